use rusqlite::{params, Connection};

use super::{lock, parse_json, SharedConnection};
use crate::db::DatabaseError;
use crate::models::{NoteIdentity, OfflineQueueEntry};
use crate::pipeline::generation::OfflineQueue;

const TABLE: &str = "offline_queue";

/// Pending entries in insertion order.
pub fn load_queue(conn: &Connection) -> Result<Vec<OfflineQueueEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT patient_id, timestamp, patient_name, snapshot_json
         FROM offline_queue ORDER BY position ASC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, Option<String>>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(patient_id, timestamp, patient_name, snapshot_json)| {
            Ok(OfflineQueueEntry {
                snapshot: parse_json(TABLE, &snapshot_json)?,
                patient_id,
                patient_name,
                timestamp,
            })
        })
        .collect()
}

fn append_entry(conn: &Connection, entry: &OfflineQueueEntry) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO offline_queue (timestamp, patient_id, patient_name, snapshot_json)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            entry.timestamp,
            entry.patient_id,
            entry.patient_name,
            serde_json::to_string(&entry.snapshot)?,
        ],
    )?;
    Ok(())
}

/// Replace the entry with the same identity in place, or append a new one.
pub fn upsert_entry(conn: &Connection, entry: &OfflineQueueEntry) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE offline_queue SET patient_name = ?1, snapshot_json = ?2
         WHERE timestamp = ?3 AND patient_id IS ?4",
        params![
            entry.patient_name,
            serde_json::to_string(&entry.snapshot)?,
            entry.timestamp,
            entry.patient_id,
        ],
    )?;
    if changed == 0 {
        append_entry(conn, entry)?;
    }
    Ok(())
}

pub fn remove_entry(conn: &Connection, id: &NoteIdentity) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM offline_queue WHERE timestamp = ?1 AND patient_id IS ?2",
        params![id.timestamp, id.patient_id],
    )?;
    Ok(changed > 0)
}

/// Atomically swap the queue content for `entries`.
pub fn replace_queue(conn: &Connection, entries: &[OfflineQueueEntry]) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM offline_queue", [])?;
    for entry in entries {
        append_entry(&tx, entry)?;
    }
    tx.commit()?;
    Ok(())
}

pub fn clear_queue(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM offline_queue", [])?;
    Ok(())
}

// ═══════════════════════════════════════════
// OfflineQueue over a shared connection
// ═══════════════════════════════════════════

pub struct SqliteOfflineQueue {
    conn: SharedConnection,
}

impl SqliteOfflineQueue {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

impl OfflineQueue for SqliteOfflineQueue {
    /// An unreadable queue is reset to empty.
    fn load(&self) -> Result<Vec<OfflineQueueEntry>, DatabaseError> {
        let conn = lock(&self.conn)?;
        match load_queue(&conn) {
            Err(e @ DatabaseError::Corrupted { .. }) => {
                tracing::warn!(error = %e, "Offline queue unreadable, resetting");
                clear_queue(&conn)?;
                Ok(Vec::new())
            }
            other => other,
        }
    }

    fn upsert(&self, entry: &OfflineQueueEntry) -> Result<(), DatabaseError> {
        upsert_entry(&*lock(&self.conn)?, entry)
    }

    fn remove(&self, id: &NoteIdentity) -> Result<bool, DatabaseError> {
        remove_entry(&*lock(&self.conn)?, id)
    }

    fn replace_all(&self, entries: &[OfflineQueueEntry]) -> Result<(), DatabaseError> {
        replace_queue(&*lock(&self.conn)?, entries)
    }

    fn clear(&self) -> Result<(), DatabaseError> {
        clear_queue(&*lock(&self.conn)?)
    }
}
