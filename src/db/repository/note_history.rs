use rusqlite::{params, Connection, OptionalExtension};

use super::{lock, parse_json, SharedConnection};
use crate::db::DatabaseError;
use crate::models::{GeneratedNoteRecord, NoteIdentity};
use crate::pipeline::generation::NoteLedger;

const TABLE: &str = "note_history";

type RawRecord = (Option<String>, i64, String, String, String, bool);

fn read_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRecord> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn into_record(raw: RawRecord) -> Result<GeneratedNoteRecord, DatabaseError> {
    let (patient_id, timestamp, patient_name, note_content, snapshot_json, is_offline) = raw;
    Ok(GeneratedNoteRecord {
        patient_id,
        timestamp,
        patient_name,
        note_content,
        snapshot: parse_json(TABLE, &snapshot_json)?,
        is_offline,
    })
}

pub fn insert_note(conn: &Connection, record: &GeneratedNoteRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR REPLACE INTO note_history
         (timestamp, patient_id, patient_name, note_content, snapshot_json, is_offline)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            record.timestamp,
            record.patient_id,
            record.patient_name,
            record.note_content,
            serde_json::to_string(&record.snapshot)?,
            record.is_offline,
        ],
    )?;
    Ok(())
}

pub fn get_note(
    conn: &Connection,
    id: &NoteIdentity,
) -> Result<Option<GeneratedNoteRecord>, DatabaseError> {
    let raw = conn
        .query_row(
            "SELECT patient_id, timestamp, patient_name, note_content, snapshot_json, is_offline
             FROM note_history WHERE timestamp = ?1 AND patient_id IS ?2",
            params![id.timestamp, id.patient_id],
            read_raw,
        )
        .optional()?;
    raw.map(into_record).transpose()
}

/// All notes, oldest first.
pub fn list_notes(conn: &Connection) -> Result<Vec<GeneratedNoteRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT patient_id, timestamp, patient_name, note_content, snapshot_json, is_offline
         FROM note_history ORDER BY timestamp ASC",
    )?;
    let rows = stmt
        .query_map([], read_raw)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(into_record).collect()
}

/// Overwrite the note stored under `id`. The identity itself may change
/// (a regeneration can reassign the patient).
pub fn update_note(
    conn: &Connection,
    id: &NoteIdentity,
    record: &GeneratedNoteRecord,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE note_history SET
         timestamp = ?1, patient_id = ?2, patient_name = ?3, note_content = ?4,
         snapshot_json = ?5, is_offline = ?6
         WHERE timestamp = ?7 AND patient_id IS ?8",
        params![
            record.timestamp,
            record.patient_id,
            record.patient_name,
            record.note_content,
            serde_json::to_string(&record.snapshot)?,
            record.is_offline,
            id.timestamp,
            id.patient_id,
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_note(conn: &Connection, id: &NoteIdentity) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM note_history WHERE timestamp = ?1 AND patient_id IS ?2",
        params![id.timestamp, id.patient_id],
    )?;
    Ok(changed > 0)
}

pub fn clear_notes(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM note_history", [])?;
    Ok(())
}

pub fn latest_note_timestamp(conn: &Connection) -> Result<Option<i64>, DatabaseError> {
    let max = conn.query_row("SELECT MAX(timestamp) FROM note_history", [], |row| {
        row.get::<_, Option<i64>>(0)
    })?;
    Ok(max)
}

// ═══════════════════════════════════════════
// NoteLedger over a shared connection
// ═══════════════════════════════════════════

pub struct SqliteNoteLedger {
    conn: SharedConnection,
}

impl SqliteNoteLedger {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// Run a read; an unreadable history is reset and reads as `empty`.
    fn read_or_reset<T>(
        &self,
        read: impl FnOnce(&Connection) -> Result<T, DatabaseError>,
        empty: T,
    ) -> Result<T, DatabaseError> {
        let conn = lock(&self.conn)?;
        match read(&*conn) {
            Err(e @ DatabaseError::Corrupted { .. }) => {
                tracing::warn!(error = %e, "Note history unreadable, resetting");
                clear_notes(&conn)?;
                Ok(empty)
            }
            other => other,
        }
    }
}

impl NoteLedger for SqliteNoteLedger {
    /// A history with unreadable rows is reset to empty.
    fn list(&self) -> Result<Vec<GeneratedNoteRecord>, DatabaseError> {
        self.read_or_reset(list_notes, Vec::new())
    }

    /// Same reset as [`list`](Self::list) when the row cannot be read.
    fn get(&self, id: &NoteIdentity) -> Result<Option<GeneratedNoteRecord>, DatabaseError> {
        self.read_or_reset(|conn| get_note(conn, id), None)
    }

    fn insert(&self, record: &GeneratedNoteRecord) -> Result<(), DatabaseError> {
        insert_note(&*lock(&self.conn)?, record)
    }

    fn update(
        &self,
        id: &NoteIdentity,
        record: &GeneratedNoteRecord,
    ) -> Result<bool, DatabaseError> {
        update_note(&*lock(&self.conn)?, id, record)
    }

    fn delete(&self, id: &NoteIdentity) -> Result<bool, DatabaseError> {
        delete_note(&*lock(&self.conn)?, id)
    }

    fn clear(&self) -> Result<(), DatabaseError> {
        clear_notes(&*lock(&self.conn)?)
    }

    fn latest_timestamp(&self) -> Result<Option<i64>, DatabaseError> {
        latest_note_timestamp(&*lock(&self.conn)?)
    }
}
