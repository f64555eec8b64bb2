use std::path::Path;

use rusqlite::Connection;

use super::DatabaseError;

const MIGRATION_001_INITIAL: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS note_history (
    timestamp INTEGER PRIMARY KEY,
    patient_id TEXT,
    patient_name TEXT NOT NULL,
    note_content TEXT NOT NULL,
    snapshot_json TEXT NOT NULL,
    is_offline INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS offline_queue (
    position INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp INTEGER NOT NULL,
    patient_id TEXT,
    patient_name TEXT NOT NULL,
    snapshot_json TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_offline_queue_timestamp ON offline_queue(timestamp);

INSERT INTO schema_version (version) VALUES (1);
";

const MIGRATION_002_DRAFTS: &str = "
CREATE TABLE IF NOT EXISTS drafts (
    name TEXT PRIMARY KEY,
    snapshot_json TEXT NOT NULL,
    note_text TEXT NOT NULL DEFAULT '',
    saved_at INTEGER NOT NULL
);

INSERT INTO schema_version (version) VALUES (2);
";

/// Open a SQLite connection to the given path and run migrations
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    let conn = Connection::open(path)?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Open the database, moving an unreadable file aside and starting fresh.
///
/// The damaged file is kept next to the original with a `.corrupt` suffix.
pub fn open_database_or_reset(path: &Path) -> Result<Connection, DatabaseError> {
    match open_database(path) {
        Ok(conn) => Ok(conn),
        Err(e) if path.exists() => {
            let aside = path.with_extension("corrupt");
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Database unreadable, resetting to empty"
            );
            std::fs::rename(path, &aside).map_err(|io| DatabaseError::Corrupted {
                table: "*".into(),
                reason: format!("cannot move damaged file aside: {io}"),
            })?;
            open_database(path)
        }
        Err(e) => Err(e),
    }
}

/// Open an in-memory database (for testing)
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

fn configure_pragmas(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "PRAGMA journal_mode=DELETE;
         PRAGMA foreign_keys=ON;",
    )?;
    Ok(())
}

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let current_version = get_current_version(conn);

    let migrations: [(i64, &str); 2] = [(1, MIGRATION_001_INITIAL), (2, MIGRATION_002_DRAFTS)];

    for (version, sql) in migrations {
        if version > current_version {
            tracing::info!("Running migration v{version}");
            conn.execute_batch(sql).map_err(|e| DatabaseError::MigrationFailed {
                version,
                reason: e.to_string(),
            })?;
        }
    }

    Ok(())
}

/// Get the current schema version (0 if no schema exists yet)
fn get_current_version(conn: &Connection) -> i64 {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get::<_, Option<i64>>(0)
    })
    .ok()
    .flatten()
    .unwrap_or(0)
}

/// Count tables in the database (for verification)
pub fn count_tables(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_initializes_all_tables() {
        let conn = open_memory_database().unwrap();
        // schema_version + note_history + offline_queue + drafts
        let count = count_tables(&conn).unwrap();
        assert_eq!(count, 4);
    }

    #[test]
    fn schema_version_is_current() {
        let conn = open_memory_database().unwrap();
        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, 2);
    }

    #[test]
    fn migration_idempotent() {
        let conn = open_memory_database().unwrap();
        assert!(run_migrations(&conn).is_ok());
    }

    #[test]
    fn reopening_file_keeps_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.db");
        drop(open_database(&path).unwrap());
        let conn = open_database(&path).unwrap();
        assert_eq!(count_tables(&conn).unwrap(), 4);
    }

    #[test]
    fn garbage_file_is_moved_aside_and_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.db");
        std::fs::write(&path, b"definitely not a sqlite database, just bytes....").unwrap();

        let conn = open_database_or_reset(&path).unwrap();
        assert_eq!(count_tables(&conn).unwrap(), 4);
        assert!(path.with_extension("corrupt").exists());
    }
}
