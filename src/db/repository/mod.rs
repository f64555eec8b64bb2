//! Repository layer: durable stores for the note history, the offline queue
//! and saved drafts.
//!
//! Each store exposes free functions over a `&Connection` plus a thin
//! `Sqlite*` wrapper over a shared connection implementing the generation
//! traits.

mod draft;
mod note_history;
mod offline_queue;

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use super::DatabaseError;

pub use draft::*;
pub use note_history::*;
pub use offline_queue::*;

/// One connection shared by every store of a session.
pub type SharedConnection = Arc<Mutex<Connection>>;

pub fn share(conn: Connection) -> SharedConnection {
    Arc::new(Mutex::new(conn))
}

fn lock(conn: &SharedConnection) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
    conn.lock().map_err(|_| DatabaseError::LockPoisoned)
}

/// Parse a JSON column, naming the table on failure.
fn parse_json<T: serde::de::DeserializeOwned>(table: &str, raw: &str) -> Result<T, DatabaseError> {
    serde_json::from_str(raw).map_err(|e| DatabaseError::Corrupted {
        table: table.into(),
        reason: e.to_string(),
    })
}
