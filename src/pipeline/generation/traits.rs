//! Collaborator seams of the generation pipeline.
//!
//! - NoteLedger: history of generated notes keyed by identity
//! - OfflineQueue: durable pending requests awaiting the external service
//! - PatientDirectory: read-only patient lookup
//! - Connectivity: effective online state
//!
//! SQLite implementations live in `crate::db::repository`, in-memory ones in
//! `super::memory`.

use crate::db::DatabaseError;
use crate::models::{GeneratedNoteRecord, NoteIdentity, OfflineQueueEntry, PatientContext};

/// Store of generated-note records. Writes are last-writer-wins by identity.
pub trait NoteLedger: Send + Sync {
    /// All records, oldest first.
    fn list(&self) -> Result<Vec<GeneratedNoteRecord>, DatabaseError>;

    fn get(&self, id: &NoteIdentity) -> Result<Option<GeneratedNoteRecord>, DatabaseError>;

    fn insert(&self, record: &GeneratedNoteRecord) -> Result<(), DatabaseError>;

    /// Replace the record stored under `id`. Returns false when absent.
    fn update(&self, id: &NoteIdentity, record: &GeneratedNoteRecord)
        -> Result<bool, DatabaseError>;

    fn delete(&self, id: &NoteIdentity) -> Result<bool, DatabaseError>;

    fn clear(&self) -> Result<(), DatabaseError>;

    /// Highest timestamp in the ledger, if any.
    fn latest_timestamp(&self) -> Result<Option<i64>, DatabaseError> {
        Ok(self.list()?.iter().map(|r| r.timestamp).max())
    }

    /// Manual edit of the note text. Returns false when absent.
    fn update_content(&self, id: &NoteIdentity, content: &str) -> Result<bool, DatabaseError> {
        match self.get(id)? {
            Some(mut record) => {
                record.note_content = content.to_string();
                self.update(id, &record)
            }
            None => Ok(false),
        }
    }
}

/// Durable set of pending generation requests, at most one per identity.
pub trait OfflineQueue: Send + Sync {
    /// Pending entries in insertion order.
    fn load(&self) -> Result<Vec<OfflineQueueEntry>, DatabaseError>;

    /// Insert, or replace the entry with the same identity.
    fn upsert(&self, entry: &OfflineQueueEntry) -> Result<(), DatabaseError>;

    fn remove(&self, id: &NoteIdentity) -> Result<bool, DatabaseError>;

    /// Persist exactly `entries` as the new queue content.
    fn replace_all(&self, entries: &[OfflineQueueEntry]) -> Result<(), DatabaseError>;

    fn clear(&self) -> Result<(), DatabaseError>;
}

/// Patient management collaborator.
pub trait PatientDirectory: Send + Sync {
    fn find(&self, id: &str) -> Option<PatientContext>;
}

/// Connectivity collaborator.
pub trait Connectivity: Send + Sync {
    /// Reachable and not forced offline.
    fn is_effectively_online(&self) -> bool;
}
