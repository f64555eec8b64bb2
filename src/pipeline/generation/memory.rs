//! In-memory collaborators, for tests and for running without a database.

use std::collections::HashMap;
use std::sync::Mutex;

use super::traits::{NoteLedger, OfflineQueue, PatientDirectory};
use crate::db::DatabaseError;
use crate::models::{GeneratedNoteRecord, NoteIdentity, OfflineQueueEntry, PatientContext};

#[derive(Default)]
pub struct InMemoryLedger {
    records: Mutex<Vec<GeneratedNoteRecord>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_records<T>(
        &self,
        f: impl FnOnce(&mut Vec<GeneratedNoteRecord>) -> T,
    ) -> Result<T, DatabaseError> {
        let mut records = self.records.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        Ok(f(&mut records))
    }
}

impl NoteLedger for InMemoryLedger {
    fn list(&self) -> Result<Vec<GeneratedNoteRecord>, DatabaseError> {
        self.with_records(|records| {
            let mut sorted = records.clone();
            sorted.sort_by_key(|r| r.timestamp);
            sorted
        })
    }

    fn get(&self, id: &NoteIdentity) -> Result<Option<GeneratedNoteRecord>, DatabaseError> {
        self.with_records(|records| records.iter().find(|r| r.identity() == *id).cloned())
    }

    fn insert(&self, record: &GeneratedNoteRecord) -> Result<(), DatabaseError> {
        self.with_records(|records| {
            let identity = record.identity();
            records.retain(|r| r.identity() != identity);
            records.push(record.clone());
        })
    }

    fn update(
        &self,
        id: &NoteIdentity,
        record: &GeneratedNoteRecord,
    ) -> Result<bool, DatabaseError> {
        self.with_records(|records| match records.iter_mut().find(|r| r.identity() == *id) {
            Some(existing) => {
                *existing = record.clone();
                true
            }
            None => false,
        })
    }

    fn delete(&self, id: &NoteIdentity) -> Result<bool, DatabaseError> {
        self.with_records(|records| {
            let before = records.len();
            records.retain(|r| r.identity() != *id);
            records.len() != before
        })
    }

    fn clear(&self) -> Result<(), DatabaseError> {
        self.with_records(|records| records.clear())
    }
}

#[derive(Default)]
pub struct InMemoryQueue {
    entries: Mutex<Vec<OfflineQueueEntry>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries<T>(
        &self,
        f: impl FnOnce(&mut Vec<OfflineQueueEntry>) -> T,
    ) -> Result<T, DatabaseError> {
        let mut entries = self.entries.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        Ok(f(&mut entries))
    }
}

impl OfflineQueue for InMemoryQueue {
    fn load(&self) -> Result<Vec<OfflineQueueEntry>, DatabaseError> {
        self.with_entries(|entries| entries.clone())
    }

    fn upsert(&self, entry: &OfflineQueueEntry) -> Result<(), DatabaseError> {
        self.with_entries(|entries| {
            let identity = entry.identity();
            match entries.iter_mut().find(|e| e.identity() == identity) {
                Some(existing) => *existing = entry.clone(),
                None => entries.push(entry.clone()),
            }
        })
    }

    fn remove(&self, id: &NoteIdentity) -> Result<bool, DatabaseError> {
        self.with_entries(|entries| {
            let before = entries.len();
            entries.retain(|e| e.identity() != *id);
            entries.len() != before
        })
    }

    fn replace_all(&self, new_entries: &[OfflineQueueEntry]) -> Result<(), DatabaseError> {
        self.with_entries(|entries| *entries = new_entries.to_vec())
    }

    fn clear(&self) -> Result<(), DatabaseError> {
        self.with_entries(|entries| entries.clear())
    }
}

/// Fixed patient list keyed by id.
#[derive(Default)]
pub struct InMemoryPatients {
    patients: HashMap<String, PatientContext>,
}

impl InMemoryPatients {
    pub fn new(patients: impl IntoIterator<Item = PatientContext>) -> Self {
        Self {
            patients: patients.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }
}

impl PatientDirectory for InMemoryPatients {
    fn find(&self, id: &str) -> Option<PatientContext> {
        self.patients.get(id).cloned()
    }
}
