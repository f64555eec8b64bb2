use serde::{Deserialize, Serialize};

use super::observation::ObservationSnapshot;

/// Identity of one generated note: (patient id or none, creation timestamp in
/// epoch milliseconds). The timestamp is unique across the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteIdentity {
    pub patient_id: Option<String>,
    pub timestamp: i64,
}

impl NoteIdentity {
    pub fn new(patient_id: Option<String>, timestamp: i64) -> Self {
        Self {
            patient_id,
            timestamp,
        }
    }
}

impl std::fmt::Display for NoteIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{}",
            self.patient_id.as_deref().unwrap_or("-"),
            self.timestamp
        )
    }
}

/// A note in the shift history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedNoteRecord {
    pub patient_id: Option<String>,
    pub timestamp: i64,
    pub patient_name: String,
    pub note_content: String,
    /// Form state at generation time.
    pub snapshot: ObservationSnapshot,
    /// Composed locally and still waiting for the external service.
    pub is_offline: bool,
}

impl GeneratedNoteRecord {
    pub fn identity(&self) -> NoteIdentity {
        NoteIdentity::new(self.patient_id.clone(), self.timestamp)
    }
}

/// Pending request kept until its offline record is upgraded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfflineQueueEntry {
    pub snapshot: ObservationSnapshot,
    pub patient_id: Option<String>,
    pub patient_name: String,
    /// Equal to the paired record's timestamp.
    pub timestamp: i64,
}

impl OfflineQueueEntry {
    pub fn identity(&self) -> NoteIdentity {
        NoteIdentity::new(self.patient_id.clone(), self.timestamp)
    }
}

/// Named saved form, with the note text that was on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedDraft {
    pub name: String,
    pub snapshot: ObservationSnapshot,
    pub note_text: String,
    pub saved_at: i64,
}
