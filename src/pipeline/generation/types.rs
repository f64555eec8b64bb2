use serde::{Deserialize, Serialize};

use crate::models::{NoteIdentity, ObservationSnapshot};

// ═══════════════════════════════════════════
// Dispatcher
// ═══════════════════════════════════════════

/// Dispatcher state. Every request ends back in `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchState {
    Idle,
    AssemblingOnline,
    AssemblingOffline,
    AwaitingExternalService,
    Committing,
}

/// Note text tagged with the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "text", rename_all = "snake_case")]
pub enum GeneratedNote {
    /// Written by the external service.
    Online(String),
    /// Composed locally, queued for an upgrade.
    Offline(String),
}

impl GeneratedNote {
    pub fn text(&self) -> &str {
        match self {
            Self::Online(text) | Self::Offline(text) => text,
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Offline(_))
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Online(text) | Self::Offline(text) => text,
        }
    }
}

/// One note request from the form.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub snapshot: ObservationSnapshot,
    /// Currently selected patient.
    pub patient_id: Option<String>,
    /// Identity of the record being regenerated, if any.
    pub regenerate: Option<NoteIdentity>,
}

impl GenerationRequest {
    pub fn new(snapshot: ObservationSnapshot, patient_id: Option<String>) -> Self {
        Self {
            snapshot,
            patient_id,
            regenerate: None,
        }
    }

    pub fn regenerating(mut self, identity: NoteIdentity) -> Self {
        self.regenerate = Some(identity);
        self
    }
}

/// Result of a committed request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutcome {
    /// Identity of the record that was created or updated.
    pub identity: NoteIdentity,
    pub note: GeneratedNote,
    /// Form state to continue with: shift and gender only, after an offline
    /// commit. `None` leaves the form as it was.
    pub reset_form: Option<ObservationSnapshot>,
}

// ═══════════════════════════════════════════
// Queue drain
// ═══════════════════════════════════════════

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainReport {
    /// Entries handled in this pass (upgraded + discarded + failed).
    pub processed: u32,
    /// Records upgraded from offline to online text.
    pub upgraded: u32,
    /// Entries dropped without a service call (blank summary, deleted record).
    pub discarded: u32,
    /// Entries still pending after the pass.
    pub remaining: u32,
    pub errors: Vec<String>,
    pub duration_ms: u64,
    /// Another drain was already running; nothing was done.
    pub skipped: bool,
}

impl DrainReport {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    /// French status line for the user.
    pub fn summary_message(&self) -> String {
        if self.skipped {
            return "Synchronisation déjà en cours.".into();
        }
        if self.processed == 0 {
            return "Aucune note en attente de synchronisation.".into();
        }
        let mut message = match self.upgraded {
            0 => "Aucune note n'a pu être synchronisée.".to_string(),
            1 => "1 note hors ligne a été synchronisée.".to_string(),
            n => format!("{n} notes hors ligne ont été synchronisées."),
        };
        match self.remaining {
            0 => {}
            1 => message.push_str(" 1 note reste en attente."),
            n => message.push_str(&format!(" {n} notes restent en attente.")),
        }
        message
    }
}

/// Progress event emitted during a drain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DrainEvent {
    Started {
        entry_count: u32,
    },
    Progress {
        completed: u32,
        total: u32,
        timestamp: i64,
    },
    Completed {
        upgraded: u32,
        remaining: u32,
        duration_ms: u64,
    },
}
