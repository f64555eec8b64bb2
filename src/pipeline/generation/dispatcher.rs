//! NoteDispatcher: picks the online or offline strategy for one request and
//! commits the result to the ledger (and the offline queue).
//!
//! Idle → AssemblingOnline → AwaitingExternalService → Committing → Idle
//! Idle → AssemblingOffline → Committing → Idle

use std::sync::{Arc, Mutex};

use super::error::GenerationError;
use super::types::*;
use super::Collaborators;
use crate::models::{
    GeneratedNoteRecord, NoteIdentity, ObservationSnapshot, OfflineQueueEntry, PatientContext,
};
use crate::pipeline::assembler::{build_clinical_summary, has_clinical_content};
use crate::pipeline::narrative::compose_offline_note;
use crate::worker::{OperationKind, WorkerGate};

type StateObserver = Box<dyn Fn(DispatchState) + Send + Sync>;

pub struct NoteDispatcher {
    deps: Collaborators,
    gate: Arc<WorkerGate>,
    offline_queue_enabled: bool,
    state: Mutex<DispatchState>,
    last_timestamp: Mutex<i64>,
    observer: Option<StateObserver>,
}

impl NoteDispatcher {
    pub fn new(deps: Collaborators, gate: Arc<WorkerGate>, offline_queue_enabled: bool) -> Self {
        Self {
            deps,
            gate,
            offline_queue_enabled,
            state: Mutex::new(DispatchState::Idle),
            last_timestamp: Mutex::new(0),
            observer: None,
        }
    }

    /// Called on every state transition.
    pub fn with_state_observer(
        mut self,
        observer: impl Fn(DispatchState) + Send + Sync + 'static,
    ) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn state(&self) -> DispatchState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(DispatchState::Idle)
    }

    /// Generate one note for the form.
    ///
    /// A snapshot without clinical content is rejected before anything runs,
    /// whichever strategy would have applied. A service failure
    /// leaves the ledger and queue untouched.
    pub fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationOutcome, GenerationError> {
        if !has_clinical_content(&request.snapshot) {
            return Err(GenerationError::empty_form());
        }

        let _guard = self.gate.acquire(OperationKind::NoteGeneration)?;
        let _idle = IdleOnDrop(self);

        let existing = match &request.regenerate {
            Some(id) => Some(self.deps.ledger.get(id)?.ok_or_else(|| {
                GenerationError::Validation("La note à régénérer n'existe plus.".into())
            })?),
            None => None,
        };

        let patient = request
            .patient_id
            .as_deref()
            .and_then(|id| self.deps.patients.find(id));

        let online = self.deps.connectivity.is_effectively_online() || !self.offline_queue_enabled;
        let note = if online {
            self.generate_online(&request.snapshot, patient.as_ref())?
        } else {
            self.set_state(DispatchState::AssemblingOffline);
            GeneratedNote::Offline(compose_offline_note(&request.snapshot, patient.as_ref()))
        };

        self.set_state(DispatchState::Committing);
        let reset_form = note
            .is_offline()
            .then(|| request.snapshot.context_only());
        let identity = self.commit(&request, existing.as_ref(), patient.as_ref(), note.clone())?;

        tracing::info!(
            note = %identity,
            offline = note.is_offline(),
            regenerated = request.regenerate.is_some(),
            "Note committed"
        );

        Ok(GenerationOutcome {
            identity,
            note,
            reset_form,
        })
    }

    fn generate_online(
        &self,
        snapshot: &ObservationSnapshot,
        patient: Option<&PatientContext>,
    ) -> Result<GeneratedNote, GenerationError> {
        self.set_state(DispatchState::AssemblingOnline);
        let summary = build_clinical_summary(snapshot, patient);

        self.set_state(DispatchState::AwaitingExternalService);
        match self.deps.service.generate_note(&summary) {
            Ok(text) => Ok(GeneratedNote::Online(text)),
            Err(e) => {
                tracing::warn!(error = %e, "Note generation failed");
                Err(e.into())
            }
        }
    }

    /// Write the note. Regeneration updates the edited identity in place;
    /// anything else appends a new identity.
    fn commit(
        &self,
        request: &GenerationRequest,
        existing: Option<&GeneratedNoteRecord>,
        patient: Option<&PatientContext>,
        note: GeneratedNote,
    ) -> Result<NoteIdentity, GenerationError> {
        let is_offline = note.is_offline();
        let timestamp = match existing {
            Some(record) => record.timestamp,
            None => self.next_timestamp()?,
        };

        let record = GeneratedNoteRecord {
            patient_id: request.patient_id.clone(),
            timestamp,
            patient_name: PatientContext::display_name(patient),
            note_content: note.into_text(),
            snapshot: request.snapshot.clone(),
            is_offline,
        };
        let identity = record.identity();

        match existing {
            Some(previous) => {
                let previous_id = previous.identity();
                self.deps.ledger.update(&previous_id, &record)?;
                // The stale entry goes either way; offline re-queues below.
                self.deps.queue.remove(&previous_id)?;
            }
            None => self.deps.ledger.insert(&record)?,
        }

        if is_offline {
            self.deps.queue.upsert(&OfflineQueueEntry {
                snapshot: record.snapshot.clone(),
                patient_id: record.patient_id.clone(),
                patient_name: record.patient_name.clone(),
                timestamp,
            })?;
        }

        Ok(identity)
    }

    /// Epoch milliseconds, strictly greater than any timestamp already used.
    fn next_timestamp(&self) -> Result<i64, GenerationError> {
        let mut last = self
            .last_timestamp
            .lock()
            .map_err(|_| GenerationError::WorkerUnavailable)?;
        let ledger_max = self.deps.ledger.latest_timestamp()?.unwrap_or(0);
        let now = chrono::Utc::now().timestamp_millis();
        let next = now.max(*last + 1).max(ledger_max + 1);
        *last = next;
        Ok(next)
    }

    fn set_state(&self, next: DispatchState) {
        if let Ok(mut state) = self.state.lock() {
            *state = next;
        }
        if let Some(observer) = &self.observer {
            observer(next);
        }
    }
}

/// Returns the dispatcher to `Idle` however the request ends.
struct IdleOnDrop<'a>(&'a NoteDispatcher);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.set_state(DispatchState::Idle);
    }
}
