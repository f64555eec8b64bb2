//! Shared fixtures for generation tests.

use std::sync::{Arc, Mutex};

use super::*;
use crate::models::{Gender, PatientContext};
use crate::pipeline::llm::{LlmNoteService, MockLlmClient};
use crate::worker::WorkerGate;

pub(crate) struct Harness {
    pub llm: Arc<MockLlmClient>,
    pub ledger: Arc<InMemoryLedger>,
    pub queue: Arc<InMemoryQueue>,
    pub patients: Arc<InMemoryPatients>,
    pub connectivity: Arc<ConnectivityMonitor>,
    pub gate: Arc<WorkerGate>,
}

impl Harness {
    fn new(reachable: bool) -> Self {
        let patient = PatientContext {
            id: "p1".into(),
            name: "Anne Roy".into(),
            room: Some("12".into()),
            gender: Some(Gender::Feminine),
            diagnosis: Some("Pneumonie".into()),
            ..Default::default()
        };
        Self {
            llm: Arc::new(MockLlmClient::new(r#"{"note": "Note en ligne."}"#)),
            ledger: Arc::new(InMemoryLedger::new()),
            queue: Arc::new(InMemoryQueue::new()),
            patients: Arc::new(InMemoryPatients::new([patient])),
            connectivity: Arc::new(ConnectivityMonitor::new(reachable)),
            gate: Arc::new(WorkerGate::new()),
        }
    }

    pub fn online() -> Self {
        Self::new(true)
    }

    pub fn offline() -> Self {
        Self::new(false)
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            ledger: self.ledger.clone(),
            queue: self.queue.clone(),
            patients: self.patients.clone(),
            connectivity: self.connectivity.clone(),
            service: Arc::new(LlmNoteService::new(self.llm.clone(), "llama3.1:8b")),
        }
    }

    pub fn dispatcher(&self) -> NoteDispatcher {
        NoteDispatcher::new(self.collaborators(), self.gate.clone(), true)
    }

    pub fn record_states(&self) -> Arc<Mutex<Vec<DispatchState>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    pub fn dispatcher_with_observer(&self, states: Arc<Mutex<Vec<DispatchState>>>) -> NoteDispatcher {
        self.dispatcher().with_state_observer(move |s| {
            if let Ok(mut states) = states.lock() {
                states.push(s);
            }
        })
    }

    pub fn reconciler(&self) -> QueueReconciler {
        QueueReconciler::new(self.collaborators(), self.gate.clone())
    }
}
