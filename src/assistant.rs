//! Clinical assistant: free-text nursing questions answered by the same
//! external service that writes the notes.

use std::sync::Arc;

use crate::models::AnswerComplexity;
use crate::pipeline::generation::GenerationError;
use crate::pipeline::llm::NoteService;
use crate::worker::{OperationKind, WorkerGate};

const EMPTY_QUESTION: &str = "Veuillez saisir une question clinique.";

pub struct ClinicalAssistant {
    service: Arc<dyn NoteService>,
    gate: Arc<WorkerGate>,
}

impl ClinicalAssistant {
    pub fn new(service: Arc<dyn NoteService>, gate: Arc<WorkerGate>) -> Self {
        Self { service, gate }
    }

    /// Ask one question. Blank questions are refused without contacting the
    /// service; the answer is never stored.
    pub fn ask(
        &self,
        question: &str,
        complexity: AnswerComplexity,
    ) -> Result<String, GenerationError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(GenerationError::Validation(EMPTY_QUESTION.into()));
        }

        let _guard = self.gate.acquire(OperationKind::ClinicalAssistant)?;
        tracing::info!(%complexity, chars = question.chars().count(), "Asking clinical assistant");
        self.service
            .answer_question(question, complexity)
            .map_err(|e| {
                tracing::warn!(error = %e, "Clinical assistant failed");
                e.into()
            })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::pipeline::generation::testing::Harness;
    use crate::pipeline::llm::ServiceError;

    fn assistant(h: &Harness) -> ClinicalAssistant {
        ClinicalAssistant::new(h.collaborators().service, h.gate.clone())
    }

    #[test]
    fn blank_question_is_refused_without_service_call() {
        let h = Harness::online();
        let err = assistant(&h).ask("  \n", AnswerComplexity::Simple).unwrap_err();
        assert!(matches!(err, GenerationError::Validation(_)));
        assert_eq!(h.llm.call_count(), 0);
    }

    #[test]
    fn question_and_level_reach_the_service() {
        let h = Harness::online();
        h.llm.set_response("Surveiller la saturation.");
        let answer = assistant(&h)
            .ask(" Signes d'hypoxie ? ", AnswerComplexity::Detailed)
            .unwrap();

        assert_eq!(answer, "Surveiller la saturation.");
        let prompt = &h.llm.prompts()[0];
        assert!(prompt.contains("QUESTION : \"Signes d'hypoxie ?\""));
        assert!(prompt.contains("NIVEAU DE COMPLEXITÉ : \"Détaillé\"."));
        assert!(!h.gate.is_busy());
    }

    #[test]
    fn service_failure_is_recoverable_and_releases_worker() {
        let h = Harness::online();
        h.llm.set_failing(true);
        let err = assistant(&h)
            .ask("Dose d'héparine ?", AnswerComplexity::Simple)
            .unwrap_err();
        assert!(matches!(err, GenerationError::Service(_)));
        assert!(err.is_recoverable());
        assert!(!h.gate.is_busy());
        assert!(h.gate.current_operation().is_none());
    }

    /// Records which operation held the worker while the question ran.
    struct GateWitness {
        gate: Arc<WorkerGate>,
        seen: Mutex<Option<OperationKind>>,
    }

    impl NoteService for GateWitness {
        fn generate_note(&self, _: &str) -> Result<String, ServiceError> {
            unreachable!()
        }

        fn generate_shift_report(&self, _: &str) -> Result<String, ServiceError> {
            unreachable!()
        }

        fn answer_question(&self, _: &str, _: AnswerComplexity) -> Result<String, ServiceError> {
            *self.seen.lock().unwrap() = self.gate.current_operation().map(|op| op.kind);
            Ok("ok".into())
        }
    }

    #[test]
    fn question_holds_the_worker_as_clinical_assistant() {
        let gate = Arc::new(WorkerGate::new());
        let witness = Arc::new(GateWitness {
            gate: gate.clone(),
            seen: Mutex::new(None),
        });
        let assistant = ClinicalAssistant::new(witness.clone(), gate);
        assistant.ask("Question", AnswerComplexity::Simple).unwrap();
        assert_eq!(
            *witness.seen.lock().unwrap(),
            Some(OperationKind::ClinicalAssistant)
        );
    }
}
