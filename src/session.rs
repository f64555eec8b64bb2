//! Shift session: the working form, the selected patient and the note being
//! regenerated, on top of a [`NoteDispatcher`].

use crate::models::{NoteIdentity, ObservationSnapshot, SavedDraft};
use crate::pipeline::generation::{
    Collaborators, GenerationError, GenerationOutcome, GenerationRequest,
    NoteDispatcher,
};
use crate::scenarios::Scenario;

pub struct ShiftSession {
    dispatcher: NoteDispatcher,
    deps: Collaborators,
    snapshot: ObservationSnapshot,
    selected_patient: Option<String>,
    regenerating: Option<NoteIdentity>,
    note_text: String,
}

impl ShiftSession {
    pub fn new(dispatcher: NoteDispatcher, deps: Collaborators) -> Self {
        Self {
            dispatcher,
            deps,
            snapshot: ObservationSnapshot::default(),
            selected_patient: None,
            regenerating: None,
            note_text: String::new(),
        }
    }

    pub fn snapshot(&self) -> &ObservationSnapshot {
        &self.snapshot
    }

    /// Edit the working form in place.
    pub fn edit(&mut self, f: impl FnOnce(&mut ObservationSnapshot)) {
        f(&mut self.snapshot);
    }

    pub fn selected_patient(&self) -> Option<&str> {
        self.selected_patient.as_deref()
    }

    pub fn regenerating(&self) -> Option<&NoteIdentity> {
        self.regenerating.as_ref()
    }

    /// Note text currently shown for the form.
    pub fn note_text(&self) -> &str {
        &self.note_text
    }

    /// Select a patient, copying their gender into the form. Clearing the
    /// selection clears the gender too, except while regenerating.
    pub fn select_patient(&mut self, patient_id: Option<String>) {
        match patient_id.as_deref().and_then(|id| self.deps.patients.find(id)) {
            Some(patient) => self.snapshot.gender = patient.gender,
            None if patient_id.is_none() && self.regenerating.is_none() => {
                self.snapshot.gender = None;
            }
            None => {}
        }
        self.selected_patient = patient_id;
    }

    /// Replace the form with a preset, keeping shift and gender.
    pub fn apply_scenario(&mut self, scenario: &Scenario) {
        self.snapshot = scenario.apply(&self.snapshot);
        self.regenerating = None;
        self.note_text.clear();
    }

    /// Load a note from the history back into the form and enter
    /// regeneration mode for it.
    pub fn recall(&mut self, id: &NoteIdentity) -> Result<(), GenerationError> {
        let record = self.deps.ledger.get(id)?.ok_or_else(|| {
            GenerationError::Validation("Cette note n'existe plus dans l'historique.".into())
        })?;

        self.snapshot = record.snapshot.clone();
        self.regenerating = Some(record.identity());
        self.note_text = format!(
            "Mode de regénération pour la note de {}. Modifiez le formulaire et cliquez sur \"Générer\" pour mettre à jour.",
            crate::shift_report::format_time(record.timestamp, &chrono::Local)
        );
        self.select_patient(record.patient_id);
        Ok(())
    }

    /// Generate a note for the current form. An offline note resets the form
    /// to its context; a regeneration leaves regeneration mode.
    pub fn generate(&mut self) -> Result<GenerationOutcome, GenerationError> {
        let mut request = GenerationRequest::new(self.snapshot.clone(), self.selected_patient.clone());
        if let Some(id) = &self.regenerating {
            request = request.regenerating(id.clone());
        }

        let outcome = self.dispatcher.generate(request)?;

        if let Some(reset) = &outcome.reset_form {
            self.snapshot = reset.clone();
        }
        self.regenerating = None;
        self.note_text = outcome.note.text().to_string();
        Ok(outcome)
    }

    /// Clear the form, the selection, the note and regeneration mode.
    pub fn reset(&mut self) {
        self.snapshot = ObservationSnapshot::default();
        self.selected_patient = None;
        self.regenerating = None;
        self.note_text.clear();
    }

    /// Capture the form and the note on screen under `name`. Blank names are
    /// refused.
    pub fn to_draft(&self, name: &str, saved_at: i64) -> Option<SavedDraft> {
        let name = name.trim();
        (!name.is_empty()).then(|| SavedDraft {
            name: name.to_string(),
            snapshot: self.snapshot.clone(),
            note_text: self.note_text.clone(),
            saved_at,
        })
    }

    pub fn load_draft(&mut self, draft: &SavedDraft) {
        self.snapshot = draft.snapshot.clone();
        self.note_text = draft.note_text.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, Shift};
    use crate::pipeline::generation::testing::Harness;
    use crate::pipeline::generation::{NoteLedger, OfflineQueue};
    use crate::scenarios::{find_scenario, load_catalog};

    fn session(h: &Harness) -> ShiftSession {
        ShiftSession::new(h.dispatcher(), h.collaborators())
    }

    fn fill(s: &mut ShiftSession) {
        s.edit(|snap| {
            snap.shift = Some(Shift::Day);
            snap.vital_signs = "Stable".into();
            snap.notes = "RAS".into();
        });
    }

    #[test]
    fn selecting_a_patient_copies_gender() {
        let h = Harness::online();
        let mut s = session(&h);
        s.select_patient(Some("p1".into()));
        assert_eq!(s.snapshot().gender, Some(Gender::Feminine));
        assert_eq!(s.selected_patient(), Some("p1"));

        s.select_patient(None);
        assert_eq!(s.snapshot().gender, None);
    }

    #[test]
    fn online_generation_keeps_form() {
        let h = Harness::online();
        let mut s = session(&h);
        fill(&mut s);
        let outcome = s.generate().unwrap();
        assert!(!outcome.note.is_offline());
        assert_eq!(s.note_text(), "Note en ligne.");
        assert_eq!(s.snapshot().notes, "RAS");
    }

    #[test]
    fn offline_generation_resets_form_to_context() {
        let h = Harness::offline();
        let mut s = session(&h);
        s.select_patient(Some("p1".into()));
        fill(&mut s);

        let outcome = s.generate().unwrap();
        assert!(outcome.note.is_offline());
        assert_eq!(s.snapshot().shift, Some(Shift::Day));
        assert_eq!(s.snapshot().gender, Some(Gender::Feminine));
        assert!(s.snapshot().is_context_only());
        assert_eq!(h.queue.load().unwrap().len(), 1);
    }

    #[test]
    fn recall_then_generate_updates_in_place() {
        let h = Harness::online();
        let mut s = session(&h);
        fill(&mut s);
        let first = s.generate().unwrap();

        s.reset();
        s.recall(&first.identity).unwrap();
        assert_eq!(s.regenerating(), Some(&first.identity));
        assert_eq!(s.snapshot().notes, "RAS");
        assert!(s.note_text().starts_with("Mode de regénération"));

        s.edit(|snap| snap.notes = "Précision".into());
        let second = s.generate().unwrap();
        assert_eq!(second.identity.timestamp, first.identity.timestamp);
        assert!(s.regenerating().is_none());

        let records = h.ledger.list().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].snapshot.notes, "Précision");
    }

    #[test]
    fn recall_of_missing_note_fails() {
        let h = Harness::online();
        let mut s = session(&h);
        let err = s.recall(&NoteIdentity::new(None, 1)).unwrap_err();
        assert!(matches!(err, GenerationError::Validation(_)));
        assert!(s.regenerating().is_none());
    }

    #[test]
    fn clearing_selection_keeps_gender_while_regenerating() {
        let h = Harness::online();
        let mut s = session(&h);
        s.select_patient(Some("p1".into()));
        fill(&mut s);
        let outcome = s.generate().unwrap();

        s.recall(&outcome.identity).unwrap();
        s.select_patient(None);
        assert_eq!(s.snapshot().gender, Some(Gender::Feminine));
    }

    #[test]
    fn failed_generation_leaves_session_untouched() {
        let h = Harness::online();
        h.llm.set_failing(true);
        let mut s = session(&h);
        fill(&mut s);
        let before = s.snapshot().clone();
        assert!(s.generate().is_err());
        assert_eq!(s.snapshot(), &before);
        assert!(s.note_text().is_empty());
    }

    #[test]
    fn scenario_exits_regeneration_mode() {
        let h = Harness::online();
        let mut s = session(&h);
        fill(&mut s);
        let outcome = s.generate().unwrap();
        s.recall(&outcome.identity).unwrap();

        let catalog = load_catalog().unwrap();
        s.apply_scenario(find_scenario(&catalog, "Chute du patient").unwrap());
        assert!(s.regenerating().is_none());
        assert_eq!(s.snapshot().shift, Some(Shift::Day));
        assert!(s.snapshot().notes.starts_with("Patient retrouvé au sol"));
    }

    #[test]
    fn drafts_capture_form_and_note() {
        let h = Harness::online();
        let mut s = session(&h);
        fill(&mut s);
        s.generate().unwrap();

        assert!(s.to_draft("   ", 1).is_none());
        let draft = s.to_draft(" Chambre 12 ", 1).unwrap();
        assert_eq!(draft.name, "Chambre 12");
        assert_eq!(draft.note_text, "Note en ligne.");

        s.reset();
        s.load_draft(&draft);
        assert_eq!(s.snapshot().notes, "RAS");
        assert_eq!(s.note_text(), "Note en ligne.");
    }
}
