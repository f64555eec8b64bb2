//! Observation snapshot: a full point-in-time capture of the nursing
//! assessment form.
//!
//! Checkbox groups are modelled as [`Selection`] (set membership, insertion
//! order kept for display). Radio groups with a closed vocabulary are enums;
//! the others stay as their French option label, empty meaning "not set".

use serde::{Deserialize, Serialize};

use super::enums::{Gender, PainSeverity, Shift, Visit};

/// Respiratory item rewritten with the oxygen flow rate when one is given.
pub const OXYGEN_MARKER: &str = "Utilisation d’O₂";

/// End-of-life item that enables the free-text "other" clause.
pub const END_OF_LIFE_OTHER_MARKER: &str = "Autre (à préciser)";

/// Neurological finding rendered as a dedicated sentence by the composer.
pub const PUPILS_NORMAL: &str = "Pupilles isocores et réactives";

/// Radio value meaning the detail lives on a separate flowsheet.
pub const SEE_FLOWSHEET: &str = "Voir feuille spéciale";

/// Ordered set of form labels.
///
/// Membership has set semantics (no duplicates) while iteration follows the
/// order in which items were first selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Selection(Vec<String>);

impl Selection {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add an item if absent. Returns false when it was already selected.
    pub fn insert(&mut self, item: impl Into<String>) -> bool {
        let item = item.into();
        if self.contains(&item) {
            return false;
        }
        self.0.push(item);
        true
    }

    /// Checkbox semantics: select when absent, deselect when present.
    pub fn toggle(&mut self, item: &str) {
        if let Some(pos) = self.0.iter().position(|i| i == item) {
            self.0.remove(pos);
        } else {
            self.0.push(item.to_string());
        }
    }

    pub fn contains(&self, item: &str) -> bool {
        self.0.iter().any(|i| i == item)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<S: Into<String>> FromIterator<S> for Selection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut selection = Selection::new();
        for item in iter {
            selection.insert(item);
        }
        selection
    }
}

impl From<Vec<String>> for Selection {
    fn from(items: Vec<String>) -> Self {
        items.into_iter().collect()
    }
}

impl From<Selection> for Vec<String> {
    fn from(selection: Selection) -> Self {
        selection.0
    }
}

/// One body system of the review: findings, medication given, interventions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemReview {
    pub findings: Selection,
    pub medication: String,
    pub interventions: Selection,
}

impl SystemReview {
    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
            && self.medication.trim().is_empty()
            && self.interventions.is_empty()
    }
}

/// PQRSTU pain assessment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PainAssessment {
    /// P: provoking / palliating factors.
    pub provocation: Selection,
    /// Q: quality.
    pub quality: Selection,
    /// R: region / radiation.
    pub region: Selection,
    /// Free-text anatomical site completing R.
    pub site: String,
    /// S: severity category.
    pub severity: Option<PainSeverity>,
    /// T: timing.
    pub timing: Selection,
    /// U: impact / understanding.
    pub impact: Selection,
    pub medication: String,
    pub non_pharma_interventions: Selection,
}

impl PainAssessment {
    /// True when any PQRSTU clause (not counting treatment) has content.
    pub fn is_assessed(&self) -> bool {
        self.severity.is_some()
            || !self.provocation.is_empty()
            || !self.quality.is_empty()
            || !self.region.is_empty()
            || !self.site.trim().is_empty()
            || !self.timing.is_empty()
            || !self.impact.is_empty()
    }

    pub fn has_treatment(&self) -> bool {
        !self.medication.trim().is_empty() || !self.non_pharma_interventions.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.is_assessed() && !self.has_treatment()
    }
}

/// Full assessment form state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservationSnapshot {
    // Context
    pub shift: Option<Shift>,
    pub gender: Option<Gender>,
    /// Observation time as typed ("14:30").
    pub time: String,

    // Admission & devices
    pub admission_checks: Selection,
    pub orientation: Selection,
    pub autonomy: String,
    pub personal_effects: String,
    pub venous_access: bool,
    pub venous_access_gauge: String,
    pub venous_access_site: String,
    pub picc_line: bool,
    pub picc_line_site: String,
    pub drains: Selection,
    pub tubes: Selection,

    // General state
    pub position: Selection,
    pub alertness: String,
    pub vital_signs: String,
    pub neuro_signs: String,

    // Systems review
    pub respiratory: SystemReview,
    /// Oxygen flow in L/min, as typed.
    pub oxygen_flow_lpm: String,
    pub digestive: SystemReview,
    pub urinary: SystemReview,
    pub integumentary: SystemReview,
    pub geriatric: Selection,

    pub pain: PainAssessment,

    pub end_of_life: Selection,
    pub end_of_life_other: String,
    pub observations: Selection,
    pub visit: Option<Visit>,
    /// Free-text notable events.
    pub notes: String,
}

impl ObservationSnapshot {
    /// True when nothing but the carried-over context (shift, gender) is set.
    /// Whether a form has anything worth a note is
    /// [`has_clinical_content`](crate::pipeline::assembler::has_clinical_content).
    pub fn is_context_only(&self) -> bool {
        *self == self.context_only()
    }

    /// Copy keeping only shift and gender: the form state after an offline
    /// note has been saved for later.
    pub fn context_only(&self) -> Self {
        Self {
            shift: self.shift,
            gender: self.gender,
            ..Self::default()
        }
    }

    /// True when any admission/device field contributes.
    pub fn has_admission(&self) -> bool {
        !self.admission_checks.is_empty()
            || !self.orientation.is_empty()
            || !self.autonomy.trim().is_empty()
            || !self.personal_effects.trim().is_empty()
            || self.venous_access
            || !self.venous_access_site.trim().is_empty()
            || self.picc_line
            || !self.picc_line_site.trim().is_empty()
            || !self.drains.is_empty()
            || !self.tubes.is_empty()
    }

    /// Free text of the end-of-life "other" clause, when it applies.
    pub fn end_of_life_other_text(&self) -> Option<&str> {
        let other = self.end_of_life_other.trim();
        (self.end_of_life.contains(END_OF_LIFE_OTHER_MARKER) && !other.is_empty()).then_some(other)
    }

    /// Oxygen flow to embed, when the oxygen marker is selected.
    pub fn oxygen_flow(&self) -> Option<&str> {
        let flow = self.oxygen_flow_lpm.trim();
        (self.respiratory.findings.contains(OXYGEN_MARKER) && !flow.is_empty()).then_some(flow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_keeps_insertion_order_without_duplicates() {
        let mut sel = Selection::new();
        assert!(sel.insert("Dyspnée"));
        assert!(sel.insert("Toux présente"));
        assert!(!sel.insert("Dyspnée"));
        assert_eq!(sel.iter().collect::<Vec<_>>(), vec!["Dyspnée", "Toux présente"]);
    }

    #[test]
    fn selection_toggle_removes_then_readds_at_end() {
        let mut sel: Selection = ["a", "b", "c"].into_iter().collect();
        sel.toggle("a");
        assert_eq!(sel.iter().collect::<Vec<_>>(), vec!["b", "c"]);
        sel.toggle("a");
        assert_eq!(sel.iter().collect::<Vec<_>>(), vec!["b", "c", "a"]);
    }

    #[test]
    fn default_snapshot_is_context_only() {
        assert!(ObservationSnapshot::default().is_context_only());
    }

    #[test]
    fn shift_and_gender_alone_are_context_only() {
        let snap = ObservationSnapshot {
            shift: Some(Shift::Night),
            gender: Some(Gender::Feminine),
            ..Default::default()
        };
        assert!(snap.is_context_only());
    }

    #[test]
    fn time_alone_is_more_than_context() {
        let snap = ObservationSnapshot {
            time: "14:00".into(),
            ..Default::default()
        };
        assert!(!snap.is_context_only());
    }

    #[test]
    fn context_only_drops_everything_else() {
        let snap = ObservationSnapshot {
            shift: Some(Shift::Day),
            gender: Some(Gender::Masculine),
            notes: "Chute".into(),
            venous_access: true,
            ..Default::default()
        };
        let reduced = snap.context_only();
        assert_eq!(reduced.shift, Some(Shift::Day));
        assert_eq!(reduced.gender, Some(Gender::Masculine));
        assert!(reduced.notes.is_empty());
        assert!(!reduced.venous_access);
    }

    #[test]
    fn other_text_requires_marker_and_content() {
        let mut snap = ObservationSnapshot {
            end_of_life_other: "  Myoclonies ".into(),
            ..Default::default()
        };
        assert_eq!(snap.end_of_life_other_text(), None);
        snap.end_of_life.insert(END_OF_LIFE_OTHER_MARKER);
        assert_eq!(snap.end_of_life_other_text(), Some("Myoclonies"));
        snap.end_of_life_other = "   ".into();
        assert_eq!(snap.end_of_life_other_text(), None);
    }

    #[test]
    fn older_json_without_new_fields_still_loads() {
        let json = r#"{"notes": "Patient transféré", "gender": "Féminin"}"#;
        let snap: ObservationSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.gender, Some(Gender::Feminine));
        assert_eq!(snap.notes, "Patient transféré");
        assert!(snap.drains.is_empty());
    }

    #[test]
    fn deserialized_selection_drops_duplicates() {
        let review: SystemReview =
            serde_json::from_str(r#"{"findings": ["Toux", "Dyspnée", "Toux"]}"#).unwrap();
        assert_eq!(review.findings.as_slice(), ["Toux", "Dyspnée"]);

        let json = serde_json::to_value(&review).unwrap();
        assert_eq!(json["findings"], serde_json::json!(["Toux", "Dyspnée"]));
    }
}
