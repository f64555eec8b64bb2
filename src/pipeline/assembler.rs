//! Clinical assembler: observation snapshot -> structured plain-text summary.
//!
//! The summary is what the external text-generation service receives. One
//! labelled line (or block) per section, in a fixed order; sections with no
//! contributing field are omitted. Pure and total: a default snapshot gives an
//! empty string.

use crate::models::{
    ObservationSnapshot, PainAssessment, PatientContext, Selection, SystemReview, OXYGEN_MARKER,
    SEE_FLOWSHEET,
};

const PAIN_LABEL_P: &str = "P – Provoquée par / Palliative (ce qui améliore ou aggrave)";
const PAIN_LABEL_Q: &str = "Q – Qualité (comment la douleur est ressentie)";
const PAIN_LABEL_R: &str = "R – Région / Irradiation (où se situe la douleur et si elle s'étend)";
const PAIN_LABEL_S: &str = "S – Sévérité (intensité de la douleur sur une échelle de 0 à 10)";
const PAIN_LABEL_T: &str = "T – Temps (depuis quand, durée, fréquence)";
const PAIN_LABEL_U: &str =
    "U - Impact / Compréhension (ce que le patient en comprend, impact sur les activités)";

/// Build the summary sent to the external service.
pub fn build_clinical_summary(
    snapshot: &ObservationSnapshot,
    patient: Option<&PatientContext>,
) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.extend(patient.and_then(patient_context_line));
    lines.extend(temporal_context_line(snapshot));
    if let Some(gender) = snapshot.gender {
        lines.push(format!("Genre du patient: {gender}."));
    }
    lines.extend(admission_line(snapshot));

    let sections: [(&str, Vec<String>); 12] = [
        ("Position du patient", selection_content(&snapshot.position)),
        ("État d'éveil", text_content(&snapshot.alertness)),
        ("Signes vitaux", flowsheet_content(&snapshot.vital_signs)),
        ("Signes neurologiques", flowsheet_content(&snapshot.neuro_signs)),
        ("Respiratoire", respiratory_content(snapshot)),
        ("Digestif", system_content(&snapshot.digestive, selection_content(&snapshot.digestive.findings))),
        ("Urinaire", system_content(&snapshot.urinary, selection_content(&snapshot.urinary.findings))),
        (
            "Tégumentaire",
            system_content(&snapshot.integumentary, selection_content(&snapshot.integumentary.findings)),
        ),
        ("Gériatrie", selection_content(&snapshot.geriatric)),
        ("Fin de vie / Soins palliatifs", end_of_life_content(snapshot)),
        ("Observations générales", selection_content(&snapshot.observations)),
        (
            "Visites",
            snapshot.visit.map(|v| v.as_str().to_string()).into_iter().collect(),
        ),
    ];
    for (title, content) in sections {
        if !content.is_empty() {
            lines.push(format!("- {title} : {}.", content.join("; ")));
        }
    }

    lines.extend(pain_block(&snapshot.pain));

    let notes = snapshot.notes.trim();
    if !notes.is_empty() {
        lines.push(format!("- Particularités / Événements notables : {notes}"));
    }

    lines.join("\n")
}

/// True when a field other than shift and gender reaches the summary. Both
/// generation strategies refuse snapshots without clinical content.
pub fn has_clinical_content(snapshot: &ObservationSnapshot) -> bool {
    let clinical = ObservationSnapshot {
        shift: None,
        gender: None,
        ..snapshot.clone()
    };
    !build_clinical_summary(&clinical, None).trim().is_empty()
}

fn patient_context_line(patient: &PatientContext) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    if let Some(diagnosis) = patient.diagnosis.as_deref().and_then(non_blank) {
        parts.push(format!("Diagnostic principal: {diagnosis}."));
    }
    if let Some(history) = patient.medical_history.as_deref().and_then(non_blank) {
        parts.push(format!("Antécédents pertinents: {history}."));
    }
    if let Some(allergies) = patient.allergies.as_deref().and_then(non_blank) {
        parts.push(format!("ALLERGIES CONNUES: {allergies}."));
    }
    if let Some(code_status) = patient.code_status {
        parts.push(format!("Statut de réanimation: {code_status}."));
    }
    (!parts.is_empty()).then(|| format!("CONTEXTE PATIENT : {}", parts.join(" ")))
}

fn temporal_context_line(snapshot: &ObservationSnapshot) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    if let Some(shift) = snapshot.shift {
        parts.push(format!("note rédigée durant le quart de {shift}"));
    }
    if let Some(time) = non_blank(&snapshot.time) {
        parts.push(format!("observation faite vers {time}"));
    }
    (!parts.is_empty()).then(|| format!("Contexte: {}.", parts.join(", ")))
}

fn admission_line(snapshot: &ObservationSnapshot) -> Option<String> {
    if !snapshot.has_admission() {
        return None;
    }

    let mut details: Vec<String> = Vec::new();
    if !snapshot.admission_checks.is_empty() {
        details.push(format!("{}.", snapshot.admission_checks.as_slice().join(", ")));
    }
    if snapshot.orientation.is_empty() {
        details.push("Orientation: Non évaluée ou non orienté(e).".into());
    } else {
        details.push(format!(
            "Orientation: {}.",
            snapshot.orientation.as_slice().join(", ")
        ));
    }
    if let Some(autonomy) = non_blank(&snapshot.autonomy) {
        details.push(format!("Autonomie fonctionnelle: {autonomy}."));
    }
    if let Some(effects) = non_blank(&snapshot.personal_effects) {
        details.push(format!("Effets personnels: {effects}."));
    }
    if snapshot.venous_access {
        let mut text = String::from("Accès veineux (CVP) fonctionnel");
        if let Some(gauge) = non_blank(&snapshot.venous_access_gauge) {
            text.push_str(&format!(", calibre {gauge}"));
        }
        if let Some(site) = non_blank(&snapshot.venous_access_site) {
            text.push_str(&format!(" au {site}"));
        }
        details.push(format!("{text}."));
    }
    if snapshot.picc_line {
        let mut text = String::from("PICC Line en place et fonctionnel");
        if let Some(site) = non_blank(&snapshot.picc_line_site) {
            text.push_str(&format!(" au {site}"));
        }
        details.push(format!("{text}."));
    }
    if !snapshot.drains.is_empty() {
        details.push(format!("Drains en place: {}.", snapshot.drains.as_slice().join(", ")));
    }
    if !snapshot.tubes.is_empty() {
        details.push(format!("Sondes en place: {}.", snapshot.tubes.as_slice().join(", ")));
    }

    Some(format!("- Admission : {}", details.join(" ")))
}

fn selection_content(selection: &Selection) -> Vec<String> {
    if selection.is_empty() {
        Vec::new()
    } else {
        vec![selection.as_slice().join(", ")]
    }
}

fn text_content(text: &str) -> Vec<String> {
    non_blank(text).map(str::to_string).into_iter().collect()
}

/// Radio values that point at the flowsheet for the details.
fn flowsheet_content(text: &str) -> Vec<String> {
    match non_blank(text) {
        None => Vec::new(),
        Some(SEE_FLOWSHEET) => vec![SEE_FLOWSHEET.to_string()],
        Some(value) => vec![format!("{value}, voir feuille spéciale")],
    }
}

fn respiratory_content(snapshot: &ObservationSnapshot) -> Vec<String> {
    let findings = &snapshot.respiratory.findings;
    let content = match snapshot.oxygen_flow() {
        Some(flow) => {
            let rewritten: Vec<String> = findings
                .iter()
                .map(|item| {
                    if item == OXYGEN_MARKER {
                        format!("{OXYGEN_MARKER} ({flow} L/min)")
                    } else {
                        item.to_string()
                    }
                })
                .collect();
            vec![rewritten.join(", ")]
        }
        None => selection_content(findings),
    };
    system_content(&snapshot.respiratory, content)
}

fn system_content(review: &SystemReview, mut content: Vec<String>) -> Vec<String> {
    if let Some(medication) = non_blank(&review.medication) {
        content.push(format!("Médicament: {medication}"));
    }
    if !review.interventions.is_empty() {
        content.push(format!(
            "Interventions: {}",
            review.interventions.as_slice().join(", ")
        ));
    }
    content
}

fn end_of_life_content(snapshot: &ObservationSnapshot) -> Vec<String> {
    let mut content = selection_content(&snapshot.end_of_life);
    if let Some(other) = snapshot.end_of_life_other_text() {
        content.push(format!("Autre: {other}"));
    }
    content
}

fn pain_block(pain: &PainAssessment) -> Option<String> {
    if pain.is_empty() {
        return None;
    }

    let mut block = String::from("- Douleur (PQRSTU) :");
    let mut field = |label: &str, value: String| {
        if !value.is_empty() {
            block.push_str(&format!("\n  - {label} : {value}"));
        }
    };

    field(PAIN_LABEL_P, pain.provocation.as_slice().join(", "));
    field(PAIN_LABEL_Q, pain.quality.as_slice().join(", "));
    let mut region = pain.region.as_slice().join(", ");
    if let Some(site) = non_blank(&pain.site) {
        if !region.is_empty() {
            region.push_str("; ");
        }
        region.push_str(&format!("Site: {site}"));
    }
    field(PAIN_LABEL_R, region);
    field(
        PAIN_LABEL_S,
        pain.severity.map(|s| s.as_str().to_string()).unwrap_or_default(),
    );
    field(PAIN_LABEL_T, pain.timing.as_slice().join(", "));
    field(PAIN_LABEL_U, pain.impact.as_slice().join(", "));
    field(
        "Intervention pharmacologique (Médicament)",
        pain.medication.trim().to_string(),
    );
    field(
        "Interventions non pharmacologiques",
        pain.non_pharma_interventions.as_slice().join(", "),
    );

    Some(block)
}

fn non_blank(text: &str) -> Option<&str> {
    let text = text.trim();
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CodeStatus, Gender, PainSeverity, Shift, Visit, END_OF_LIFE_OTHER_MARKER};

    fn sel(items: &[&str]) -> Selection {
        items.iter().copied().collect()
    }

    #[test]
    fn default_snapshot_yields_empty_summary() {
        assert_eq!(build_clinical_summary(&ObservationSnapshot::default(), None), "");
    }

    #[test]
    fn context_and_inert_fields_are_not_clinical_content() {
        let inert: &[fn(&mut ObservationSnapshot)] = &[
            |s| s.shift = Some(Shift::Night),
            |s| s.gender = Some(Gender::Masculine),
            |s| s.venous_access_gauge = "#20".into(),
            |s| s.oxygen_flow_lpm = "2".into(),
            |s| s.end_of_life_other = "Myoclonies".into(),
            |s| s.notes = "   \n ".into(),
        ];
        for mutate in inert {
            let mut snap = ObservationSnapshot::default();
            mutate(&mut snap);
            assert!(!has_clinical_content(&snap), "{snap:?}");
        }

        let mut snap = ObservationSnapshot {
            venous_access_gauge: "#20".into(),
            ..Default::default()
        };
        snap.venous_access = true;
        assert!(has_clinical_content(&snap));
        assert!(has_clinical_content(&ObservationSnapshot {
            time: "08:00".into(),
            ..Default::default()
        }));
    }

    #[test]
    fn duplicated_labels_in_json_are_summarized_once() {
        let snap: ObservationSnapshot =
            serde_json::from_str(r#"{"position": ["Fowler", "Fowler"]}"#).unwrap();
        assert_eq!(snap.position.len(), 1);
        assert_eq!(build_clinical_summary(&snap, None), "- Position du patient : Fowler.");
    }

    #[test]
    fn summary_is_idempotent() {
        let mut snap = ObservationSnapshot {
            shift: Some(Shift::Evening),
            time: "20:15".into(),
            position: sel(&["Fowler"]),
            notes: "Appel à la famille".into(),
            ..Default::default()
        };
        snap.pain.severity = Some(PainSeverity::Mild);
        let patient = PatientContext {
            id: "p1".into(),
            name: "Luc".into(),
            diagnosis: Some("Pneumonie".into()),
            ..Default::default()
        };
        let first = build_clinical_summary(&snap, Some(&patient));
        let second = build_clinical_summary(&snap, Some(&patient));
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn single_field_adds_exactly_one_section() {
        type Mutator = fn(&mut ObservationSnapshot);
        let cases: &[(Mutator, &str)] = &[
            (|s| { s.position.insert("Fowler"); }, "- Position du patient : Fowler."),
            (|s| s.alertness = "Somnolent".into(), "- État d'éveil : Somnolent."),
            (|s| s.vital_signs = "Stable".into(), "- Signes vitaux : Stable, voir feuille spéciale."),
            (|s| s.neuro_signs = "Vertiges".into(), "- Signes neurologiques : Vertiges, voir feuille spéciale."),
            (|s| s.digestive.medication = "Gravol".into(), "- Digestif : Médicament: Gravol."),
            (|s| s.urinary.findings = sel(&["Dysurie"]), "- Urinaire : Dysurie."),
            (|s| s.integumentary.interventions = sel(&["Pansement"]), "- Tégumentaire : Interventions: Pansement."),
            (|s| s.geriatric = sel(&["Risque de chute"]), "- Gériatrie : Risque de chute."),
            (|s| s.observations = sel(&["Repos au lit"]), "- Observations générales : Repos au lit."),
            (|s| s.visit = Some(Visit::Physician), "- Visites : Visite du médecin."),
            (|s| s.gender = Some(Gender::Feminine), "Genre du patient: Féminin."),
            (|s| s.time = "08:00".into(), "Contexte: observation faite vers 08:00."),
            (|s| s.notes = "Chute".into(), "- Particularités / Événements notables : Chute"),
        ];

        for (mutate, expected) in cases {
            let mut snap = ObservationSnapshot::default();
            mutate(&mut snap);
            let summary = build_clinical_summary(&snap, None);
            assert_eq!(summary.lines().count(), 1, "{summary}");
            assert_eq!(summary, *expected);
        }
    }

    #[test]
    fn toggle_on_populated_snapshot_adds_one_line() {
        let mut snap = ObservationSnapshot {
            shift: Some(Shift::Day),
            alertness: "Éveillé et alerte".into(),
            ..Default::default()
        };
        let before = build_clinical_summary(&snap, None).lines().count();
        snap.respiratory.findings.toggle("Toux présente");
        let after = build_clinical_summary(&snap, None).lines().count();
        assert_eq!(after, before + 1);
        snap.respiratory.findings.toggle("Toux présente");
        assert_eq!(build_clinical_summary(&snap, None).lines().count(), before);
    }

    #[test]
    fn oxygen_item_is_rewritten_in_place() {
        let mut snap = ObservationSnapshot {
            oxygen_flow_lpm: "3".into(),
            ..Default::default()
        };
        snap.respiratory.findings = sel(&["Dyspnée", OXYGEN_MARKER, "Toux présente"]);
        assert_eq!(
            build_clinical_summary(&snap, None),
            "- Respiratoire : Dyspnée, Utilisation d’O₂ (3 L/min), Toux présente."
        );
    }

    #[test]
    fn oxygen_without_rate_stays_plain() {
        let mut snap = ObservationSnapshot::default();
        snap.respiratory.findings = sel(&[OXYGEN_MARKER]);
        snap.respiratory.medication = "Atrovent".into();
        assert_eq!(
            build_clinical_summary(&snap, None),
            "- Respiratoire : Utilisation d’O₂; Médicament: Atrovent."
        );
    }

    #[test]
    fn end_of_life_other_needs_marker() {
        let mut snap = ObservationSnapshot {
            end_of_life: sel(&["Dyspnée terminale"]),
            end_of_life_other: "Agitation".into(),
            ..Default::default()
        };
        assert_eq!(
            build_clinical_summary(&snap, None),
            "- Fin de vie / Soins palliatifs : Dyspnée terminale."
        );
        snap.end_of_life.insert(END_OF_LIFE_OTHER_MARKER);
        assert_eq!(
            build_clinical_summary(&snap, None),
            "- Fin de vie / Soins palliatifs : Dyspnée terminale, Autre (à préciser); Autre: Agitation."
        );
    }

    #[test]
    fn flowsheet_value_is_not_suffixed_twice() {
        let snap = ObservationSnapshot {
            vital_signs: SEE_FLOWSHEET.into(),
            ..Default::default()
        };
        assert_eq!(
            build_clinical_summary(&snap, None),
            "- Signes vitaux : Voir feuille spéciale."
        );
    }

    #[test]
    fn patient_context_and_ordering() {
        let patient = PatientContext {
            id: "p1".into(),
            name: "Anne".into(),
            diagnosis: Some("AVC".into()),
            allergies: Some("Pénicilline".into()),
            code_status: Some(CodeStatus::DoNotResuscitate),
            ..Default::default()
        };
        let snap = ObservationSnapshot {
            shift: Some(Shift::Night),
            time: "02:00".into(),
            gender: Some(Gender::Feminine),
            venous_access: true,
            venous_access_gauge: "#22".into(),
            venous_access_site: "bras droit".into(),
            notes: "Dort bien".into(),
            ..Default::default()
        };
        let summary = build_clinical_summary(&snap, Some(&patient));
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(
            lines,
            vec![
                "CONTEXTE PATIENT : Diagnostic principal: AVC. ALLERGIES CONNUES: Pénicilline. Statut de réanimation: Ne pas réanimer (NPR).",
                "Contexte: note rédigée durant le quart de Nuit, observation faite vers 02:00.",
                "Genre du patient: Féminin.",
                "- Admission : Orientation: Non évaluée ou non orienté(e). Accès veineux (CVP) fonctionnel, calibre #22 au bras droit.",
                "- Particularités / Événements notables : Dort bien",
            ]
        );
    }

    #[test]
    fn pain_block_lists_assessed_fields() {
        let mut snap = ObservationSnapshot::default();
        snap.pain.region = sel(&["Localisée"]);
        snap.pain.site = "lombaire".into();
        snap.pain.severity = Some(PainSeverity::Moderate);
        snap.pain.medication = "Dilaudid 1 mg".into();
        assert_eq!(
            build_clinical_summary(&snap, None),
            format!(
                "- Douleur (PQRSTU) :\n  - {PAIN_LABEL_R} : Localisée; Site: lombaire\n  - {PAIN_LABEL_S} : 4-6 - Douleur modérée\n  - Intervention pharmacologique (Médicament) : Dilaudid 1 mg"
            )
        );
    }
}
