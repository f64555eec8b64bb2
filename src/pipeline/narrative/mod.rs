//! Offline narrative composer.
//!
//! Deterministic French prose built from an observation snapshot when the
//! external service cannot be reached. One to four paragraphs:
//!
//! 1. context, alertness, orientation, neurological signs, position
//! 2. vital signs and systems review
//! 3. pain (PQRSTU)
//! 4. devices, admission and ancillary observations, notable events
//!
//! The first paragraph is always written, falling back to "Le patient est
//! évalué."; the others are dropped when no field contributes. All gendered words come
//! from [`agreement::Agreement`].

pub mod agreement;
pub mod format;

use crate::models::{
    ObservationSnapshot, PainAssessment, PatientContext, SystemReview, Visit,
    END_OF_LIFE_OTHER_MARKER, OXYGEN_MARKER, PUPILS_NORMAL, SEE_FLOWSHEET,
};

use agreement::Agreement;
use format::{capitalize_first, format_list, join_paragraphs, lowercased};

/// Number of orientation spheres (time, place, person).
const ORIENTATION_SPHERES: usize = 3;

/// Compose the offline note. Never fails; absent fields omit their clauses.
pub fn compose_offline_note(
    snapshot: &ObservationSnapshot,
    patient: Option<&PatientContext>,
) -> String {
    let agreement = Agreement::for_gender(snapshot.gender);

    let paragraphs = [
        context_paragraph(snapshot, patient, agreement),
        systems_paragraph(snapshot, agreement),
        pain_paragraph(&snapshot.pain, agreement),
        closing_paragraph(snapshot, agreement),
    ];
    join_paragraphs(&paragraphs)
}

// ═══════════════════════════════════════════
// Paragraph 1: context & general state
// ═══════════════════════════════════════════

fn context_paragraph(
    snapshot: &ObservationSnapshot,
    patient: Option<&PatientContext>,
    agreement: &Agreement,
) -> String {
    let time = snapshot.time.trim();
    let alertness = snapshot.alertness.trim();

    let mut state_parts: Vec<String> = Vec::new();
    if !snapshot.orientation.is_empty() {
        let oriented = agreement.agree("orienté");
        if snapshot.orientation.len() == ORIENTATION_SPHERES {
            state_parts.push(format!(
                "{} est {oriented} dans les trois sphères",
                agreement.pronoun
            ));
        } else {
            let spheres = format_list(&lowercased(snapshot.orientation.iter()));
            state_parts.push(format!(
                "{} est {oriented} au niveau {spheres}",
                agreement.pronoun
            ));
        }
    }
    match snapshot.neuro_signs.trim() {
        "" | SEE_FLOWSHEET => {}
        PUPILS_NORMAL => state_parts.push("ses pupilles sont isocores et réactives".into()),
        other => state_parts.push(format!(
            "au niveau neurologique, on note {}",
            other.to_lowercase()
        )),
    }
    if !snapshot.position.is_empty() {
        let positions = format_list(&lowercased(snapshot.position.iter()));
        state_parts.push(format!(
            "{} est {} en {positions}",
            agreement.pronoun,
            agreement.agree("positionné")
        ));
    }

    let mut intro = if time.is_empty() {
        agreement.subject_cap.to_string()
    } else {
        format!("Vers {time}, {}", agreement.subject)
    };

    if let Some(diagnosis) = patient
        .and_then(|p| p.diagnosis.as_deref())
        .map(str::trim)
        .filter(|d| !d.is_empty())
    {
        intro.push_str(&format!(", {} pour {diagnosis},", agreement.agree("connu")));
    }

    if alertness.is_empty() {
        intro.push_str(&format!(" est {}.", agreement.agree("évalué")));
    } else {
        intro.push_str(&format!(
            " est {} {}.",
            agreement.agree("trouvé"),
            agreement.alertness(alertness)
        ));
    }

    if !state_parts.is_empty() {
        intro.push(' ');
        intro.push_str(&capitalize_first(&state_parts.join(", ")));
        intro.push('.');
    }
    intro
}

// ═══════════════════════════════════════════
// Paragraph 2: vital signs & systems review
// ═══════════════════════════════════════════

fn systems_paragraph(snapshot: &ObservationSnapshot, agreement: &Agreement) -> String {
    let mut parts: Vec<String> = Vec::new();

    match snapshot.vital_signs.trim() {
        "" | SEE_FLOWSHEET => {}
        vitals => parts.push(format!(
            "Les signes vitaux sont {}.",
            vitals.to_lowercase()
        )),
    }

    let mut systems: Vec<String> = Vec::new();

    let respiratory_findings: Vec<String> = snapshot
        .respiratory
        .findings
        .iter()
        .map(|item| match snapshot.oxygen_flow() {
            Some(flow) if item == OXYGEN_MARKER => {
                format!("une oxygénothérapie à {flow} L/min via lunette nasale")
            }
            _ => item.to_lowercase(),
        })
        .collect();
    if let Some(details) = system_details(
        &snapshot.respiratory,
        respiratory_findings,
        "interventions appliquées",
    ) {
        systems.push(format!(
            "Sur le plan respiratoire, {} présente {details}",
            agreement.subject
        ));
    }

    let digestive = lowercased(snapshot.digestive.findings.iter());
    if let Some(details) = system_details(&snapshot.digestive, digestive, "interventions") {
        systems.push(format!("Le système digestif est marqué par {details}"));
    }

    let urinary = lowercased(snapshot.urinary.findings.iter());
    if let Some(details) = system_details(&snapshot.urinary, urinary, "interventions") {
        systems.push(format!("Au niveau urinaire, on note: {details}"));
    }

    let integumentary = lowercased(snapshot.integumentary.findings.iter());
    if let Some(details) = system_details(&snapshot.integumentary, integumentary, "interventions")
    {
        systems.push(format!("L'état tégumentaire révèle {details}"));
    }

    if !systems.is_empty() {
        parts.push(format!("{}.", systems.join(". ")));
    }
    parts.join(" ")
}

/// "findings; administration de X; interventions: a et b", or None when the
/// system has nothing recorded.
fn system_details(
    review: &SystemReview,
    findings: Vec<String>,
    interventions_label: &str,
) -> Option<String> {
    if review.is_empty() {
        return None;
    }
    let mut details: Vec<String> = Vec::new();
    let findings = format_list(&findings);
    if !findings.is_empty() {
        details.push(findings);
    }
    let medication = review.medication.trim();
    if !medication.is_empty() {
        details.push(format!("administration de {medication}"));
    }
    if !review.interventions.is_empty() {
        details.push(format!(
            "{interventions_label}: {}",
            format_list(&lowercased(review.interventions.iter()))
        ));
    }
    Some(details.join("; "))
}

// ═══════════════════════════════════════════
// Paragraph 3: pain
// ═══════════════════════════════════════════

fn pain_paragraph(pain: &PainAssessment, agreement: &Agreement) -> String {
    let mut paragraph = String::new();

    if pain.severity.is_some_and(|s| s.is_pain_free()) {
        paragraph.push_str(&format!("{} nie toute douleur.", agreement.subject_cap));
    } else if pain.is_assessed() {
        let intensity = pain
            .severity
            .map(|s| s.intensity())
            .unwrap_or("non évaluée");
        paragraph.push_str(&format!(
            "{} rapporte une douleur d'intensité {intensity}",
            agreement.subject_cap
        ));

        let mut location = lowercased(pain.region.iter());
        let site = pain.site.trim();
        if !site.is_empty() {
            location.push(format!("localisée au {site}"));
        }
        if !location.is_empty() {
            paragraph.push_str(&format!(", {}", format_list(&location)));
        }
        if !pain.quality.is_empty() {
            paragraph.push_str(&format!(
                ", de type {}",
                format_list(&lowercased(pain.quality.iter()))
            ));
        }
        paragraph.push('.');

        let mut details: Vec<String> = Vec::new();
        if !pain.timing.is_empty() {
            details.push(format!(
                "la douleur est {}",
                format_list(&lowercased(pain.timing.iter()))
            ));
        }
        if !pain.provocation.is_empty() {
            details.push(format!(
                "celle-ci est provoquée/aggravée par {}",
                format_list(&lowercased(pain.provocation.iter()))
            ));
        }
        if !details.is_empty() {
            paragraph.push_str(&format!(
                " {} précise que {}.",
                agreement.pronoun_cap,
                format_list(&details)
            ));
        }

        if !pain.impact.is_empty() {
            let impacts: Vec<String> = pain
                .impact
                .iter()
                .map(|i| i.strip_prefix("Impact sur ").unwrap_or(i).to_lowercase())
                .collect();
            paragraph.push_str(&format!(
                " La douleur a un impact sur {}.",
                format_list(&impacts)
            ));
        }
    }

    let mut treatment: Vec<String> = Vec::new();
    let medication = pain.medication.trim();
    if !medication.is_empty() {
        treatment.push(format!("administration de {medication}"));
    }
    treatment.extend(lowercased(pain.non_pharma_interventions.iter()));
    if !treatment.is_empty() {
        paragraph.push_str(&format!(
            " Pour la soulager, les interventions suivantes ont été appliquées: {}.",
            format_list(&treatment)
        ));
    }
    paragraph
}

// ═══════════════════════════════════════════
// Paragraph 4: devices, admission, observations
// ═══════════════════════════════════════════

fn closing_paragraph(snapshot: &ObservationSnapshot, agreement: &Agreement) -> String {
    let mut parts: Vec<String> = Vec::new();

    if snapshot.has_admission() {
        if !snapshot.admission_checks.is_empty() {
            parts.push(format!(
                "À l'admission: {}.",
                format_list(&lowercased(snapshot.admission_checks.iter()))
            ));
        }
        let autonomy = snapshot.autonomy.trim();
        if !autonomy.is_empty() {
            parts.push(format!(
                "Autonomie fonctionnelle: {}.",
                autonomy.to_lowercase()
            ));
        }

        let devices = devices(snapshot);
        if !devices.is_empty() {
            parts.push(format!(
                "{} est {} des dispositifs suivants: {}.",
                agreement.subject_cap,
                agreement.wearer,
                format_list(&devices)
            ));
        }

        let effects = snapshot.personal_effects.trim();
        if !effects.is_empty() {
            parts.push(format!("Effets personnels: {effects}."));
        }
    }

    let mut observations: Vec<String> = Vec::new();
    if !snapshot.geriatric.is_empty() {
        observations.push(format!(
            "observations gériatriques notables: {}",
            format_list(&lowercased(snapshot.geriatric.iter()))
        ));
    }
    let mut end_of_life: Vec<String> = snapshot
        .end_of_life
        .iter()
        .filter(|item| *item != END_OF_LIFE_OTHER_MARKER)
        .map(str::to_lowercase)
        .collect();
    if let Some(other) = snapshot.end_of_life_other_text() {
        end_of_life.push(other.to_lowercase());
    }
    if !end_of_life.is_empty() {
        observations.push(format!(
            "des signes de fin de vie ont été observés, notamment: {}",
            format_list(&end_of_life)
        ));
    }
    observations.extend(snapshot.observations.iter().map(str::to_string));
    if let Some(visit) = snapshot.visit {
        observations.push(visit_sentence(visit, agreement));
    }
    if !observations.is_empty() {
        let sentences: Vec<String> = observations.iter().map(|o| capitalize_first(o)).collect();
        parts.push(format!("{}.", sentences.join(". ")));
    }

    let notes = snapshot.notes.trim();
    if !notes.is_empty() {
        parts.push(terminated(&format!("Événements notables: {notes}")));
    }

    parts.join(" ")
}

fn devices(snapshot: &ObservationSnapshot) -> Vec<String> {
    let mut devices = Vec::new();
    if snapshot.venous_access {
        let mut text = String::from("un accès veineux");
        let gauge = snapshot.venous_access_gauge.trim();
        if !gauge.is_empty() {
            text.push_str(&format!(" (calibre {gauge})"));
        }
        let site = snapshot.venous_access_site.trim();
        if !site.is_empty() {
            text.push_str(&format!(" au {site}"));
        }
        devices.push(text);
    }
    if snapshot.picc_line {
        let mut text = String::from("un PICC line");
        let site = snapshot.picc_line_site.trim();
        if !site.is_empty() {
            text.push_str(&format!(" au {site}"));
        }
        devices.push(text);
    }
    if !snapshot.drains.is_empty() {
        devices.push(format!("des drains ({})", format_list(snapshot.drains.as_slice())));
    }
    if !snapshot.tubes.is_empty() {
        devices.push(format!("des sondes ({})", format_list(snapshot.tubes.as_slice())));
    }
    devices
}

fn visit_sentence(visit: Visit, agreement: &Agreement) -> String {
    match visit {
        Visit::Family => format!("{} a reçu la visite de la famille", agreement.pronoun),
        Visit::Physician => format!("{} a reçu la visite du médecin", agreement.pronoun),
        Visit::NoVisit => format!("{} n'a reçu aucune visite", agreement.pronoun),
    }
}

/// Append a period unless the text already ends a sentence.
fn terminated(text: &str) -> String {
    if text.ends_with(['.', '!', '?']) {
        text.to_string()
    } else {
        format!("{text}.")
    }
}
