use serde::{Deserialize, Serialize};

use super::enums::{CodeStatus, Gender};

/// Name recorded on notes generated without a selected patient.
pub const UNIDENTIFIED_PATIENT: &str = "Non identifié";

/// Read-only patient context supplied by the patient management collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientContext {
    pub id: String,
    pub name: String,
    pub room: Option<String>,
    pub gender: Option<Gender>,
    pub diagnosis: Option<String>,
    pub allergies: Option<String>,
    pub medical_history: Option<String>,
    pub code_status: Option<CodeStatus>,
}

impl PatientContext {
    /// Display name recorded on a note, falling back to "Non identifié".
    pub fn display_name(patient: Option<&PatientContext>) -> String {
        patient
            .map(|p| p.name.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or(UNIDENTIFIED_PATIENT)
            .to_string()
    }
}
