//! Shift journal and end-of-shift report.
//!
//! The journal groups the shift's notes by patient; the report sends those
//! groups to the external service and returns its Markdown hand-off summary.

use std::fmt::Display;
use std::sync::Arc;

use chrono::{Local, TimeZone};

use crate::models::{GeneratedNoteRecord, UNIDENTIFIED_PATIENT};
use crate::pipeline::generation::{Collaborators, GenerationError, PatientDirectory};
use crate::worker::{OperationKind, WorkerGate};

/// Grouping key for notes written without a selected patient.
pub const UNKNOWN_PATIENT_KEY: &str = "unknown";

const EMPTY_SHIFT: &str = "Aucune note n'a été générée pour créer un rapport de garde.";

/// The notes of one patient, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientNotes {
    /// Patient id, or [`UNKNOWN_PATIENT_KEY`].
    pub key: String,
    /// "Name (Ch. room)", room omitted when unknown.
    pub header: String,
    pub notes: Vec<GeneratedNoteRecord>,
}

/// Sort the ledger chronologically and group it by patient, groups in order
/// of their first note.
pub fn group_by_patient(
    records: &[GeneratedNoteRecord],
    patients: &dyn PatientDirectory,
) -> Vec<PatientNotes> {
    let mut sorted: Vec<&GeneratedNoteRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.timestamp);

    let mut groups: Vec<PatientNotes> = Vec::new();
    for record in sorted {
        let key = record
            .patient_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(UNKNOWN_PATIENT_KEY);

        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => group.notes.push(record.clone()),
            None => groups.push(PatientNotes {
                key: key.to_string(),
                header: group_header(key, record, patients),
                notes: vec![record.clone()],
            }),
        }
    }
    groups
}

fn group_header(key: &str, first: &GeneratedNoteRecord, patients: &dyn PatientDirectory) -> String {
    let patient = (key != UNKNOWN_PATIENT_KEY)
        .then(|| patients.find(key))
        .flatten();

    let name = patient
        .as_ref()
        .map(|p| p.name.trim())
        .filter(|n| !n.is_empty())
        .or_else(|| Some(first.patient_name.trim()).filter(|n| !n.is_empty()))
        .unwrap_or(UNIDENTIFIED_PATIENT);

    match patient.as_ref().and_then(|p| p.room.as_deref()).map(str::trim) {
        Some(room) if !room.is_empty() => format!("{name} (Ch. {room})"),
        _ => name.to_string(),
    }
}

/// "HH:MM" of an epoch-millisecond timestamp in `tz`.
pub fn format_time<Tz>(timestamp: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    tz.timestamp_millis_opt(timestamp)
        .single()
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

/// Plain-text journal: a header per patient followed by "HH:MM: note" lines.
pub fn render_journal<Tz>(groups: &[PatientNotes], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    groups
        .iter()
        .map(|group| {
            let mut block = group.header.clone();
            for note in &group.notes {
                block.push('\n');
                block.push_str(&format!(
                    "{}: {}",
                    format_time(note.timestamp, tz),
                    note.note_content.trim()
                ));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Notes as sent to the service for the shift report.
pub fn shift_report_data<Tz>(groups: &[PatientNotes], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut data = String::new();
    for group in groups {
        data.push_str(&format!("--- Patient: {} ---\n", group.header));
        for (i, note) in group.notes.iter().enumerate() {
            data.push_str(&format!(
                "Note {} ({}): {}\n",
                i + 1,
                format_time(note.timestamp, tz),
                note.note_content
            ));
        }
        data.push('\n');
    }
    data
}

// ═══════════════════════════════════════════
// Reporter
// ═══════════════════════════════════════════

pub struct ShiftReporter {
    deps: Collaborators,
    gate: Arc<WorkerGate>,
}

impl ShiftReporter {
    pub fn new(deps: Collaborators, gate: Arc<WorkerGate>) -> Self {
        Self { deps, gate }
    }

    /// Journal of the current ledger in local time.
    pub fn journal(&self) -> Result<String, GenerationError> {
        let records = self.deps.ledger.list()?;
        let groups = group_by_patient(&records, self.deps.patients.as_ref());
        Ok(render_journal(&groups, &Local))
    }

    /// Generate the Markdown hand-off report for every note of the shift.
    pub fn generate(&self) -> Result<String, GenerationError> {
        self.generate_in(&Local)
    }

    pub fn generate_in<Tz>(&self, tz: &Tz) -> Result<String, GenerationError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let records = self.deps.ledger.list()?;
        if records.is_empty() {
            return Err(GenerationError::Validation(EMPTY_SHIFT.into()));
        }

        let groups = group_by_patient(&records, self.deps.patients.as_ref());
        let data = shift_report_data(&groups, tz);

        let _guard = self.gate.acquire(OperationKind::ShiftReport)?;
        tracing::info!(
            notes = records.len(),
            patients = groups.len(),
            "Generating shift report"
        );
        let report = self.deps.service.generate_shift_report(&data)?;
        Ok(report)
    }
}
