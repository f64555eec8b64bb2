//! Offline queue reconciliation.
//!
//! On each offline→online transition the queue is drained sequentially:
//! each entry is re-assembled and sent to the external service. A success
//! overwrites the paired record's text and clears its offline flag; a failure
//! leaves entry and record untouched for the next reconnect. An entry with
//! nothing to send is dropped and its record keeps the composed text.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::types::{DrainEvent, DrainReport};
use super::Collaborators;
use crate::models::OfflineQueueEntry;
use crate::pipeline::assembler::{build_clinical_summary, has_clinical_content};
use crate::worker::{OperationKind, WorkerGate};

pub struct QueueReconciler {
    deps: Collaborators,
    gate: Arc<WorkerGate>,
    draining: AtomicBool,
}

/// What happened to one entry.
enum EntryOutcome {
    Upgraded,
    Discarded,
    Kept(String),
}

impl QueueReconciler {
    pub fn new(deps: Collaborators, gate: Arc<WorkerGate>) -> Self {
        Self {
            deps,
            gate,
            draining: AtomicBool::new(false),
        }
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::SeqCst)
    }

    /// Drain after a connectivity change; only an offline→online transition
    /// triggers a pass.
    pub fn on_connectivity_change(&self, came_online: bool) -> Option<DrainReport> {
        came_online.then(|| self.drain(None))
    }

    /// Run one reconciliation pass. At most one pass runs at a time; a
    /// concurrent call returns a skipped report without doing anything.
    pub fn drain(&self, progress_fn: Option<&dyn Fn(DrainEvent)>) -> DrainReport {
        if self.draining.swap(true, Ordering::SeqCst) {
            tracing::debug!("Queue drain already in flight, skipping");
            return DrainReport::skipped();
        }
        let _flag = DrainingFlag(&self.draining);

        let start = Instant::now();
        let mut report = DrainReport::empty();

        let _guard = match self.gate.acquire(OperationKind::QueueDrain) {
            Ok(guard) => guard,
            Err(e) => {
                report.errors.push(e.to_string());
                return report;
            }
        };

        let entries = match self.deps.queue.load() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "Offline queue unreadable, leaving it for next pass");
                report.errors.push(format!("Lecture de la file: {e}"));
                return report;
            }
        };

        if entries.is_empty() {
            if let Err(e) = self.deps.queue.clear() {
                report.errors.push(e.to_string());
            }
            return report;
        }

        let total = entries.len() as u32;
        tracing::info!(entries = total, "Draining offline queue");
        if let Some(progress) = progress_fn {
            progress(DrainEvent::Started { entry_count: total });
        }

        let mut remaining: Vec<OfflineQueueEntry> = Vec::new();
        for (i, entry) in entries.into_iter().enumerate() {
            if let Some(progress) = progress_fn {
                progress(DrainEvent::Progress {
                    completed: i as u32,
                    total,
                    timestamp: entry.timestamp,
                });
            }

            report.processed += 1;
            match self.process_entry(&entry) {
                EntryOutcome::Upgraded => report.upgraded += 1,
                EntryOutcome::Discarded => report.discarded += 1,
                EntryOutcome::Kept(error) => {
                    report.errors.push(format!("Note {}: {error}", entry.identity()));
                    remaining.push(entry);
                }
            }
        }

        let persisted = if remaining.is_empty() {
            self.deps.queue.clear()
        } else {
            self.deps.queue.replace_all(&remaining)
        };
        if let Err(e) = persisted {
            tracing::warn!(error = %e, "Failed to persist remaining queue");
            report.errors.push(format!("Écriture de la file: {e}"));
        }

        report.remaining = remaining.len() as u32;
        report.duration_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            processed = report.processed,
            upgraded = report.upgraded,
            discarded = report.discarded,
            remaining = report.remaining,
            duration_ms = report.duration_ms,
            "Offline queue drain complete"
        );
        if let Some(progress) = progress_fn {
            progress(DrainEvent::Completed {
                upgraded: report.upgraded,
                remaining: report.remaining,
                duration_ms: report.duration_ms,
            });
        }

        report
    }

    fn process_entry(&self, entry: &OfflineQueueEntry) -> EntryOutcome {
        let identity = entry.identity();

        let mut record = match self.deps.ledger.get(&identity) {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::debug!(note = %identity, "Record deleted, dropping queue entry");
                return EntryOutcome::Discarded;
            }
            Err(e) => return EntryOutcome::Kept(e.to_string()),
        };

        if !has_clinical_content(&entry.snapshot) {
            tracing::debug!(note = %identity, "Nothing to send, settling record as is");
            record.is_offline = false;
            return match self.deps.ledger.update(&identity, &record) {
                Ok(_) => EntryOutcome::Discarded,
                Err(e) => EntryOutcome::Kept(e.to_string()),
            };
        }

        let patient = entry
            .patient_id
            .as_deref()
            .and_then(|id| self.deps.patients.find(id));
        let summary = build_clinical_summary(&entry.snapshot, patient.as_ref());

        let text = match self.deps.service.generate_note(&summary) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(note = %identity, error = %e, "Upgrade failed, keeping entry");
                return EntryOutcome::Kept(e.to_string());
            }
        };

        record.note_content = text;
        record.is_offline = false;
        match self.deps.ledger.update(&identity, &record) {
            Ok(true) => EntryOutcome::Upgraded,
            Ok(false) => EntryOutcome::Discarded,
            Err(e) => EntryOutcome::Kept(e.to_string()),
        }
    }
}

/// Clears the in-flight flag when a drain ends.
struct DrainingFlag<'a>(&'a AtomicBool);

impl Drop for DrainingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
