//! Single-worker gate for the external text-generation service.
//!
//! Only one of {single note generation, offline queue drain, shift report,
//! clinical question} talks to the service at a time. `acquire()` blocks until the worker is
//! free; `try_acquire()` returns `None` when it is busy. The running
//! operation is observable through `current_operation()`.

use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// What kind of service operation is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// One note requested from the form (new or regeneration).
    NoteGeneration,
    /// Reconciliation pass over the offline queue.
    QueueDrain,
    /// End-of-shift report.
    ShiftReport,
    /// Free-text question to the clinical assistant.
    ClinicalAssistant,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoteGeneration => write!(f, "Note generation"),
            Self::QueueDrain => write!(f, "Queue drain"),
            Self::ShiftReport => write!(f, "Shift report"),
            Self::ClinicalAssistant => write!(f, "Clinical assistant"),
        }
    }
}

/// Snapshot of the currently running operation.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveOperation {
    pub kind: OperationKind,
    /// When the operation started (RFC 3339).
    pub started_at: String,
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Internal lock error")]
    LockPoisoned,
}

// ═══════════════════════════════════════════════════════════
// WorkerGate
// ═══════════════════════════════════════════════════════════

/// Exclusive access controller, shared via `Arc`.
pub struct WorkerGate {
    lock: Mutex<()>,
    current_op: Mutex<Option<ActiveOperation>>,
}

impl WorkerGate {
    pub fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            current_op: Mutex::new(None),
        }
    }

    /// Acquire exclusive access. Blocks until available.
    ///
    /// The guard must be held for the entire operation; dropping it releases
    /// the worker and clears the current operation.
    pub fn acquire(&self, kind: OperationKind) -> Result<WorkerGuard<'_>, WorkerError> {
        let guard = self.lock.lock().map_err(|_| WorkerError::LockPoisoned)?;
        self.set_current_op(kind);
        Ok(WorkerGuard {
            _guard: guard,
            gate: self,
        })
    }

    /// Acquire without blocking. `None` when another operation holds the worker.
    pub fn try_acquire(&self, kind: OperationKind) -> Option<WorkerGuard<'_>> {
        let guard = self.lock.try_lock().ok()?;
        self.set_current_op(kind);
        Some(WorkerGuard {
            _guard: guard,
            gate: self,
        })
    }

    /// `None` when the worker is idle.
    pub fn current_operation(&self) -> Option<ActiveOperation> {
        self.current_op.lock().ok()?.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.lock.try_lock().is_err()
    }

    // ── Internal ────────────────────────────────────────────

    fn set_current_op(&self, kind: OperationKind) {
        if let Ok(mut current) = self.current_op.lock() {
            *current = Some(ActiveOperation {
                kind,
                started_at: chrono::Utc::now().to_rfc3339(),
            });
        }
    }

    fn clear_current_op(&self) {
        if let Ok(mut current) = self.current_op.lock() {
            *current = None;
        }
    }
}

impl Default for WorkerGate {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII token for exclusive worker access.
pub struct WorkerGuard<'a> {
    _guard: MutexGuard<'a, ()>,
    gate: &'a WorkerGate,
}

impl Drop for WorkerGuard<'_> {
    fn drop(&mut self) {
        self.gate.clear_current_op();
    }
}
