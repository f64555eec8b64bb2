//! Errors surfaced by note generation.
//!
//! Drains never return these: per-entry failures are collected into the
//! drain report instead.

use thiserror::Error;

use crate::db::DatabaseError;
use crate::pipeline::llm::ServiceError;

#[derive(Error, Debug)]
pub enum GenerationError {
    /// Rejected before any work was done; never retried.
    #[error("{0}")]
    Validation(String),

    /// The external service failed; nothing was created or mutated.
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] DatabaseError),

    #[error("Generation worker unavailable")]
    WorkerUnavailable,
}

impl GenerationError {
    pub fn empty_form() -> Self {
        Self::Validation("Le formulaire est vide.".into())
    }

    /// True for failures the user can retry as-is.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Service(_) | Self::WorkerUnavailable)
    }
}

impl From<crate::worker::WorkerError> for GenerationError {
    fn from(_: crate::worker::WorkerError) -> Self {
        Self::WorkerUnavailable
    }
}
