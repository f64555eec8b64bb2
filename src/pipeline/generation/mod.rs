//! Note generation: the online/offline dispatcher and the offline queue
//! reconciliation that upgrades locally composed notes once the external
//! service is reachable again.

pub mod connectivity;
pub mod dispatcher;
pub mod error;
pub mod memory;
pub mod reconcile;
#[cfg(test)]
pub(crate) mod testing;
pub mod traits;
pub mod types;

pub use connectivity::*;
pub use dispatcher::*;
pub use error::*;
pub use memory::*;
pub use reconcile::*;
pub use traits::*;
pub use types::*;

use std::sync::Arc;

use crate::pipeline::llm::NoteService;

/// Injected collaborators shared by the dispatcher and the reconciler.
#[derive(Clone)]
pub struct Collaborators {
    pub ledger: Arc<dyn NoteLedger>,
    pub queue: Arc<dyn OfflineQueue>,
    pub patients: Arc<dyn PatientDirectory>,
    pub connectivity: Arc<dyn Connectivity>,
    pub service: Arc<dyn NoteService>,
}
