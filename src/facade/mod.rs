//! The dataset facade: the sole channel through which
//! plugins read the dataset. Two concrete variants share the
//! [`Facade`] trait: [`LocalFacade`] owns its dataset for the
//! engine's lifetime, [`SharedFacade`] attaches to a dataset living
//! in a named shared region and can hot-swap to a newer generation.

mod local;
mod shared;

pub use local::LocalFacade;
pub use shared::{ControlBlock, SharedFacade};

use std::sync::Arc;

use crate::dataset::Dataset;
use crate::error::Status;
use crate::revision::GenerationId;

/// Read-only accessor to an immutable, versioned dataset.
///
/// `current` resolves to the dataset this facade is attached to right
/// now. Callers must fetch it once per query and reuse that snapshot
/// for the query's whole lifetime rather than
/// calling `current` again mid-query, since a concurrent reload could
/// otherwise hand back a different generation.
pub trait Facade: Send + Sync {
    /// Resolve the dataset this facade is currently attached to.
    ///
    /// For [`LocalFacade`] this always succeeds. For [`SharedFacade`]
    /// it may re-attach to a newer generation and can fail with
    /// [`crate::error::EngineError::DatasetUnavailable`] if no
    /// dataset has ever been published, or if attachment fails an
    /// integrity check.
    fn current(&self) -> Status<Arc<Dataset>>;

    /// The generation id of the dataset this facade is attached to,
    /// without resolving a full snapshot. Returns [`GenerationId::none`]
    /// if nothing is attached yet.
    fn attached_generation(&self) -> GenerationId;
}
