//! Error taxonomy for the dispatch core.
//!
//! Every kind here corresponds 1:1 to an origin named in the engine's
//! error-handling design: construction-time failures abort engine
//! creation outright, while per-query failures are returned to the
//! caller and never logged-and-swallowed inside the core.

use thiserror::Error;

/// Errors the dispatch core can produce.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A [`crate::config::StorageConfig`] path was missing or unreadable
    /// at local-facade construction time. Fatal: no engine is created.
    #[error("invalid storage configuration: {0}")]
    ConfigInvalid(String),

    /// The shared facade could not attach to (or re-attach to) a
    /// dataset generation: the region is missing, unreadable, or its
    /// magic/generation does not match the control block.
    #[error("dataset unavailable: {0}")]
    DatasetUnavailable(String),

    /// A plugin's location cap was exceeded.
    #[error("too many locations: {got} exceeds cap {cap}")]
    TooManyLocations {
        /// Number of locations the caller supplied.
        got: usize,
        /// Configured cap for this plugin.
        cap: usize,
    },

    /// Parameters failed plugin-local validation for a reason other
    /// than a location cap.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// `nearest`/`match` found no segment near a given coordinate.
    #[error("no segment found near the given coordinate")]
    NoSegment,

    /// `route`/`table` found no path between the given coordinates.
    #[error("no route between the given coordinates")]
    NoRoute,

    /// `match` could not produce a plausible trace alignment.
    #[error("no plausible match for the given trace")]
    NoMatch,

    /// `trip` could not construct a feasible tour.
    #[error("no feasible trip covering the given locations")]
    NoTrip,

    /// Any other unexpected failure inside a plugin. The query gate
    /// guarantees the in-flight counter is decremented regardless.
    #[error("internal error: {0}")]
    Internal(String),
}

/// The result type returned by every dispatcher entry point: `Ok`
/// carries the plugin's structured result, `Err` carries the
/// [`EngineError`] kind. This is `Status` from the design in prose
/// form: Rust's `Result` already encodes "Ok or Error(kind)" without
/// a redundant wrapper enum.
pub type Status<T> = Result<T, EngineError>;
