//! The plugin contract: every query kind implements a
//! single capability, `handle(params, facade) -> (Status, Result)`.
//! Plugins are stateless between calls (all per-query state lives on
//! the stack) and validate their own parameters; the dispatcher never
//! pre-validates.

mod graph_algo;
mod map_matching;
mod multi_target;
mod nearest;
mod route;
mod smooth_via;
mod table;
mod tile;
mod trip;

pub use map_matching::{MatchParameters, MatchPlugin, MatchResult, MatchedPoint};
pub use multi_target::{MultiTargetParameters, MultiTargetPlugin, MultiTargetResult};
pub use nearest::{NearestCandidate, NearestParameters, NearestPlugin, NearestResult};
pub use route::{RouteLeg, RouteParameters, RoutePlugin, RouteResult};
pub use smooth_via::{SmoothViaParameters, SmoothViaPlugin, SmoothViaResult};
pub use table::{TableParameters, TablePlugin, TableResult};
pub use tile::{TileParameters, TilePlugin};
pub use trip::{TripParameters, TripPlugin, TripResult};

use crate::dataset::Dataset;
use crate::error::Status;

/// A stateless query handler for one query kind.
///
/// Implementors carry their immutable per-plugin configuration (caps,
/// etc.) at construction time and hold nothing else; `handle` is the
/// whole contract. `dataset` is the resolved facade snapshot the query
/// gate obtained before calling in: a single generation, valid for
/// the duration of this call.
pub trait Plugin {
    /// This plugin's parameter type.
    type Params;
    /// This plugin's result type (a structured value, or raw bytes
    /// for `tile`).
    type Output;

    /// Run this plugin's algorithm against `dataset`. Constraint
    /// validation (including location caps) is this method's
    /// responsibility, not the dispatcher's.
    fn handle(&self, params: Self::Params, dataset: &Dataset) -> Status<Self::Output>;
}

pub(crate) fn check_location_cap(got: usize, cap: usize) -> Status<()> {
    if got > cap {
        return Err(crate::error::EngineError::TooManyLocations { got, cap });
    }
    Ok(())
}
