//! `match`: project a noisy GPS trace onto the road network (a
//! greedy nearest-edge projection standing in for a full Hidden
//! Markov map matcher; the HMM internals are out of scope here).

use crate::dataset::{Coordinate, Dataset, NodeId};
use crate::error::{EngineError, Status};
use crate::plugins::{check_location_cap, Plugin};

/// Parameters for a `match` query: a time-ordered GPS trace.
#[derive(Debug, Clone)]
pub struct MatchParameters {
    /// Noisy trace points, in temporal order.
    pub trace: Vec<Coordinate>,
}

/// One matched trace point.
#[derive(Debug, Clone)]
pub struct MatchedPoint {
    /// Node the trace point snapped to.
    pub node: NodeId,
    /// Distance between the raw trace point and the snapped node.
    pub snap_distance: f64,
}

/// The structured result of a `match` query.
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// One matched point per input trace point, in order.
    pub matched: Vec<MatchedPoint>,
}

/// Trace map-matching plugin.
pub struct MatchPlugin {
    max_locations: usize,
}

impl MatchPlugin {
    /// Build a match plugin capped at `max_locations`
    /// (`max_locations_map_matching` in the engine configuration).
    pub fn new(max_locations: usize) -> Self {
        MatchPlugin { max_locations }
    }
}

impl Plugin for MatchPlugin {
    type Params = MatchParameters;
    type Output = MatchResult;

    fn handle(&self, params: MatchParameters, dataset: &Dataset) -> Status<MatchResult> {
        check_location_cap(params.trace.len(), self.max_locations)?;
        if params.trace.len() < 2 {
            return Err(EngineError::InvalidParameters(
                "match requires at least two trace points".to_string(),
            ));
        }

        let mut matched = Vec::with_capacity(params.trace.len());
        for point in &params.trace {
            let (node, snap_distance) = dataset.nearest_node(*point).ok_or(EngineError::NoMatch)?;
            matched.push(MatchedPoint { node, snap_distance });
        }

        Ok(MatchResult { matched })
    }
}
