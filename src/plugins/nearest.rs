//! `nearest`: snap a single coordinate to the closest node.

use crate::dataset::{Coordinate, Dataset, NodeId};
use crate::error::{EngineError, Status};
use crate::plugins::Plugin;

/// Parameters for a `nearest` query.
#[derive(Debug, Clone)]
pub struct NearestParameters {
    /// Coordinate to snap.
    pub coordinate: Coordinate,
    /// Number of candidate nodes to return, ranked by distance.
    pub number_of_results: usize,
}

/// One candidate snap result.
#[derive(Debug, Clone)]
pub struct NearestCandidate {
    /// The snapped node.
    pub node: NodeId,
    /// Its coordinate.
    pub coordinate: Coordinate,
    /// Distance from the query coordinate (same units as
    /// [`Coordinate::rough_distance`]).
    pub distance: f64,
}

/// The structured result of a `nearest` query.
#[derive(Debug, Clone)]
pub struct NearestResult {
    /// Candidates, nearest first.
    pub candidates: Vec<NearestCandidate>,
}

/// Nearest-node lookup plugin.
#[derive(Default)]
pub struct NearestPlugin;

impl NearestPlugin {
    /// Nearest has no per-call cap in the source; it always projects
    /// a single coordinate.
    pub fn new() -> Self {
        NearestPlugin
    }
}

impl Plugin for NearestPlugin {
    type Params = NearestParameters;
    type Output = NearestResult;

    fn handle(&self, params: NearestParameters, dataset: &Dataset) -> Status<NearestResult> {
        if params.number_of_results == 0 {
            return Err(EngineError::InvalidParameters(
                "number_of_results must be at least 1".to_string(),
            ));
        }

        let mut ranked: Vec<NearestCandidate> = (0..dataset.node_count() as NodeId)
            .filter_map(|node| {
                dataset.node_coordinate(node).map(|coordinate| {
                    let distance = coordinate.rough_distance(&params.coordinate);
                    NearestCandidate {
                        node,
                        coordinate,
                        distance,
                    }
                })
            })
            .collect();
        ranked.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(params.number_of_results);

        if ranked.is_empty() {
            return Err(EngineError::NoSegment);
        }

        Ok(NearestResult { candidates: ranked })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::synthetic_line;
    use crate::revision::GenerationId;

    #[test]
    fn returns_requested_number_of_candidates() {
        let dataset = synthetic_line(GenerationId::first(), 10);
        let plugin = NearestPlugin::new();
        let result = plugin
            .handle(
                NearestParameters {
                    coordinate: Coordinate { lat: 0.031, lon: 0.0 },
                    number_of_results: 3,
                },
                &dataset,
            )
            .unwrap();
        assert_eq!(result.candidates.len(), 3);
        assert_eq!(result.candidates[0].node, 3);
    }

    #[test]
    fn empty_dataset_is_no_segment() {
        let dataset = synthetic_line(GenerationId::first(), 0);
        let plugin = NearestPlugin::new();
        let result = plugin.handle(
            NearestParameters {
                coordinate: Coordinate { lat: 0.0, lon: 0.0 },
                number_of_results: 1,
            },
            &dataset,
        );
        assert!(matches!(result, Err(EngineError::NoSegment)));
    }
}
