//! `smooth_via`: concatenated via-leg routing with endpoint
//! smoothing. Like `route`, each consecutive pair of coordinates is
//! shortest-pathed independently, but where `route` reports each leg
//! on its own, `smooth_via` additionally collapses the shared node at
//! a leg boundary so the stitched node sequence reads as one
//! continuous path rather than `n-1` disjoint ones.

use crate::dataset::{Coordinate, Dataset, NodeId};
use crate::error::{EngineError, Status};
use crate::plugins::graph_algo::{dijkstra_with_path, reconstruct_path};
use crate::plugins::{check_location_cap, Plugin};

/// Parameters for a `smooth_via` query: an ordered list of
/// coordinates, the first and last being the route's true endpoints
/// and everything between a via-point to be smoothed through.
#[derive(Debug, Clone)]
pub struct SmoothViaParameters {
    /// Coordinates to route through, in order.
    pub coordinates: Vec<Coordinate>,
}

/// The structured result of a `smooth_via` query: a single continuous
/// node sequence and its total weight, with via-point boundaries
/// smoothed away rather than reported as separate legs.
#[derive(Debug, Clone)]
pub struct SmoothViaResult {
    /// The stitched node sequence, each via-node appearing exactly
    /// once even though it closes one leg and opens the next.
    pub nodes: Vec<NodeId>,
    /// Weight summed across all legs.
    pub total_weight: f64,
}

/// Smoothed via-point routing plugin.
pub struct SmoothViaPlugin {
    max_locations: usize,
}

impl SmoothViaPlugin {
    /// Build a smooth-via plugin capped at `max_locations` waypoints
    /// per call. The source shares this cap with `route`
    /// (`max_locations_viaroute`) since both walk the same kind of
    /// waypoint list.
    pub fn new(max_locations: usize) -> Self {
        SmoothViaPlugin { max_locations }
    }
}

impl Plugin for SmoothViaPlugin {
    type Params = SmoothViaParameters;
    type Output = SmoothViaResult;

    fn handle(&self, params: SmoothViaParameters, dataset: &Dataset) -> Status<SmoothViaResult> {
        check_location_cap(params.coordinates.len(), self.max_locations)?;
        if params.coordinates.len() < 2 {
            return Err(EngineError::InvalidParameters(
                "smooth_via requires at least two coordinates".to_string(),
            ));
        }

        let mut waypoint_nodes = Vec::with_capacity(params.coordinates.len());
        for coordinate in &params.coordinates {
            let (node, _distance) = dataset
                .nearest_node(*coordinate)
                .ok_or(EngineError::NoSegment)?;
            waypoint_nodes.push(node);
        }

        let mut nodes = Vec::new();
        let mut total_weight = 0.0;
        for pair in waypoint_nodes.windows(2) {
            let (source, target) = (pair[0], pair[1]);
            let (costs, predecessor) = dijkstra_with_path(dataset, source);
            let weight = *costs.get(&target).ok_or(EngineError::NoRoute)?;
            let path = reconstruct_path(dataset, source, target, &predecessor)
                .ok_or(EngineError::NoRoute)?;
            total_weight += weight;

            // Drop the leading node of every leg after the first: it
            // is the same node as the previous leg's trailing node, so
            // keeping it would duplicate the via-point in the stitched
            // sequence instead of smoothing through it.
            if nodes.is_empty() {
                nodes.extend(path);
            } else {
                nodes.extend(path.into_iter().skip(1));
            }
        }

        Ok(SmoothViaResult {
            nodes,
            total_weight,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::synthetic_line;
    use crate::revision::GenerationId;

    fn coord(node: usize) -> Coordinate {
        Coordinate {
            lat: node as f64 * 0.01,
            lon: 0.0,
        }
    }

    #[test]
    fn via_point_is_smoothed_not_duplicated() {
        let dataset = synthetic_line(GenerationId::first(), 5);
        let plugin = SmoothViaPlugin::new(3);
        let result = plugin
            .handle(
                SmoothViaParameters {
                    coordinates: vec![coord(0), coord(2), coord(4)],
                },
                &dataset,
            )
            .unwrap();
        assert_eq!(result.nodes, vec![0, 1, 2, 3, 4]);
        assert_eq!(result.total_weight, 4.0);
    }

    #[test]
    fn exceeding_cap_is_too_many_locations() {
        let dataset = synthetic_line(GenerationId::first(), 5);
        let plugin = SmoothViaPlugin::new(2);
        let result = plugin.handle(
            SmoothViaParameters {
                coordinates: vec![coord(0), coord(1), coord(2)],
            },
            &dataset,
        );
        assert!(matches!(
            result,
            Err(EngineError::TooManyLocations { got: 3, cap: 2 })
        ));
    }

    #[test]
    fn single_coordinate_is_invalid() {
        let dataset = synthetic_line(GenerationId::first(), 5);
        let plugin = SmoothViaPlugin::new(2);
        let result = plugin.handle(
            SmoothViaParameters {
                coordinates: vec![coord(0)],
            },
            &dataset,
        );
        assert!(matches!(result, Err(EngineError::InvalidParameters(_))));
    }
}
