//! `route`: single-pair shortest path (the source's "viaroute" plugin).

use crate::dataset::{Coordinate, Dataset, NodeId};
use crate::error::{EngineError, Status};
use crate::plugins::graph_algo::{dijkstra_with_path, reconstruct_path};
use crate::plugins::{check_location_cap, Plugin};

/// Parameters for a `route` query: an ordered list of coordinates to
/// visit in sequence (at minimum, a source and a target).
#[derive(Debug, Clone)]
pub struct RouteParameters {
    /// Coordinates to route through, in order.
    pub coordinates: Vec<Coordinate>,
}

/// A single leg between two consecutive waypoints.
#[derive(Debug, Clone)]
pub struct RouteLeg {
    /// Node sequence for this leg.
    pub nodes: Vec<NodeId>,
    /// Summed routing weight for this leg.
    pub weight: f64,
}

/// The structured result of a `route` query.
#[derive(Debug, Clone)]
pub struct RouteResult {
    /// One leg per consecutive pair of input coordinates.
    pub legs: Vec<RouteLeg>,
    /// Weight summed across all legs.
    pub total_weight: f64,
}

/// Single-pair (and multi-waypoint) shortest path plugin.
pub struct RoutePlugin {
    max_locations: usize,
}

impl RoutePlugin {
    /// Build a route plugin capped at `max_locations` waypoints per
    /// call (`max_locations_viaroute` in the engine configuration).
    pub fn new(max_locations: usize) -> Self {
        RoutePlugin { max_locations }
    }
}

impl Plugin for RoutePlugin {
    type Params = RouteParameters;
    type Output = RouteResult;

    fn handle(&self, params: RouteParameters, dataset: &Dataset) -> Status<RouteResult> {
        check_location_cap(params.coordinates.len(), self.max_locations)?;
        if params.coordinates.len() < 2 {
            return Err(EngineError::InvalidParameters(
                "route requires at least two coordinates".to_string(),
            ));
        }

        let mut nodes = Vec::with_capacity(params.coordinates.len());
        for coordinate in &params.coordinates {
            let (node, _distance) = dataset
                .nearest_node(*coordinate)
                .ok_or(EngineError::NoSegment)?;
            nodes.push(node);
        }

        let mut legs = Vec::with_capacity(nodes.len() - 1);
        let mut total_weight = 0.0;
        for pair in nodes.windows(2) {
            let (source, target) = (pair[0], pair[1]);
            let (costs, predecessor) = dijkstra_with_path(dataset, source);
            let weight = *costs.get(&target).ok_or(EngineError::NoRoute)?;
            let path = reconstruct_path(dataset, source, target, &predecessor)
                .ok_or(EngineError::NoRoute)?;
            total_weight += weight;
            legs.push(RouteLeg {
                nodes: path,
                weight,
            });
        }

        Ok(RouteResult {
            legs,
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
    fn two_coordinates_yield_a_single_leg() {
        let dataset = synthetic_line(GenerationId::first(), 5);
        let plugin = RoutePlugin::new(2);
        let result = plugin
            .handle(
                RouteParameters {
                    coordinates: vec![coord(0), coord(4)],
                },
                &dataset,
            )
            .unwrap();
        assert_eq!(result.legs.len(), 1);
        assert_eq!(result.total_weight, 4.0);
        assert_eq!(result.legs[0].nodes, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn exceeding_cap_is_too_many_locations() {
        let dataset = synthetic_line(GenerationId::first(), 5);
        let plugin = RoutePlugin::new(2);
        let result = plugin.handle(
            RouteParameters {
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
        let plugin = RoutePlugin::new(2);
        let result = plugin.handle(
            RouteParameters {
                coordinates: vec![coord(0)],
            },
            &dataset,
        );
        assert!(matches!(result, Err(EngineError::InvalidParameters(_))));
    }
}
