//! `trip`: open-loop nearest-neighbour tour construction across a set
//! of locations (a simplified stand-in for a full trip-solver
//! plugin; tour *optimality* is an algorithm-internals concern out
//! of scope here).

use rustc_hash::FxHashMap;

use crate::dataset::{Coordinate, Dataset, NodeId};
use crate::error::{EngineError, Status};
use crate::plugins::graph_algo::dijkstra;
use crate::plugins::{check_location_cap, Plugin};

/// Parameters for a `trip` query.
#[derive(Debug, Clone)]
pub struct TripParameters {
    /// Locations to visit; order is not significant, the plugin picks
    /// a visiting order.
    pub coordinates: Vec<Coordinate>,
}

/// The structured result of a `trip` query.
#[derive(Debug, Clone)]
pub struct TripResult {
    /// Visiting order, as indices into the input `coordinates`.
    pub waypoint_order: Vec<usize>,
    /// Total weight of the constructed tour.
    pub total_weight: f64,
}

/// Nearest-neighbour tour plugin.
pub struct TripPlugin {
    max_locations: usize,
}

impl TripPlugin {
    /// Build a trip plugin capped at `max_locations`
    /// (`max_locations_trip` in the engine configuration).
    pub fn new(max_locations: usize) -> Self {
        TripPlugin { max_locations }
    }
}

impl Plugin for TripPlugin {
    type Params = TripParameters;
    type Output = TripResult;

    fn handle(&self, params: TripParameters, dataset: &Dataset) -> Status<TripResult> {
        check_location_cap(params.coordinates.len(), self.max_locations)?;
        if params.coordinates.len() < 2 {
            return Err(EngineError::InvalidParameters(
                "trip requires at least two coordinates".to_string(),
            ));
        }

        let mut nodes: Vec<NodeId> = Vec::with_capacity(params.coordinates.len());
        for coordinate in &params.coordinates {
            let (node, _distance) = dataset
                .nearest_node(*coordinate)
                .ok_or(EngineError::NoSegment)?;
            nodes.push(node);
        }

        // Pre-compute a shortest-path tree from every candidate node
        // once, then greedily extend the tour by always hopping to
        // the closest unvisited location.
        let trees: Vec<FxHashMap<NodeId, f64>> = nodes.iter().map(|&n| dijkstra(dataset, n)).collect();

        let mut visited = vec![false; nodes.len()];
        let mut order = vec![0usize];
        visited[0] = true;
        let mut total_weight = 0.0;

        while order.len() < nodes.len() {
            let current = *order.last().unwrap();
            let mut best: Option<(usize, f64)> = None;
            for (candidate, &is_visited) in visited.iter().enumerate() {
                if is_visited {
                    continue;
                }
                if let Some(&cost) = trees[current].get(&nodes[candidate]) {
                    if best.map(|(_, best_cost)| cost < best_cost).unwrap_or(true) {
                        best = Some((candidate, cost));
                    }
                }
            }
            let (next, cost) = best.ok_or(EngineError::NoTrip)?;
            visited[next] = true;
            order.push(next);
            total_weight += cost;
        }

        Ok(TripResult {
            waypoint_order: order,
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
    fn visits_every_location_once() {
        let dataset = synthetic_line(GenerationId::first(), 6);
        let plugin = TripPlugin::new(10);
        let result = plugin
            .handle(
                TripParameters {
                    coordinates: vec![coord(0), coord(5), coord(2), coord(4)],
                },
                &dataset,
            )
            .unwrap();
        assert_eq!(result.waypoint_order.len(), 4);
        let mut sorted = result.waypoint_order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3]);
    }

    #[test]
    fn disconnected_locations_yield_no_trip() {
        use crate::dataset::{Dataset, EdgeRecord};

        // Two isolated nodes with no edge between them at all.
        let nodes = vec![coord(0), coord(1)];
        let dataset = Dataset::build(
            GenerationId::first(),
            nodes,
            Vec::<EdgeRecord>::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
        let plugin = TripPlugin::new(10);
        let result = plugin.handle(
            TripParameters {
                coordinates: vec![coord(0), coord(1)],
            },
            &dataset,
        );
        assert!(matches!(result, Err(EngineError::NoTrip)));
    }
}
