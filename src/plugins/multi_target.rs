//! `multi_target`: shortest paths from one source to many targets in
//! a single pass (multi-source Dijkstra run once from the source,
//! rather than once per target as `route` would).

use crate::dataset::{Coordinate, Dataset, NodeId};
use crate::error::{EngineError, Status};
use crate::plugins::graph_algo::dijkstra;
use crate::plugins::Plugin;

/// Parameters for a `multi_target` query.
#[derive(Debug, Clone)]
pub struct MultiTargetParameters {
    /// The single source coordinate.
    pub source: Coordinate,
    /// The coordinates to compute distances to.
    pub targets: Vec<Coordinate>,
}

/// The structured result of a `multi_target` query.
#[derive(Debug, Clone)]
pub struct MultiTargetResult {
    /// The node `source` snapped to.
    pub source_node: NodeId,
    /// One weight per target, in the same order as the input, `None`
    /// if unreachable.
    pub weights: Vec<Option<f64>>,
}

/// Multi-target shortest path plugin.
#[derive(Default)]
pub struct MultiTargetPlugin;

impl MultiTargetPlugin {
    /// Multi-target has no per-call cap in the source.
    pub fn new() -> Self {
        MultiTargetPlugin
    }
}

impl Plugin for MultiTargetPlugin {
    type Params = MultiTargetParameters;
    type Output = MultiTargetResult;

    fn handle(&self, params: MultiTargetParameters, dataset: &Dataset) -> Status<MultiTargetResult> {
        if params.targets.is_empty() {
            return Err(EngineError::InvalidParameters(
                "multi_target requires at least one target".to_string(),
            ));
        }

        let (source_node, _distance) = dataset
            .nearest_node(params.source)
            .ok_or(EngineError::NoSegment)?;

        let costs = dijkstra(dataset, source_node);
        let mut weights = Vec::with_capacity(params.targets.len());
        for target in &params.targets {
            let (target_node, _distance) = dataset
                .nearest_node(*target)
                .ok_or(EngineError::NoSegment)?;
            weights.push(costs.get(&target_node).copied());
        }

        Ok(MultiTargetResult {
            source_node,
            weights,
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
    fn computes_one_weight_per_target() {
        let dataset = synthetic_line(GenerationId::first(), 6);
        let plugin = MultiTargetPlugin::new();
        let result = plugin
            .handle(
                MultiTargetParameters {
                    source: coord(0),
                    targets: vec![coord(1), coord(5)],
                },
                &dataset,
            )
            .unwrap();
        assert_eq!(result.source_node, 0);
        assert_eq!(result.weights, vec![Some(1.0), Some(5.0)]);
    }
}
