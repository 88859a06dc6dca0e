//! `table`: many-to-many distance/duration matrix.

use crate::dataset::{Coordinate, Dataset};
use crate::error::{EngineError, Status};
use crate::plugins::graph_algo::dijkstra;
use crate::plugins::{check_location_cap, Plugin};

/// Parameters for a `table` query.
#[derive(Debug, Clone)]
pub struct TableParameters {
    /// Locations to compute the matrix over.
    pub coordinates: Vec<Coordinate>,
}

/// A flattened `sources.len() * destinations.len()` row-major matrix;
/// here sources and destinations are the same set, as the source's
/// `TablePlugin` defaults to.
#[derive(Debug, Clone)]
pub struct TableResult {
    /// Row-major weight matrix, `entries[i * n + j]` is the weight
    /// from `coordinates[i]` to `coordinates[j]`, or `None` if
    /// unreachable.
    pub entries: Vec<Option<f64>>,
    /// Side length of the (square) matrix.
    pub dimension: usize,
}

/// Many-to-many distance table plugin.
pub struct TablePlugin {
    max_locations: usize,
}

impl TablePlugin {
    /// Build a table plugin capped at `max_locations`
    /// (`max_locations_distance_table` in the engine configuration).
    pub fn new(max_locations: usize) -> Self {
        TablePlugin { max_locations }
    }
}

impl Plugin for TablePlugin {
    type Params = TableParameters;
    type Output = TableResult;

    fn handle(&self, params: TableParameters, dataset: &Dataset) -> Status<TableResult> {
        check_location_cap(params.coordinates.len(), self.max_locations)?;
        if params.coordinates.is_empty() {
            return Err(EngineError::InvalidParameters(
                "table requires at least one coordinate".to_string(),
            ));
        }

        let mut nodes = Vec::with_capacity(params.coordinates.len());
        for coordinate in &params.coordinates {
            let (node, _distance) = dataset
                .nearest_node(*coordinate)
                .ok_or(EngineError::NoSegment)?;
            nodes.push(node);
        }

        let dimension = nodes.len();
        let mut entries = vec![None; dimension * dimension];
        for (row, &source) in nodes.iter().enumerate() {
            let costs = dijkstra(dataset, source);
            for (col, target) in nodes.iter().enumerate() {
                entries[row * dimension + col] = costs.get(target).copied();
            }
        }

        Ok(TableResult { entries, dimension })
    }
}
