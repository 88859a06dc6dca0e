//! `tile`: vector-tile-shaped raw byte encoding of the edges touching
//! a tile's bounding box. The real MVT encoding is an upstream
//! rendering concern; this plugin's contract is only "raw bytes out",
//! which a minimal, legible little-endian record stream satisfies
//! honestly without pulling in a protobuf stack.

use crate::dataset::Dataset;
use crate::error::{EngineError, Status};
use crate::plugins::Plugin;

/// Parameters for a `tile` query: a bounding box in degrees.
#[derive(Debug, Clone, Copy)]
pub struct TileParameters {
    /// Minimum latitude.
    pub min_lat: f64,
    /// Minimum longitude.
    pub min_lon: f64,
    /// Maximum latitude.
    pub max_lat: f64,
    /// Maximum longitude.
    pub max_lon: f64,
}

impl TileParameters {
    fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

/// Vector-tile plugin. Its result is a raw byte sequence rather than
/// a structured object, since callers pass tile bytes straight
/// through to a renderer.
#[derive(Default)]
pub struct TilePlugin;

impl TilePlugin {
    /// Tile has no per-call cap in the source.
    pub fn new() -> Self {
        TilePlugin
    }
}

impl Plugin for TilePlugin {
    type Params = TileParameters;
    type Output = Vec<u8>;

    fn handle(&self, params: TileParameters, dataset: &Dataset) -> Status<Vec<u8>> {
        if params.min_lat > params.max_lat || params.min_lon > params.max_lon {
            return Err(EngineError::InvalidParameters(
                "tile bounding box is inverted".to_string(),
            ));
        }

        let mut bytes = Vec::new();
        let mut edge_count: u32 = 0;
        let mut body = Vec::new();

        for edge_id in 0u32..dataset.edge_count() as u32 {
            let Some(edge) = dataset.edge(edge_id) else {
                continue;
            };
            let (Some(from), Some(to)) =
                (dataset.node_coordinate(edge.from), dataset.node_coordinate(edge.to))
            else {
                continue;
            };
            if !params.contains(from.lat, from.lon) && !params.contains(to.lat, to.lon) {
                continue;
            }
            body.extend_from_slice(&edge_id.to_le_bytes());
            body.extend_from_slice(&from.lat.to_le_bytes());
            body.extend_from_slice(&from.lon.to_le_bytes());
            body.extend_from_slice(&to.lat.to_le_bytes());
            body.extend_from_slice(&to.lon.to_le_bytes());
            edge_count += 1;
        }

        bytes.extend_from_slice(b"RTil");
        bytes.extend_from_slice(&edge_count.to_le_bytes());
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::synthetic_line;
    use crate::revision::GenerationId;

    #[test]
    fn encodes_edges_within_the_bbox() {
        let dataset = synthetic_line(GenerationId::first(), 5);
        let plugin = TilePlugin::new();
        let bytes = plugin
            .handle(
                TileParameters {
                    min_lat: -1.0,
                    min_lon: -1.0,
                    max_lat: 1.0,
                    max_lon: 1.0,
                },
                &dataset,
            )
            .unwrap();
        assert_eq!(&bytes[0..4], b"RTil");
        let count = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        assert!(count > 0);
    }

    #[test]
    fn inverted_bbox_is_invalid() {
        let dataset = synthetic_line(GenerationId::first(), 5);
        let plugin = TilePlugin::new();
        let result = plugin.handle(
            TileParameters {
                min_lat: 1.0,
                min_lon: 0.0,
                max_lat: 0.0,
                max_lon: 1.0,
            },
            &dataset,
        );
        assert!(matches!(result, Err(EngineError::InvalidParameters(_))));
    }
}
