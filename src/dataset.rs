//! The dataset: an immutable, versioned bundle of graph and spatial
//! indices. Storage layout is intentionally simple; preprocessing and
//! the real on-disk formats are an upstream batch tool's concern;
//! this module only needs a format the local facade can
//! genuinely load and fail to load, so [`crate::error::EngineError::ConfigInvalid`]
//! is a real outcome and not a stub.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::config::StorageConfig;
use crate::error::EngineError;
use crate::revision::GenerationId;

const NODES_MAGIC: &[u8; 4] = b"REnd";
const EDGES_MAGIC: &[u8; 4] = b"REed";
const GEOMETRY_MAGIC: &[u8; 4] = b"REgm";
const NAMES_MAGIC: &[u8; 4] = b"REnm";
const RTREE_MAGIC: &[u8; 4] = b"REri";

/// A node identifier, indexing [`Dataset::nodes`].
pub type NodeId = u32;
/// An edge identifier, indexing [`Dataset::edges`].
pub type EdgeId = u32;

/// A latitude/longitude pair in degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl Coordinate {
    /// Great-circle-free planar approximation of distance, adequate
    /// for nearest-neighbor ranking over small test datasets; real
    /// distance computation is a plugin/indexing concern upstream of
    /// this module.
    pub fn rough_distance(&self, other: &Coordinate) -> f64 {
        let dlat = self.lat - other.lat;
        let dlon = self.lon - other.lon;
        (dlat * dlat + dlon * dlon).sqrt()
    }
}

/// A directed graph edge.
#[derive(Copy, Clone, Debug)]
pub struct EdgeRecord {
    /// Tail node.
    pub from: NodeId,
    /// Head node.
    pub to: NodeId,
    /// Routing weight (e.g. generalized cost).
    pub weight: f64,
    /// Travel duration in seconds.
    pub duration: f64,
    /// Index into [`Dataset::geometries`].
    pub geometry_index: u32,
}

/// A turn restriction: traveling `from_edge` into `via_node` and out
/// `to_edge` is either forbidden (`Kind::Only` false) or the only
/// legal continuation (`Kind::Only` true).
#[derive(Copy, Clone, Debug)]
pub struct TurnRestriction {
    /// Edge entering `via_node`.
    pub from_edge: EdgeId,
    /// The shared node.
    pub via_node: NodeId,
    /// Edge leaving `via_node`.
    pub to_edge: EdgeId,
    /// Whether this is an "only" restriction rather than a prohibition.
    pub only: bool,
}

/// The immutable, versioned dataset every plugin reads through a
/// [`crate::facade::Facade`].
pub struct Dataset {
    generation: GenerationId,
    nodes: Vec<Coordinate>,
    edges: Vec<EdgeRecord>,
    geometries: Vec<Vec<Coordinate>>,
    names: Vec<String>,
    turn_restrictions: Vec<TurnRestriction>,
    adjacency: FxHashMap<NodeId, SmallVec<[EdgeId; 4]>>,
    /// Reverse name-table index, preserving first-insertion order the
    /// way the forward table is ordered; lets `name`/`name_index`
    /// round-trip without a linear scan.
    name_index: IndexMap<String, u32>,
}

impl Dataset {
    /// Build a dataset in memory (used by tests and by a
    /// [`crate::loader::Loader`] preparing a new generation, since
    /// loaders are not required to round-trip through files).
    pub fn build(
        generation: GenerationId,
        nodes: Vec<Coordinate>,
        edges: Vec<EdgeRecord>,
        geometries: Vec<Vec<Coordinate>>,
        names: Vec<String>,
        turn_restrictions: Vec<TurnRestriction>,
    ) -> Self {
        let mut adjacency: FxHashMap<NodeId, SmallVec<[EdgeId; 4]>> = FxHashMap::default();
        for (index, edge) in edges.iter().enumerate() {
            adjacency
                .entry(edge.from)
                .or_default()
                .push(index as EdgeId);
        }
        let mut name_index = IndexMap::with_capacity(names.len());
        for (index, name) in names.iter().enumerate() {
            name_index.entry(name.clone()).or_insert(index as u32);
        }
        Dataset {
            generation,
            nodes,
            edges,
            geometries,
            names,
            turn_restrictions,
            adjacency,
            name_index,
        }
    }

    /// Load a dataset from the files named in `config`, failing with
    /// [`EngineError::ConfigInvalid`] on any missing, unreadable, or
    /// malformed path.
    pub fn load(config: &StorageConfig, generation: GenerationId) -> Result<Self, EngineError> {
        config.validate()?;

        let nodes = read_nodes(&config.nodes)?;
        let (edges, turn_restrictions) = read_edges(&config.edges)?;
        let geometries = read_geometries(&config.geometry)?;
        let names = read_names(&config.names)?;
        read_rtree_magic(&config.rtree)?;

        Ok(Dataset::build(
            generation,
            nodes,
            edges,
            geometries,
            names,
            turn_restrictions,
        ))
    }

    /// Write this dataset out as a [`StorageConfig`]-shaped directory
    /// tree, for fixture construction in tests and demos.
    pub fn write_to_directory(&self, config: &StorageConfig) -> io::Result<()> {
        write_nodes(&config.nodes, &self.nodes)?;
        write_edges(&config.edges, &self.edges, &self.turn_restrictions)?;
        write_geometries(&config.geometry, &self.geometries)?;
        write_names(&config.names, &self.names)?;
        write_rtree_magic(&config.rtree)
    }

    /// The generation id this dataset was published under.
    pub fn generation(&self) -> GenerationId {
        self.generation
    }

    /// Coordinate of `node`, if it exists.
    pub fn node_coordinate(&self, node: NodeId) -> Option<Coordinate> {
        self.nodes.get(node as usize).copied()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Outgoing edges of `node`.
    pub fn adjacency(&self, node: NodeId) -> &[EdgeId] {
        self.adjacency
            .get(&node)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// The edge record for `edge`, if it exists.
    pub fn edge(&self, edge: EdgeId) -> Option<&EdgeRecord> {
        self.edges.get(edge as usize)
    }

    /// Routing weight of `edge`.
    pub fn edge_weight(&self, edge: EdgeId) -> Option<f64> {
        self.edge(edge).map(|e| e.weight)
    }

    /// Geometry (polyline) of `edge`.
    pub fn edge_geometry(&self, edge: EdgeId) -> Option<&[Coordinate]> {
        let record = self.edge(edge)?;
        self.geometries
            .get(record.geometry_index as usize)
            .map(|g| g.as_slice())
    }

    /// String-table lookup.
    pub fn name(&self, index: u32) -> Option<&str> {
        self.names.get(index as usize).map(|s| s.as_str())
    }

    /// Reverse string-table lookup: the index a name was first
    /// inserted under, if it occurs in the table at all.
    pub fn name_index(&self, name: &str) -> Option<u32> {
        self.name_index.get(name).copied()
    }

    /// Turn restrictions active at `via_node`.
    pub fn turn_restrictions_at(&self, via_node: NodeId) -> impl Iterator<Item = &TurnRestriction> {
        self.turn_restrictions
            .iter()
            .filter(move |r| r.via_node == via_node)
    }

    /// Linear-scan nearest-node lookup. A real spatial index is an
    /// upstream indexing concern; this is the minimal, honest
    /// stand-in the dispatch contract needs to run `nearest`/`match`
    /// against something real.
    pub fn nearest_node(&self, target: Coordinate) -> Option<(NodeId, f64)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(id, coord)| (id as NodeId, coord.rough_distance(&target)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    }
}

fn read_u32(reader: &mut impl Read) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_f64(reader: &mut impl Read) -> io::Result<f64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

fn malformed(path: &Path, what: &str) -> EngineError {
    EngineError::ConfigInvalid(format!("{path:?} is malformed: {what}"))
}

fn read_nodes(path: &Path) -> Result<Vec<Coordinate>, EngineError> {
    let mut file = fs::File::open(path).map_err(|e| EngineError::ConfigInvalid(format!("{path:?}: {e}")))?;
    let mut magic = [0u8; 4];
    file.read_exact(&mut magic).map_err(|_| malformed(path, "truncated header"))?;
    if &magic != NODES_MAGIC {
        return Err(malformed(path, "bad magic"));
    }
    let count = read_u32(&mut file).map_err(|_| malformed(path, "truncated count"))?;
    let mut nodes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let lat = read_f64(&mut file).map_err(|_| malformed(path, "truncated node"))?;
        let lon = read_f64(&mut file).map_err(|_| malformed(path, "truncated node"))?;
        nodes.push(Coordinate { lat, lon });
    }
    Ok(nodes)
}

fn read_edges(path: &Path) -> Result<(Vec<EdgeRecord>, Vec<TurnRestriction>), EngineError> {
    let mut file = fs::File::open(path).map_err(|e| EngineError::ConfigInvalid(format!("{path:?}: {e}")))?;
    let mut magic = [0u8; 4];
    file.read_exact(&mut magic).map_err(|_| malformed(path, "truncated header"))?;
    if &magic != EDGES_MAGIC {
        return Err(malformed(path, "bad magic"));
    }
    let count = read_u32(&mut file).map_err(|_| malformed(path, "truncated count"))?;
    let mut edges = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let from = read_u32(&mut file).map_err(|_| malformed(path, "truncated edge"))?;
        let to = read_u32(&mut file).map_err(|_| malformed(path, "truncated edge"))?;
        let weight = read_f64(&mut file).map_err(|_| malformed(path, "truncated edge"))?;
        let duration = read_f64(&mut file).map_err(|_| malformed(path, "truncated edge"))?;
        let geometry_index = read_u32(&mut file).map_err(|_| malformed(path, "truncated edge"))?;
        edges.push(EdgeRecord {
            from,
            to,
            weight,
            duration,
            geometry_index,
        });
    }
    let restriction_count = read_u32(&mut file).map_err(|_| malformed(path, "truncated restriction count"))?;
    let mut turn_restrictions = Vec::with_capacity(restriction_count as usize);
    for _ in 0..restriction_count {
        let from_edge = read_u32(&mut file).map_err(|_| malformed(path, "truncated restriction"))?;
        let via_node = read_u32(&mut file).map_err(|_| malformed(path, "truncated restriction"))?;
        let to_edge = read_u32(&mut file).map_err(|_| malformed(path, "truncated restriction"))?;
        let mut only = [0u8; 1];
        file.read_exact(&mut only).map_err(|_| malformed(path, "truncated restriction"))?;
        turn_restrictions.push(TurnRestriction {
            from_edge,
            via_node,
            to_edge,
            only: only[0] != 0,
        });
    }
    Ok((edges, turn_restrictions))
}

fn read_geometries(path: &Path) -> Result<Vec<Vec<Coordinate>>, EngineError> {
    let mut file = fs::File::open(path).map_err(|e| EngineError::ConfigInvalid(format!("{path:?}: {e}")))?;
    let mut magic = [0u8; 4];
    file.read_exact(&mut magic).map_err(|_| malformed(path, "truncated header"))?;
    if &magic != GEOMETRY_MAGIC {
        return Err(malformed(path, "bad magic"));
    }
    let count = read_u32(&mut file).map_err(|_| malformed(path, "truncated count"))?;
    let mut geometries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let point_count = read_u32(&mut file).map_err(|_| malformed(path, "truncated geometry"))?;
        let mut points = Vec::with_capacity(point_count as usize);
        for _ in 0..point_count {
            let lat = read_f64(&mut file).map_err(|_| malformed(path, "truncated point"))?;
            let lon = read_f64(&mut file).map_err(|_| malformed(path, "truncated point"))?;
            points.push(Coordinate { lat, lon });
        }
        geometries.push(points);
    }
    Ok(geometries)
}

fn read_names(path: &Path) -> Result<Vec<String>, EngineError> {
    let mut file = fs::File::open(path).map_err(|e| EngineError::ConfigInvalid(format!("{path:?}: {e}")))?;
    let mut magic = [0u8; 4];
    file.read_exact(&mut magic).map_err(|_| malformed(path, "truncated header"))?;
    if &magic != NAMES_MAGIC {
        return Err(malformed(path, "bad magic"));
    }
    let count = read_u32(&mut file).map_err(|_| malformed(path, "truncated count"))?;
    let mut names = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let len = read_u32(&mut file).map_err(|_| malformed(path, "truncated name length"))?;
        let mut bytes = vec![0u8; len as usize];
        file.read_exact(&mut bytes).map_err(|_| malformed(path, "truncated name"))?;
        let name = String::from_utf8(bytes).map_err(|_| malformed(path, "non-utf8 name"))?;
        names.push(name);
    }
    Ok(names)
}

fn read_rtree_magic(path: &Path) -> Result<(), EngineError> {
    let mut file = fs::File::open(path).map_err(|e| EngineError::ConfigInvalid(format!("{path:?}: {e}")))?;
    let mut magic = [0u8; 4];
    file.read_exact(&mut magic).map_err(|_| malformed(path, "truncated header"))?;
    if &magic != RTREE_MAGIC {
        return Err(malformed(path, "bad magic"));
    }
    Ok(())
}

fn write_nodes(path: &Path, nodes: &[Coordinate]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(NODES_MAGIC)?;
    file.write_all(&(nodes.len() as u32).to_le_bytes())?;
    for node in nodes {
        file.write_all(&node.lat.to_le_bytes())?;
        file.write_all(&node.lon.to_le_bytes())?;
    }
    Ok(())
}

fn write_edges(path: &Path, edges: &[EdgeRecord], restrictions: &[TurnRestriction]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(EDGES_MAGIC)?;
    file.write_all(&(edges.len() as u32).to_le_bytes())?;
    for edge in edges {
        file.write_all(&edge.from.to_le_bytes())?;
        file.write_all(&edge.to.to_le_bytes())?;
        file.write_all(&edge.weight.to_le_bytes())?;
        file.write_all(&edge.duration.to_le_bytes())?;
        file.write_all(&edge.geometry_index.to_le_bytes())?;
    }
    file.write_all(&(restrictions.len() as u32).to_le_bytes())?;
    for restriction in restrictions {
        file.write_all(&restriction.from_edge.to_le_bytes())?;
        file.write_all(&restriction.via_node.to_le_bytes())?;
        file.write_all(&restriction.to_edge.to_le_bytes())?;
        file.write_all(&[restriction.only as u8])?;
    }
    Ok(())
}

fn write_geometries(path: &Path, geometries: &[Vec<Coordinate>]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(GEOMETRY_MAGIC)?;
    file.write_all(&(geometries.len() as u32).to_le_bytes())?;
    for geometry in geometries {
        file.write_all(&(geometry.len() as u32).to_le_bytes())?;
        for point in geometry {
            file.write_all(&point.lat.to_le_bytes())?;
            file.write_all(&point.lon.to_le_bytes())?;
        }
    }
    Ok(())
}

fn write_names(path: &Path, names: &[String]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(NAMES_MAGIC)?;
    file.write_all(&(names.len() as u32).to_le_bytes())?;
    for name in names {
        let bytes = name.as_bytes();
        file.write_all(&(bytes.len() as u32).to_le_bytes())?;
        file.write_all(bytes)?;
    }
    Ok(())
}

fn write_rtree_magic(path: &Path) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(RTREE_MAGIC)
}

/// Build a small, deterministic synthetic dataset for tests: a line
/// of `node_count` nodes one routing-unit apart, each connected to
/// its successor in both directions.
pub fn synthetic_line(generation: GenerationId, node_count: usize) -> Dataset {
    let nodes: Vec<Coordinate> = (0..node_count)
        .map(|i| Coordinate {
            lat: i as f64 * 0.01,
            lon: 0.0,
        })
        .collect();

    let mut edges = Vec::new();
    let mut geometries = Vec::new();
    for i in 0..node_count.saturating_sub(1) {
        let a = i as NodeId;
        let b = (i + 1) as NodeId;
        let geometry_index = geometries.len() as u32;
        geometries.push(vec![nodes[i], nodes[i + 1]]);
        edges.push(EdgeRecord {
            from: a,
            to: b,
            weight: 1.0,
            duration: 1.0,
            geometry_index,
        });
        let geometry_index = geometries.len() as u32;
        geometries.push(vec![nodes[i + 1], nodes[i]]);
        edges.push(EdgeRecord {
            from: b,
            to: a,
            weight: 1.0,
            duration: 1.0,
            geometry_index,
        });
    }

    let names = vec!["Example Street".to_string()];
    Dataset::build(generation, nodes, edges, geometries, names, Vec::new())
}
