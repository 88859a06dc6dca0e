//! Engine configuration.
//!
//! Parsing a config file format is out of scope here; this
//! module only defines the recognized options as a plain, validated
//! value type. A front-end that does parse a config file constructs one
//! of these and hands it to [`crate::Engine::new`].

use std::path::PathBuf;

use crate::error::EngineError;

/// Paths to the on-disk dataset files a [`crate::facade::LocalFacade`]
/// loads from. All five are required; the local facade fails
/// construction with [`EngineError::ConfigInvalid`] if any path is
/// missing or unreadable.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Node coordinate table.
    pub nodes: PathBuf,
    /// Directed edge table (weights, durations, geometry indices).
    pub edges: PathBuf,
    /// Edge geometry table.
    pub geometry: PathBuf,
    /// String table (street/place names).
    pub names: PathBuf,
    /// Serialized nearest-neighbor index.
    pub rtree: PathBuf,
}

impl StorageConfig {
    /// Construct a config pointing every required file at the same
    /// directory, assuming the conventional file names. Convenient for
    /// tests and for callers that lay out a dataset directory the way
    /// the preprocessing tool does.
    pub fn from_directory(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        StorageConfig {
            nodes: dir.join("nodes.dat"),
            edges: dir.join("edges.dat"),
            geometry: dir.join("geometry.dat"),
            names: dir.join("names.dat"),
            rtree: dir.join("rtree.dat"),
        }
    }

    /// Checks that every path exists and is readable. Called by the
    /// local facade at construction; exposed for callers that want to
    /// fail fast before constructing an engine at all.
    pub fn validate(&self) -> Result<(), EngineError> {
        for (label, path) in [
            ("nodes", &self.nodes),
            ("edges", &self.edges),
            ("geometry", &self.geometry),
            ("names", &self.names),
            ("rtree", &self.rtree),
        ] {
            let metadata = std::fs::metadata(path).map_err(|err| {
                EngineError::ConfigInvalid(format!(
                    "{label} path {path:?} is missing or unreadable: {err}"
                ))
            })?;
            if !metadata.is_file() {
                return Err(EngineError::ConfigInvalid(format!(
                    "{label} path {path:?} is not a regular file"
                )));
            }
        }
        Ok(())
    }
}

/// Recognized engine options.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Selects the shared-facade variant when `true`; otherwise the
    /// local, process-private variant is used.
    pub use_shared_memory: bool,
    /// Local-variant-only: paths to the dataset files. Ignored (and
    /// may be left at its default) when `use_shared_memory` is `true`.
    pub storage_config: StorageConfig,
    /// Name of the shared-memory dataset this engine attaches to.
    /// Ignored when `use_shared_memory` is `false`.
    pub shared_dataset_name: String,
    /// Plugin cap: maximum locations per `route` call.
    pub max_locations_viaroute: usize,
    /// Plugin cap: maximum locations per `table` call.
    pub max_locations_distance_table: usize,
    /// Plugin cap: maximum locations per `trip` call.
    pub max_locations_trip: usize,
    /// Plugin cap: maximum locations per `match` call.
    pub max_locations_map_matching: usize,
}

impl EngineConfig {
    /// A local-mode config with generous default caps, rooted at
    /// `dir` for its dataset files. Convenient as a builder starting
    /// point for tests and examples.
    pub fn local(dir: impl Into<PathBuf>) -> Self {
        EngineConfig {
            use_shared_memory: false,
            storage_config: StorageConfig::from_directory(dir),
            shared_dataset_name: String::new(),
            max_locations_viaroute: 2,
            max_locations_distance_table: 100,
            max_locations_trip: 100,
            max_locations_map_matching: 100,
        }
    }

    /// A shared-mode config attaching to the dataset named `name`.
    pub fn shared(name: impl Into<String>) -> Self {
        EngineConfig {
            use_shared_memory: true,
            storage_config: StorageConfig::from_directory(""),
            shared_dataset_name: name.into(),
            max_locations_viaroute: 2,
            max_locations_distance_table: 100,
            max_locations_trip: 100,
            max_locations_map_matching: 100,
        }
    }

    /// Builder-style setter for `max_locations_viaroute`.
    pub fn with_max_locations_viaroute(mut self, cap: usize) -> Self {
        self.max_locations_viaroute = cap;
        self
    }

    /// Builder-style setter for `max_locations_distance_table`.
    pub fn with_max_locations_distance_table(mut self, cap: usize) -> Self {
        self.max_locations_distance_table = cap;
        self
    }

    /// Builder-style setter for `max_locations_trip`.
    pub fn with_max_locations_trip(mut self, cap: usize) -> Self {
        self.max_locations_trip = cap;
        self
    }

    /// Builder-style setter for `max_locations_map_matching`.
    pub fn with_max_locations_map_matching(mut self, cap: usize) -> Self {
        self.max_locations_map_matching = cap;
        self
    }
}
