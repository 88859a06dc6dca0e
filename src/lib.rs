//! Query dispatch and dataset-lifecycle core for a multi-plugin
//! routing engine.
//!
//! This crate owns the process-wide (possibly cross-process-shared)
//! read-mostly road-network dataset, serializes hot-swap/reload
//! against in-flight queries with a two-lock reader-writer discipline,
//! and dispatches typed query parameters to one of eight stateless
//! query plugins under the correct locking regime. It does not
//! preprocess OSM data, does not implement the plugins' graph
//! algorithms beyond a minimal honest implementation of each, and does
//! not define a wire format; those are external collaborators.

#![warn(rust_2018_idioms)]
#![warn(missing_docs)]

mod barriers;
mod config;
mod dataset;
mod error;
mod facade;
mod gate;
mod loader;
mod plugins;
mod revision;

pub use config::{EngineConfig, StorageConfig};
pub use dataset::{Coordinate, Dataset, EdgeId, EdgeRecord, NodeId, TurnRestriction};
pub use error::{EngineError, Status};
pub use facade::{ControlBlock, Facade, LocalFacade, SharedFacade};
pub use loader::Loader;
pub use revision::{GenerationId, RegionTag};

pub use plugins::{
    MatchParameters, MatchPlugin, MatchResult, MatchedPoint, MultiTargetParameters,
    MultiTargetPlugin, MultiTargetResult, NearestCandidate, NearestParameters, NearestPlugin,
    NearestResult, RouteLeg, RouteParameters, RoutePlugin, RouteResult, SmoothViaParameters,
    SmoothViaPlugin, SmoothViaResult, TableParameters, TablePlugin, TableResult, TileParameters,
    TilePlugin, TripParameters, TripPlugin, TripResult,
};

use gate::QueryGate;

/// The plugin registry and dispatcher: owns one instance of each
/// query plugin bound to a facade, and exposes one typed entry point
/// per query kind. The registry is closed; plugins are fixed at
/// construction, matching spec §4.4's "static dispatch avoids a
/// dynamic result-type machinery in hot paths".
pub struct Engine {
    gate: QueryGate,
    route: RoutePlugin,
    table: TablePlugin,
    nearest: NearestPlugin,
    trip: TripPlugin,
    map_matching: MatchPlugin,
    tile: TilePlugin,
    multi_target: MultiTargetPlugin,
    smooth_via: SmoothViaPlugin,
}

impl Engine {
    /// Construct an engine from `config`. Selects the local or shared
    /// facade variant per `config.use_shared_memory`; in local mode
    /// the dataset is loaded eagerly and construction fails with
    /// [`EngineError::ConfigInvalid`] if any required file is missing
    /// or unreadable. In shared mode construction always succeeds;
    /// attachment is lazy, deferred to the first query, matching the
    /// shared facade's "created empty" lifecycle (spec §3).
    pub fn new(config: &EngineConfig) -> Status<Engine> {
        let gate = if config.use_shared_memory {
            log::info!(
                target: "route_engine",
                "attaching shared-memory engine to dataset {:?}",
                config.shared_dataset_name
            );
            QueryGate::shared(&config.shared_dataset_name)
        } else {
            log::info!(
                target: "route_engine",
                "loading local dataset from {:?}",
                config.storage_config
            );
            let facade = LocalFacade::load(&config.storage_config)?;
            QueryGate::local(facade)
        };

        Ok(Engine {
            gate,
            route: RoutePlugin::new(config.max_locations_viaroute),
            table: TablePlugin::new(config.max_locations_distance_table),
            nearest: NearestPlugin::new(),
            trip: TripPlugin::new(config.max_locations_trip),
            map_matching: MatchPlugin::new(config.max_locations_map_matching),
            tile: TilePlugin::new(),
            multi_target: MultiTargetPlugin::new(),
            smooth_via: SmoothViaPlugin::new(config.max_locations_viaroute),
        })
    }

    /// Build an engine directly over an in-memory dataset, bypassing
    /// file I/O and shared memory entirely. Convenient for tests and
    /// embedders that already have a [`Dataset`] in hand.
    pub fn from_dataset(dataset: Dataset, config: &EngineConfig) -> Engine {
        Engine {
            gate: QueryGate::local(LocalFacade::from_dataset(dataset)),
            route: RoutePlugin::new(config.max_locations_viaroute),
            table: TablePlugin::new(config.max_locations_distance_table),
            nearest: NearestPlugin::new(),
            trip: TripPlugin::new(config.max_locations_trip),
            map_matching: MatchPlugin::new(config.max_locations_map_matching),
            tile: TilePlugin::new(),
            multi_target: MultiTargetPlugin::new(),
            smooth_via: SmoothViaPlugin::new(config.max_locations_viaroute),
        }
    }

    /// Single-pair (and multi-waypoint) shortest path.
    pub fn route(&self, params: RouteParameters) -> Status<RouteResult> {
        self.gate.run(&self.route, params)
    }

    /// Many-to-many distance/duration matrix.
    pub fn table(&self, params: TableParameters) -> Status<TableResult> {
        self.gate.run(&self.table, params)
    }

    /// Nearest-node projection.
    pub fn nearest(&self, params: NearestParameters) -> Status<NearestResult> {
        self.gate.run(&self.nearest, params)
    }

    /// Open-loop tour construction across a set of locations.
    pub fn trip(&self, params: TripParameters) -> Status<TripResult> {
        self.gate.run(&self.trip, params)
    }

    /// Map-matching: project a noisy trace onto the road network.
    pub fn map_matching(&self, params: MatchParameters) -> Status<MatchResult> {
        self.gate.run(&self.map_matching, params)
    }

    /// Vector-tile-shaped raw byte encoding of the edges in a bounding
    /// box.
    pub fn tile(&self, params: TileParameters) -> Status<Vec<u8>> {
        self.gate.run(&self.tile, params)
    }

    /// Multi-target shortest paths from one source to many targets.
    pub fn multi_target(&self, params: MultiTargetParameters) -> Status<MultiTargetResult> {
        self.gate.run(&self.multi_target, params)
    }

    /// Smoothed via-point routing: like [`Engine::route`] but
    /// stitches legs into one continuous node sequence.
    pub fn smooth_via(&self, params: SmoothViaParameters) -> Status<SmoothViaResult> {
        self.gate.run(&self.smooth_via, params)
    }

    /// The generation id of the dataset this engine is currently
    /// serving queries against. For a local engine this never
    /// changes; for a shared engine it reflects whatever this
    /// process last attached to, which may lag a generation a loader
    /// has published but no query has observed yet.
    pub fn attached_generation(&self) -> GenerationId {
        match &self.gate {
            QueryGate::Local(facade) => facade.attached_generation(),
            QueryGate::Shared { facade, .. } => facade.attached_generation(),
        }
    }
}

/// A plugin that sleeps for a fixed duration before returning, standing
/// in for a long-running query. Exists only so tests can hold the
/// gate's in-flight counter open for a query's whole runtime rather
/// than the instant `handle` returns, the way a genuinely slow plugin
/// would. Not part of the closed eight-plugin registry (spec §4.4);
/// never constructed outside [`Engine::sleep_query`].
#[cfg(any(test, feature = "test-support"))]
struct SleepPlugin {
    duration: std::time::Duration,
}

#[cfg(any(test, feature = "test-support"))]
impl plugins::Plugin for SleepPlugin {
    type Params = ();
    type Output = ();

    fn handle(&self, _params: (), _dataset: &dataset::Dataset) -> Status<()> {
        std::thread::sleep(self.duration);
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Engine {
    /// Run a query that sleeps for `duration` through this engine's
    /// query gate, exactly like any other dispatcher entry point.
    /// Lets tests exercise drain-blocking (spec §8 scenario 4)
    /// without depending on how fast one of the real plugins happens
    /// to run.
    pub fn sleep_query(&self, duration: std::time::Duration) -> Status<()> {
        self.gate.run(&SleepPlugin { duration }, ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn coord(node: usize) -> Coordinate {
        Coordinate {
            lat: node as f64 * 0.01,
            lon: 0.0,
        }
    }

    /// Scenario 1: local viaroute (spec §8).
    #[test]
    fn scenario_1_local_viaroute() {
        let dataset = dataset::synthetic_line(GenerationId::first(), 5);
        let config = EngineConfig::local(".").with_max_locations_viaroute(2);
        let engine = Engine::from_dataset(dataset, &config);

        let result = engine
            .route(RouteParameters {
                coordinates: vec![coord(0), coord(4)],
            })
            .unwrap();
        assert!(!result.legs.is_empty());

        let err = engine
            .route(RouteParameters {
                coordinates: vec![coord(0), coord(2), coord(4)],
            })
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::TooManyLocations { got: 3, cap: 2 }
        ));
    }

    /// Scenario 2: shared startup with no dataset published yet
    /// (spec §8). The counter must return to its prior value (zero)
    /// even though the query itself fails.
    #[test]
    fn scenario_2_shared_startup_with_no_dataset() {
        let config = EngineConfig::shared("lib-scenario-2-no-dataset");
        let engine = Engine::new(&config).unwrap();

        let err = engine
            .route(RouteParameters {
                coordinates: vec![coord(0), coord(1)],
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::DatasetUnavailable(_)));

        if let QueryGate::Shared { barriers, .. } = &engine.gate {
            assert_eq!(barriers.number_of_queries(), 0);
        } else {
            unreachable!("shared config must build a shared gate");
        }
    }

    #[test]
    fn local_engine_round_trips_through_a_real_storage_config() {
        let dir = tempdir().unwrap();
        let storage_config = StorageConfig::from_directory(dir.path());
        let dataset = dataset::synthetic_line(GenerationId::first(), 4);
        dataset.write_to_directory(&storage_config).unwrap();

        let mut config = EngineConfig::local(dir.path());
        config.storage_config = storage_config;
        let engine = Engine::new(&config).unwrap();

        assert_eq!(engine.attached_generation(), GenerationId::first());
        let result = engine
            .nearest(NearestParameters {
                coordinate: coord(2),
                number_of_results: 1,
            })
            .unwrap();
        assert_eq!(result.candidates[0].node, 2);
    }

    #[test]
    fn local_engine_construction_fails_on_missing_files() {
        let dir = tempdir().unwrap();
        let config = EngineConfig::local(dir.path());
        assert!(matches!(
            Engine::new(&config),
            Err(EngineError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn repeated_queries_on_local_engine_are_byte_identical() {
        // Property 5 (spec §8): constructing a local engine over a
        // fixed dataset and issuing the same query N times yields
        // identical results, since the dataset never changes and the
        // plugins are stateless and deterministic.
        let dataset = dataset::synthetic_line(GenerationId::first(), 8);
        let config = EngineConfig::local(".");
        let engine = Engine::from_dataset(dataset, &config);

        let params = || RouteParameters {
            coordinates: vec![coord(0), coord(7)],
        };
        let first = engine.route(params()).unwrap();
        for _ in 0..20 {
            let again = engine.route(params()).unwrap();
            assert_eq!(again.total_weight, first.total_weight);
            assert_eq!(
                again.legs.iter().map(|l| l.nodes.clone()).collect::<Vec<_>>(),
                first.legs.iter().map(|l| l.nodes.clone()).collect::<Vec<_>>()
            );
        }
    }
}
