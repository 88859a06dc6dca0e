//! The query gate: the RAII scope wrapping every plugin
//! invocation. Behavior depends on the facade variant; local mode is
//! a no-op, shared mode runs the full two-lock entry/leave protocol
//! around a re-attach check and a read-locked plugin call.

use crate::barriers::SharedBarriers;
use crate::dataset::Dataset;
use crate::error::Status;
use crate::facade::{Facade, LocalFacade, SharedFacade};
use crate::plugins::Plugin;

/// Increments the shared query counter on construction and decrements
/// it on drop, broadcasting `no_running_queries_condition` if it
/// reaches zero. This is the scoped guard the design notes call for:
/// the counter is released on every exit path, including a panic
/// unwinding out of the plugin call this guard brackets.
struct QueryCountGuard<'a> {
    barriers: &'a SharedBarriers,
}

impl<'a> QueryCountGuard<'a> {
    fn enter(barriers: &'a SharedBarriers) -> Self {
        barriers.enter();
        QueryCountGuard { barriers }
    }
}

impl Drop for QueryCountGuard<'_> {
    fn drop(&mut self) {
        self.barriers.leave();
    }
}

/// The per-query scope a dispatcher entry point runs a plugin inside.
pub enum QueryGate {
    /// No-op: no cross-process coordination needed, no intra-process
    /// reload possible.
    Local(LocalFacade),
    /// Full two-lock entry/leave protocol plus re-attach and
    /// read-locked dataset access.
    Shared {
        /// The attached shared facade.
        facade: SharedFacade,
        /// The named barrier triple this facade's dataset publishes
        /// swaps through.
        barriers: SharedBarriers,
    },
}

impl QueryGate {
    /// Build a gate over a process-local dataset: always the no-op
    /// path.
    pub fn local(facade: LocalFacade) -> Self {
        QueryGate::Local(facade)
    }

    /// Build a gate over a named shared dataset, attaching to the
    /// barrier triple of the same name.
    pub fn shared(name: &str) -> Self {
        QueryGate::Shared {
            facade: SharedFacade::attach(name),
            barriers: SharedBarriers::attach(name),
        }
    }

    /// The generic dispatch function: parameterized on the plugin
    /// type and its parameter/result types, this is the one code path
    /// every dispatcher entry point funnels through.
    pub fn run<PL: Plugin>(&self, plugin: &PL, params: PL::Params) -> Status<PL::Output> {
        match self {
            QueryGate::Local(facade) => {
                // No-op gate: no counter, no lock, just a direct call.
                let dataset = facade.current()?;
                plugin.handle(params, &dataset)
            }
            QueryGate::Shared { facade, barriers } => {
                let _count_guard = QueryCountGuard::enter(barriers);
                facade.check_and_reload()?;
                let snapshot = facade.read_attached()?;
                plugin.handle(params, snapshot.dataset())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::synthetic_line;
    use crate::revision::GenerationId;

    struct EchoPlugin;

    impl Plugin for EchoPlugin {
        type Params = ();
        type Output = usize;

        fn handle(&self, _params: (), dataset: &Dataset) -> Status<usize> {
            Ok(dataset.node_count())
        }
    }

    #[test]
    fn local_gate_calls_plugin_directly() {
        let dataset = synthetic_line(GenerationId::first(), 7);
        let gate = QueryGate::local(LocalFacade::from_dataset(dataset));
        let result = gate.run(&EchoPlugin, ()).unwrap();
        assert_eq!(result, 7);
    }

    #[test]
    fn shared_gate_counter_returns_to_zero_after_success() {
        let gate = QueryGate::shared("gate-test-success");
        if let QueryGate::Shared { facade, barriers } = &gate {
            facade
                .control_block()
                .publish(synthetic_line(GenerationId::first(), 3));
            let result = gate.run(&EchoPlugin, ()).unwrap();
            assert_eq!(result, 3);
            assert_eq!(barriers.number_of_queries(), 0);
        } else {
            unreachable!()
        }
    }

    #[test]
    fn shared_gate_counter_returns_to_zero_after_dataset_unavailable() {
        let gate = QueryGate::shared("gate-test-unavailable");
        if let QueryGate::Shared { barriers, .. } = &gate {
            let result = gate.run(&EchoPlugin, ());
            assert!(result.is_err());
            assert_eq!(barriers.number_of_queries(), 0);
        } else {
            unreachable!()
        }
    }

    struct PanickingPlugin;

    impl Plugin for PanickingPlugin {
        type Params = ();
        type Output = ();

        fn handle(&self, _params: (), _dataset: &Dataset) -> Status<()> {
            panic!("simulated plugin failure");
        }
    }

    #[test]
    fn shared_gate_counter_returns_to_zero_after_panic() {
        let gate = QueryGate::shared("gate-test-panic");
        if let QueryGate::Shared { facade, barriers } = &gate {
            facade
                .control_block()
                .publish(synthetic_line(GenerationId::first(), 3));
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                gate.run(&PanickingPlugin, ())
            }));
            assert!(result.is_err());
            assert_eq!(barriers.number_of_queries(), 0);
        } else {
            unreachable!()
        }
    }
}
