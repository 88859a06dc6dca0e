//! The loader-side protocol (spec §4.5): an external collaborator,
//! not part of the public dispatch API, but the dual of the query
//! gate's entry/leave dance. Modeled here so scenario tests can drive
//! hot-swap under concurrent load without a separate process.
//!
//! Protocol: acquire `pending_update_mutex`, acquire `query_mutex`,
//! wait on `no_running_queries_condition` until the counter is zero,
//! flip the region tag and generation id, release both mutexes in
//! reverse order. [`crate::barriers::SharedBarriers::swap_when_drained`]
//! already holds `pending_update_mutex` and the drained `query_mutex`
//! guard for the duration of the callback, so publishing inside it
//! satisfies the whole sequence in one call.

use crate::dataset::Dataset;
use crate::facade::ControlBlock;
use crate::barriers::SharedBarriers;

/// Publishes new dataset generations into a named shared region,
/// draining in-flight readers before every swap.
pub struct Loader {
    control: ControlBlock,
    barriers: SharedBarriers,
}

impl Loader {
    /// Attach to the control block and barrier triple named `name`,
    /// the same name a [`crate::facade::SharedFacade`] attaches to.
    pub fn attach(name: &str) -> Self {
        Loader {
            control: ControlBlock::attach(name),
            barriers: SharedBarriers::attach(name),
        }
    }

    /// Publish `dataset` as the new current generation. Blocks until
    /// `number_of_queries` reaches zero before flipping the region
    /// tag, per the loader protocol; any reader that entered before
    /// this call observes the old generation for its entire lifetime,
    /// and any reader that enters after observes the new one.
    pub fn publish(&self, dataset: Dataset) {
        self.barriers.swap_when_drained(|| {
            self.control.publish(dataset);
        });
    }
}
