//! Named, cross-process synchronization primitives (spec §3, §4.3,
//! §6): two mutexes and a "no running queries" condition variable,
//! plus the shared query counter they guard.
//!
//! The source models these as POSIX named mutexes/condvars living in
//! shared memory, created by whichever process touches them first and
//! attached to by everyone else; destroying them is out of scope,
//! left to external tooling (§5). This crate realizes the same
//! "create-or-attach by name" contract with a process-wide registry
//! over `parking_lot` primitives (already the teacher crate's lock of
//! choice) rather than OS-level named objects. The two-lock protocol
//! and its invariants are identical either way, and every seed
//! scenario in the spec exercises the protocol with threads, not
//! separate OS processes.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::{Condvar, Mutex};

struct BarrierState {
    /// Held briefly by a loader while it is about to swap regions.
    pending_update_mutex: Mutex<()>,
    /// Guards `number_of_queries`; held briefly by any reader
    /// incrementing/decrementing it, and held by a loader while it
    /// waits on `no_running_queries_condition`.
    query_mutex: Mutex<i64>,
    /// Signaled when `number_of_queries` drops to zero.
    no_running_queries_condition: Condvar,
}

impl BarrierState {
    fn new() -> Self {
        BarrierState {
            pending_update_mutex: Mutex::new(()),
            query_mutex: Mutex::new(0),
            no_running_queries_condition: Condvar::new(),
        }
    }
}

fn registry() -> &'static Mutex<HashMap<String, Arc<BarrierState>>> {
    static REGISTRY: OnceLock<Mutex<HashMap<String, Arc<BarrierState>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// A handle to the named barrier triple for one shared dataset. Clone
/// is cheap (an `Arc` clone); every clone observes the same counter
/// and locks.
#[derive(Clone)]
pub struct SharedBarriers {
    state: Arc<BarrierState>,
}

impl SharedBarriers {
    /// Attach to the barrier triple named `name`, creating it if this
    /// is the first attachment in the process.
    pub fn attach(name: &str) -> Self {
        let mut map = registry().lock();
        let state = map
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(BarrierState::new()))
            .clone();
        SharedBarriers { state }
    }

    /// Current value of the in-flight query counter. For tests and
    /// diagnostics only; never used for control flow decisions
    /// elsewhere in the gate, since it can be stale the instant it is
    /// read.
    pub fn number_of_queries(&self) -> i64 {
        *self.state.query_mutex.lock()
    }

    /// Entry side of the gate protocol (§4.3 step 1): acquire
    /// `pending_update_mutex`, then `query_mutex`, release
    /// `pending_update_mutex`, increment the counter, release
    /// `query_mutex`.
    pub fn enter(&self) {
        let pending_guard = self.state.pending_update_mutex.lock();
        let mut count = self.state.query_mutex.lock();
        drop(pending_guard);
        *count += 1;
    }

    /// Leave side of the gate protocol (§4.3 step 6): acquire
    /// `query_mutex`, decrement, assert non-negative, broadcast the
    /// condition if the counter reached zero, release `query_mutex`.
    pub fn leave(&self) {
        let mut count = self.state.query_mutex.lock();
        *count -= 1;
        assert!(*count >= 0, "invalid number of queries");
        if *count == 0 {
            self.state.no_running_queries_condition.notify_all();
        }
    }

    /// Loader-side protocol (spec §4.5, steps 2-6): acquire
    /// `pending_update_mutex`, acquire `query_mutex`, wait on the
    /// condition until the counter is zero, run `swap` with both
    /// locks held, then release both.
    pub fn swap_when_drained(&self, swap: impl FnOnce()) {
        let _pending_guard = self.state.pending_update_mutex.lock();
        let mut count = self.state.query_mutex.lock();
        while *count != 0 {
            self.state.no_running_queries_condition.wait(&mut count);
        }
        swap();
    }
}
