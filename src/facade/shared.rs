//! Shared facade and the control block it polls: a dataset attached
//! from a named region that can be hot-swapped to a newer generation
//! between queries.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::{RwLock, RwLockReadGuard};

use crate::dataset::Dataset;
use crate::error::{EngineError, Status};
use crate::facade::Facade;
use crate::revision::{AtomicGenerationId, AtomicRegionTag, GenerationId, RegionTag};

struct ControlBlockInner {
    current_region_tag: AtomicRegionTag,
    current_generation_id: AtomicGenerationId,
    region_a: RwLock<Option<Arc<Dataset>>>,
    region_b: RwLock<Option<Arc<Dataset>>>,
}

impl ControlBlockInner {
    fn new() -> Self {
        ControlBlockInner {
            current_region_tag: AtomicRegionTag::default(),
            current_generation_id: AtomicGenerationId::none(),
            region_a: RwLock::new(None),
            region_b: RwLock::new(None),
        }
    }

    fn slot(&self, tag: RegionTag) -> &RwLock<Option<Arc<Dataset>>> {
        match tag {
            RegionTag::A => &self.region_a,
            RegionTag::B => &self.region_b,
        }
    }
}

fn registry() -> &'static RwLock<HashMap<String, Arc<ControlBlockInner>>> {
    static REGISTRY: OnceLock<RwLock<HashMap<String, Arc<ControlBlockInner>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// The small, well-known control block every attached process polls:
/// current region tag and current generation id.
/// Creating or attaching is by name, mirroring the named-object
/// lifecycle of the barrier triple.
#[derive(Clone)]
pub struct ControlBlock {
    inner: Arc<ControlBlockInner>,
}

impl ControlBlock {
    /// Attach to the control block named `name`, creating it if this
    /// is the first attachment in the process.
    pub fn attach(name: &str) -> Self {
        {
            let existing = registry().read();
            if let Some(inner) = existing.get(name) {
                return ControlBlock {
                    inner: inner.clone(),
                };
            }
        }
        let mut map = registry().write();
        let inner = map
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(ControlBlockInner::new()))
            .clone();
        ControlBlock { inner }
    }

    /// An atomic snapshot of `(current_region_tag, current_generation_id)`.
    /// Readers tolerate torn reads by re-checking after taking the
    /// write lock in [`SharedFacade::check_and_reload`].
    pub fn snapshot(&self) -> (RegionTag, GenerationId) {
        (
            self.inner.current_region_tag.load(),
            self.inner.current_generation_id.load(),
        )
    }

    /// Publish `dataset` into the region that is *not* currently live,
    /// then flip the control block to make it current. Callers still
    /// need to wrap this in the drain-then-swap protocol implemented
    /// by [`crate::loader::Loader`] so in-flight readers aren't cut out
    /// from under themselves.
    pub fn publish(&self, dataset: Dataset) {
        let (current_tag, _) = self.snapshot();
        let staging_tag = current_tag.other();
        let generation = dataset.generation();
        *self.inner.slot(staging_tag).write() = Some(Arc::new(dataset));
        self.inner.current_generation_id.store(generation);
        self.inner.current_region_tag.store(staging_tag);
    }

    fn region(&self, tag: RegionTag) -> Option<Arc<Dataset>> {
        self.inner.slot(tag).read().clone()
    }
}

struct AttachedState {
    region: RegionTag,
    generation: GenerationId,
    dataset: Option<Arc<Dataset>>,
}

impl AttachedState {
    fn empty() -> Self {
        AttachedState {
            region: RegionTag::A,
            generation: GenerationId::none(),
            dataset: None,
        }
    }

    fn matches(&self, tag: RegionTag, generation: GenerationId) -> bool {
        self.dataset.is_some() && self.region == tag && self.generation == generation
    }
}

/// A facade attached to a dataset living in a named shared region.
/// Holds the currently attached region tag, generation id, and a
/// handle to the mapped dataset, all guarded by a per-process
/// read-write lock (`data_mutex`).
pub struct SharedFacade {
    control: ControlBlock,
    data_mutex: RwLock<AttachedState>,
}

impl SharedFacade {
    /// Attach (lazily) to the control block named `name`. No I/O or
    /// dataset resolution happens yet; the first query (or any query
    /// after a detected generation change) triggers re-attachment via
    /// [`Self::check_and_reload`].
    pub fn attach(name: &str) -> Self {
        SharedFacade {
            control: ControlBlock::attach(name),
            data_mutex: RwLock::new(AttachedState::empty()),
        }
    }

    /// The control block this facade polls, exposed so a
    /// [`crate::loader::Loader`] can publish new generations against
    /// the same named region.
    pub fn control_block(&self) -> &ControlBlock {
        &self.control
    }

    /// Compare the locally attached `(region, generation)` against
    /// the control block; if they
    /// differ, take the write lock and re-attach. Returns
    /// [`EngineError::DatasetUnavailable`] if the control block names
    /// a region with nothing published, or if the published dataset's
    /// own generation disagrees with the control block (integrity
    /// failure).
    pub fn check_and_reload(&self) -> Status<()> {
        let (tag, generation) = self.control.snapshot();
        {
            let read = self.data_mutex.read();
            if read.matches(tag, generation) {
                return Ok(());
            }
        }

        let mut write = self.data_mutex.write();
        let (tag, generation) = self.control.snapshot();
        if write.matches(tag, generation) {
            return Ok(());
        }

        let dataset = self.control.region(tag).ok_or_else(|| {
            EngineError::DatasetUnavailable(format!(
                "no dataset published in region {tag:?}"
            ))
        })?;
        if dataset.generation() != generation {
            return Err(EngineError::DatasetUnavailable(format!(
                "attached dataset generation {:?} does not match control block {:?}",
                dataset.generation(),
                generation
            )));
        }

        write.region = tag;
        write.generation = generation;
        write.dataset = Some(dataset);
        Ok(())
    }

    /// Acquire `data_mutex` in read mode and return a guard exposing
    /// the currently attached dataset. The query gate holds this
    /// guard for the duration of the plugin call so a concurrent
    /// `check_and_reload` cannot swap the attached
    /// dataset out from under an in-flight query.
    pub fn read_attached(&self) -> Status<SharedSnapshot<'_>> {
        let guard = self.data_mutex.read();
        if guard.dataset.is_none() {
            return Err(EngineError::DatasetUnavailable(
                "facade has no attached dataset".to_string(),
            ));
        }
        Ok(SharedSnapshot { guard })
    }
}

impl Facade for SharedFacade {
    fn current(&self) -> Status<Arc<Dataset>> {
        self.check_and_reload()?;
        let snapshot = self.read_attached()?;
        Ok(snapshot.dataset().clone())
    }

    fn attached_generation(&self) -> GenerationId {
        self.data_mutex.read().generation
    }
}

/// A read-locked view of the facade's currently attached dataset.
/// Dropping it releases `data_mutex`.
pub struct SharedSnapshot<'a> {
    guard: RwLockReadGuard<'a, AttachedState>,
}

impl<'a> SharedSnapshot<'a> {
    /// The attached dataset. `panic`s only if constructed outside
    /// [`SharedFacade::read_attached`], which never happens.
    pub fn dataset(&self) -> &Arc<Dataset> {
        self.guard
            .dataset
            .as_ref()
            .expect("SharedSnapshot constructed without an attached dataset")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::synthetic_line;

    #[test]
    fn query_before_any_publish_is_unavailable() {
        let facade = SharedFacade::attach("shared-facade-test-empty");
        assert!(facade.current().is_err());
    }

    #[test]
    fn publish_then_check_and_reload_attaches() {
        let facade = SharedFacade::attach("shared-facade-test-basic");
        facade
            .control_block()
            .publish(synthetic_line(GenerationId::first(), 3));

        facade.check_and_reload().unwrap();
        assert_eq!(facade.attached_generation(), GenerationId::first());
        assert_eq!(facade.current().unwrap().node_count(), 3);
    }

    #[test]
    fn second_check_and_reload_is_a_fast_path_noop() {
        let facade = SharedFacade::attach("shared-facade-test-fastpath");
        facade
            .control_block()
            .publish(synthetic_line(GenerationId::first(), 3));
        facade.check_and_reload().unwrap();
        let first = facade.current().unwrap();

        // No new generation published: re-checking must not replace
        // the attached Arc (same pointer identity).
        facade.check_and_reload().unwrap();
        let second = facade.current().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn republish_bumps_generation_and_reattaches() {
        let facade = SharedFacade::attach("shared-facade-test-republish");
        facade
            .control_block()
            .publish(synthetic_line(GenerationId::first(), 3));
        facade.check_and_reload().unwrap();
        assert_eq!(facade.attached_generation(), GenerationId::first());

        facade
            .control_block()
            .publish(synthetic_line(GenerationId::first().next(), 5));
        facade.check_and_reload().unwrap();
        assert_eq!(facade.attached_generation(), GenerationId::first().next());
        assert_eq!(facade.current().unwrap().node_count(), 5);
    }
}
