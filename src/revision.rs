//! Generation identifiers and the region tag that names which of the
//! two shared-memory slots currently holds the live dataset.
//!
//! Mirrors the teacher crate's `Revision`/`AtomicRevision` pair: a
//! plain `Copy` value type for passing around and comparing, plus an
//! atomic wrapper for the single shared counter that every thread
//! reads without taking a lock.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

/// A monotonically increasing dataset version number.
///
/// Two datasets are "the same" iff their generation ids are equal;
/// a query that observed generation `g` at first facade access must
/// observe `g` for the remainder of its lifetime (invariant 3, §3).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct GenerationId(u64);

impl GenerationId {
    /// The generation id assigned before any dataset has ever been
    /// published.
    pub const fn none() -> Self {
        GenerationId(0)
    }

    /// The first real generation id a loader can publish.
    pub const fn first() -> Self {
        GenerationId(1)
    }

    /// The generation that follows this one.
    pub fn next(self) -> Self {
        GenerationId(self.0 + 1)
    }

    /// Raw numeric value, useful for logging and wire encodings.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for GenerationId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "GenerationId({})", self.0)
    }
}

impl From<u64> for GenerationId {
    fn from(value: u64) -> Self {
        GenerationId(value)
    }
}

/// An atomic cell holding a [`GenerationId`], used for the control
/// block field every reader polls without locking.
#[derive(Default)]
pub struct AtomicGenerationId {
    value: AtomicU64,
}

impl AtomicGenerationId {
    /// A fresh cell starting at [`GenerationId::none`].
    pub const fn none() -> Self {
        AtomicGenerationId {
            value: AtomicU64::new(0),
        }
    }

    /// Read the current value. Readers tolerate torn reads by
    /// re-checking against the region tag (see `shared` facade).
    pub fn load(&self) -> GenerationId {
        GenerationId(self.value.load(Ordering::SeqCst))
    }

    /// Overwrite the value.
    pub fn store(&self, value: GenerationId) {
        self.value.store(value.0, Ordering::SeqCst);
    }
}

impl fmt::Debug for AtomicGenerationId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_tuple("AtomicGenerationId").field(&self.load()).finish()
    }
}

/// Identifies which of the two shared-memory regions is "current".
///
/// The source's control block uses a plain flip between two slots; a
/// third staging region, if ever desired, only widens this enum.
/// The gate protocol is unaffected (§9, open question).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum RegionTag {
    /// Shared-memory slot `0`.
    A = 0,
    /// Shared-memory slot `1`.
    B = 1,
}

impl RegionTag {
    /// The slot that is not `self`.
    pub fn other(self) -> Self {
        match self {
            RegionTag::A => RegionTag::B,
            RegionTag::B => RegionTag::A,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => RegionTag::A,
            _ => RegionTag::B,
        }
    }
}

/// An atomic cell holding a [`RegionTag`].
pub struct AtomicRegionTag {
    value: AtomicU8,
}

impl AtomicRegionTag {
    /// A fresh cell starting at [`RegionTag::A`].
    pub const fn new(initial: RegionTag) -> Self {
        AtomicRegionTag {
            value: AtomicU8::new(initial as u8),
        }
    }

    /// Read the current tag.
    pub fn load(&self) -> RegionTag {
        RegionTag::from_u8(self.value.load(Ordering::SeqCst))
    }

    /// Overwrite the tag.
    pub fn store(&self, value: RegionTag) {
        self.value.store(value as u8, Ordering::SeqCst);
    }
}

impl Default for AtomicRegionTag {
    fn default() -> Self {
        AtomicRegionTag::new(RegionTag::A)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_ids_order_monotonically() {
        let g0 = GenerationId::none();
        let g1 = GenerationId::first();
        assert!(g0 < g1);
        assert_eq!(g1.next().as_u64(), 2);
    }

    #[test]
    fn region_tag_flips() {
        assert_eq!(RegionTag::A.other(), RegionTag::B);
        assert_eq!(RegionTag::B.other(), RegionTag::A);
    }

    #[test]
    fn atomic_cells_round_trip() {
        let cell = AtomicGenerationId::none();
        cell.store(GenerationId::from(42));
        assert_eq!(cell.load().as_u64(), 42);

        let tag = AtomicRegionTag::new(RegionTag::A);
        tag.store(RegionTag::B);
        assert_eq!(tag.load(), RegionTag::B);
    }
}
