//! Rotating set of lit tile indices
//!
//! Each grid keeps up to `K` of its tile slots lit. On every rotation tick the
//! oldest lit slot is dropped and one uniformly chosen unlit slot is lit in
//! its place, giving a steady one-slot churn per tick.

use std::collections::VecDeque;

use serde::Serialize;
use thiserror::Error;
use tracing::trace;

use crate::models::{GridId, Wake};
use crate::shuffle::{sample_distinct, RandomSource};
use crate::timer::{Millis, TimerHandle, Timers};

/// Reference number of lit tiles per grid.
pub const DEFAULT_LIT_COUNT: usize = 3;

/// Reference rotation period.
pub const DEFAULT_ROTATION_MS: Millis = 850;

/// Why an explicit lit order was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LitSetError {
    #[error("lit index {index} is outside 0..{domain}")]
    OutOfRange { index: usize, domain: usize },
    #[error("lit index {0} appears more than once")]
    Duplicate(usize),
    #[error("{len} lit indices exceed capacity {capacity}")]
    OverCapacity { len: usize, capacity: usize },
}

/// One rotation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rotation {
    /// Oldest index, switched off
    pub dropped: usize,
    /// Newly lit index
    pub lit: usize,
}

/// Ordered, bounded set of lit indices over `0..domain`.
///
/// Invariants: `len() <= capacity`, no duplicates, every index `< domain`.
/// Order is insertion order; the front is the oldest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LitSet {
    capacity: usize,
    domain: usize,
    order: VecDeque<usize>,
}

impl LitSet {
    /// An empty set over an empty domain.
    pub fn empty(capacity: usize) -> Self {
        Self { capacity, domain: 0, order: VecDeque::new() }
    }

    /// Seed `min(capacity, domain)` distinct indices uniformly at random.
    pub fn seeded<R: RandomSource + ?Sized>(capacity: usize, domain: usize, rng: &mut R) -> Self {
        let order = sample_distinct(domain, capacity, rng).into();
        Self { capacity, domain, order }
    }

    /// Build a set from an explicit order, oldest first.
    pub fn from_order(
        capacity: usize,
        domain: usize,
        order: impl IntoIterator<Item = usize>,
    ) -> Result<Self, LitSetError> {
        let mut set = Self { capacity, domain, order: VecDeque::new() };
        for index in order {
            if index >= domain {
                return Err(LitSetError::OutOfRange { index, domain });
            }
            if set.contains(index) {
                return Err(LitSetError::Duplicate(index));
            }
            set.order.push_back(index);
        }
        if set.order.len() > capacity {
            return Err(LitSetError::OverCapacity { len: set.order.len(), capacity });
        }
        Ok(set)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of tile slots the indices range over.
    pub fn domain(&self) -> usize {
        self.domain
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.order.contains(&index)
    }

    /// Lit indices, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.order.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.order.iter().copied().collect()
    }

    /// Indices in `0..domain` that are not lit, ascending.
    pub fn off_indices(&self) -> Vec<usize> {
        (0..self.domain).filter(|i| !self.contains(*i)).collect()
    }

    /// Drop the oldest lit index and light one random unlit index.
    ///
    /// No-op (returns `None`) when nothing is lit or every slot is lit.
    pub fn rotate<R: RandomSource + ?Sized>(&mut self, rng: &mut R) -> Option<Rotation> {
        if self.order.is_empty() {
            return None;
        }
        let off = self.off_indices();
        if off.is_empty() {
            return None;
        }
        let lit = off[rng.below(off.len())];
        let dropped = self.order.pop_front()?;
        self.order.push_back(lit);
        Some(Rotation { dropped, lit })
    }
}

/// A grid's lit set plus the interval timer that rotates it.
#[derive(Debug, Clone)]
pub struct LitRotation {
    grid: GridId,
    period_ms: Millis,
    set: LitSet,
    timer: Option<TimerHandle>,
}

impl LitRotation {
    /// An idle scheduler with an empty set; call [`LitRotation::reseed`] to start.
    pub fn new(grid: GridId, capacity: usize, period_ms: Millis) -> Self {
        Self { grid, period_ms, set: LitSet::empty(capacity), timer: None }
    }

    pub fn set(&self) -> &LitSet {
        &self.set
    }

    pub fn contains(&self, index: usize) -> bool {
        self.set.contains(index)
    }

    pub fn timer(&self) -> Option<TimerHandle> {
        self.timer
    }

    /// Replace the set with a fresh seed over `domain` slots and restart the
    /// rotation timer.
    pub fn reseed<R: RandomSource + ?Sized>(&mut self, domain: usize, timers: &mut Timers<Wake>, rng: &mut R) {
        self.stop(timers);
        self.set = LitSet::seeded(self.set.capacity(), domain, rng);
        if domain > 0 {
            self.timer = Some(timers.set_interval(self.period_ms, Wake::Rotate(self.grid)));
        }
        trace!(grid = %self.grid, lit = ?self.set.to_vec(), "lit set seeded");
    }

    /// Replace the set with an explicit one and restart the rotation timer.
    pub fn replace(&mut self, set: LitSet, timers: &mut Timers<Wake>) {
        self.stop(timers);
        let domain = set.domain();
        self.set = set;
        if domain > 0 {
            self.timer = Some(timers.set_interval(self.period_ms, Wake::Rotate(self.grid)));
        }
    }

    /// Run one rotation tick.
    pub fn on_tick<R: RandomSource + ?Sized>(&mut self, rng: &mut R) -> Option<Rotation> {
        let rotation = self.set.rotate(rng);
        if let Some(r) = rotation {
            trace!(grid = %self.grid, dropped = r.dropped, lit = r.lit, "lit set rotated");
        }
        rotation
    }

    /// Cancel the rotation timer.
    pub fn stop(&mut self, timers: &mut Timers<Wake>) {
        if let Some(handle) = self.timer.take() {
            timers.cancel(handle);
        }
    }
}
