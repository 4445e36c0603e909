//! Showcase driver
//!
//! Mounts one [`CollectionGrid`] per catalog collection and owns everything
//! they share: the virtual timer queue, the random source and the image
//! loader. Time only moves when [`Showcase::advance_to`] is called, which
//! dispatches due wake-ups one at a time in deadline order.

use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::grid::{CollectionGrid, GridSettings, GridSummary};
use crate::image_source::ImageLoader;
use crate::models::{GridId, TileId, Wake};
use crate::shuffle::RandomSource;
use crate::timer::{Millis, Timers};

/// Counts of wake-ups handled by one [`Showcase::advance_to`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dispatched {
    pub chunks: usize,
    pub clears: usize,
    pub rotations: usize,
    /// Wake-ups addressed to nothing mounted
    pub stray: usize,
}

/// Every collection grid of a page, driven on a shared virtual clock.
pub struct Showcase<'c, R: RandomSource> {
    timers: Timers<Wake>,
    grids: Vec<CollectionGrid<'c>>,
    loader: &'c dyn ImageLoader,
    rng: R,
}

impl<'c, R: RandomSource> Showcase<'c, R> {
    /// Mount a grid for each collection in `catalog`, in catalog order.
    pub fn new(catalog: &'c Catalog, settings: GridSettings, loader: &'c dyn ImageLoader, mut rng: R) -> Self {
        let mut timers = Timers::new();
        let grids = catalog
            .collections()
            .iter()
            .enumerate()
            .map(|(index, collection)| {
                CollectionGrid::mount(GridId(index as u32), collection, settings.clone(), loader, &mut timers, &mut rng)
            })
            .collect::<Vec<_>>();
        debug!(grids = grids.len(), timers = timers.len(), "showcase mounted");
        Self { timers, grids, loader, rng }
    }

    /// Current virtual time.
    pub fn now(&self) -> Millis {
        self.timers.now()
    }

    pub fn grids(&self) -> &[CollectionGrid<'c>] {
        &self.grids
    }

    pub fn grid(&self, id: GridId) -> Option<&CollectionGrid<'c>> {
        self.grids.iter().find(|g| g.id() == id)
    }

    /// Look a grid up by its collection id.
    pub fn grid_for(&self, collection_id: &str) -> Option<&CollectionGrid<'c>> {
        self.grids.iter().find(|g| g.collection().id == collection_id)
    }

    /// Mutable access for scripted scenarios (e.g. pinning a lit set).
    pub fn grid_mut(&mut self, id: GridId) -> Option<(&mut CollectionGrid<'c>, &mut Timers<Wake>, &mut R)> {
        let grid = self.grids.iter_mut().find(|g| g.id() == id)?;
        Some((grid, &mut self.timers, &mut self.rng))
    }

    pub fn summaries(&self) -> Vec<GridSummary> {
        self.grids.iter().map(CollectionGrid::summary).collect()
    }

    /// Outstanding timers across every grid and tile.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Apply a container width observation to every grid.
    ///
    /// Returns how many grids changed their visible tiles.
    pub fn resize(&mut self, width: u32) -> usize {
        let mut changed = 0;
        for grid in &mut self.grids {
            if grid.observe_width(width, self.loader, &mut self.timers, &mut self.rng) {
                changed += 1;
            }
        }
        changed
    }

    /// Run every wake-up due at or before `until`, then move the clock there.
    pub fn advance_to(&mut self, until: Millis) -> Dispatched {
        let mut dispatched = Dispatched::default();
        while let Some(due) = self.timers.pop_due(until) {
            self.dispatch(due.payload, &mut dispatched);
        }
        self.timers.advance_to(until);
        dispatched
    }

    /// Advance the clock by `delta` milliseconds.
    pub fn advance_by(&mut self, delta: Millis) -> Dispatched {
        self.advance_to(self.now().saturating_add(delta))
    }

    /// Unmount every grid. No timers remain afterwards.
    pub fn teardown(&mut self) {
        for grid in &mut self.grids {
            grid.teardown(&mut self.timers);
        }
        debug!(remaining = self.timers.len(), "showcase torn down");
    }

    fn dispatch(&mut self, wake: Wake, dispatched: &mut Dispatched) {
        match wake {
            Wake::RevealTick(tile) => match self.grid_index(tile) {
                Some(i) => {
                    if self.grids[i].on_reveal_tick(tile, &mut self.timers) {
                        dispatched.chunks += 1;
                    }
                }
                None => Self::stray(wake, dispatched),
            },
            Wake::ClearSurface(tile) => match self.grid_index(tile) {
                Some(i) => {
                    if self.grids[i].on_hide_elapsed(tile) {
                        dispatched.clears += 1;
                    }
                }
                None => Self::stray(wake, dispatched),
            },
            Wake::Rotate(id) => match self.grids.iter_mut().find(|g| g.id() == id) {
                Some(grid) => {
                    if grid.on_rotate(&mut self.timers, &mut self.rng).is_some() {
                        dispatched.rotations += 1;
                    }
                }
                None => Self::stray(wake, dispatched),
            },
        }
    }

    fn grid_index(&self, tile: TileId) -> Option<usize> {
        self.grids.iter().position(|g| g.id() == tile.grid)
    }

    fn stray(wake: Wake, dispatched: &mut Dispatched) {
        warn!(?wake, "wake-up for unmounted target ignored");
        dispatched.stray += 1;
    }
}
