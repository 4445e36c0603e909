//! Collection grid composer
//!
//! A [`CollectionGrid`] shuffles its collection once when mounted, shows the
//! first `visibleCount = min(items, columns × rows)` items of that shuffle as
//! tiles, and drives each tile's on/off signal from a rotating lit set.
//!
//! Column changes only re-slice the fixed shuffle. Tiles in the common prefix
//! keep their state; tiles past the new count are torn down and new tail
//! tiles are mounted. Any change of `visibleCount` reseeds the lit set.

use image::{imageops, RgbaImage};
use serde::Serialize;
use tracing::{debug, warn};

use crate::columns::{ColumnLayout, ColumnTracker};
use crate::image_source::ImageLoader;
use crate::lit_set::{LitRotation, LitSet, Rotation};
use crate::models::{Collection, GridId, RewardItem, TileId, Wake};
use crate::reveal::{RevealPhase, RevealTiming};
use crate::shuffle::{shuffled, RandomSource};
use crate::tile::{RewardTile, TileSpec};
use crate::timer::{Millis, Timers};

/// Grid settings shared by every collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSettings {
    pub layout: ColumnLayout,
    /// Rows of tiles per grid
    pub rows: usize,
    /// Columns assumed before the first width observation
    pub initial_columns: usize,
    /// Lit tiles per grid (`K`)
    pub lit_count: usize,
    pub rotation_ms: Millis,
    pub timing: RevealTiming,
    /// Image substituted when a tile's own image fails to load
    pub fallback_source: String,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            layout: ColumnLayout::default(),
            rows: 1,
            initial_columns: crate::columns::DEFAULT_INITIAL_COLUMNS,
            lit_count: crate::lit_set::DEFAULT_LIT_COUNT,
            rotation_ms: crate::lit_set::DEFAULT_ROTATION_MS,
            timing: RevealTiming::default(),
            fallback_source: crate::image_source::DEFAULT_FALLBACK_SOURCE.to_string(),
        }
    }
}

/// Layout-facing state of a grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridSummary {
    pub id: String,
    pub title: String,
    pub ribbon: String,
    pub included: bool,
    pub columns: usize,
    pub visible: usize,
    pub more_count: usize,
    /// Lit slot indices, oldest first
    pub lit: Vec<usize>,
    pub phases: Vec<RevealPhase>,
}

/// Number of items shown for a collection of `total` items.
pub fn visible_count(total: usize, columns: usize, rows: usize) -> usize {
    total.min(columns.max(1) * rows)
}

/// A mounted collection grid.
#[derive(Debug)]
pub struct CollectionGrid<'c> {
    id: GridId,
    collection: &'c Collection,
    settings: GridSettings,
    order: Vec<&'c RewardItem>,
    columns: ColumnTracker,
    visible: usize,
    lit: LitRotation,
    tiles: Vec<RewardTile<'c>>,
    next_serial: u64,
}

impl<'c> CollectionGrid<'c> {
    /// Mount a grid: shuffle the collection, mount the initially visible
    /// tiles, seed the lit set and start rotating it.
    pub fn mount<R: RandomSource + ?Sized>(
        id: GridId,
        collection: &'c Collection,
        settings: GridSettings,
        loader: &dyn ImageLoader,
        timers: &mut Timers<Wake>,
        rng: &mut R,
    ) -> Self {
        let all: Vec<&'c RewardItem> = collection.items.iter().collect();
        let order = shuffled(&all, rng);
        let columns = ColumnTracker::new(settings.layout, settings.initial_columns);
        let lit = LitRotation::new(id, settings.lit_count, settings.rotation_ms);
        let mut grid = Self {
            id,
            collection,
            settings,
            order,
            columns,
            visible: 0,
            lit,
            tiles: Vec::new(),
            next_serial: 0,
        };
        let target = visible_count(grid.order.len(), grid.columns.columns(), grid.settings.rows);
        grid.resample(target, loader, timers, rng);
        debug!(grid = %id, collection = %collection.id, visible = grid.visible, "grid mounted");
        grid
    }

    pub fn id(&self) -> GridId {
        self.id
    }

    pub fn collection(&self) -> &'c Collection {
        self.collection
    }

    pub fn columns(&self) -> usize {
        self.columns.columns()
    }

    /// Number of tiles currently shown.
    pub fn visible_count(&self) -> usize {
        self.visible
    }

    /// Items not shown, for the "+ N more" label.
    pub fn more_count(&self) -> usize {
        self.collection.items.len().saturating_sub(self.visible)
    }

    /// The full shuffle fixed at mount.
    pub fn shuffled_items(&self) -> &[&'c RewardItem] {
        &self.order
    }

    /// Items currently shown, in slot order.
    pub fn sampled_items(&self) -> &[&'c RewardItem] {
        &self.order[..self.visible]
    }

    pub fn lit(&self) -> &LitSet {
        self.lit.set()
    }

    pub fn tiles(&self) -> &[RewardTile<'c>] {
        &self.tiles
    }

    pub fn tile(&self, id: TileId) -> Option<&RewardTile<'c>> {
        self.tiles.iter().find(|t| t.id() == id)
    }

    /// Outstanding timers owned by this grid and its tiles.
    pub fn timer_count(&self) -> usize {
        let tiles = self
            .tiles
            .iter()
            .map(|t| t.reveal().reveal_timer().is_some() as usize + t.reveal().hide_timer().is_some() as usize)
            .sum::<usize>();
        tiles + self.lit.timer().is_some() as usize
    }

    /// Apply a container width observation.
    ///
    /// Returns `true` when the visible tile set changed.
    pub fn observe_width<R: RandomSource + ?Sized>(
        &mut self,
        width: u32,
        loader: &dyn ImageLoader,
        timers: &mut Timers<Wake>,
        rng: &mut R,
    ) -> bool {
        let Some(columns) = self.columns.observe(width) else {
            return false;
        };
        let target = visible_count(self.order.len(), columns, self.settings.rows);
        debug!(grid = %self.id, width, columns, visible = target, "columns changed");
        if target == self.visible {
            return false;
        }
        self.resample(target, loader, timers, rng);
        true
    }

    /// Replace the lit set with an explicit one and push the new membership to
    /// the tiles.
    pub fn set_lit<R: RandomSource + ?Sized>(&mut self, set: LitSet, timers: &mut Timers<Wake>, rng: &mut R) {
        self.lit.replace(set, timers);
        self.sync_tiles(timers, rng);
    }

    /// Rotation timer fired.
    pub fn on_rotate<R: RandomSource + ?Sized>(&mut self, timers: &mut Timers<Wake>, rng: &mut R) -> Option<Rotation> {
        let rotation = self.lit.on_tick(rng)?;
        for slot in [rotation.dropped, rotation.lit] {
            let on = self.lit.contains(slot);
            if let Some(tile) = self.tiles.get_mut(slot) {
                tile.set_on(on, timers, rng);
            }
        }
        Some(rotation)
    }

    /// Reveal tick fired for one of this grid's tiles.
    pub fn on_reveal_tick(&mut self, id: TileId, timers: &mut Timers<Wake>) -> bool {
        match self.tiles.iter_mut().find(|t| t.id() == id) {
            Some(tile) => tile.reveal_mut().on_reveal_tick(timers).is_some(),
            None => {
                warn!(tile = %id, "reveal tick for unmounted tile");
                false
            }
        }
    }

    /// Hide delay elapsed for one of this grid's tiles.
    pub fn on_hide_elapsed(&mut self, id: TileId) -> bool {
        match self.tiles.iter_mut().find(|t| t.id() == id) {
            Some(tile) => tile.reveal_mut().on_hide_elapsed(),
            None => {
                warn!(tile = %id, "clear for unmounted tile");
                false
            }
        }
    }

    /// Unmount: cancel the rotation timer and every tile timer.
    pub fn teardown(&mut self, timers: &mut Timers<Wake>) {
        self.lit.stop(timers);
        for tile in &mut self.tiles {
            tile.teardown(timers);
        }
        self.tiles.clear();
        debug!(grid = %self.id, "grid unmounted");
    }

    pub fn summary(&self) -> GridSummary {
        GridSummary {
            id: self.collection.id.clone(),
            title: self.collection.title.clone(),
            ribbon: self.collection.ribbon_text.clone(),
            included: self.collection.is_included_by_default,
            columns: self.columns(),
            visible: self.visible,
            more_count: self.more_count(),
            lit: self.lit.set().to_vec(),
            phases: self.tiles.iter().map(|t| t.phase()).collect(),
        }
    }

    /// Render every tile (backdrop plus reveal surface) into one frame laid
    /// out as `columns × rows` cells separated by the gap.
    pub fn render_frame(&self) -> RgbaImage {
        let layout = self.settings.layout;
        let columns = self.columns().min(self.visible.max(1));
        let rows = self.visible.div_ceil(columns).max(1) as u32;
        let pitch = layout.tile_size + layout.gap;
        let width = layout.row_width(columns).max(1);
        let height = rows * layout.tile_size + (rows - 1) * layout.gap;

        let mut frame = RgbaImage::new(width, height.max(1));
        for (slot, tile) in self.tiles.iter().enumerate() {
            let x = (slot % columns) as u32 * pitch;
            let y = (slot / columns) as u32 * pitch;
            imageops::overlay(&mut frame, &tile.composite(), x as i64, y as i64);
        }
        frame
    }

    fn tile_spec(&self) -> TileSpec {
        TileSpec {
            size: self.settings.layout.tile_size,
            style: self.collection.silhouette_style,
            timing: self.settings.timing,
        }
    }

    fn resample<R: RandomSource + ?Sized>(
        &mut self,
        target: usize,
        loader: &dyn ImageLoader,
        timers: &mut Timers<Wake>,
        rng: &mut R,
    ) {
        for mut tile in self.tiles.drain(target.min(self.tiles.len())..) {
            tile.teardown(timers);
        }
        let spec = self.tile_spec();
        for slot in self.tiles.len()..target {
            let id = TileId { grid: self.id, serial: self.next_serial };
            self.next_serial += 1;
            let item = self.order[slot];
            self.tiles.push(RewardTile::mount(id, item, slot, spec, loader, &self.settings.fallback_source));
        }
        self.visible = target;

        self.lit.reseed(target, timers, rng);
        self.sync_tiles(timers, rng);
    }

    fn sync_tiles<R: RandomSource + ?Sized>(&mut self, timers: &mut Timers<Wake>, rng: &mut R) {
        for (slot, tile) in self.tiles.iter_mut().enumerate() {
            tile.set_on(self.lit.contains(slot), timers, rng);
        }
    }
}
