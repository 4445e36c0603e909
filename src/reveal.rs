//! Chunked reveal renderer
//!
//! Paints a tile's image onto its visible surface in randomly ordered,
//! grid-aligned square chunks, one chunk per timer tick, and clears it again
//! after a grace delay when the tile is switched off.
//!
//! # Phases
//!
//! ```text
//!            activate                 last chunk painted
//!   Idle ─────────────▶ Revealing ─────────────────────▶ Revealed
//!    ▲                      │                               │
//!    │ grace delay          │ deactivate                    │ deactivate
//!    │ elapsed              ▼                               │
//!    └──────────────────  Hiding ◀──────────────────────────┘
//!                           │
//!                           │ activate (cancels the pending clear,
//!                           ▼           restarts from a blank surface)
//!                       Revealing
//! ```
//!
//! Each renderer owns at most one reveal-tick interval and one hide-delay
//! timeout at a time. [`ChunkedReveal::teardown`] cancels both.

use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use serde::Serialize;
use tracing::{debug, trace};

use crate::models::{TileId, Wake};
use crate::shuffle::{shuffle, RandomSource};
use crate::timer::{Millis, TimerHandle, Timers};

/// Smallest chunk side in pixels.
pub const MIN_CHUNK_SIZE: u32 = 2;

/// The surface is split into roughly this many chunks per side.
pub const CHUNKS_PER_SIDE: u32 = 16;

/// Reference interval between chunk paints.
pub const DEFAULT_REVEAL_TICK_MS: Millis = 5;

/// Reference delay between switching off and clearing the surface.
pub const DEFAULT_HIDE_DELAY_MS: Millis = 700;

const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Position of a chunk in chunk units (not pixels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ChunkCoord {
    pub col: u32,
    pub row: u32,
}

/// How a square surface is partitioned into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkGrid {
    /// Surface side in pixels
    pub size: u32,
    /// Chunk side in pixels, `max(2, floor(size / 16))`
    pub chunk: u32,
    pub cols: u32,
    pub rows: u32,
}

impl ChunkGrid {
    /// Partition a `size × size` surface.
    ///
    /// Pixels past `cols * chunk` on either axis are never painted; for
    /// sizes below the minimum chunk the grid is empty.
    pub fn for_size(size: u32) -> Self {
        let chunk = (size / CHUNKS_PER_SIDE).max(MIN_CHUNK_SIZE);
        let cols = size / chunk;
        Self { size, chunk, cols, rows: cols }
    }

    /// Total number of chunks.
    pub fn len(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Side length in pixels covered by whole chunks.
    pub fn covered(&self) -> u32 {
        self.cols * self.chunk
    }

    /// Every chunk coordinate, row-major.
    pub fn coords(&self) -> Vec<ChunkCoord> {
        (0..self.rows).flat_map(|row| (0..self.cols).map(move |col| ChunkCoord { col, row })).collect()
    }

    /// Every chunk coordinate in uniformly random order.
    pub fn shuffled_coords<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Vec<ChunkCoord> {
        let mut coords = self.coords();
        shuffle(&mut coords, rng);
        coords
    }

    /// Pixel origin of a chunk.
    pub fn origin(&self, coord: ChunkCoord) -> (u32, u32) {
        (coord.col * self.chunk, coord.row * self.chunk)
    }
}

/// Reveal state of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RevealPhase {
    /// Surface blank, nothing scheduled
    Idle,
    /// Chunks are being painted
    Revealing,
    /// Every chunk painted
    Revealed,
    /// Switched off; surface clears when the grace delay elapses
    Hiding,
}

/// Timing of the reveal and hide animations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealTiming {
    pub tick_ms: Millis,
    pub hide_delay_ms: Millis,
}

impl Default for RevealTiming {
    fn default() -> Self {
        Self { tick_ms: DEFAULT_REVEAL_TICK_MS, hide_delay_ms: DEFAULT_HIDE_DELAY_MS }
    }
}

/// One in-flight reveal: the chunk order and a scratch copy of the image.
#[derive(Debug, Clone)]
struct RevealPass {
    order: Vec<ChunkCoord>,
    cursor: usize,
    offscreen: RgbaImage,
}

/// Per-tile reveal state machine.
#[derive(Debug, Clone)]
pub struct ChunkedReveal {
    id: TileId,
    grid: ChunkGrid,
    timing: RevealTiming,
    phase: RevealPhase,
    source: Option<RgbaImage>,
    surface: RgbaImage,
    pass: Option<RevealPass>,
    reveal_timer: Option<TimerHandle>,
    hide_timer: Option<TimerHandle>,
    /// Last observed desired-on signal, for edge detection
    was_on: bool,
}

impl ChunkedReveal {
    /// Create an idle renderer with a blank `size × size` surface.
    ///
    /// `source` is the fully loaded image (any dimensions; it is scaled to
    /// the surface at the start of each reveal). `None` leaves the tile
    /// permanently blank.
    pub fn new(id: TileId, size: u32, source: Option<RgbaImage>, timing: RevealTiming) -> Self {
        let size = size.max(1);
        Self {
            id,
            grid: ChunkGrid::for_size(size),
            timing,
            phase: RevealPhase::Idle,
            source,
            surface: RgbaImage::from_pixel(size, size, CLEAR),
            pass: None,
            reveal_timer: None,
            hide_timer: None,
            was_on: false,
        }
    }

    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    pub fn grid(&self) -> ChunkGrid {
        self.grid
    }

    /// Visible surface.
    pub fn surface(&self) -> &RgbaImage {
        &self.surface
    }

    /// Whether a source image is available to reveal.
    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Chunks painted so far in the current reveal.
    pub fn painted(&self) -> usize {
        match (&self.pass, self.phase) {
            (Some(pass), _) => pass.cursor,
            (None, RevealPhase::Revealed) => self.grid.len(),
            _ => 0,
        }
    }

    /// Remaining chunk order of the current reveal, if one is in flight.
    pub fn pending_chunks(&self) -> &[ChunkCoord] {
        self.pass.as_ref().map(|p| &p.order[p.cursor..]).unwrap_or(&[])
    }

    pub fn reveal_timer(&self) -> Option<TimerHandle> {
        self.reveal_timer
    }

    pub fn hide_timer(&self) -> Option<TimerHandle> {
        self.hide_timer
    }

    /// Feed the desired-on signal. Only a change of the signal acts:
    /// off→on activates, on→off deactivates, repeats are ignored.
    ///
    /// Returns whether anything was (re)scheduled.
    pub fn set_on<R: RandomSource + ?Sized>(&mut self, on: bool, timers: &mut Timers<Wake>, rng: &mut R) -> bool {
        let was_on = std::mem::replace(&mut self.was_on, on);
        match (was_on, on) {
            (false, true) => self.activate(timers, rng),
            (true, false) => self.deactivate(timers),
            _ => false,
        }
    }

    /// Start revealing.
    ///
    /// No-op while `Revealing` or `Revealed`. From `Hiding` the pending clear
    /// is canceled and the reveal restarts from a blank surface.
    pub fn activate<R: RandomSource + ?Sized>(&mut self, timers: &mut Timers<Wake>, rng: &mut R) -> bool {
        if matches!(self.phase, RevealPhase::Revealing | RevealPhase::Revealed) {
            return false;
        }
        let size = self.grid.size;
        let offscreen = match &self.source {
            Some(source) if source.dimensions() == (size, size) => source.clone(),
            Some(source) => image::imageops::resize(source, size, size, FilterType::Nearest),
            None => {
                debug!(tile = %self.id, "activate ignored: no image");
                return false;
            }
        };

        self.cancel_hide(timers);
        self.cancel_reveal(timers);
        clear(&mut self.surface);

        let order = self.grid.shuffled_coords(rng);
        if order.is_empty() {
            self.phase = RevealPhase::Revealed;
            debug!(tile = %self.id, "revealed (no chunks)");
            return true;
        }

        debug!(tile = %self.id, chunks = order.len(), "reveal started");
        self.pass = Some(RevealPass { order, cursor: 0, offscreen });
        self.reveal_timer = Some(timers.set_interval(self.timing.tick_ms, Wake::RevealTick(self.id)));
        self.phase = RevealPhase::Revealing;
        true
    }

    /// Stop revealing and schedule the surface to clear after the grace delay.
    ///
    /// Already painted chunks stay visible until the clear. No-op while
    /// `Idle` or already `Hiding`.
    pub fn deactivate(&mut self, timers: &mut Timers<Wake>) -> bool {
        if matches!(self.phase, RevealPhase::Idle | RevealPhase::Hiding) {
            return false;
        }
        self.cancel_reveal(timers);
        self.cancel_hide(timers);
        self.hide_timer = Some(timers.set_timeout(self.timing.hide_delay_ms, Wake::ClearSurface(self.id)));
        self.phase = RevealPhase::Hiding;
        debug!(tile = %self.id, "hiding");
        true
    }

    /// Paint the next chunk. Called when the reveal-tick interval fires.
    ///
    /// Returns the chunk painted, or `None` for a stale tick.
    pub fn on_reveal_tick(&mut self, timers: &mut Timers<Wake>) -> Option<ChunkCoord> {
        if self.phase != RevealPhase::Revealing {
            return None;
        }
        let pass = self.pass.as_mut()?;
        let coord = *pass.order.get(pass.cursor)?;
        let (x0, y0) = self.grid.origin(coord);
        let chunk = self.grid.chunk;
        for y in y0..y0 + chunk {
            for x in x0..x0 + chunk {
                self.surface.put_pixel(x, y, *pass.offscreen.get_pixel(x, y));
            }
        }
        pass.cursor += 1;
        trace!(tile = %self.id, col = coord.col, row = coord.row, "chunk painted");

        if pass.cursor >= pass.order.len() {
            self.cancel_reveal(timers);
            self.pass = None;
            self.phase = RevealPhase::Revealed;
            debug!(tile = %self.id, "revealed");
        }
        Some(coord)
    }

    /// Clear the surface. Called when the hide-delay timeout fires.
    pub fn on_hide_elapsed(&mut self) -> bool {
        if self.phase != RevealPhase::Hiding {
            return false;
        }
        self.hide_timer = None;
        clear(&mut self.surface);
        self.phase = RevealPhase::Idle;
        debug!(tile = %self.id, "cleared");
        true
    }

    /// Cancel every outstanding timer. The renderer must not be used after.
    pub fn teardown(&mut self, timers: &mut Timers<Wake>) {
        self.cancel_reveal(timers);
        self.cancel_hide(timers);
    }

    fn cancel_reveal(&mut self, timers: &mut Timers<Wake>) {
        if let Some(handle) = self.reveal_timer.take() {
            timers.cancel(handle);
        }
        self.pass = None;
    }

    fn cancel_hide(&mut self, timers: &mut Timers<Wake>) {
        if let Some(handle) = self.hide_timer.take() {
            timers.cancel(handle);
        }
    }
}

fn clear(surface: &mut RgbaImage) {
    for pixel in surface.pixels_mut() {
        *pixel = CLEAR;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GridId;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn tile_id() -> TileId {
        TileId { grid: GridId(0), serial: 1 }
    }

    fn renderer(size: u32) -> ChunkedReveal {
        ChunkedReveal::new(tile_id(), size, Some(RgbaImage::from_pixel(size, size, RED)), RevealTiming::default())
    }

    /// Fire every due reveal tick up to `until`, returning the painted chunks.
    fn run_ticks(reveal: &mut ChunkedReveal, timers: &mut Timers<Wake>, until: Millis) -> Vec<ChunkCoord> {
        let mut painted = Vec::new();
        while let Some(due) = timers.pop_due(until) {
            match due.payload {
                Wake::RevealTick(_) => painted.extend(reveal.on_reveal_tick(timers)),
                Wake::ClearSurface(_) => {
                    reveal.on_hide_elapsed();
                }
                Wake::Rotate(_) => {}
            }
        }
        timers.advance_to(until);
        painted
    }

    fn opaque_pixels(surface: &RgbaImage) -> usize {
        surface.pixels().filter(|p| p.0[3] != 0).count()
    }

    #[test]
    fn test_chunk_grid_sizes() {
        for size in 2..=300 {
            let grid = ChunkGrid::for_size(size);
            assert_eq!(grid.chunk, (size / 16).max(2), "size {}", size);
            assert_eq!(grid.cols, size / grid.chunk);
            assert_eq!(grid.rows, grid.cols);
            assert!(grid.covered() <= size);
            // Uncovered remainder is smaller than one chunk
            assert!(size - grid.covered() < grid.chunk);
        }
    }

    #[test]
    fn test_chunk_grid_reference_tile() {
        let grid = ChunkGrid::for_size(128);
        assert_eq!(grid.chunk, 8);
        assert_eq!(grid.cols, 16);
        assert_eq!(grid.len(), 256);
        assert_eq!(grid.covered(), 128);
    }

    #[test]
    fn test_chunk_grid_degenerate_sizes() {
        assert_eq!(ChunkGrid::for_size(0).len(), 0);
        assert_eq!(ChunkGrid::for_size(1).len(), 0);
        assert_eq!(ChunkGrid::for_size(1).chunk, MIN_CHUNK_SIZE);
        assert_eq!(ChunkGrid::for_size(3).len(), 1);
    }

    #[test]
    fn test_reveal_paints_every_chunk_once() {
        let mut timers = Timers::new();
        let mut rng = StdRng::seed_from_u64(11);
        let mut reveal = renderer(64);
        assert!(reveal.activate(&mut timers, &mut rng));
        assert_eq!(reveal.phase(), RevealPhase::Revealing);

        let painted = run_ticks(&mut reveal, &mut timers, 10_000);
        let unique: HashSet<_> = painted.iter().copied().collect();
        assert_eq!(painted.len(), reveal.grid().len());
        assert_eq!(unique.len(), painted.len());
        assert_eq!(unique, reveal.grid().coords().into_iter().collect());

        assert_eq!(reveal.phase(), RevealPhase::Revealed);
        assert!(reveal.reveal_timer().is_none());
        assert!(timers.is_empty());
        assert_eq!(opaque_pixels(reveal.surface()), 64 * 64);
    }

    #[test]
    fn test_reveal_one_chunk_per_tick() {
        let mut timers = Timers::new();
        let mut rng = StdRng::seed_from_u64(5);
        let mut reveal = renderer(32);
        reveal.activate(&mut timers, &mut rng);

        // 32px tile: 2px chunks, 16x16 grid; ticks at 5, 10, 15
        let painted = run_ticks(&mut reveal, &mut timers, 15);
        assert_eq!(painted.len(), 3);
        assert_eq!(reveal.painted(), 3);
        assert_eq!(opaque_pixels(reveal.surface()), 3 * 4);
        assert_eq!(reveal.pending_chunks().len(), 256 - 3);
    }

    #[test]
    fn test_reveal_follows_shuffled_order() {
        let mut timers = Timers::new();
        let mut reveal = renderer(8);
        // Chunk order drawn from a seed must be replayed exactly
        let expected = reveal.grid().shuffled_coords(&mut StdRng::seed_from_u64(42));
        reveal.activate(&mut timers, &mut StdRng::seed_from_u64(42));
        let painted = run_ticks(&mut reveal, &mut timers, 1000);
        assert_eq!(painted, expected);
    }

    #[test]
    fn test_activate_is_idempotent() {
        let mut timers = Timers::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut reveal = renderer(32);

        reveal.activate(&mut timers, &mut rng);
        run_ticks(&mut reveal, &mut timers, 50);
        let painted = reveal.painted();
        let timer = reveal.reveal_timer();
        assert!(!reveal.activate(&mut timers, &mut rng));
        assert_eq!(reveal.painted(), painted);
        assert_eq!(reveal.reveal_timer(), timer);

        run_ticks(&mut reveal, &mut timers, 10_000);
        assert_eq!(reveal.phase(), RevealPhase::Revealed);
        let before = reveal.surface().clone();
        assert!(!reveal.activate(&mut timers, &mut rng));
        assert!(!reveal.activate(&mut timers, &mut rng));
        assert_eq!(reveal.surface(), &before);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_deactivate_clears_after_grace_delay() {
        let mut timers = Timers::new();
        let mut rng = StdRng::seed_from_u64(2);
        let mut reveal = renderer(16);
        reveal.activate(&mut timers, &mut rng);
        run_ticks(&mut reveal, &mut timers, 1000);
        assert_eq!(reveal.phase(), RevealPhase::Revealed);

        assert!(reveal.deactivate(&mut timers));
        assert_eq!(reveal.phase(), RevealPhase::Hiding);
        run_ticks(&mut reveal, &mut timers, 1000 + 699);
        assert_eq!(reveal.phase(), RevealPhase::Hiding);
        assert_eq!(opaque_pixels(reveal.surface()), 16 * 16);

        run_ticks(&mut reveal, &mut timers, 1000 + 700);
        assert_eq!(reveal.phase(), RevealPhase::Idle);
        assert_eq!(opaque_pixels(reveal.surface()), 0);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_deactivate_mid_reveal_stops_painting() {
        let mut timers = Timers::new();
        let mut rng = StdRng::seed_from_u64(3);
        let mut reveal = renderer(32);
        reveal.activate(&mut timers, &mut rng);
        run_ticks(&mut reveal, &mut timers, 20);
        let painted_pixels = opaque_pixels(reveal.surface());
        assert_eq!(painted_pixels, 4 * 4);

        reveal.deactivate(&mut timers);
        assert!(reveal.reveal_timer().is_none());
        assert_eq!(timers.len(), 1);
        run_ticks(&mut reveal, &mut timers, 500);
        assert_eq!(opaque_pixels(reveal.surface()), painted_pixels);
    }

    #[test]
    fn test_reactivate_within_grace_delay_cancels_clear() {
        let mut timers = Timers::new();
        let mut rng = StdRng::seed_from_u64(4);
        let mut reveal = renderer(16);
        reveal.activate(&mut timers, &mut rng);
        run_ticks(&mut reveal, &mut timers, 1000);
        reveal.deactivate(&mut timers);
        let hide = reveal.hide_timer().unwrap();

        run_ticks(&mut reveal, &mut timers, 1300);
        assert!(reveal.activate(&mut timers, &mut rng));
        assert!(!timers.is_pending(hide));
        assert!(reveal.hide_timer().is_none());
        assert_eq!(reveal.phase(), RevealPhase::Revealing);
        // Fresh reveal starts from blank
        assert_eq!(opaque_pixels(reveal.surface()), 0);

        // Past the original clear deadline the surface is still filling in
        run_ticks(&mut reveal, &mut timers, 1700);
        assert_eq!(reveal.phase(), RevealPhase::Revealed);
        assert_eq!(opaque_pixels(reveal.surface()), 16 * 16);
    }

    #[test]
    fn test_set_on_reacts_to_edges_only() {
        let mut timers = Timers::new();
        let mut rng = StdRng::seed_from_u64(6);
        let mut reveal = renderer(16);

        assert!(!reveal.set_on(false, &mut timers, &mut rng));
        assert!(reveal.set_on(true, &mut timers, &mut rng));
        let timer = reveal.reveal_timer();
        assert!(!reveal.set_on(true, &mut timers, &mut rng));
        assert_eq!(reveal.reveal_timer(), timer);
        assert!(reveal.set_on(false, &mut timers, &mut rng));
        assert!(!reveal.set_on(false, &mut timers, &mut rng));
        assert_eq!(reveal.phase(), RevealPhase::Hiding);
    }

    #[test]
    fn test_at_most_one_timer_of_each_kind() {
        let mut timers = Timers::new();
        let mut rng = StdRng::seed_from_u64(8);
        let mut reveal = renderer(32);
        for _ in 0..5 {
            reveal.set_on(true, &mut timers, &mut rng);
            let until = timers.now() + 12;
            run_ticks(&mut reveal, &mut timers, until);
            assert!(timers.len() <= 2);
            reveal.set_on(false, &mut timers, &mut rng);
            let until = timers.now() + 100;
            run_ticks(&mut reveal, &mut timers, until);
            assert!(timers.len() <= 2);
        }
    }

    #[test]
    fn test_teardown_cancels_everything() {
        let mut timers = Timers::new();
        let mut rng = StdRng::seed_from_u64(9);
        let mut reveal = renderer(32);
        reveal.activate(&mut timers, &mut rng);
        reveal.teardown(&mut timers);
        assert!(timers.is_empty());

        let mut reveal = renderer(32);
        reveal.activate(&mut timers, &mut rng);
        reveal.deactivate(&mut timers);
        reveal.teardown(&mut timers);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_missing_source_stays_blank() {
        let mut timers = Timers::new();
        let mut rng = StdRng::seed_from_u64(10);
        let mut reveal = ChunkedReveal::new(tile_id(), 16, None, RevealTiming::default());
        assert!(!reveal.has_source());
        assert!(!reveal.activate(&mut timers, &mut rng));
        assert_eq!(reveal.phase(), RevealPhase::Idle);
        assert!(timers.is_empty());
        assert!(!reveal.deactivate(&mut timers));
    }

    #[test]
    fn test_source_is_scaled_to_surface() {
        let mut timers = Timers::new();
        let mut rng = StdRng::seed_from_u64(12);
        let source = RgbaImage::from_pixel(4, 4, RED);
        let mut reveal = ChunkedReveal::new(tile_id(), 32, Some(source), RevealTiming::default());
        reveal.activate(&mut timers, &mut rng);
        run_ticks(&mut reveal, &mut timers, 10_000);
        assert_eq!(reveal.surface().dimensions(), (32, 32));
        assert_eq!(reveal.surface().get_pixel(31, 31), &RED);
    }

    #[test]
    fn test_tiny_surface_reveals_immediately() {
        let mut timers = Timers::new();
        let mut rng = StdRng::seed_from_u64(13);
        let mut reveal = renderer(1);
        assert!(reveal.activate(&mut timers, &mut rng));
        assert_eq!(reveal.phase(), RevealPhase::Revealed);
        assert!(timers.is_empty());
    }
}
