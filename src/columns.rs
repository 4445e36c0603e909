//! Responsive column calculation
//!
//! A grid fits as many fixed-size tiles per row as its container width
//! allows, never fewer than one. Width is observed at a shared ancestor, so
//! observations arrive for unrelated layout changes too; [`ColumnTracker`]
//! suppresses the ones that don't change the column count.

use serde::{Deserialize, Serialize};

/// Reference tile side in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 128;

/// Reference gap between tiles in pixels.
pub const DEFAULT_GAP: u32 = 4;

/// Width reserved for the container's padding and scrollbar.
pub const DEFAULT_PADDING: u32 = 20;

/// Columns assumed before the first width observation.
pub const DEFAULT_INITIAL_COLUMNS: usize = 12;

/// Compute how many columns fit in `container_width`.
///
/// `max(1, floor((max(0, width - padding) + gap) / (tile_size + gap)))`
pub fn compute_columns(container_width: u32, tile_size: u32, gap: u32, padding: u32) -> usize {
    let usable = container_width.saturating_sub(padding) as u64;
    let pitch = tile_size as u64 + gap as u64;
    if pitch == 0 {
        return 1;
    }
    (((usable + gap as u64) / pitch) as usize).max(1)
}

/// Fixed geometry of a grid's tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLayout {
    pub tile_size: u32,
    pub gap: u32,
    pub padding: u32,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self { tile_size: DEFAULT_TILE_SIZE, gap: DEFAULT_GAP, padding: DEFAULT_PADDING }
    }
}

impl ColumnLayout {
    pub fn columns_for(&self, container_width: u32) -> usize {
        compute_columns(container_width, self.tile_size, self.gap, self.padding)
    }

    /// Pixel width of a row of `columns` tiles, gaps included.
    pub fn row_width(&self, columns: usize) -> u32 {
        let columns = columns as u32;
        columns * self.tile_size + columns.saturating_sub(1) * self.gap
    }
}

/// Current column count of a grid, updated from width observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnTracker {
    layout: ColumnLayout,
    columns: usize,
}

impl ColumnTracker {
    /// Start with `initial` columns until the first observation.
    pub fn new(layout: ColumnLayout, initial: usize) -> Self {
        Self { layout, columns: initial.max(1) }
    }

    pub fn layout(&self) -> ColumnLayout {
        self.layout
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Record an observed container width.
    ///
    /// Returns the new column count if it changed, `None` otherwise.
    pub fn observe(&mut self, container_width: u32) -> Option<usize> {
        let next = self.layout.columns_for(container_width);
        if next == self.columns {
            return None;
        }
        self.columns = next;
        Some(next)
    }
}
