//! Identifiers for mounted grids and tiles, and the wake-ups addressed to them.

use serde::Serialize;
use std::fmt;

/// Identity of a mounted collection grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GridId(pub u32);

/// Identity of a mounted tile.
///
/// `serial` is unique per mount within its grid, so a tile that is torn down
/// and later remounted in the same slot gets a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TileId {
    pub grid: GridId,
    pub serial: u64,
}

impl fmt::Display for GridId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "grid#{}", self.0)
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/tile#{}", self.grid, self.serial)
    }
}

/// Timer payload: which continuation to run when a timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wake {
    /// Paint the next chunk of a tile's reveal
    RevealTick(TileId),
    /// Grace delay elapsed; clear a hidden tile's surface
    ClearSurface(TileId),
    /// Rotate a grid's lit set
    Rotate(GridId),
}
