//! Reward Reveal - Library for animating reward collection grids
//!
//! This library provides functionality to:
//! - Reveal a tile's image in randomly ordered square chunks on a virtual clock
//! - Fit tiles into responsive columns and sample each collection once per mount
//! - Rotate a bounded set of lit tiles per grid
//! - Export reveal timelines as PNG or animated GIF

pub mod catalog;
pub mod cli;
pub mod columns;
pub mod config;
pub mod gif;
pub mod grid;
pub mod image_source;
pub mod lit_set;
pub mod logging;
pub mod models;
pub mod output;
pub mod reveal;
pub mod shuffle;
pub mod showcase;
pub mod silhouette;
pub mod tile;
pub mod timer;
