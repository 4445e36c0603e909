//! Data models for reward collections and the runtime identities built on them

mod ids;
mod reward;

// Re-export all public types
pub use ids::{GridId, TileId, Wake};
pub use reward::{Collection, RewardItem, SilhouetteStyle};
