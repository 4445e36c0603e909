//! Configuration module for the reward showcase
//!
//! Provides types and parsing for `rvl.toml` configuration.

pub mod loader;
pub mod schema;

pub use loader::{find_config, find_config_from, load_config, ConfigError, LoadedConfig};
pub use schema::*;
