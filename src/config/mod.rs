//! Configuration for `sitekit.toml`
//!
//! The schema module defines the configuration structure, the loader module
//! handles discovery, parsing and CLI overrides.

pub mod loader;
pub mod schema;

pub use loader::{default_config, find_config, find_config_from, load_config, ConfigError};
pub use schema::{
    CategoryPaths, Config, ImagesConfig, Paths, ScriptPaths, ServeConfig, StylePaths,
    TemplatePaths, WatchConfig,
};
