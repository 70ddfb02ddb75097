//! Sitekit - static-site asset build pipeline
//!
//! This library provides functionality to:
//! - Compile templates, styles, scripts, images, fonts and icon sprites
//!   from a source tree into a deployable output tree
//! - Run a development mode with a local server, file watching and live reload
//! - Run a production mode with minified and optimized output

pub mod cli;
pub mod config;
pub mod pipeline;
pub mod reporter;
pub mod select;
pub mod serve;
pub mod tasks;
pub mod watch;
