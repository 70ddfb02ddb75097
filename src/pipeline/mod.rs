//! Task graph composition and execution
//!
//! The build is modeled as an explicit graph of leaf tasks composed into
//! sequences and parallel groups, walked by a small interpreter. Sequential
//! phases are strictly ordered; parallel groups start every member together
//! and complete when all members have completed. Task-local failures are
//! recorded and never abort siblings or later phases; only process-fatal
//! errors (the pre-flight clean, watcher or server setup) abort the flow.

mod context;
mod graph;
mod result;

pub use context::TaskContext;
pub use graph::{build_flow, default_flow, run, run_with, Graph, TaskKind};
pub use result::{FlowReport, TaskReport, TaskStatus};

use std::path::PathBuf;
use thiserror::Error;

/// Process-fatal pipeline error. Anything else is reported per task and
/// kept local.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// Removing the output root failed; no task may start after this
    #[error("Failed to clean output directory {path}: {source}")]
    Clean {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// File watcher could not be set up
    #[error("Watcher error: {0}")]
    Watch(String),
    /// Development server could not be started
    #[error("Server error: {0}")]
    Serve(String),
    /// A parallel branch panicked
    #[error("A parallel branch panicked")]
    Panicked,
}
