//! Per-category build tasks
//!
//! Every task is the same shape: select source files by glob, apply the
//! category's transform chain, write into the category's own destination
//! directory, then push a live-reload signal. Tasks report failures in
//! their [`TaskReport`]; nothing here aborts siblings.

pub mod clean;
pub mod fonts;
pub mod icons;
pub mod images;
pub mod scripts;
pub mod styles;
pub mod templates;

use crate::pipeline::{PipelineError, TaskContext, TaskKind, TaskReport};
use crate::select::{dest_path, pattern_base, select};
use crate::serve::Reload;
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;
use thiserror::Error;

/// Dev/prod variant selector for categories whose transform chain differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Favor speed and debuggability: source maps, no minification,
    /// unoptimized pass-through images
    Dev,
    /// Favor output quality: minification, image recompression
    Prod,
}

/// Task-local transform error. These surface in the task report, never in
/// the flow result.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TaskError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("style error: {0}")]
    Style(String),
    #[error("template error: {0}")]
    Template(String),
    #[error("script error: {0}")]
    Script(String),
    #[error("icon error: {0}")]
    Icon(String),
    #[error("image error: {0}")]
    Image(String),
}

/// Run one leaf task. Only [`TaskKind::Clean`], [`TaskKind::Watch`] and
/// [`TaskKind::Serve`] can return a process-fatal error; every other task
/// reports its failures locally.
pub fn run_task(kind: TaskKind, ctx: &TaskContext) -> Result<TaskReport, PipelineError> {
    match kind {
        TaskKind::Clean => clean::run(ctx),
        TaskKind::Templates => Ok(templates::run(ctx)),
        TaskKind::StylesDev => Ok(styles::run(ctx, Mode::Dev)),
        TaskKind::StylesProd => Ok(styles::run(ctx, Mode::Prod)),
        TaskKind::Scripts => Ok(scripts::run(ctx)),
        TaskKind::ImagesDev => Ok(images::run(ctx, Mode::Dev)),
        TaskKind::ImagesProd => Ok(images::run(ctx, Mode::Prod)),
        TaskKind::Icons => Ok(icons::run(ctx)),
        TaskKind::Fonts => Ok(fonts::run(ctx)),
        TaskKind::Watch => crate::watch::run(ctx),
        TaskKind::Serve => crate::serve::run(ctx),
    }
}

/// Pure copy task: select, copy preserving subpaths, notify. Used by the
/// fonts task and the dev images task.
pub(crate) fn copy_category(
    ctx: &TaskContext,
    task: &str,
    patterns: &[String],
    dest: &Path,
    reload: Reload,
) -> TaskReport {
    let start = Instant::now();
    let mut outputs = Vec::new();
    let mut failures = Vec::new();
    let mut seen = HashSet::new();

    for pattern in patterns {
        let base = ctx.root.join(pattern_base(pattern));
        for file in select(&ctx.root, std::slice::from_ref(pattern)) {
            let out = dest_path(&file, &base, dest);
            if !seen.insert(out.clone()) {
                continue;
            }
            match copy_file(&file, &out) {
                Ok(()) => outputs.push(out),
                Err(err) => failures.push(format!("{}: {}", file.display(), err)),
            }
        }
    }

    if !outputs.is_empty() {
        ctx.notify(reload);
    }

    let duration = start.elapsed();
    if failures.is_empty() {
        TaskReport::success(task, outputs, duration)
    } else {
        TaskReport::failed(task, failures.join("; "), duration).with_outputs(outputs)
    }
}

/// Copy one file, creating parent directories as needed.
pub(crate) fn copy_file(from: &Path, to: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(from, to)?;
    Ok(())
}

/// Write bytes to a file, creating parent directories as needed.
pub(crate) fn write_file(to: &Path, bytes: &[u8]) -> Result<(), std::io::Error> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(to, bytes)
}
