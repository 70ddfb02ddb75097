//! Watch mode
//!
//! One debounced recursive watcher over the source root. Each batch of
//! change events is mapped to the set of asset categories whose globs match
//! the changed paths, and each matched category's dev task re-runs exactly
//! once per batch. Rebuild failures are reported and watching continues.
//! Runs until the process is terminated.

use crate::pipeline::{PipelineError, TaskContext, TaskKind, TaskReport};
use crate::reporter;
use crate::tasks::run_task;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::path::PathBuf;
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};

/// One watch rule: when a changed path matches any of the globs, the task
/// re-runs.
struct WatchRule {
    patterns: Vec<glob::Pattern>,
    task: TaskKind,
}

/// Build the glob-to-task table from the path configuration. Every
/// category maps to its dev-variant task.
fn watch_rules(ctx: &TaskContext) -> Result<Vec<WatchRule>, PipelineError> {
    let paths = &ctx.config.paths;
    let entries: Vec<(Vec<String>, TaskKind)> = vec![
        (vec![paths.templates.src.clone()], TaskKind::Templates),
        (vec![paths.styles.src.clone()], TaskKind::StylesDev),
        (vec![paths.scripts.src.clone()], TaskKind::Scripts),
        (paths.images.src.clone(), TaskKind::ImagesDev),
        (paths.icons.src.clone(), TaskKind::Icons),
        (paths.fonts.src.clone(), TaskKind::Fonts),
    ];

    let mut rules = Vec::with_capacity(entries.len());
    for (globs, task) in entries {
        let mut patterns = Vec::with_capacity(globs.len());
        for g in globs {
            // Event paths are absolute; anchor the pattern to the root.
            let anchored = ctx.root.join(&g).to_string_lossy().into_owned();
            patterns.push(
                glob::Pattern::new(&anchored)
                    .map_err(|err| PipelineError::Watch(format!("{}: {}", g, err)))?,
            );
        }
        rules.push(WatchRule { patterns, task });
    }
    Ok(rules)
}

/// Map one batch of changed paths to the tasks that must re-run, each at
/// most once, in rule order.
fn tasks_for_changes(rules: &[WatchRule], changed: &[PathBuf]) -> Vec<TaskKind> {
    rules
        .iter()
        .filter(|rule| {
            changed
                .iter()
                .any(|path| rule.patterns.iter().any(|pattern| pattern.matches_path(path)))
        })
        .map(|rule| rule.task)
        .collect()
}

/// Watch the source tree and re-run dev tasks on changes. Blocks until the
/// process is terminated; returns an error only when the watcher cannot be
/// set up.
pub fn run(ctx: &TaskContext) -> Result<TaskReport, PipelineError> {
    let start = Instant::now();
    let src_root = ctx.abs(&ctx.config.paths.src_root);
    // The rule table is fixed for the lifetime of the watcher; a bad
    // pattern fails setup.
    let rules = watch_rules(ctx)?;

    let (tx, rx) = channel();
    let debounce = Duration::from_millis(ctx.config.watch.debounce_ms);
    let mut debouncer =
        new_debouncer(debounce, tx).map_err(|err| PipelineError::Watch(err.to_string()))?;
    debouncer
        .watcher()
        .watch(&src_root, RecursiveMode::Recursive)
        .map_err(|err| PipelineError::Watch(err.to_string()))?;

    reporter::info(&format!("Watching {} for changes...", src_root.display()));

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let changed: Vec<PathBuf> = events
                    .iter()
                    .filter(|event| matches!(event.kind, DebouncedEventKind::Any))
                    .map(|event| event.path.clone())
                    .collect();
                if changed.is_empty() {
                    continue;
                }
                for path in &changed {
                    if let Some(name) = path.file_name() {
                        reporter::info(&format!("Changed: {}", name.to_string_lossy()));
                    }
                }
                for kind in tasks_for_changes(&rules, &changed) {
                    match run_task(kind, ctx) {
                        Ok(report) => reporter::task_done(&report),
                        Err(err) => reporter::error(kind.name(), &err.to_string()),
                    }
                }
            }
            Ok(Err(err)) => {
                // Watch error is non-fatal; keep watching.
                reporter::error("watch", &format!("{:?}", err));
            }
            Err(_) => break,
        }
    }

    Ok(TaskReport::success("watch", vec![], start.elapsed()))
}
