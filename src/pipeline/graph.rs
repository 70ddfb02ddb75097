//! Task graph and interpreter
//!
//! The two entry flows mirror the classic asset-pipeline shape: clean, one
//! parallel build phase over all categories, a template re-render to pick
//! up assets produced by the parallel phase, and (dev only) the long-running
//! watch and serve pair.

use super::context::TaskContext;
use super::result::{FlowReport, TaskReport};
use super::PipelineError;
use crate::reporter;
use std::time::Instant;

/// Every invocable leaf task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Clean,
    Templates,
    StylesDev,
    StylesProd,
    Scripts,
    ImagesDev,
    ImagesProd,
    Icons,
    Fonts,
    Watch,
    Serve,
}

impl TaskKind {
    /// CLI-facing task name.
    pub fn name(self) -> &'static str {
        match self {
            TaskKind::Clean => "clean",
            TaskKind::Templates => "templates",
            TaskKind::StylesDev => "styles",
            TaskKind::StylesProd => "styles:prod",
            TaskKind::Scripts => "scripts",
            TaskKind::ImagesDev => "images",
            TaskKind::ImagesProd => "images:prod",
            TaskKind::Icons => "icons",
            TaskKind::Fonts => "fonts",
            TaskKind::Watch => "watch",
            TaskKind::Serve => "serve",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A node of the task graph.
#[derive(Debug, Clone)]
pub enum Graph {
    /// A single leaf task
    Task(TaskKind),
    /// Children run strictly in order
    Sequence(Vec<Graph>),
    /// Children start together; the node completes when all complete
    Parallel(Vec<Graph>),
}

/// The interactive development flow. Never terminates on its own: the
/// final parallel pair (watcher, server) blocks until the process is
/// interrupted.
pub fn default_flow() -> Graph {
    Graph::Sequence(vec![
        Graph::Task(TaskKind::Clean),
        Graph::Parallel(vec![
            Graph::Task(TaskKind::StylesDev),
            Graph::Task(TaskKind::Templates),
            Graph::Task(TaskKind::ImagesDev),
            Graph::Task(TaskKind::Icons),
            Graph::Task(TaskKind::Fonts),
            Graph::Task(TaskKind::Scripts),
        ]),
        // Re-render so pages pick up the sprite and hashed assets produced
        // by the parallel phase.
        Graph::Task(TaskKind::Templates),
        Graph::Parallel(vec![Graph::Task(TaskKind::Watch), Graph::Task(TaskKind::Serve)]),
    ])
}

/// The one-shot production flow.
pub fn build_flow() -> Graph {
    Graph::Sequence(vec![
        Graph::Task(TaskKind::Clean),
        Graph::Parallel(vec![
            Graph::Task(TaskKind::StylesProd),
            Graph::Task(TaskKind::Templates),
            Graph::Task(TaskKind::ImagesProd),
            Graph::Task(TaskKind::Icons),
            Graph::Task(TaskKind::Fonts),
            Graph::Task(TaskKind::Scripts),
        ]),
        Graph::Task(TaskKind::Templates),
    ])
}

/// Walk a graph with the real task runner.
pub fn run(graph: &Graph, ctx: &TaskContext) -> Result<FlowReport, PipelineError> {
    run_with(graph, ctx, &crate::tasks::run_task)
}

/// Walk a graph with a caller-supplied runner (tests inject stubs here).
pub fn run_with<R>(graph: &Graph, ctx: &TaskContext, runner: &R) -> Result<FlowReport, PipelineError>
where
    R: Fn(TaskKind, &TaskContext) -> Result<TaskReport, PipelineError> + Sync,
{
    let start = Instant::now();
    let mut report = FlowReport::default();
    run_node(graph, ctx, runner, &mut report.tasks)?;
    report.total_duration = start.elapsed();
    Ok(report)
}

fn run_node<R>(
    node: &Graph,
    ctx: &TaskContext,
    runner: &R,
    out: &mut Vec<TaskReport>,
) -> Result<(), PipelineError>
where
    R: Fn(TaskKind, &TaskContext) -> Result<TaskReport, PipelineError> + Sync,
{
    match node {
        Graph::Task(kind) => {
            let result = runner(*kind, ctx)?;
            reporter::task_done(&result);
            out.push(result);
            Ok(())
        }
        Graph::Sequence(children) => {
            for child in children {
                run_node(child, ctx, runner, out)?;
            }
            Ok(())
        }
        Graph::Parallel(children) => {
            let branches: Vec<Result<Vec<TaskReport>, PipelineError>> =
                std::thread::scope(|scope| {
                    let handles: Vec<_> = children
                        .iter()
                        .map(|child| {
                            scope.spawn(move || {
                                let mut sub = Vec::new();
                                run_node(child, ctx, runner, &mut sub).map(|()| sub)
                            })
                        })
                        .collect();
                    handles
                        .into_iter()
                        .map(|handle| handle.join().unwrap_or(Err(PipelineError::Panicked)))
                        .collect()
                });

            // Every branch has completed; only now propagate a fatal error.
            let mut fatal = None;
            for branch in branches {
                match branch {
                    Ok(sub) => out.extend(sub),
                    Err(err) => fatal = fatal.or(Some(err)),
                }
            }
            match fatal {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;
    use crate::pipeline::TaskStatus;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;

    fn ctx() -> TaskContext {
        TaskContext::new(default_config(), PathBuf::from("/project"))
    }

    fn ok(kind: TaskKind) -> TaskReport {
        TaskReport::success(kind.name(), vec![], Duration::ZERO)
    }

    #[test]
    fn test_sequence_runs_in_order() {
        let order = Mutex::new(Vec::new());
        let graph = Graph::Sequence(vec![
            Graph::Task(TaskKind::Clean),
            Graph::Task(TaskKind::Fonts),
            Graph::Task(TaskKind::Templates),
        ]);
        let report = run_with(&graph, &ctx(), &|kind, _ctx| {
            order.lock().unwrap().push(kind);
            Ok(ok(kind))
        })
        .unwrap();
        assert_eq!(
            *order.lock().unwrap(),
            vec![TaskKind::Clean, TaskKind::Fonts, TaskKind::Templates]
        );
        assert!(report.success());
        assert_eq!(report.tasks.len(), 3);
    }

    #[test]
    fn test_parallel_completes_all_members_despite_failure() {
        let ran = Mutex::new(Vec::new());
        let graph = Graph::Sequence(vec![
            Graph::Parallel(vec![
                Graph::Task(TaskKind::StylesDev),
                Graph::Task(TaskKind::Fonts),
                Graph::Task(TaskKind::Icons),
            ]),
            Graph::Task(TaskKind::Templates),
        ]);
        let report = run_with(&graph, &ctx(), &|kind, _ctx| {
            ran.lock().unwrap().push(kind);
            if kind == TaskKind::StylesDev {
                Ok(TaskReport::failed(kind.name(), "syntax error".to_string(), Duration::ZERO))
            } else {
                Ok(ok(kind))
            }
        })
        .unwrap();

        // All siblings and the downstream phase still ran.
        let ran = ran.lock().unwrap();
        assert_eq!(ran.len(), 4);
        assert!(ran.contains(&TaskKind::Templates));
        assert!(!report.success());
        assert_eq!(report.failure_count(), 1);
    }

    #[test]
    fn test_fatal_error_aborts_sequence() {
        let ran = Mutex::new(Vec::new());
        let graph = Graph::Sequence(vec![
            Graph::Task(TaskKind::Clean),
            Graph::Task(TaskKind::Fonts),
        ]);
        let result = run_with(&graph, &ctx(), &|kind, _ctx| {
            ran.lock().unwrap().push(kind);
            if kind == TaskKind::Clean {
                Err(PipelineError::Clean {
                    path: PathBuf::from("dist"),
                    source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
                })
            } else {
                Ok(ok(kind))
            }
        });
        assert!(result.is_err());
        assert_eq!(*ran.lock().unwrap(), vec![TaskKind::Clean]);
    }

    #[test]
    fn test_fatal_error_in_parallel_waits_for_siblings() {
        let ran = Mutex::new(Vec::new());
        let graph = Graph::Parallel(vec![
            Graph::Task(TaskKind::Watch),
            Graph::Task(TaskKind::Fonts),
        ]);
        let result = run_with(&graph, &ctx(), &|kind, _ctx| {
            ran.lock().unwrap().push(kind);
            if kind == TaskKind::Watch {
                Err(PipelineError::Watch("init failed".to_string()))
            } else {
                Ok(ok(kind))
            }
        });
        assert!(result.is_err());
        assert_eq!(ran.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_flow_shapes() {
        // Both flows start with clean and re-render templates after the
        // parallel phase.
        for flow in [default_flow(), build_flow()] {
            match flow {
                Graph::Sequence(nodes) => {
                    assert!(matches!(nodes[0], Graph::Task(TaskKind::Clean)));
                    assert!(matches!(nodes[1], Graph::Parallel(_)));
                    assert!(matches!(nodes[2], Graph::Task(TaskKind::Templates)));
                }
                _ => panic!("flow must be a sequence"),
            }
        }
    }

    #[test]
    fn test_flow_variants() {
        fn leaf_kinds(graph: &Graph) -> Vec<TaskKind> {
            match graph {
                Graph::Task(kind) => vec![*kind],
                Graph::Sequence(c) | Graph::Parallel(c) => {
                    c.iter().flat_map(leaf_kinds).collect()
                }
            }
        }
        let dev = leaf_kinds(&default_flow());
        assert!(dev.contains(&TaskKind::StylesDev));
        assert!(dev.contains(&TaskKind::Watch));
        assert!(dev.contains(&TaskKind::Serve));

        let prod = leaf_kinds(&build_flow());
        assert!(prod.contains(&TaskKind::StylesProd));
        assert!(prod.contains(&TaskKind::ImagesProd));
        assert!(!prod.contains(&TaskKind::Watch));
        assert!(!prod.contains(&TaskKind::Serve));
    }
}
