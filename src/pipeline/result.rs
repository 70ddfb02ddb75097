//! Task and flow result types

use std::path::PathBuf;
use std::time::Duration;

/// Status of a single task run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Task completed (possibly with warnings)
    Success,
    /// Task failed; the error stayed local to the task
    Failed(String),
}

impl TaskStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskStatus::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TaskStatus::Failed(_))
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Success => write!(f, "success"),
            TaskStatus::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

/// Result of running a single task.
#[derive(Debug, Clone)]
pub struct TaskReport {
    /// Task name (as shown on the CLI)
    pub task: String,
    /// Outcome
    pub status: TaskStatus,
    /// Output files written
    pub outputs: Vec<PathBuf>,
    /// Task duration
    pub duration: Duration,
    /// Warnings surfaced during the run
    pub warnings: Vec<String>,
}

impl TaskReport {
    /// Create a successful report.
    pub fn success(task: &str, outputs: Vec<PathBuf>, duration: Duration) -> Self {
        Self { task: task.to_string(), status: TaskStatus::Success, outputs, duration, warnings: vec![] }
    }

    /// Create a failed report.
    pub fn failed(task: &str, error: String, duration: Duration) -> Self {
        Self {
            task: task.to_string(),
            status: TaskStatus::Failed(error),
            outputs: vec![],
            duration,
            warnings: vec![],
        }
    }

    /// Attach warnings.
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    /// Attach outputs (useful on failed reports that still wrote files).
    pub fn with_outputs(mut self, outputs: Vec<PathBuf>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Aggregate result of walking a task graph.
#[derive(Debug, Default)]
pub struct FlowReport {
    /// Reports in completion order
    pub tasks: Vec<TaskReport>,
    /// Wall-clock duration of the whole flow
    pub total_duration: Duration,
}

impl FlowReport {
    /// True when no task failed.
    pub fn success(&self) -> bool {
        self.tasks.iter().all(TaskReport::is_success)
    }

    pub fn failure_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.status.is_failure()).count()
    }

    pub fn output_count(&self) -> usize {
        self.tasks.iter().map(|t| t.outputs.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_report_success() {
        let report = TaskReport::success("fonts", vec![PathBuf::from("dist/a.woff2")], Duration::ZERO);
        assert!(report.is_success());
        assert_eq!(report.outputs.len(), 1);
    }

    #[test]
    fn test_flow_report_counts_failures() {
        let mut flow = FlowReport::default();
        flow.tasks.push(TaskReport::success("fonts", vec![], Duration::ZERO));
        flow.tasks.push(TaskReport::failed("styles", "bad css".to_string(), Duration::ZERO));
        assert!(!flow.success());
        assert_eq!(flow.failure_count(), 1);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(TaskStatus::Success.to_string(), "success");
        assert_eq!(TaskStatus::Failed("oops".to_string()).to_string(), "failed: oops");
    }
}
