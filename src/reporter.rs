//! Console reporting
//!
//! Timestamped, per-task console output. This is the user-visible
//! notification channel: task failures are shown here and the flow keeps
//! going.

use crate::pipeline::{FlowReport, TaskReport, TaskStatus};
use std::time::Duration;

/// Format duration for display
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

/// Current wall-clock time for log lines
pub fn timestamp() -> String {
    use std::time::SystemTime;
    let now = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
    let secs = now.as_secs() % 86400;
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Log an informational line.
pub fn info(message: &str) {
    println!("[{}] {}", timestamp(), message);
}

/// Log an error line to stderr.
pub fn error(task: &str, message: &str) {
    eprintln!("[{}] {}: {}", timestamp(), task, message);
}

/// Print the outcome of one task.
pub fn task_done(report: &TaskReport) {
    match &report.status {
        TaskStatus::Success => {
            println!(
                "[{}] {} done ({}) - {} file{}",
                timestamp(),
                report.task,
                format_duration(report.duration),
                report.outputs.len(),
                if report.outputs.len() == 1 { "" } else { "s" }
            );
        }
        TaskStatus::Failed(err) => {
            eprintln!(
                "[{}] {} failed ({}): {}",
                timestamp(),
                report.task,
                format_duration(report.duration),
                err
            );
        }
    }
    for warning in &report.warnings {
        eprintln!("[{}] {} warning: {}", timestamp(), report.task, warning);
    }
}

/// Print the summary of a completed flow.
pub fn flow_summary(report: &FlowReport) {
    let failures = report.failure_count();
    if failures == 0 {
        println!(
            "[{}] Build complete ({}) - {} tasks, {} files",
            timestamp(),
            format_duration(report.total_duration),
            report.tasks.len(),
            report.output_count()
        );
    } else {
        eprintln!(
            "[{}] Build finished with {} failed task{} ({})",
            timestamp(),
            failures,
            if failures == 1 { "" } else { "s" },
            format_duration(report.total_duration)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
        assert_eq!(format_duration(Duration::from_millis(999)), "999ms");
        assert_eq!(format_duration(Duration::from_millis(1000)), "1.00s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
    }

    #[test]
    fn test_timestamp_shape() {
        let ts = timestamp();
        assert_eq!(ts.len(), 8);
        assert_eq!(ts.as_bytes()[2], b':');
        assert_eq!(ts.as_bytes()[5], b':');
    }
}
