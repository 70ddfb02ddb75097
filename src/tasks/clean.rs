//! Pre-flight clean
//!
//! Removes the output root before a build. Idempotent: an already-absent
//! directory is fine. A real removal failure is process-fatal, since every
//! later writer assumes a fresh output tree.

use crate::pipeline::{PipelineError, TaskContext, TaskReport};
use std::io::ErrorKind;
use std::time::Instant;

pub fn run(ctx: &TaskContext) -> Result<TaskReport, PipelineError> {
    let start = Instant::now();
    let out_root = ctx.out_root();
    match std::fs::remove_dir_all(&out_root) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(PipelineError::Clean { path: out_root, source: err }),
    }
    Ok(TaskReport::success("clean", vec![], start.elapsed()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;
    use std::fs;
    use tempfile::TempDir;

    fn ctx(root: &std::path::Path) -> TaskContext {
        TaskContext::new(default_config(), root.to_path_buf())
    }

    #[test]
    fn test_clean_removes_output_root() {
        let temp = TempDir::new().unwrap();
        let dist = temp.path().join("dist");
        fs::create_dir_all(dist.join("assets/css")).unwrap();
        fs::write(dist.join("assets/css/stale.css"), "old").unwrap();

        run(&ctx(temp.path())).unwrap();
        assert!(!dist.exists());
    }

    #[test]
    fn test_clean_is_idempotent() {
        let temp = TempDir::new().unwrap();
        run(&ctx(temp.path())).unwrap();
        let report = run(&ctx(temp.path())).unwrap();
        assert!(report.is_success());
    }
}
