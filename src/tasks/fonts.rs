//! Fonts task: pure copy, no transform.

use crate::pipeline::{TaskContext, TaskReport};
use crate::serve::Reload;

pub fn run(ctx: &TaskContext) -> TaskReport {
    let paths = ctx.config.paths.fonts.clone();
    let dest = ctx.abs(&paths.dest);
    super::copy_category(ctx, "fonts", &paths.src, &dest, Reload::Css)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;
    use crate::serve::ReloadHub;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_fonts_copy_preserves_subdirs() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src/assets/fonts");
        fs::create_dir_all(src.join("display")).unwrap();
        fs::write(src.join("body.woff2"), b"font").unwrap();
        fs::write(src.join("display/head.woff2"), b"font").unwrap();

        let ctx = TaskContext::new(default_config(), temp.path().to_path_buf());
        let report = run(&ctx);

        assert!(report.is_success());
        assert_eq!(report.outputs.len(), 2);
        assert!(temp.path().join("dist/assets/fonts/body.woff2").is_file());
        assert!(temp.path().join("dist/assets/fonts/display/head.woff2").is_file());
    }

    #[test]
    fn test_fonts_empty_source_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let ctx = TaskContext::new(default_config(), temp.path().to_path_buf());
        let report = run(&ctx);
        assert!(report.is_success());
        assert!(report.outputs.is_empty());
    }

    #[test]
    fn test_fonts_notify_streams_css() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src/assets/fonts");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.woff2"), b"font").unwrap();

        let hub = ReloadHub::new();
        let mut rx = hub.subscribe();
        let ctx =
            TaskContext::new(default_config(), temp.path().to_path_buf()).with_reload(hub);
        run(&ctx);
        assert_eq!(rx.try_recv().unwrap(), Reload::Css);
    }
}
