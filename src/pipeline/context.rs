//! Shared task context
//!
//! Every task receives the same explicitly-owned context: configuration,
//! the project root all relative paths resolve against, and the optional
//! live-reload hub. No ambient singletons.

use crate::config::Config;
use crate::serve::{Reload, ReloadHub};
use std::path::{Path, PathBuf};

/// Context passed to every task.
#[derive(Debug, Clone)]
pub struct TaskContext {
    /// Loaded configuration (read-only after process start)
    pub config: Config,
    /// Project root; all configured paths are resolved against it
    pub root: PathBuf,
    /// Live-reload hub; `None` outside the dev flow
    pub reload: Option<ReloadHub>,
    /// Verbose reporting
    pub verbose: bool,
}

impl TaskContext {
    pub fn new(config: Config, root: PathBuf) -> Self {
        Self { config, root, reload: None, verbose: false }
    }

    pub fn with_reload(mut self, hub: ReloadHub) -> Self {
        self.reload = Some(hub);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Resolve a configured path against the project root.
    pub fn abs(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Absolute output root.
    pub fn out_root(&self) -> PathBuf {
        self.abs(&self.config.paths.out_root)
    }

    /// Push a live-reload signal; a no-op when no hub is attached or no
    /// client is connected.
    pub fn notify(&self, reload: Reload) {
        if let Some(hub) = &self.reload {
            hub.notify(reload);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;

    #[test]
    fn test_abs_resolves_relative_paths() {
        let ctx = TaskContext::new(default_config(), PathBuf::from("/project"));
        assert_eq!(ctx.abs(Path::new("dist")), PathBuf::from("/project/dist"));
        assert_eq!(ctx.abs(Path::new("/outside")), PathBuf::from("/outside"));
        assert_eq!(ctx.out_root(), PathBuf::from("/project/dist"));
    }

    #[test]
    fn test_notify_without_hub_is_noop() {
        let ctx = TaskContext::new(default_config(), PathBuf::from("/project"));
        ctx.notify(Reload::Full);
    }
}
