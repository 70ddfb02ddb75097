//! Configuration loading and discovery for `sitekit.toml`

use super::schema::Config;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse sitekit.toml: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Find `sitekit.toml` by walking up from the current working directory.
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(find_config_from)
}

/// Find `sitekit.toml` by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;
    loop {
        let candidate = current.join("sitekit.toml");
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a file, or return defaults when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => {
            let raw = fs::read_to_string(path)?;
            Ok(toml::from_str(&raw)?)
        }
        None => Ok(default_config()),
    }
}

/// Default configuration for a project without a `sitekit.toml`.
pub fn default_config() -> Config {
    Config::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_load_default_when_no_path() {
        let config = load_config(None).unwrap();
        assert_eq!(config.paths.out_root, PathBuf::from("dist"));
    }

    #[test]
    fn test_find_config_walks_up() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        let mut file = fs::File::create(temp.path().join("sitekit.toml")).unwrap();
        writeln!(file, "[serve]\nport = 9000").unwrap();

        let found = find_config_from(nested).unwrap();
        assert_eq!(found, temp.path().join("sitekit.toml"));

        let config = load_config(Some(&found)).unwrap();
        assert_eq!(config.serve.port, 9000);
    }

    #[test]
    fn test_find_config_missing() {
        let temp = TempDir::new().unwrap();
        assert_eq!(find_config_from(temp.path().to_path_buf()), None);
    }

    #[test]
    fn test_load_config_rejects_bad_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sitekit.toml");
        fs::write(&path, "paths = nonsense").unwrap();
        assert!(matches!(load_config(Some(&path)), Err(ConfigError::Parse(_))));
    }
}
