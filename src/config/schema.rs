//! Configuration schema types for `sitekit.toml`
//!
//! One section per asset category plus server, watch and image-optimizer
//! settings. Every field has a default matching the conventional source
//! layout, so a project without a `sitekit.toml` still builds.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Asset category paths
    #[serde(default)]
    pub paths: Paths,
    /// Free-form values exposed to every template render
    #[serde(default)]
    pub site: toml::Table,
    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,
    /// File watcher settings
    #[serde(default)]
    pub watch: WatchConfig,
    /// Image optimizer settings
    #[serde(default)]
    pub images: ImagesConfig,
}

/// Source globs and destination directories for every asset category.
///
/// Read-only after load. Globs for categories with several extensions are
/// lists, since the `glob` crate has no brace expansion. A nonexistent
/// source directory simply matches zero files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Paths {
    /// Output root, removed and recreated by every flow
    #[serde(default = "default_out_root")]
    pub out_root: PathBuf,
    /// Source root watched in dev mode
    #[serde(default = "default_src_root")]
    pub src_root: PathBuf,
    #[serde(default)]
    pub templates: TemplatePaths,
    #[serde(default)]
    pub styles: StylePaths,
    #[serde(default)]
    pub scripts: ScriptPaths,
    #[serde(default = "CategoryPaths::images")]
    pub images: CategoryPaths,
    #[serde(default = "CategoryPaths::icons")]
    pub icons: CategoryPaths,
    #[serde(default = "CategoryPaths::fonts")]
    pub fonts: CategoryPaths,
}

fn default_out_root() -> PathBuf {
    PathBuf::from("dist")
}

fn default_src_root() -> PathBuf {
    PathBuf::from("src")
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            out_root: default_out_root(),
            src_root: default_src_root(),
            templates: TemplatePaths::default(),
            styles: StylePaths::default(),
            scripts: ScriptPaths::default(),
            images: CategoryPaths::images(),
            icons: CategoryPaths::icons(),
            fonts: CategoryPaths::fonts(),
        }
    }
}

/// Template paths: page templates are rendered, the whole views tree is
/// watched (partials and layouts trigger a re-render too).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplatePaths {
    /// Root the template loader resolves names against
    #[serde(default = "default_views_root")]
    pub views_root: PathBuf,
    /// Glob for page templates (rendered to output)
    #[serde(default = "default_pages_glob")]
    pub pages: String,
    /// Glob for all template sources (watched)
    #[serde(default = "default_views_glob")]
    pub src: String,
    /// Destination directory for rendered pages
    #[serde(default = "default_out_root")]
    pub dest: PathBuf,
}

fn default_views_root() -> PathBuf {
    PathBuf::from("src/views")
}

fn default_pages_glob() -> String {
    "src/views/pages/**/*.html".to_string()
}

fn default_views_glob() -> String {
    "src/views/**/*.html".to_string()
}

impl Default for TemplatePaths {
    fn default() -> Self {
        Self {
            views_root: default_views_root(),
            pages: default_pages_glob(),
            src: default_views_glob(),
            dest: default_out_root(),
        }
    }
}

/// Style paths: one main entry stylesheet, the whole styles tree is watched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StylePaths {
    /// Entry stylesheet (`@import`s are bundled into it)
    #[serde(default = "default_styles_main")]
    pub main: PathBuf,
    /// Glob for all style sources (watched)
    #[serde(default = "default_styles_glob")]
    pub src: String,
    /// Destination directory
    #[serde(default = "default_styles_dest")]
    pub dest: PathBuf,
    /// Fixed output filename, shared by dev and prod variants
    #[serde(default = "default_styles_out")]
    pub out_name: String,
}

fn default_styles_main() -> PathBuf {
    PathBuf::from("src/assets/styles/main.css")
}

fn default_styles_glob() -> String {
    "src/assets/styles/**/*.css".to_string()
}

fn default_styles_dest() -> PathBuf {
    PathBuf::from("dist/assets/css")
}

fn default_styles_out() -> String {
    "main.min.css".to_string()
}

impl Default for StylePaths {
    fn default() -> Self {
        Self {
            main: default_styles_main(),
            src: default_styles_glob(),
            dest: default_styles_dest(),
            out_name: default_styles_out(),
        }
    }
}

/// Script paths: named entry points, each bundled to `<name>.min.js`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptPaths {
    /// Glob for all script sources (watched)
    #[serde(default = "default_scripts_glob")]
    pub src: String,
    /// Entry points by output name. Entries may import sub-modules with
    /// relative paths; those are inlined into the bundle.
    #[serde(default = "default_script_entries")]
    pub entries: std::collections::BTreeMap<String, PathBuf>,
    /// Destination directory
    #[serde(default = "default_scripts_dest")]
    pub dest: PathBuf,
}

fn default_scripts_glob() -> String {
    "src/assets/scripts/**/*.js".to_string()
}

fn default_script_entries() -> std::collections::BTreeMap<String, PathBuf> {
    let mut entries = std::collections::BTreeMap::new();
    entries.insert("main".to_string(), PathBuf::from("src/assets/scripts/main.js"));
    entries.insert("app".to_string(), PathBuf::from("src/assets/scripts/app.js"));
    entries
}

fn default_scripts_dest() -> PathBuf {
    PathBuf::from("dist/assets/js")
}

impl Default for ScriptPaths {
    fn default() -> Self {
        Self {
            src: default_scripts_glob(),
            entries: default_script_entries(),
            dest: default_scripts_dest(),
        }
    }
}

/// Generic category: source glob(s) and a destination directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryPaths {
    /// Source glob patterns
    pub src: Vec<String>,
    /// Destination directory
    pub dest: PathBuf,
}

impl CategoryPaths {
    pub(crate) fn images() -> Self {
        Self {
            src: vec![
                "src/assets/images/**/*.png".to_string(),
                "src/assets/images/**/*.jpg".to_string(),
                "src/assets/images/**/*.jpeg".to_string(),
                "src/assets/images/**/*.gif".to_string(),
                "src/assets/images/**/*.svg".to_string(),
            ],
            dest: PathBuf::from("dist/assets/images"),
        }
    }

    pub(crate) fn icons() -> Self {
        Self {
            src: vec!["src/assets/icons/**/*.svg".to_string()],
            dest: PathBuf::from("dist/assets/svg"),
        }
    }

    pub(crate) fn fonts() -> Self {
        Self {
            src: vec!["src/assets/fonts/**/*".to_string()],
            dest: PathBuf::from("dist/assets/fonts"),
        }
    }
}

/// Development server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// Port for the local server
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self { port: default_port() }
    }
}

/// File watcher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    /// Debounce window in milliseconds; one rebuild per batch of changes
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: default_debounce_ms() }
    }
}

/// Image optimizer settings (production images task)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImagesConfig {
    /// JPEG re-encode quality; lossy recompression stays in the 65-75 band
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// Cross-run optimization cache, keyed by source content hash
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

fn default_jpeg_quality() -> u8 {
    70
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".sitekit-cache")
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self { jpeg_quality: default_jpeg_quality(), cache_dir: default_cache_dir() }
    }
}
