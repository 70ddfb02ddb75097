//! Source file selection
//!
//! Glob matching over the source tree plus the path arithmetic that maps a
//! selected file into its destination directory. Zero matches is never an
//! error: a missing source directory just means an empty selection.

use std::path::{Path, PathBuf};

/// Select all files matching `patterns`, resolved against `root`.
///
/// Results are sorted and deduplicated so downstream output is
/// deterministic. Directories are skipped. Invalid patterns and unreadable
/// entries match nothing.
pub fn select(root: &Path, patterns: &[String]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    for pattern in patterns {
        let full = root.join(pattern);
        if let Ok(paths) = glob::glob(&full.to_string_lossy()) {
            files.extend(paths.filter_map(Result::ok).filter(|p| p.is_file()));
        }
    }
    files.sort();
    files.dedup();
    files
}

/// The fixed directory prefix of a glob pattern (everything before the
/// first component containing a wildcard).
///
/// `src/assets/fonts/**/*` has base `src/assets/fonts`; a literal path is
/// its own base's parent plus filename, so the base is the parent.
pub fn pattern_base(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    for component in Path::new(pattern).components() {
        let text = component.as_os_str().to_string_lossy();
        if text.contains('*') || text.contains('?') || text.contains('[') {
            break;
        }
        base.push(component);
    }
    // A fully literal pattern names a file; its base is the directory.
    if base == Path::new(pattern) {
        base.pop();
    }
    base
}

/// Map a selected source file to its destination path, preserving the
/// subpath below the pattern base.
pub fn dest_path(file: &Path, base: &Path, dest: &Path) -> PathBuf {
    match file.strip_prefix(base) {
        Ok(rel) => dest.join(rel),
        // File outside the base (absolute pattern quirk): flatten to name.
        Err(_) => match file.file_name() {
            Some(name) => dest.join(name),
            None => dest.to_path_buf(),
        },
    }
}
