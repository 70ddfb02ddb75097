//! Styles task
//!
//! One entry stylesheet is bundled (its `@import`s inlined), vendor-prefixed
//! for the browser targets, and written under a fixed output name. The dev
//! variant keeps the output readable and writes an external source map, then
//! streams the update to live clients without a page reload. The prod
//! variant minifies and writes no map. A compile error never halts the
//! flow: it is surfaced, and any stale output from a previous run is
//! removed so nothing outdated is served.

use super::{write_file, Mode, TaskError};
use crate::pipeline::{TaskContext, TaskReport};
use crate::serve::Reload;
use lightningcss::bundler::{Bundler, FileProvider};
use lightningcss::stylesheet::{MinifyOptions, ParserFlags, ParserOptions, PrinterOptions};
use lightningcss::targets::{Browsers, Targets};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Instant;

pub fn run(ctx: &TaskContext, mode: Mode) -> TaskReport {
    let task = match mode {
        Mode::Dev => "styles",
        Mode::Prod => "styles:prod",
    };
    let start = Instant::now();
    let paths = ctx.config.paths.styles.clone();
    let main = ctx.abs(&paths.main);
    let dest = ctx.abs(&paths.dest);
    let out = dest.join(&paths.out_name);
    let map_out = dest.join(format!("{}.map", paths.out_name));

    if !main.is_file() {
        // Missing entry matches zero files: nothing to do, not an error.
        return TaskReport::success(task, vec![], start.elapsed());
    }

    match compile(&main, mode) {
        Ok((css, source_map)) => {
            let mut outputs = Vec::new();
            let mut css = css;
            if let Some(map) = &source_map {
                css.push_str(&format!(
                    "\n/*# sourceMappingURL={}.map */",
                    paths.out_name
                ));
                if let Err(err) = write_file(&map_out, map.as_bytes()) {
                    return TaskReport::failed(task, err.to_string(), start.elapsed());
                }
                outputs.push(map_out.clone());
            } else {
                // A prod run after a dev run must not leave the debug map
                // behind.
                remove_stale(&map_out);
            }
            if let Err(err) = write_file(&out, css.as_bytes()) {
                return TaskReport::failed(task, err.to_string(), start.elapsed());
            }
            outputs.insert(0, out);
            ctx.notify(Reload::Css);
            TaskReport::success(task, outputs, start.elapsed())
        }
        Err(err) => {
            // No stale stylesheet may outlive a failed compile.
            remove_stale(&out);
            remove_stale(&map_out);
            TaskReport::failed(task, err.to_string(), start.elapsed())
        }
    }
}

/// Remove a leftover output; an absent file is fine.
fn remove_stale(path: &Path) {
    if let Err(err) = std::fs::remove_file(path) {
        if err.kind() != ErrorKind::NotFound {
            crate::reporter::error("styles", &format!("cannot remove {}: {}", path.display(), err));
        }
    }
}

/// Browser targets driving vendor prefixing (major versions, three back).
fn browser_targets() -> Targets {
    Targets::from(Browsers {
        chrome: Some(90 << 16),
        edge: Some(90 << 16),
        firefox: Some(88 << 16),
        safari: Some(14 << 16),
        ..Browsers::default()
    })
}

/// Bundle, prefix and print the entry stylesheet. Dev returns the source
/// map JSON alongside the CSS.
fn compile(main: &Path, mode: Mode) -> Result<(String, Option<String>), TaskError> {
    let provider = FileProvider::new();
    let flags = ParserFlags::NESTING | ParserFlags::CUSTOM_MEDIA;
    // The parser recovers from bad declarations by skipping them and
    // recording a warning. A skipped declaration must fail the task, not
    // silently ship a stylesheet missing rules.
    let warnings = Arc::new(RwLock::new(Vec::new()));
    let options = ParserOptions {
        flags,
        warnings: Some(Arc::clone(&warnings)),
        ..ParserOptions::default()
    };
    let mut bundler = Bundler::new(&provider, None, options);
    let mut sheet =
        bundler.bundle(main).map_err(|err| TaskError::Style(err.to_string()))?;

    let recovered: Vec<String> = warnings
        .read()
        .map_err(|err| TaskError::Style(err.to_string()))?
        .iter()
        .map(|warning| warning.to_string())
        .collect();
    if !recovered.is_empty() {
        return Err(TaskError::Style(recovered.join("; ")));
    }

    sheet
        .minify(MinifyOptions { targets: browser_targets(), ..MinifyOptions::default() })
        .map_err(|err| TaskError::Style(err.to_string()))?;

    let mut source_map = match mode {
        Mode::Dev => Some(parcel_sourcemap::SourceMap::new("/")),
        Mode::Prod => None,
    };
    let result = sheet
        .to_css(PrinterOptions {
            minify: mode == Mode::Prod,
            targets: browser_targets(),
            source_map: source_map.as_mut(),
            ..PrinterOptions::default()
        })
        .map_err(|err| TaskError::Style(err.to_string()))?;

    let map_json = match source_map.as_mut() {
        Some(map) => {
            Some(map.to_json(None).map_err(|err| TaskError::Style(err.to_string()))?)
        }
        None => None,
    };
    Ok((result.code, map_json))
}
