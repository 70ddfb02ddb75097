//! Vector-icon sprite task
//!
//! Minifies every icon source, strips presentation attributes that the
//! consuming document should control (`fill`, `stroke`, inline `style`),
//! and assembles all icons into a single `sprite.svg` of `<symbol>`
//! elements referenced by id. The minify step can leave a literal `&gt;`
//! behind; it is restored to `>` before assembly. The same pipeline runs
//! in dev and prod.

use super::{write_file, TaskError};
use crate::pipeline::{TaskContext, TaskReport};
use crate::select::select;
use crate::serve::Reload;
use regex::Regex;
use std::path::Path;
use std::time::Instant;

/// Output filename of the combined sprite document.
pub const SPRITE_NAME: &str = "sprite.svg";

pub fn run(ctx: &TaskContext) -> TaskReport {
    let start = Instant::now();
    let paths = ctx.config.paths.icons.clone();
    let dest = ctx.abs(&paths.dest);
    let files = select(&ctx.root, &paths.src);

    if files.is_empty() {
        return TaskReport::success("icons", vec![], start.elapsed());
    }

    let regexes = match SvgRegexes::new() {
        Ok(r) => r,
        Err(err) => {
            return TaskReport::failed("icons", err.to_string(), start.elapsed());
        }
    };

    let mut symbols = Vec::new();
    let mut failures = Vec::new();
    for file in &files {
        match std::fs::read_to_string(file)
            .map_err(TaskError::from)
            .and_then(|source| symbol_for(file, &source, &regexes))
        {
            Ok(symbol) => symbols.push(symbol),
            Err(err) => failures.push(format!("{}: {}", file.display(), err)),
        }
    }

    let sprite = assemble_sprite(&symbols);
    let out = dest.join(SPRITE_NAME);
    if let Err(err) = write_file(&out, sprite.as_bytes()) {
        failures.push(format!("{}: {}", out.display(), err));
        return TaskReport::failed("icons", failures.join("; "), start.elapsed());
    }

    ctx.notify(Reload::Css);

    let duration = start.elapsed();
    if failures.is_empty() {
        TaskReport::success("icons", vec![out], duration)
    } else {
        TaskReport::failed("icons", failures.join("; "), duration).with_outputs(vec![out])
    }
}

struct SvgRegexes {
    /// XML declaration and doctype
    prolog: Regex,
    /// XML comments
    comment: Regex,
    /// Inter-tag whitespace
    between_tags: Regex,
    /// Presentation attributes the sprite must not bake in
    presentation: Regex,
    /// Root element split into attributes and content
    root: Regex,
    /// viewBox attribute of the root element
    viewbox: Regex,
}

impl SvgRegexes {
    fn new() -> Result<Self, TaskError> {
        let build = |pattern: &str| {
            Regex::new(pattern).map_err(|err| TaskError::Icon(err.to_string()))
        };
        Ok(Self {
            prolog: build(r"(?is)<\?xml.*?\?>|<!DOCTYPE[^>]*>")?,
            comment: build(r"(?s)<!--.*?-->")?,
            between_tags: build(r">\s+<")?,
            presentation: build(r#"\s+(?:fill|stroke|style)\s*=\s*("[^"]*"|'[^']*')"#)?,
            root: build(r"(?s)<svg\b([^>]*)>(.*)</svg>")?,
            viewbox: build(r#"(?i)viewBox\s*=\s*"([^"]*)""#)?,
        })
    }
}

/// Minify one icon source and rewrap it as a `<symbol>`.
fn symbol_for(path: &Path, source: &str, regexes: &SvgRegexes) -> Result<String, TaskError> {
    let minified = minify(source, regexes);
    let stripped = regexes.presentation.replace_all(&minified, "").into_owned();
    // Escaping artifact of the minify/parse chain: a literal `&gt;` must
    // come back out as `>`.
    let repaired = stripped.replace("&gt;", ">");

    let captures = regexes
        .root
        .captures(&repaired)
        .ok_or_else(|| TaskError::Icon("no <svg> root element".to_string()))?;
    let root_attrs = captures.get(1).map(|m| m.as_str()).unwrap_or("");
    let content = captures.get(2).map(|m| m.as_str()).unwrap_or("").trim();

    let id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| TaskError::Icon("icon file has no name".to_string()))?;

    let viewbox = regexes
        .viewbox
        .captures(root_attrs)
        .and_then(|c| c.get(1))
        .map(|m| format!(" viewBox=\"{}\"", m.as_str()))
        .unwrap_or_default();

    Ok(format!("<symbol id=\"{}\"{}>{}</symbol>", id, viewbox, content))
}

/// Strip prolog and comments, collapse inter-tag whitespace.
fn minify(source: &str, regexes: &SvgRegexes) -> String {
    let without_prolog = regexes.prolog.replace_all(source, "");
    let without_comments = regexes.comment.replace_all(&without_prolog, "");
    regexes.between_tags.replace_all(without_comments.trim(), "><").into_owned()
}

/// Combine symbols into the sprite document.
fn assemble_sprite(symbols: &[String]) -> String {
    let mut sprite = String::from(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\">",
    );
    for symbol in symbols {
        sprite.push_str(symbol);
    }
    sprite.push_str("</svg>");
    sprite
}
