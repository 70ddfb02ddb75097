//! Scripts task
//!
//! Each named entry point is bundled into `<name>.min.js`: relative
//! imports are inlined dependency-first into one flat scope, `export`
//! declarations are unwrapped to plain declarations, and the result is
//! emitted minified via SWC. Syntax is not downleveled: the bundle keeps
//! the ES2022 baseline of the sources. Bare (package) imports are kept
//! as-is. Script changes are not hot-swappable, so the task forces a full
//! page reload.

use super::{write_file, TaskError};
use crate::pipeline::{TaskContext, TaskReport};
use crate::serve::Reload;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use swc_common::sync::Lrc;
use swc_common::{FileName, SourceMap};
use swc_ecma_ast::{
    ClassDecl, ClassExpr, Decl, DefaultDecl, EsVersion, FnDecl, FnExpr, ModuleDecl, ModuleItem,
    Program, Stmt,
};
use swc_ecma_codegen::text_writer::JsWriter;
use swc_ecma_codegen::{Config as CodegenConfig, Emitter};
use swc_ecma_parser::{parse_file_as_program, EsSyntax, Syntax};

pub fn run(ctx: &TaskContext) -> TaskReport {
    let start = Instant::now();
    let paths = ctx.config.paths.scripts.clone();
    let dest = ctx.abs(&paths.dest);

    let mut outputs = Vec::new();
    let mut failures = Vec::new();

    for (name, entry) in &paths.entries {
        let entry = ctx.abs(entry);
        if !entry.is_file() {
            // A configured entry the project does not use matches nothing,
            // like an empty glob.
            continue;
        }
        match bundle_entry(&entry) {
            Ok(js) => {
                let out = dest.join(format!("{}.min.js", name));
                match write_file(&out, js.as_bytes()) {
                    Ok(()) => outputs.push(out),
                    Err(err) => failures.push(format!("{}: {}", name, err)),
                }
            }
            Err(err) => failures.push(format!("{}: {}", name, err)),
        }
    }

    if !outputs.is_empty() {
        ctx.notify(Reload::Full);
    }

    let duration = start.elapsed();
    if failures.is_empty() {
        TaskReport::success("scripts", outputs, duration)
    } else {
        TaskReport::failed("scripts", failures.join("; "), duration).with_outputs(outputs)
    }
}

/// Inline an entry and its relative imports, dependency-first.
fn bundle_entry(entry: &Path) -> Result<String, TaskError> {
    let mut visited = HashSet::new();
    let mut chunks = Vec::new();
    inline_module(entry, &mut visited, &mut chunks)?;
    Ok(chunks.join("\n"))
}

fn inline_module(
    path: &Path,
    visited: &mut HashSet<PathBuf>,
    chunks: &mut Vec<String>,
) -> Result<(), TaskError> {
    let identity = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(identity) {
        // Already inlined (diamond or cycle); inline once.
        return Ok(());
    }

    let code = std::fs::read_to_string(path)
        .map_err(|err| TaskError::Script(format!("{}: {}", path.display(), err)))?;
    let transformed = transform_module(path, &code)?;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    for spec in &transformed.imports {
        let dep = resolve_relative(dir, spec);
        inline_module(&dep, visited, chunks)?;
    }
    chunks.push(transformed.code);
    Ok(())
}

/// Resolve a relative import specifier against the importing module's
/// directory, defaulting the `.js` extension.
fn resolve_relative(dir: &Path, spec: &str) -> PathBuf {
    let mut path = dir.join(spec);
    if path.extension().is_none() {
        path.set_extension("js");
    }
    path
}

struct TransformedModule {
    /// Relative import specifiers, in source order
    imports: Vec<String>,
    /// Minified output with relative imports removed and exports unwrapped
    code: String,
}

fn transform_module(path: &Path, code: &str) -> Result<TransformedModule, TaskError> {
    let source_map: Lrc<SourceMap> = Lrc::new(SourceMap::default());
    let file = source_map
        .new_source_file(Lrc::new(FileName::Real(path.to_path_buf())), code.to_owned());

    let mut recovered = vec![];
    let program = parse_file_as_program(
        &file,
        Syntax::Es(EsSyntax::default()),
        EsVersion::Es2022,
        None,
        &mut recovered,
    )
    .map_err(|err| TaskError::Script(format!("{}: {}", path.display(), err.kind().msg())))?;
    if let Some(err) = recovered.first() {
        return Err(TaskError::Script(format!(
            "{}: {}",
            path.display(),
            err.kind().msg()
        )));
    }

    let mut imports = Vec::new();
    let program = match program {
        Program::Module(mut module) => {
            let mut kept = Vec::with_capacity(module.body.len());
            for item in module.body {
                match item {
                    ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => {
                        let spec = import.src.value.to_string();
                        if spec.starts_with("./") || spec.starts_with("../") {
                            imports.push(spec);
                        } else {
                            // Bare import: left for the page to provide.
                            kept.push(ModuleItem::ModuleDecl(ModuleDecl::Import(import)));
                        }
                    }
                    ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                        kept.push(ModuleItem::Stmt(Stmt::Decl(export.decl)));
                    }
                    ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(export)) => {
                        // A named default export carries its declaration
                        // into the flat scope; an anonymous one has no
                        // binding to inline.
                        match export.decl {
                            DefaultDecl::Fn(FnExpr { ident: Some(ident), function }) => {
                                kept.push(ModuleItem::Stmt(Stmt::Decl(Decl::Fn(FnDecl {
                                    ident,
                                    declare: false,
                                    function,
                                }))));
                            }
                            DefaultDecl::Class(ClassExpr { ident: Some(ident), class }) => {
                                kept.push(ModuleItem::Stmt(Stmt::Decl(Decl::Class(
                                    ClassDecl { ident, declare: false, class },
                                ))));
                            }
                            _ => {
                                return Err(TaskError::Script(format!(
                                    "{}: anonymous default export cannot be inlined; name it",
                                    path.display()
                                )));
                            }
                        }
                    }
                    ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(export))
                        if export.src.is_none() =>
                    {
                        // `export { a, b }` only re-labels bindings that
                        // already exist in the flat scope.
                    }
                    ModuleItem::ModuleDecl(_) => {
                        return Err(TaskError::Script(format!(
                            "{}: unsupported module declaration cannot be inlined",
                            path.display()
                        )));
                    }
                    stmt => kept.push(stmt),
                }
            }
            module.body = kept;
            Program::Module(module)
        }
        script => script,
    };

    let mut buf = vec![];
    {
        let writer = JsWriter::new(Lrc::clone(&source_map), "\n", &mut buf, None);
        let mut emitter = Emitter {
            // The target only shapes printing; it performs no syntax
            // downleveling, so the bundle stays at the source baseline.
            cfg: CodegenConfig::default()
                .with_target(EsVersion::Es2022)
                .with_minify(true),
            cm: Lrc::clone(&source_map),
            comments: None,
            wr: writer,
        };
        emitter
            .emit_program(&program)
            .map_err(|err| TaskError::Script(err.to_string()))?;
    }
    let code = String::from_utf8(buf)
        .map_err(|err| TaskError::Script(format!("{}: {}", path.display(), err)))?;

    Ok(TransformedModule { imports, code })
}
