//! Templates task
//!
//! Renders every page template under the pages glob to flat HTML in the
//! output root. Page templates may extend or include anything under the
//! views root. A single page's render failure is surfaced and does not
//! stop the remaining pages; the task still pushes a full reload when it
//! finishes.

use crate::pipeline::{TaskContext, TaskReport};
use crate::select::{dest_path, pattern_base, select};
use crate::serve::Reload;
use minijinja::{context, path_loader, Environment, Value};
use std::time::Instant;

pub fn run(ctx: &TaskContext) -> TaskReport {
    let start = Instant::now();
    let paths = ctx.config.paths.templates.clone();
    let views_root = ctx.abs(&paths.views_root);
    let dest = ctx.abs(&paths.dest);
    let pages_base = ctx.root.join(pattern_base(&paths.pages));
    let pages = select(&ctx.root, std::slice::from_ref(&paths.pages));

    let mut env = Environment::new();
    env.set_loader(path_loader(&views_root));
    let site = Value::from_serialize(&ctx.config.site);

    let mut outputs = Vec::new();
    let mut failures = Vec::new();
    for page in &pages {
        let name = match page.strip_prefix(&views_root) {
            Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
            Err(_) => {
                failures.push(format!("{}: outside the views root", page.display()));
                continue;
            }
        };
        let rendered = env
            .get_template(&name)
            .and_then(|template| template.render(context! { site => site.clone() }));
        match rendered {
            Ok(html) => {
                let mut out = dest_path(page, &pages_base, &dest);
                out.set_extension("html");
                match super::write_file(&out, html.as_bytes()) {
                    Ok(()) => outputs.push(out),
                    Err(err) => failures.push(format!("{}: {}", out.display(), err)),
                }
            }
            Err(err) => failures.push(format!("{}: {}", name, err)),
        }
    }

    // Reload even when a page failed: the successfully rendered pages
    // are already on disk.
    if !pages.is_empty() {
        ctx.notify(Reload::Full);
    }

    let duration = start.elapsed();
    if failures.is_empty() {
        TaskReport::success("templates", outputs, duration)
    } else {
        TaskReport::failed("templates", failures.join("; "), duration).with_outputs(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{default_config, Config};
    use crate::serve::ReloadHub;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_view(root: &Path, rel: &str, content: &str) {
        let path = root.join("src/views").join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn ctx_with(root: &Path, config: Config) -> TaskContext {
        TaskContext::new(config, root.to_path_buf())
    }

    #[test]
    fn test_pages_render_with_includes() {
        let temp = TempDir::new().unwrap();
        write_view(temp.path(), "partials/header.html", "<header>hi</header>");
        write_view(
            temp.path(),
            "pages/index.html",
            "{% include 'partials/header.html' %}<main>home</main>",
        );

        let report = run(&ctx_with(temp.path(), default_config()));
        assert!(report.is_success(), "{:?}", report.status);

        let html = fs::read_to_string(temp.path().join("dist/index.html")).unwrap();
        assert!(html.contains("<header>hi</header>"));
        assert!(html.contains("<main>home</main>"));
        // partials are not rendered as pages
        assert!(!temp.path().join("dist/partials").exists());
    }

    #[test]
    fn test_site_values_are_exposed() {
        let temp = TempDir::new().unwrap();
        write_view(temp.path(), "pages/about.html", "<title>{{ site.title }}</title>");

        let mut config = default_config();
        config.site.insert("title".to_string(), toml::Value::String("Sitekit".to_string()));

        let report = run(&ctx_with(temp.path(), config));
        assert!(report.is_success());
        let html = fs::read_to_string(temp.path().join("dist/about.html")).unwrap();
        assert!(html.contains("<title>Sitekit</title>"));
    }

    #[test]
    fn test_broken_page_does_not_stop_the_rest() {
        let temp = TempDir::new().unwrap();
        write_view(temp.path(), "pages/bad.html", "{% if %}");
        write_view(temp.path(), "pages/good.html", "<p>fine</p>");

        let hub = ReloadHub::new();
        let mut rx = hub.subscribe();
        let ctx = ctx_with(temp.path(), default_config()).with_reload(hub);
        let report = run(&ctx);

        assert!(!report.is_success());
        assert!(temp.path().join("dist/good.html").is_file());
        assert!(!temp.path().join("dist/bad.html").exists());
        // the reload signal still fires
        assert_eq!(rx.try_recv().unwrap(), Reload::Full);
    }

    #[test]
    fn test_nested_pages_keep_subpaths() {
        let temp = TempDir::new().unwrap();
        write_view(temp.path(), "pages/blog/post.html", "<article/>");

        let report = run(&ctx_with(temp.path(), default_config()));
        assert!(report.is_success());
        assert!(temp.path().join("dist/blog/post.html").is_file());
    }
}
