//! Development server and live reload
//!
//! Serves the output root on a fixed local port and pushes reload signals
//! to connected browsers over server-sent events. Tasks feed the push
//! channel through a cloneable [`ReloadHub`]; the server itself runs on a
//! dedicated thread-owned tokio runtime so the task pipeline stays
//! synchronous.
//!
//! Two client-facing endpoints sit in front of the static files:
//! `/__livereload` (the SSE stream) and `/__livereload.js` (a small client
//! that full-reloads on `reload` events and re-links stylesheets on `css`
//! events, so style updates do not force a page reload).

use crate::pipeline::{PipelineError, TaskContext, TaskReport};
use axum::extract::State;
use axum::http::header;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::Router;
use futures::stream::Stream;
use std::convert::Infallible;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;

/// A reload signal pushed to connected clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reload {
    /// Full page reload (templates, scripts)
    Full,
    /// Stylesheet re-link without a page reload (styles, images, icons)
    Css,
}

/// Cloneable handle for pushing reload signals.
///
/// Connection state lives entirely inside the broadcast channel; tasks
/// never touch it. Pushing with no connected client is a no-op.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    tx: broadcast::Sender<Reload>,
}

impl ReloadHub {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(16);
        Self { tx }
    }

    /// Push a signal to all connected clients.
    pub fn notify(&self, reload: Reload) {
        // Err means no subscriber is connected right now.
        let _ = self.tx.send(reload);
    }

    /// Subscribe to the signal stream (one receiver per SSE connection).
    pub fn subscribe(&self) -> broadcast::Receiver<Reload> {
        self.tx.subscribe()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Browser-side client, served at `/__livereload.js`.
const CLIENT_JS: &str = r#"(() => {
  const source = new EventSource("/__livereload");
  source.addEventListener("reload", () => location.reload());
  source.addEventListener("css", () => {
    for (const link of document.querySelectorAll('link[rel="stylesheet"]')) {
      const url = new URL(link.href, location.href);
      url.searchParams.set("v", Date.now().toString());
      link.href = url.toString();
    }
  });
})();
"#;

/// Run the development server. Blocks until the process is terminated;
/// returns an error only when the server cannot start.
pub fn run(ctx: &TaskContext) -> Result<TaskReport, PipelineError> {
    let hub = ctx.reload.clone().unwrap_or_default();
    let dist = ctx.out_root();
    let port = ctx.config.serve.port;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| PipelineError::Serve(err.to_string()))?;

    crate::reporter::info(&format!("Serving {} on http://localhost:{}", dist.display(), port));

    runtime
        .block_on(serve_inner(dist, port, hub))
        .map_err(PipelineError::Serve)?;

    // Unreachable in practice: the server runs until the process dies.
    Ok(TaskReport::success("serve", vec![], Duration::ZERO))
}

async fn serve_inner(dist: PathBuf, port: u16, hub: ReloadHub) -> Result<(), String> {
    let app = Router::new()
        .route("/__livereload", get(sse_handler))
        .route("/__livereload.js", get(client_js))
        .fallback_service(ServeDir::new(dist))
        .with_state(hub);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .map_err(|err| format!("cannot bind port {}: {}", port, err))?;
    axum::serve(listener, app).await.map_err(|err| err.to_string())
}

async fn sse_handler(
    State(hub): State<ReloadHub>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = hub.subscribe();
    let stream = futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(Reload::Full) => {
                    return Some((Ok(Event::default().event("reload").data("page")), rx));
                }
                Ok(Reload::Css) => {
                    return Some((Ok(Event::default().event("css").data("stylesheet")), rx));
                }
                // Slow client missed signals; the next one still arrives.
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn client_js() -> ([(header::HeaderName, &'static str); 1], &'static str) {
    ([(header::CONTENT_TYPE, "application/javascript")], CLIENT_JS)
}
