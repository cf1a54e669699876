//! Embedded web dashboard for mallscope.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - The single-page dashboard (filters, four charts, question box)
//! - JSON API endpoints for filter options, charts, questions, and health
//!
//! A fixed pool of worker threads pulls requests off one shared listener,
//! so a slow question does not hold up chart updates.

mod api;
mod frontend;

use std::io::Cursor;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use crate::config::MallscopeConfig;
use crate::dataset::Dataset;
use crate::llm::Dispatcher;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Everything a request handler may touch. Built once at startup and shared
/// read-only between workers.
#[derive(Debug)]
pub struct AppState {
    pub dataset: Dataset,
    pub dispatcher: Dispatcher,
    pub chat_endpoint: String,
}

impl AppState {
    pub fn new(dataset: Dataset, dispatcher: Dispatcher) -> Self {
        Self {
            dataset,
            dispatcher,
            chat_endpoint: String::new(),
        }
    }

    /// Load the dataset and build the dispatcher from the resolved config.
    pub fn from_config(config: &MallscopeConfig) -> Result<Self> {
        let dataset = Dataset::load(&config.dataset).context("failed to load customer dataset")?;
        let dispatcher = Dispatcher::from_config(config);

        Ok(Self {
            dataset,
            dispatcher,
            chat_endpoint: config.chat.endpoint.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the dashboard server on `addr` with `workers` handler threads.
///
/// Blocks the current thread. Per-request errors become 500 responses and
/// never take the server down.
pub fn serve(state: AppState, addr: &str, workers: usize) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;
    let server = Arc::new(server);
    let state = Arc::new(state);

    tracing::info!(%addr, workers, records = state.dataset.len(), "dashboard listening");
    println!("mallscope dashboard running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    let handles = (0..workers.max(1))
        .map(|id| {
            let server = Arc::clone(&server);
            let state = Arc::clone(&state);
            thread::Builder::new()
                .name(format!("mallscope-worker-{id}"))
                .spawn(move || {
                    for request in server.incoming_requests() {
                        handle_request(&state, request);
                    }
                })
        })
        .collect::<std::io::Result<Vec<_>>>()
        .context("failed to spawn worker threads")?;

    for handle in handles {
        let _ = handle.join();
    }

    Ok(())
}

/// Read, dispatch, respond, log.
fn handle_request(state: &AppState, mut request: Request) {
    let start = Instant::now();
    let method = request.method().clone();
    let url = request.url().to_string();

    // Read body up-front for methods that carry one
    let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
        let mut buf = String::new();
        if let Err(e) = request.as_reader().read_to_string(&mut buf) {
            tracing::debug!(error = %e, "failed to read request body");
        }
        Some(buf)
    } else {
        None
    };

    let resp = match dispatch(state, &method, &url, body.as_deref()) {
        Ok(resp) => resp,
        Err(e) => {
            tracing::warn!(%method, %url, error = %format!("{e:#}"), "request failed");
            error_response(500, &format!("{e:#}"))
        }
    };

    let status = resp.status_code().0;
    if let Err(e) = request.respond(resp) {
        tracing::debug!(error = %e, "failed to send response");
    }

    tracing::info!(
        %method,
        %url,
        status,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request"
    );
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch an incoming request to the appropriate handler.
pub fn dispatch(
    state: &AppState,
    method: &Method,
    url: &str,
    body: Option<&str>,
) -> Result<Response<Cursor<Vec<u8>>>> {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));

    match (method, path) {
        // Frontend
        (&Method::Get, "/") | (&Method::Get, "/index.html") => Ok(serve_frontend()),

        // API
        (&Method::Get, "/api/options") => api::get_options(state),
        (&Method::Get, "/api/charts") => api::get_charts(state, query),
        (&Method::Post, "/api/ask") => api::post_ask(state, body.unwrap_or("{}")),
        (&Method::Get, "/api/health") => api::get_health(state),

        // 404
        _ => Ok(not_found()),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Serve the embedded single-page frontend.
fn serve_frontend() -> Response<Cursor<Vec<u8>>> {
    Response::from_data(frontend::INDEX_HTML.as_bytes().to_vec())
        .with_header(content_type_html())
        .with_status_code(StatusCode(200))
}

/// 404 response.
fn not_found() -> Response<Cursor<Vec<u8>>> {
    error_response(404, "not found")
}

/// JSON `{"error": ...}` with the given status.
fn error_response(status: u16, message: &str) -> Response<Cursor<Vec<u8>>> {
    let body = serde_json::json!({ "error": message }).to_string();
    Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(status))
}

/// JSON content type header.
pub(crate) fn content_type_json() -> Header {
    header("Content-Type", "application/json; charset=utf-8")
}

/// HTML content type header.
fn content_type_html() -> Header {
    header("Content-Type", "text/html; charset=utf-8")
}

fn header(name: &'static str, value: &'static str) -> Header {
    Header::from_bytes(name, value).expect("static header is valid ASCII")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
