//! Actix Web server exposing the dashboard, the overlay op stream, the ledger
//! viewer and the user actions.
//!
//! The server runs on a dedicated thread with its own actix system. Backend
//! calls made on behalf of a request are spawned onto the main tokio runtime so
//! every reqwest connection lives in one place.

use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};

use actix_web::{
    App, HttpResponse, HttpServer,
    http::{StatusCode, header},
    web::{self, Bytes},
};
use alert_ingest::{FetchError, LedgerViewer, ResolutionController, ResolveError, SnapshotFetcher};
use anyhow::{Context, Result};
use async_stream::stream;
use incident_core::{AlertFilter, LedgerCard, render_chain};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast::error::RecvError, oneshot};
use tracing::{debug, error, info};

use crate::dashboard::{
    data::{Publisher, VerdictPanel},
    session::SessionControl,
    telemetry,
};

const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Shared state backing HTTP handlers.
pub(crate) struct ServerState {
    pub(crate) publisher: Arc<Publisher>,
    pub(crate) control: SessionControl,
    pub(crate) resolver: ResolutionController,
    pub(crate) ledger: LedgerViewer,
    /// Per-subject lookups; the session's own view is not touched.
    pub(crate) fetcher: SnapshotFetcher,
    /// Used when a resolve request does not name a resolver.
    pub(crate) default_resolver: Option<String>,
    /// Runtime that owns backend I/O.
    pub(crate) runtime: tokio::runtime::Handle,
}

impl ServerState {
    async fn on_runtime<F>(&self, task: F) -> Result<F::Output, HttpResponse>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.runtime.spawn(task).await.map_err(|err| {
            error!("backend task failed: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal", err.to_string())
        })
    }
}

/// Handle for the dashboard server thread.
pub(crate) struct DashboardServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl DashboardServer {
    pub(crate) fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signal the server to stop and block until the thread exits.
    pub(crate) fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Bind `addr` and serve the dashboard from a dedicated thread.
pub(crate) fn spawn_dashboard_server(
    addr: SocketAddr,
    state: ServerState,
) -> Result<DashboardServer> {
    let listener = std::net::TcpListener::bind(addr)
        .with_context(|| format!("failed to bind dashboard server to {addr}"))?;
    let addr = listener.local_addr().context("bound listener has no address")?;
    let data = web::Data::new(state);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let handle = telemetry::spawn_thread("dashboard-server", move || {
        if let Err(err) = actix_web::rt::System::new().block_on(async move {
            let server = HttpServer::new(move || {
                App::new().app_data(data.clone()).configure(routes)
            })
            .workers(2)
            .listen(listener)?
            .run();

            let srv_handle = server.handle();
            actix_web::rt::spawn(async move {
                let _ = shutdown_rx.await;
                srv_handle.stop(true).await;
            });

            server.await
        }) {
            error!("dashboard server error: {err}");
        }
    })
    .context("failed to spawn dashboard server thread")?;

    info!(%addr, "dashboard server listening");
    Ok(DashboardServer {
        addr,
        shutdown: Some(shutdown_tx),
        handle: Some(handle),
    })
}

pub(crate) fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index_route))
        .route("/ledger", web::get().to(ledger_page_route))
        .route("/api/view", web::get().to(view_handler))
        .route("/api/stream", web::get().to(stream_handler))
        .route("/api/ledger", web::get().to(ledger_handler))
        .route("/api/ledger/{index}", web::get().to(block_handler))
        .route(
            "/api/subjects/{subject}/alerts",
            web::get().to(subject_handler),
        )
        .route(
            "/api/incidents/{id}/resolve",
            web::post().to(resolve_handler),
        )
        .route("/api/refresh", web::post().to(refresh_handler))
        .route("/api/filter", web::post().to(filter_handler))
        .route("/metrics", web::get().to(metrics_handler));
}

#[derive(Serialize)]
struct ErrorBody {
    kind: &'static str,
    error: String,
}

fn error_response(status: StatusCode, kind: &'static str, error: String) -> HttpResponse {
    HttpResponse::build(status).json(ErrorBody { kind, error })
}

fn fetch_error_response(err: &FetchError) -> HttpResponse {
    let status = match err {
        FetchError::NotFound { .. } => StatusCode::NOT_FOUND,
        FetchError::Transport { .. } | FetchError::Parse { .. } => StatusCode::BAD_GATEWAY,
    };
    error_response(status, err.kind(), err.to_string())
}

fn resolve_error_response(err: &ResolveError) -> HttpResponse {
    let status = match err {
        ResolveError::Precondition { .. } => StatusCode::BAD_REQUEST,
        ResolveError::Rejected { status, .. } => StatusCode::from_u16(*status)
            .ok()
            .filter(StatusCode::is_client_error)
            .unwrap_or(StatusCode::BAD_GATEWAY),
        ResolveError::Transport { .. } => StatusCode::BAD_GATEWAY,
    };
    let detail = match err {
        ResolveError::Precondition { detail }
        | ResolveError::Rejected { detail, .. }
        | ResolveError::Transport { detail } => detail.clone(),
    };
    error_response(status, err.kind(), detail)
}

async fn index_route() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(crate::html::dashboard::DASHBOARD_HTML)
}

async fn ledger_page_route() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(crate::html::ledger::LEDGER_HTML)
}

/// Current rows, markers, status area and verdict.
async fn view_handler(state: web::Data<ServerState>) -> HttpResponse {
    HttpResponse::Ok().json(state.publisher.snapshot())
}

fn sse_chunk<T: Serialize>(event: &str, id: u64, payload: &T) -> Bytes {
    match serde_json::to_string(payload) {
        Ok(json) => Bytes::from(format!("event: {event}\nid: {id}\ndata: {json}\n\n")),
        Err(err) => Bytes::from(format!("event: error\ndata: {err}\n\n")),
    }
}

/// Stream overlay operations as Server-Sent Events.
///
/// The first event is a full `snapshot`; every following `pass` event carries
/// only the operations of one pass. A subscriber that falls behind is sent a
/// fresh snapshot instead of the missed passes.
async fn stream_handler(state: web::Data<ServerState>) -> HttpResponse {
    let publisher = state.publisher.clone();
    let mut events = publisher.subscribe();
    let initial = publisher.snapshot();

    let stream = stream! {
        yield Ok::<Bytes, actix_web::Error>(Bytes::from_static(b"retry: 2000\n\n"));
        let mut seen = initial.sequence;
        yield Ok(sse_chunk("snapshot", initial.sequence, &initial));
        loop {
            match tokio::time::timeout(KEEPALIVE_INTERVAL, events.recv()).await {
                Err(_) => {
                    yield Ok(Bytes::from_static(b": keep-alive\n\n"));
                }
                Ok(Ok(event)) => {
                    if event.sequence <= seen {
                        continue;
                    }
                    seen = event.sequence;
                    yield Ok(sse_chunk("pass", event.sequence, &event));
                }
                Ok(Err(RecvError::Lagged(skipped))) => {
                    debug!(skipped, "stream subscriber lagged; resending snapshot");
                    let snapshot = publisher.snapshot();
                    seen = snapshot.sequence;
                    yield Ok(sse_chunk("snapshot", snapshot.sequence, &snapshot));
                }
                Ok(Err(RecvError::Closed)) => break,
            }
        }
    };

    HttpResponse::Ok()
        .insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, "GET"))
        .append_header(("Cache-Control", "no-cache"))
        .append_header(("Content-Type", "text/event-stream"))
        .append_header(("Connection", "keep-alive"))
        .streaming(stream)
}

#[derive(Serialize)]
struct LedgerResponse {
    verdict: VerdictPanel,
    blocks: Vec<LedgerCard>,
}

async fn ledger_handler(state: web::Data<ServerState>) -> HttpResponse {
    let ledger = state.ledger.clone();
    let fetched = match state.on_runtime(async move { ledger.fetch_ledger().await }).await {
        Ok(fetched) => fetched,
        Err(response) => return response,
    };
    match fetched {
        Ok(blocks) => HttpResponse::Ok().json(LedgerResponse {
            verdict: state.publisher.snapshot().verdict,
            blocks: render_chain(&blocks),
        }),
        Err(err) => fetch_error_response(&err),
    }
}

async fn block_handler(path: web::Path<u64>, state: web::Data<ServerState>) -> HttpResponse {
    let index = path.into_inner();
    let ledger = state.ledger.clone();
    let fetched = match state
        .on_runtime(async move { ledger.fetch_block(index).await })
        .await
    {
        Ok(fetched) => fetched,
        Err(response) => return response,
    };
    match fetched {
        Ok(block) => HttpResponse::Ok().json(block.render()),
        Err(err) => fetch_error_response(&err),
    }
}

#[derive(Deserialize)]
struct SubjectQuery {
    #[serde(default)]
    unresolved_only: bool,
}

/// Consolidated incidents raised by one subject.
async fn subject_handler(
    path: web::Path<String>,
    query: web::Query<SubjectQuery>,
    state: web::Data<ServerState>,
) -> HttpResponse {
    let subject = path.into_inner();
    let unresolved_only = query.unresolved_only;
    let fetcher = state.fetcher.clone();
    let fetched = match state
        .on_runtime(async move { fetcher.fetch_subject(&subject, unresolved_only).await })
        .await
    {
        Ok(fetched) => fetched,
        Err(response) => return response,
    };
    match fetched {
        Ok(incidents) => HttpResponse::Ok().json(incidents),
        Err(err) => fetch_error_response(&err),
    }
}

#[derive(Deserialize)]
struct ResolveQuery {
    resolved_by: Option<String>,
}

#[derive(Serialize)]
struct ResolvedBody {
    incident: String,
    resolved_by: Option<String>,
    resolved_at: Option<String>,
}

/// Resolve one incident. The table catches up on the pass this requests.
async fn resolve_handler(
    path: web::Path<String>,
    query: web::Query<ResolveQuery>,
    state: web::Data<ServerState>,
) -> HttpResponse {
    let id = path.into_inner();
    let resolver_name = query
        .into_inner()
        .resolved_by
        .filter(|name| !name.trim().is_empty())
        .or_else(|| state.default_resolver.clone())
        .unwrap_or_default();

    let controller = state.resolver.clone();
    let task_id = id.clone();
    let outcome = match state
        .on_runtime(async move { controller.resolve_incident(&task_id, &resolver_name).await })
        .await
    {
        Ok(outcome) => outcome,
        Err(response) => return response,
    };

    match outcome {
        Ok(record) => {
            metrics::counter!("dashboard_resolutions_total", "outcome" => "resolved").increment(1);
            HttpResponse::Ok().json(ResolvedBody {
                incident: record.incident_id.unwrap_or(id),
                resolved_by: record.resolved_by,
                resolved_at: record.resolved_at,
            })
        }
        Err(err) => {
            metrics::counter!("dashboard_resolutions_total", "outcome" => err.kind()).increment(1);
            resolve_error_response(&err)
        }
    }
}

async fn refresh_handler(state: web::Data<ServerState>) -> HttpResponse {
    state.control.refresh();
    HttpResponse::Accepted().json(serde_json::json!({ "requested": true }))
}

#[derive(Deserialize)]
struct FilterQuery {
    value: Option<String>,
}

async fn filter_handler(
    query: web::Query<FilterQuery>,
    state: web::Data<ServerState>,
) -> HttpResponse {
    let filter = query
        .value
        .as_deref()
        .map(|value| value.parse::<AlertFilter>().unwrap_or_default())
        .unwrap_or_default();
    state.control.set_filter(filter);
    HttpResponse::Accepted().json(serde_json::json!({ "filter": state.control.filter().label() }))
}

async fn metrics_handler() -> HttpResponse {
    match telemetry::prometheus_handle() {
        Some(handle) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(handle.render()),
        None => HttpResponse::ServiceUnavailable().body("metrics recorder not initialised"),
    }
}
