//! Supervisor tying together the session loop, the feed health monitor and
//! the dashboard server.

use std::sync::Arc;

use alert_ingest::{
    AlertBackend, HttpBackend, LedgerViewer, ResolutionController, SnapshotFetcher,
};
use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::dashboard::{
    DashboardConfig,
    data::Publisher,
    health::{FeedHealth, spawn_health_monitor},
    server::{ServerState, spawn_dashboard_server},
    session::{DashboardSession, SessionControl},
    telemetry,
};

/// Run the dashboard until Ctrl+C.
pub fn run(config: DashboardConfig) -> Result<()> {
    let _telemetry = telemetry::install(&config.telemetry)?;
    telemetry::init_metrics_recorder()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("dashboard-worker")
        .build()
        .context("failed to build tokio runtime")?;
    runtime.block_on(serve(config))
}

async fn serve(config: DashboardConfig) -> Result<()> {
    let backend: Arc<dyn AlertBackend> =
        Arc::new(HttpBackend::new(&config.backend).context("invalid backend configuration")?);

    let (control, filter) = SessionControl::new(config.filter);
    let publisher = Arc::new(Publisher::new());
    let health = Arc::new(FeedHealth::new(config.stale_after));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let server = spawn_dashboard_server(
        config.bind,
        ServerState {
            publisher: publisher.clone(),
            control: control.clone(),
            resolver: ResolutionController::new(backend.clone(), control.trigger().clone()),
            ledger: LedgerViewer::new(backend.clone()),
            fetcher: SnapshotFetcher::new(backend.clone()),
            default_resolver: config.resolver.clone(),
            runtime: tokio::runtime::Handle::current(),
        },
    )?;
    info!(
        backend = %config.backend.base_url,
        filter = %config.filter,
        "dashboard available at http://{}/",
        server.local_addr()
    );

    let monitor = spawn_health_monitor(health.clone(), publisher.clone(), shutdown_rx.clone());
    let session = DashboardSession::new(SnapshotFetcher::new(backend), filter, health, publisher);
    let session = tokio::spawn(session.run(
        control.trigger().clone(),
        config.poll_interval,
        shutdown_rx,
    ));

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(err) => warn!("failed to listen for Ctrl+C, shutting down: {err}"),
    }

    let _ = shutdown_tx.send(true);
    if let Err(err) = session.await {
        warn!("session task ended abnormally: {err}");
    }
    if let Err(err) = monitor.await {
        warn!("health monitor ended abnormally: {err}");
    }
    tokio::task::spawn_blocking(move || server.stop())
        .await
        .context("dashboard server did not stop cleanly")?;
    Ok(())
}
