//! The dashboard session: one rendered view, one overlay board, one pass at a
//! time.
//!
//! Passes are driven by the poll interval and by on-demand requests (refresh,
//! filter change, successful resolve) arriving through a shared
//! [`PassTrigger`]. Because the loop awaits each pass before selecting again,
//! passes never overlap and results always apply in the order their fetches
//! started.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use alert_ingest::{PassTrigger, SnapshotFetcher};
use chrono::{SecondsFormat, Utc};
use incident_core::{
    AlertFilter, OverlayBoard, ReconcileReport, RenderedView, consolidate, reconcile,
};
use metrics::{counter, gauge, histogram};
use tokio::{sync::watch, time::MissedTickBehavior};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::dashboard::{
    data::{Publisher, StatusArea, VerdictPanel},
    health::FeedHealth,
};

/// User-facing knobs shared with the web server.
#[derive(Clone)]
pub(crate) struct SessionControl {
    trigger: PassTrigger,
    filter: Arc<watch::Sender<AlertFilter>>,
}

impl SessionControl {
    pub(crate) fn new(initial: AlertFilter) -> (Self, watch::Receiver<AlertFilter>) {
        let (filter, receiver) = watch::channel(initial);
        let control = Self {
            trigger: PassTrigger::new(),
            filter: Arc::new(filter),
        };
        (control, receiver)
    }

    pub(crate) fn trigger(&self) -> &PassTrigger {
        &self.trigger
    }

    pub(crate) fn refresh(&self) {
        self.trigger.request();
    }

    /// Switch the filter used by subsequent passes and ask for one now.
    pub(crate) fn set_filter(&self, filter: AlertFilter) {
        let previous = self.filter.send_replace(filter);
        if previous != filter {
            info!(from = %previous, to = %filter, "filter changed");
        }
        self.trigger.request();
    }

    pub(crate) fn filter(&self) -> AlertFilter {
        *self.filter.borrow()
    }
}

/// What a single pass did.
#[derive(Debug)]
pub(crate) struct PassOutcome {
    /// `None` when the incident fetch failed and the view was left untouched.
    pub(crate) report: Option<ReconcileReport>,
    pub(crate) sequence: u64,
}

pub(crate) struct DashboardSession {
    fetcher: SnapshotFetcher,
    filter: watch::Receiver<AlertFilter>,
    view: RenderedView,
    board: OverlayBoard,
    status: StatusArea,
    verdict: VerdictPanel,
    health: Arc<FeedHealth>,
    publisher: Arc<Publisher>,
}

impl DashboardSession {
    pub(crate) fn new(
        fetcher: SnapshotFetcher,
        filter: watch::Receiver<AlertFilter>,
        health: Arc<FeedHealth>,
        publisher: Arc<Publisher>,
    ) -> Self {
        Self {
            fetcher,
            filter,
            view: RenderedView::new(),
            board: OverlayBoard::new(),
            status: StatusArea::default(),
            verdict: VerdictPanel::default(),
            health,
            publisher,
        }
    }

    /// Run passes until `shutdown` changes or its sender is dropped.
    pub(crate) async fn run(
        mut self,
        trigger: PassTrigger,
        poll_interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            poll_interval = %humantime::format_duration(poll_interval),
            "dashboard session started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = trigger.requested() => debug!("on-demand pass"),
                _ = shutdown.changed() => break,
            }
            let outcome = self.run_pass().await;
            debug!(
                sequence = outcome.sequence,
                applied = outcome.report.is_some(),
                "pass published"
            );
            // The interval counts from the end of the last pass, whatever started it.
            ticker.reset();
        }

        info!(passes = self.status.passes, "dashboard session stopped");
    }

    /// Fetch, consolidate, reconcile and publish once.
    pub(crate) async fn run_pass(&mut self) -> PassOutcome {
        let filter = *self.filter.borrow_and_update();
        let span = info_span!("dashboard.pass", pass = self.status.passes + 1, filter = %filter);
        self.execute(filter).instrument(span).await
    }

    async fn execute(&mut self, filter: AlertFilter) -> PassOutcome {
        let started = Instant::now();
        let snapshot = self.fetcher.fetch_snapshot(filter).await;
        self.status.passes += 1;
        self.status.filter = filter.label().to_string();

        let report = match snapshot.records {
            Ok(records) => {
                let received = records.len();
                let incidents = consolidate(records);
                let report = reconcile(&mut self.view, incidents, &mut self.board);
                self.status.last_success =
                    Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
                self.status.last_error = None;
                self.health.beat();
                counter!("dashboard_passes_total", "outcome" => "ok").increment(1);
                info!(
                    received,
                    added = report.to_add.len(),
                    updated = report.to_update.len(),
                    removed = report.to_remove.len(),
                    "pass applied"
                );
                Some(report)
            }
            Err(err) => {
                self.status.failed_passes += 1;
                self.status.last_error = Some(err.to_string());
                counter!("dashboard_passes_total", "outcome" => "error").increment(1);
                counter!(
                    "dashboard_fetch_failures_total",
                    "source" => "alerts",
                    "kind" => err.kind()
                )
                .increment(1);
                warn!(kind = err.kind(), "incident fetch failed; keeping last view: {err}");
                None
            }
        };

        match snapshot.verdict {
            Ok(verdict) => self.verdict.accept(verdict),
            Err(err) => {
                counter!(
                    "dashboard_fetch_failures_total",
                    "source" => "chain_verdict",
                    "kind" => err.kind()
                )
                .increment(1);
                debug!(kind = err.kind(), "keeping last chain verdict");
                self.verdict.fail(err.to_string());
            }
        }

        self.status.incidents = self.view.len();
        self.status.markers = self.board.marker_count();
        self.status.stale = self.health.is_stale();
        gauge!("dashboard_incidents").set(self.view.len() as f64);
        gauge!("dashboard_markers").set(self.board.marker_count() as f64);
        histogram!("dashboard_pass_latency_seconds").record(started.elapsed().as_secs_f64());

        let ops = self.board.drain_ops();
        let sequence = self.publisher.publish(
            self.board.snapshot(),
            ops,
            self.status.clone(),
            self.verdict.clone(),
        );
        PassOutcome { report, sequence }
    }
}
