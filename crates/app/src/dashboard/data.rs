use std::sync::{Mutex, MutexGuard, PoisonError};

use incident_core::{ChainValidityVerdict, OverlayOp, OverlaySnapshot};
use serde::Serialize;
use tokio::sync::broadcast;

/// Pass events buffered per subscriber before it is considered lagging.
pub(crate) const EVENT_BUFFER_CAPACITY: usize = 64;

/// Status area shown above the table. Only this area reflects fetch failures;
/// the overlay keeps its last good state.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub(crate) struct StatusArea {
    pub(crate) filter: String,
    pub(crate) last_success: Option<String>,
    pub(crate) last_error: Option<String>,
    pub(crate) passes: u64,
    pub(crate) failed_passes: u64,
    pub(crate) incidents: usize,
    pub(crate) markers: usize,
    pub(crate) stale: bool,
}

/// Chain verdict panel, rendered independently of the incident set.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub(crate) struct VerdictPanel {
    /// Last verdict received; `None` until one arrives.
    pub(crate) verdict: Option<ChainValidityVerdict>,
    pub(crate) summary: Option<String>,
    /// Why the latest verdict fetch failed, if it did.
    pub(crate) error: Option<String>,
}

impl VerdictPanel {
    pub(crate) fn accept(&mut self, verdict: ChainValidityVerdict) {
        self.summary = Some(verdict.summary());
        self.verdict = Some(verdict);
        self.error = None;
    }

    pub(crate) fn fail(&mut self, detail: String) {
        self.error = Some(detail);
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub(crate) struct PublishedView {
    pub(crate) sequence: u64,
    pub(crate) overlay: OverlaySnapshot,
    pub(crate) status: StatusArea,
    pub(crate) verdict: VerdictPanel,
}

/// Incremental update sent to stream subscribers after each publish.
#[derive(Clone, Debug, Serialize)]
pub(crate) struct PassEvent {
    pub(crate) sequence: u64,
    pub(crate) ops: Vec<OverlayOp>,
    pub(crate) status: StatusArea,
    pub(crate) verdict: VerdictPanel,
}

/// Latest published view plus a broadcast of per-pass deltas.
///
/// The view and the event share one lock so a subscriber that snapshots after
/// subscribing never misses or double-applies a pass.
pub(crate) struct Publisher {
    view: Mutex<PublishedView>,
    events: broadcast::Sender<PassEvent>,
}

impl Publisher {
    pub(crate) fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER_CAPACITY);
        Self {
            view: Mutex::new(PublishedView::default()),
            events,
        }
    }

    pub(crate) fn publish(
        &self,
        overlay: OverlaySnapshot,
        ops: Vec<OverlayOp>,
        status: StatusArea,
        verdict: VerdictPanel,
    ) -> u64 {
        let mut view = self.lock();
        view.sequence += 1;
        view.overlay = overlay;
        view.status = status.clone();
        view.verdict = verdict.clone();
        let sequence = view.sequence;
        // No subscribers is fine.
        let _ = self.events.send(PassEvent {
            sequence,
            ops,
            status,
            verdict,
        });
        sequence
    }

    /// Flip the stale flag without touching the overlay.
    pub(crate) fn mark_stale(&self, stale: bool) {
        let mut view = self.lock();
        if view.status.stale == stale {
            return;
        }
        view.sequence += 1;
        view.status.stale = stale;
        let _ = self.events.send(PassEvent {
            sequence: view.sequence,
            ops: Vec::new(),
            status: view.status.clone(),
            verdict: view.verdict.clone(),
        });
    }

    pub(crate) fn snapshot(&self) -> PublishedView {
        self.lock().clone()
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<PassEvent> {
        self.events.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, PublishedView> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
