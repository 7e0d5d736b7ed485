use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use alert_ingest::{AlertBackend, FetchError, ResolveError};
use async_trait::async_trait;
use incident_core::{AlertFilter, ChainValidityVerdict, IncidentId, LedgerBlock, RawAlertRecord};
use serde_json::json;
use tokio::sync::Notify;

/// In-memory backend whose responses are set by the test.
pub(crate) struct ScriptedBackend {
    alerts: Mutex<Result<Vec<RawAlertRecord>, FetchError>>,
    verdict: Mutex<Result<ChainValidityVerdict, FetchError>>,
    filters: Mutex<Vec<AlertFilter>>,
    gate: Mutex<Option<Arc<Notify>>>,
    resolve_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub(crate) fn new(alerts: Vec<RawAlertRecord>) -> Self {
        Self {
            alerts: Mutex::new(Ok(alerts)),
            verdict: Mutex::new(Ok(ChainValidityVerdict::valid())),
            filters: Mutex::new(Vec::new()),
            gate: Mutex::new(None),
            resolve_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn set_alerts(&self, alerts: Result<Vec<RawAlertRecord>, FetchError>) {
        *self.alerts.lock().unwrap() = alerts;
    }

    pub(crate) fn set_verdict(&self, verdict: Result<ChainValidityVerdict, FetchError>) {
        *self.verdict.lock().unwrap() = verdict;
    }

    /// Filters of every listing request, in order.
    pub(crate) fn filters(&self) -> Vec<AlertFilter> {
        self.filters.lock().unwrap().clone()
    }

    /// Hold every listing request until [`Self::open_gate`].
    pub(crate) fn close_gate(&self) {
        *self.gate.lock().unwrap() = Some(Arc::new(Notify::new()));
    }

    pub(crate) fn open_gate(&self) {
        if let Some(gate) = self.gate.lock().unwrap().take() {
            gate.notify_waiters();
        }
    }

    pub(crate) fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }
}

pub(crate) fn record(id: &str) -> RawAlertRecord {
    RawAlertRecord {
        incident_id: Some(id.to_string()),
        ..RawAlertRecord::default()
    }
}

pub(crate) fn located(id: &str, lat: f64, lon: f64) -> RawAlertRecord {
    RawAlertRecord {
        lat: Some(lat),
        lon: Some(lon),
        ..record(id)
    }
}

pub(crate) fn http_500() -> FetchError {
    FetchError::Transport {
        status: Some(500),
        detail: "alerts request failed with HTTP 500 Internal Server Error".into(),
    }
}

#[async_trait]
impl AlertBackend for ScriptedBackend {
    async fn list_alerts(&self, filter: AlertFilter) -> Result<Vec<RawAlertRecord>, FetchError> {
        self.filters.lock().unwrap().push(filter);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.alerts.lock().unwrap().clone()
    }

    async fn subject_alerts(
        &self,
        subject: &str,
        unresolved_only: bool,
    ) -> Result<Vec<RawAlertRecord>, FetchError> {
        let alerts = self.alerts.lock().unwrap().clone()?;
        Ok(alerts
            .into_iter()
            .filter(|alert| alert.subject_id.as_deref() == Some(subject))
            .filter(|alert| !unresolved_only || alert.resolved != Some(true))
            .collect())
    }

    async fn chain_verdict(&self) -> Result<ChainValidityVerdict, FetchError> {
        self.verdict.lock().unwrap().clone()
    }

    async fn ledger(&self) -> Result<Vec<LedgerBlock>, FetchError> {
        Ok(vec![
            LedgerBlock {
                index: Some(0),
                hash: Some("h0".into()),
                previous_hash: Some("0".into()),
                data: Some(json!("genesis")),
                ..LedgerBlock::default()
            },
            LedgerBlock {
                index: Some(1),
                hash: Some("h1".into()),
                previous_hash: Some("h0".into()),
                data: Some(json!({"alert_uuid": "a-1"})),
                ..LedgerBlock::default()
            },
        ])
    }

    async fn ledger_block(&self, index: u64) -> Result<LedgerBlock, FetchError> {
        let blocks = self.ledger().await?;
        blocks
            .into_iter()
            .find(|block| block.index == Some(index))
            .ok_or_else(|| FetchError::NotFound {
                detail: "Block not found".into(),
            })
    }

    async fn resolve_alert(
        &self,
        id: &IncidentId,
        resolved_by: &str,
    ) -> Result<RawAlertRecord, ResolveError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        Ok(RawAlertRecord {
            resolved: Some(true),
            resolved_by: Some(resolved_by.to_string()),
            ..record(id.as_str())
        })
    }
}
