use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use incident_core::{AlertFilter, ChainValidityVerdict, IncidentId, LedgerBlock, RawAlertRecord};

use crate::{
    backend::AlertBackend,
    error::{FetchError, ResolveError},
};

/// In-memory backend that records how it was called.
pub(crate) struct FakeBackend {
    alerts: Mutex<Result<Vec<RawAlertRecord>, FetchError>>,
    verdict: Mutex<Result<ChainValidityVerdict, FetchError>>,
    rejection: Mutex<Option<ResolveError>>,
    last_filter: Mutex<Option<AlertFilter>>,
    resolve_calls: AtomicUsize,
}

impl FakeBackend {
    pub(crate) fn with_alerts(alerts: Vec<RawAlertRecord>) -> Self {
        Self {
            alerts: Mutex::new(Ok(alerts)),
            verdict: Mutex::new(Ok(ChainValidityVerdict::valid())),
            rejection: Mutex::new(None),
            last_filter: Mutex::new(None),
            resolve_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn set_alerts(&self, alerts: Result<Vec<RawAlertRecord>, FetchError>) {
        *self.alerts.lock().unwrap() = alerts;
    }

    pub(crate) fn set_verdict(&self, verdict: Result<ChainValidityVerdict, FetchError>) {
        *self.verdict.lock().unwrap() = verdict;
    }

    pub(crate) fn reject_resolutions(&self, err: ResolveError) {
        *self.rejection.lock().unwrap() = Some(err);
    }

    pub(crate) fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_filter(&self) -> Option<AlertFilter> {
        *self.last_filter.lock().unwrap()
    }
}

#[async_trait]
impl AlertBackend for FakeBackend {
    async fn list_alerts(&self, filter: AlertFilter) -> Result<Vec<RawAlertRecord>, FetchError> {
        *self.last_filter.lock().unwrap() = Some(filter);
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
        Ok(Vec::new())
    }

    async fn ledger_block(&self, index: u64) -> Result<LedgerBlock, FetchError> {
        Err(FetchError::NotFound {
            detail: format!("ledger block {index} not found"),
        })
    }

    async fn resolve_alert(
        &self,
        id: &IncidentId,
        resolved_by: &str,
    ) -> Result<RawAlertRecord, ResolveError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.rejection.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(RawAlertRecord {
            incident_id: Some(id.to_string()),
            resolved: Some(true),
            resolved_by: Some(resolved_by.to_string()),
            ..RawAlertRecord::default()
        })
    }
}
