//! Snapshot fetcher and ledger viewer.
//!
//! Neither type touches rendered state; they only turn backend calls into
//! typed outcomes.

use std::sync::Arc;

use incident_core::{
    AlertFilter, ChainValidityVerdict, ConsolidatedIncident, LedgerBlock, RawAlertRecord,
    consolidate,
};
use tracing::{Instrument, debug, info_span, warn};

use crate::{backend::AlertBackend, error::FetchError};

/// Result of one poll. The incident list and the chain verdict are separate
/// pipelines: either half may fail without affecting the other.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub records: Result<Vec<RawAlertRecord>, FetchError>,
    pub verdict: Result<ChainValidityVerdict, FetchError>,
}

#[derive(Clone)]
pub struct SnapshotFetcher {
    backend: Arc<dyn AlertBackend>,
}

impl SnapshotFetcher {
    pub fn new(backend: Arc<dyn AlertBackend>) -> Self {
        Self { backend }
    }

    /// Request both halves concurrently.
    pub async fn fetch_snapshot(&self, filter: AlertFilter) -> Snapshot {
        let (records, verdict) = tokio::join!(self.fetch_records(filter), self.fetch_verdict());
        Snapshot { records, verdict }
    }

    pub async fn fetch_records(
        &self,
        filter: AlertFilter,
    ) -> Result<Vec<RawAlertRecord>, FetchError> {
        let span = info_span!("ingest.fetch", source = "alerts", filter = %filter);
        async {
            let outcome = self.backend.list_alerts(filter).await;
            match &outcome {
                Ok(records) => debug!(records = records.len(), "alerts fetched"),
                Err(err) => warn!(kind = err.kind(), "alerts fetch failed: {err}"),
            }
            outcome
        }
        .instrument(span)
        .await
    }

    /// Consolidated incidents for one subject, outside the session's view.
    pub async fn fetch_subject(
        &self,
        subject: &str,
        unresolved_only: bool,
    ) -> Result<Vec<ConsolidatedIncident>, FetchError> {
        let span = info_span!("ingest.fetch", source = "subject_alerts", subject);
        async {
            match self.backend.subject_alerts(subject, unresolved_only).await {
                Ok(records) => {
                    let incidents = consolidate(records);
                    debug!(incidents = incidents.len(), "subject alerts fetched");
                    Ok(incidents)
                }
                Err(err) => {
                    warn!(kind = err.kind(), "subject alerts fetch failed: {err}");
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    pub async fn fetch_verdict(&self) -> Result<ChainValidityVerdict, FetchError> {
        let span = info_span!("ingest.fetch", source = "chain_verdict");
        async {
            let outcome = self.backend.chain_verdict().await;
            match &outcome {
                Ok(verdict) => debug!(valid = verdict.valid, "chain verdict fetched"),
                Err(err) => warn!(kind = err.kind(), "chain verdict fetch failed: {err}"),
            }
            outcome
        }
        .instrument(span)
        .await
    }
}

/// Read-only access to the chain-of-custody ledger.
#[derive(Clone)]
pub struct LedgerViewer {
    backend: Arc<dyn AlertBackend>,
}

impl LedgerViewer {
    pub fn new(backend: Arc<dyn AlertBackend>) -> Self {
        Self { backend }
    }

    pub async fn fetch_ledger(&self) -> Result<Vec<LedgerBlock>, FetchError> {
        let outcome = self.backend.ledger().await;
        if let Err(err) = &outcome {
            warn!(kind = err.kind(), "ledger fetch failed: {err}");
        }
        outcome
    }

    pub async fn fetch_block(&self, index: u64) -> Result<LedgerBlock, FetchError> {
        self.backend.ledger_block(index).await
    }
}
