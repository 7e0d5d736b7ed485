use async_trait::async_trait;
use incident_core::{AlertFilter, ChainValidityVerdict, IncidentId, LedgerBlock, RawAlertRecord};

use crate::error::{FetchError, ResolveError};

/// Operations the dashboard needs from the alert backend.
///
/// Implementations must convert every failure into the typed errors; callers
/// never see transport exceptions.
#[async_trait]
pub trait AlertBackend: Send + Sync {
    /// Current alert fragments, optionally filtered by resolution state.
    async fn list_alerts(&self, filter: AlertFilter) -> Result<Vec<RawAlertRecord>, FetchError>;

    /// Alerts raised by one subject (the tourist's temporary id).
    async fn subject_alerts(
        &self,
        subject: &str,
        unresolved_only: bool,
    ) -> Result<Vec<RawAlertRecord>, FetchError>;

    /// Structural validity of the ledger chain.
    async fn chain_verdict(&self) -> Result<ChainValidityVerdict, FetchError>;

    /// Every ledger block, in chain order.
    async fn ledger(&self) -> Result<Vec<LedgerBlock>, FetchError>;

    async fn ledger_block(&self, index: u64) -> Result<LedgerBlock, FetchError>;

    /// Mark one alert resolved. Returns the backend's updated record.
    async fn resolve_alert(
        &self,
        id: &IncidentId,
        resolved_by: &str,
    ) -> Result<RawAlertRecord, ResolveError>;
}
