use std::sync::Arc;

use incident_core::{IncidentId, RawAlertRecord};
use tracing::{Instrument, info, info_span, warn};

use crate::{backend::AlertBackend, error::ResolveError, trigger::PassTrigger};

/// Resolves one incident, then asks for a fresh pass so the authoritative
/// state flows back through the normal pipeline.
///
/// Rendered state is never patched locally and failures are never retried.
#[derive(Clone)]
pub struct ResolutionController {
    backend: Arc<dyn AlertBackend>,
    trigger: PassTrigger,
}

impl ResolutionController {
    pub fn new(backend: Arc<dyn AlertBackend>, trigger: PassTrigger) -> Self {
        Self { backend, trigger }
    }

    pub async fn resolve_incident(
        &self,
        id: &str,
        resolver: &str,
    ) -> Result<RawAlertRecord, ResolveError> {
        let id = IncidentId::new(id).ok_or_else(|| ResolveError::Precondition {
            detail: "an incident identifier is required".into(),
        })?;
        let resolver = resolver.trim();
        if resolver.is_empty() {
            return Err(ResolveError::Precondition {
                detail: "a resolver identity is required".into(),
            });
        }

        let span = info_span!("ingest.resolve", incident = %id, resolver);
        async {
            match self.backend.resolve_alert(&id, resolver).await {
                Ok(record) => {
                    info!("incident resolved; requesting refresh");
                    self.trigger.request();
                    Ok(record)
                }
                Err(err) => {
                    warn!(kind = err.kind(), "resolution failed: {err}");
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }
}
