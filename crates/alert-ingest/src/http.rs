//! reqwest-backed [`AlertBackend`].

use std::time::Duration;

use async_trait::async_trait;
use incident_core::{
    AlertFilter, ChainValidityVerdict, IncidentId, LedgerBlock, LedgerChain, RawAlertRecord,
};
use reqwest::{Client, Response, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    backend::AlertBackend,
    error::{BuildError, FetchError, ResolveError},
};

/// Where the backend lives and how long to wait for it.
#[derive(Clone, Debug)]
pub struct BackendConfig {
    /// Scheme, host and optional path prefix, e.g. `http://127.0.0.1:8000`.
    pub base_url: String,
    /// Alerts collection path, relative to `base_url`.
    pub alerts_path: String,
    /// Ledger routes prefix, relative to `base_url`.
    pub chain_path: String,
    pub request_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".into(),
            alerts_path: "/alerts/".into(),
            chain_path: "/blockchain".into(),
            request_timeout: Duration::from_secs(8),
        }
    }
}

#[derive(Clone, Debug)]
struct Endpoints {
    alerts: Url,
    chain: Url,
}

#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    endpoints: Endpoints,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BuildError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        let endpoints = Endpoints {
            alerts: endpoint(&config.base_url, &config.alerts_path)?,
            chain: endpoint(&config.base_url, &config.chain_path)?,
        };
        debug!(alerts = %endpoints.alerts, chain = %endpoints.chain, "alert backend configured");
        Ok(Self { client, endpoints })
    }

    async fn get(&self, url: Url, what: &str) -> Result<Response, FetchError> {
        self.client
            .get(url)
            .send()
            .await
            .map_err(|err| transport(what, err))
    }
}

#[async_trait]
impl AlertBackend for HttpBackend {
    async fn list_alerts(&self, filter: AlertFilter) -> Result<Vec<RawAlertRecord>, FetchError> {
        let mut request = self.client.get(self.endpoints.alerts.clone());
        if let Some(pair) = filter.query_pair() {
            request = request.query(&[pair]);
        }
        let response = request.send().await.map_err(|err| transport("alerts", err))?;
        let body = success_json(response, "alerts").await?;
        parse_alert_records(body)
    }

    async fn subject_alerts(
        &self,
        subject: &str,
        unresolved_only: bool,
    ) -> Result<Vec<RawAlertRecord>, FetchError> {
        let url = join(&self.endpoints.alerts, &["tourist", subject]);
        let mut request = self.client.get(url);
        if unresolved_only {
            request = request.query(&[("unresolved_only", "true")]);
        }
        let response = request
            .send()
            .await
            .map_err(|err| transport("subject alerts", err))?;
        let body = success_json(response, "subject alerts").await?;
        parse_alert_records(body)
    }

    async fn chain_verdict(&self) -> Result<ChainValidityVerdict, FetchError> {
        let url = join(&self.endpoints.chain, &["validate"]);
        let response = self.get(url, "chain validation").await?;
        let status = response.status();

        if status == StatusCode::BAD_REQUEST {
            // A broken chain is reported as a 400 carrying the reason.
            return match error_detail(response).await {
                Some(detail) => Ok(ChainValidityVerdict::broken(detail)),
                None => Err(status_error("chain validation", status)),
            };
        }

        let body = success_json(response, "chain validation").await?;
        serde_json::from_value(body).map_err(|err| FetchError::Parse {
            detail: format!("chain validation body has no usable verdict: {err}"),
        })
    }

    async fn ledger(&self) -> Result<Vec<LedgerBlock>, FetchError> {
        let url = join(&self.endpoints.chain, &["list"]);
        let response = self.get(url, "ledger").await?;
        let body = success_json(response, "ledger").await?;
        let chain: LedgerChain = serde_json::from_value(body).map_err(|err| FetchError::Parse {
            detail: format!("ledger body is not a chain listing: {err}"),
        })?;
        Ok(chain.chain)
    }

    async fn ledger_block(&self, index: u64) -> Result<LedgerBlock, FetchError> {
        let segment = index.to_string();
        let url = join(&self.endpoints.chain, &["block", &segment]);
        let response = self.get(url, "ledger block").await?;
        if response.status() == StatusCode::NOT_FOUND {
            let detail = error_detail(response)
                .await
                .unwrap_or_else(|| format!("ledger block {index} not found"));
            return Err(FetchError::NotFound { detail });
        }
        let body = success_json(response, "ledger block").await?;
        serde_json::from_value(body).map_err(|err| FetchError::Parse {
            detail: format!("ledger block {index} is malformed: {err}"),
        })
    }

    async fn resolve_alert(
        &self,
        id: &IncidentId,
        resolved_by: &str,
    ) -> Result<RawAlertRecord, ResolveError> {
        let url = join(&self.endpoints.alerts, &[id.as_str(), "resolve"]);
        let response = self
            .client
            .patch(url)
            .query(&[("resolved_by", resolved_by)])
            .send()
            .await
            .map_err(|err| ResolveError::Transport {
                detail: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = error_detail(response).await;
            let fallback = || format!("resolve request failed with HTTP {status}");
            // Only a stated reason or a client error counts as a refusal.
            return Err(match detail {
                Some(detail) => ResolveError::Rejected {
                    status: status.as_u16(),
                    detail,
                },
                None if status.is_client_error() => ResolveError::Rejected {
                    status: status.as_u16(),
                    detail: fallback(),
                },
                None => ResolveError::Transport { detail: fallback() },
            });
        }

        match response.json::<RawAlertRecord>().await {
            Ok(record) => Ok(record),
            Err(err) => {
                // The resolution went through; only the echo is unreadable.
                warn!(incident = %id, "unreadable resolve response: {err}");
                Ok(RawAlertRecord {
                    incident_id: Some(id.to_string()),
                    resolved: Some(true),
                    resolved_by: Some(resolved_by.to_string()),
                    ..RawAlertRecord::default()
                })
            }
        }
    }
}

/// Decode an alert listing. Non-array bodies are a parse error; individual
/// elements that are not usable records are skipped.
pub(crate) fn parse_alert_records(body: Value) -> Result<Vec<RawAlertRecord>, FetchError> {
    let Value::Array(items) = body else {
        return Err(FetchError::Parse {
            detail: format!("alerts body is not a list (found {})", value_kind(&body)),
        });
    };

    let total = items.len();
    let mut records = Vec::with_capacity(total);
    for (position, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            warn!(position, kind = value_kind(&item), "skipping non-object alert entry");
            continue;
        }
        match serde_json::from_value::<RawAlertRecord>(item) {
            Ok(record) => records.push(record),
            Err(err) => warn!(position, "skipping malformed alert entry: {err}"),
        }
    }
    if records.len() < total {
        debug!(kept = records.len(), total, "alert listing partially decoded");
    }
    Ok(records)
}

fn endpoint(base: &str, path: &str) -> Result<Url, BuildError> {
    let raw = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let url = Url::parse(&raw).map_err(|err| BuildError::InvalidUrl {
        url: raw.clone(),
        detail: err.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(BuildError::InvalidUrl {
            url: raw,
            detail: "url cannot carry a path".into(),
        });
    }
    Ok(url)
}

/// Append percent-encoded path segments, dropping a trailing empty segment.
fn join(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

async fn success_json(response: Response, what: &str) -> Result<Value, FetchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(status_error(what, status));
    }
    response.json::<Value>().await.map_err(|err| FetchError::Parse {
        detail: format!("{what} body is not JSON: {err}"),
    })
}

/// `detail` field of an error body, stringified when it is not text.
async fn error_detail(response: Response) -> Option<String> {
    let body = response.json::<Value>().await.ok()?;
    match body.get("detail")? {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::String(_) | Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn status_error(what: &str, status: StatusCode) -> FetchError {
    FetchError::Transport {
        status: Some(status.as_u16()),
        detail: format!("{what} request failed with HTTP {status}"),
    }
}

fn transport(what: &str, err: reqwest::Error) -> FetchError {
    let detail = if err.is_timeout() {
        format!("{what} request timed out")
    } else {
        format!("{what} request failed: {err}")
    };
    FetchError::Transport {
        status: err.status().map(|status| status.as_u16()),
        detail,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
