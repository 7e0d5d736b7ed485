//! Alert records as they arrive from the backend, and the canonical incident
//! view consolidated from them.

use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Glyph rendered wherever an optional field was never supplied.
pub const PLACEHOLDER: &str = "—";

/// Stable identifier of one incident. Never empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct IncidentId(String);

impl IncidentId {
    /// Returns `None` for empty or whitespace-only identifiers.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IncidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One partial observation of an incident, exactly as polled.
///
/// Every field is optional. `null` on the wire is the same as a missing key,
/// so a fragment can never erase a value another fragment supplied.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RawAlertRecord {
    #[serde(
        default,
        rename = "alert_uuid",
        alias = "id",
        deserialize_with = "lenient_string"
    )]
    pub incident_id: Option<String>,
    #[serde(
        default,
        rename = "temp_id",
        alias = "tempid",
        deserialize_with = "lenient_string"
    )]
    pub subject_id: Option<String>,
    #[serde(default, alias = "latitude", deserialize_with = "lenient_coordinate")]
    pub lat: Option<f64>,
    #[serde(default, alias = "longitude", deserialize_with = "lenient_coordinate")]
    pub lon: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub resolved: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub resolved_by: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub resolved_at: Option<String>,
    #[serde(default, rename = "blockchain_index")]
    pub ledger_index: Option<u64>,
    #[serde(default, rename = "blockchain_hash")]
    pub ledger_hash: Option<String>,
}

/// Observed resolution state. `Unresolved -> Resolved` is the only transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionState {
    Unresolved,
    Resolved,
}

/// WGS84 position that is usable for map placement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Canonical, merged view of one incident for a single reconciliation pass.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConsolidatedIncident {
    pub id: IncidentId,
    pub subject_id: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub timestamp: Option<String>,
    pub resolved: Option<bool>,
    pub message: Option<String>,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<String>,
    pub ledger_index: Option<u64>,
    pub ledger_hash: Option<String>,
}

impl ConsolidatedIncident {
    /// Empty accumulator: every optional field absent.
    pub fn new(id: IncidentId) -> Self {
        Self {
            id,
            subject_id: None,
            lat: None,
            lon: None,
            timestamp: None,
            resolved: None,
            message: None,
            resolved_by: None,
            resolved_at: None,
            ledger_index: None,
            ledger_hash: None,
        }
    }

    /// Overwrite each field the record carries; leave the rest untouched.
    pub fn merge(&mut self, record: RawAlertRecord) {
        fn take<T>(slot: &mut Option<T>, incoming: Option<T>) {
            if incoming.is_some() {
                *slot = incoming;
            }
        }

        take(&mut self.subject_id, record.subject_id);
        take(&mut self.lat, record.lat);
        take(&mut self.lon, record.lon);
        take(&mut self.timestamp, record.timestamp);
        take(&mut self.resolved, record.resolved);
        take(&mut self.message, record.message);
        take(&mut self.resolved_by, record.resolved_by);
        take(&mut self.resolved_at, record.resolved_at);
        take(&mut self.ledger_index, record.ledger_index);
        take(&mut self.ledger_hash, record.ledger_hash);
    }

    /// Map position, if both coordinates are present and not the `(0, 0)`
    /// "no fix" sentinel.
    pub fn position(&self) -> Option<GeoPoint> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) if !(lat == 0.0 && lon == 0.0) => Some(GeoPoint { lat, lon }),
            _ => None,
        }
    }

    pub fn state(&self) -> ResolutionState {
        if self.resolved == Some(true) {
            ResolutionState::Resolved
        } else {
            ResolutionState::Unresolved
        }
    }
}

/// Verdict reported by the ledger validation endpoint. Replaced wholesale on
/// every poll.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainValidityVerdict {
    pub valid: bool,
    #[serde(default, alias = "detail", skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl ChainValidityVerdict {
    pub fn valid() -> Self {
        Self {
            valid: true,
            diagnostic: None,
        }
    }

    pub fn broken(diagnostic: impl Into<String>) -> Self {
        Self {
            valid: false,
            diagnostic: Some(diagnostic.into()),
        }
    }

    /// Single-line status text shown in the verdict banner.
    pub fn summary(&self) -> String {
        match (self.valid, self.diagnostic.as_deref()) {
            (true, None) => "Ledger chain valid".to_string(),
            (true, Some(note)) => format!("Ledger chain valid ({note})"),
            (false, None) => "Ledger chain INVALID".to_string(),
            (false, Some(note)) => format!("Ledger chain INVALID: {note}"),
        }
    }
}

/// Which alerts a poll asks the backend for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertFilter {
    #[default]
    All,
    UnresolvedOnly,
    ResolvedOnly,
}

impl AlertFilter {
    /// Query parameter understood by the alerts endpoint, if any.
    pub fn query_pair(self) -> Option<(&'static str, &'static str)> {
        match self {
            AlertFilter::All => None,
            AlertFilter::UnresolvedOnly => Some(("unresolved_only", "true")),
            AlertFilter::ResolvedOnly => Some(("resolved_only", "true")),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AlertFilter::All => "all",
            AlertFilter::UnresolvedOnly => "unresolved",
            AlertFilter::ResolvedOnly => "resolved",
        }
    }
}

impl FromStr for AlertFilter {
    type Err = Infallible;

    /// Unknown values fall back to [`AlertFilter::All`].
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let filter = match value.trim().to_ascii_lowercase().as_str() {
            "unresolved" | "unresolved_only" | "open" => AlertFilter::UnresolvedOnly,
            "resolved" | "resolved_only" | "closed" => AlertFilter::ResolvedOnly,
            _ => AlertFilter::All,
        };
        Ok(filter)
    }
}

impl fmt::Display for AlertFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text)),
        Value::Number(number) => Ok(Some(number.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected string, found {other}"
        ))),
    }
}

fn lenient_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(value.filter(|v| v.is_finite()))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Bool(flag) => Ok(Some(flag)),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(Some(true)),
            "false" | "no" | "0" => Ok(Some(false)),
            _ => Err(serde::de::Error::custom(format!(
                "expected boolean, found {text:?}"
            ))),
        },
        other => Err(serde::de::Error::custom(format!(
            "expected boolean, found {other}"
        ))),
    }
}
