//! Live incident dashboard: polls the alert backend, reconciles the incident
//! set into table and map overlays, and serves them to browsers.
//!
//! The module is split into focused submodules:
//! - `config`: CLI arguments and validated settings.
//! - `pipeline`: Wires the session, health monitor and server together.
//! - `session`: Single-flight pass loop owning the rendered view.
//! - `data`: Published view and per-pass events shared with the server.
//! - `server`: Actix Web dashboard, op stream, ledger and action endpoints.
//! - `health`: Feed staleness monitor.
//! - `telemetry`: Tracing and Prometheus setup.

pub use config::{BackendArgs, DashboardCliArgs, DashboardConfig, TelemetryOptions};
pub use pipeline::run;

mod config;
mod data;
mod health;
mod pipeline;
mod server;
mod session;
pub(crate) mod telemetry;

#[cfg(test)]
mod testing;
