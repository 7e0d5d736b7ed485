//! Async ingest side of the dashboard: everything that talks to the alert
//! backend.
//!
//! - `backend`: the [`AlertBackend`] seam and the reqwest implementation.
//! - `fetcher`: snapshot fetcher (incident list and chain verdict, fetched
//!   independently) plus the read-only ledger viewer.
//! - `resolve`: resolution controller that re-triggers a pass on success.
//! - `trigger`: single-flight pass trigger.
//!
//! Transport and parse failures are converted to [`FetchError`] /
//! [`ResolveError`] here and never escape as panics.

pub mod backend;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod resolve;
pub mod trigger;

pub use backend::AlertBackend;
pub use error::{BuildError, FetchError, ResolveError};
pub use fetcher::{LedgerViewer, Snapshot, SnapshotFetcher};
pub use http::{BackendConfig, HttpBackend};
pub use resolve::ResolutionController;
pub use trigger::PassTrigger;

#[cfg(test)]
mod testing;
