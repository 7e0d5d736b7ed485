//! Embedded static HTML served by the dashboard web UI.
//!
//! The pages are kept as `&'static str` so they ship inside the binary without
//! filesystem lookups.

pub mod dashboard;
pub mod ledger;
