//! Incident reconciliation engine behind the alert dashboard.
//!
//! The crate is free of I/O. Each poll cycle hands it a batch of raw alert
//! fragments and it turns them into overlay operations:
//! - `model`: wire records, canonical incidents, filters and the chain verdict.
//! - `consolidate`: field-wise merge of fragments sharing an incident id.
//! - `reconcile`: add/update/remove diff against the retained rendered view.
//! - `overlay`: table and map projections driven purely by reconcile output.
//! - `ledger`: read-only rendering of the chain-of-custody blocks.

pub mod consolidate;
pub mod ledger;
pub mod model;
pub mod overlay;
pub mod reconcile;

pub use consolidate::consolidate;
pub use ledger::{LedgerBlock, LedgerCard, LedgerChain, render_chain};
pub use model::{
    AlertFilter, ChainValidityVerdict, ConsolidatedIncident, GeoPoint, IncidentId, PLACEHOLDER,
    RawAlertRecord, ResolutionState,
};
pub use overlay::{
    Marker, MarkerHandle, OverlayBoard, OverlayHandles, OverlayOp, OverlaySink, OverlaySnapshot,
    RowHandle, TableRow,
};
pub use reconcile::{ReconcilePlan, ReconcileReport, RenderedView, diff, reconcile};
