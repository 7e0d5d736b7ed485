//! Table and map projections of the reconciled incident set.
//!
//! Both projections are pure consumers of reconcile output. The board owns
//! its row and marker tables outright and hands opaque handles back to the
//! rendered view, so identity survives from one pass to the next. Every
//! mutation is also journalled as an [`OverlayOp`] for remote renderers.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::trace;

use crate::model::{ConsolidatedIncident, GeoPoint, IncidentId, PLACEHOLDER};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RowHandle(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MarkerHandle(u64);

/// Overlay identity of one rendered incident.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlayHandles {
    pub row: RowHandle,
    /// `None` while the incident has no usable position.
    pub marker: Option<MarkerHandle>,
}

/// Consumer of reconcile operations.
pub trait OverlaySink {
    /// Render a newly seen incident.
    fn add(&mut self, incident: &ConsolidatedIncident) -> OverlayHandles;
    /// Re-render an incident in place, returning its (possibly changed) handles.
    fn update(&mut self, handles: OverlayHandles, incident: &ConsolidatedIncident)
    -> OverlayHandles;
    /// Tear down everything rendered for an evicted incident.
    fn remove(&mut self, id: &IncidentId, handles: OverlayHandles);
}

/// Fully rendered table row; every cell is well-formed text.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TableRow {
    pub handle: RowHandle,
    pub incident_id: String,
    pub subject: String,
    pub time: String,
    pub location: String,
    pub status: String,
    pub resolved_by: String,
    pub resolved_at: String,
    pub message: String,
    /// Whether the row offers a resolve action.
    pub resolvable: bool,
}

impl TableRow {
    fn render(handle: RowHandle, incident: &ConsolidatedIncident) -> Self {
        let location = incident
            .position()
            .map(|point| format!("{:.5}, {:.5}", point.lat, point.lon))
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        let status = match incident.resolved {
            Some(true) => "Resolved".to_string(),
            Some(false) => "Open".to_string(),
            None => PLACEHOLDER.to_string(),
        };
        Self {
            handle,
            incident_id: incident.id.to_string(),
            subject: cell(incident.subject_id.as_deref()),
            time: cell(incident.timestamp.as_deref()),
            location,
            status,
            resolved_by: cell(incident.resolved_by.as_deref()),
            resolved_at: cell(incident.resolved_at.as_deref()),
            message: cell(incident.message.as_deref()),
            resolvable: incident.resolved != Some(true),
        }
    }
}

/// Map marker for one geolocated incident.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Marker {
    pub handle: MarkerHandle,
    pub incident_id: String,
    pub position: GeoPoint,
    pub resolved: bool,
    /// Popup body as `(label, value)` lines.
    pub popup: Vec<(String, String)>,
}

impl Marker {
    fn render(handle: MarkerHandle, position: GeoPoint, incident: &ConsolidatedIncident) -> Self {
        let resolved = incident.resolved == Some(true);
        let popup = vec![
            ("Incident".to_string(), incident.id.to_string()),
            ("Subject".to_string(), cell(incident.subject_id.as_deref())),
            ("Time".to_string(), cell(incident.timestamp.as_deref())),
            (
                "Resolved".to_string(),
                if resolved { "Yes" } else { "No" }.to_string(),
            ),
            ("Message".to_string(), cell(incident.message.as_deref())),
        ];
        Self {
            handle,
            incident_id: incident.id.to_string(),
            position,
            resolved,
            popup,
        }
    }
}

/// Journal entry describing one projection mutation.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OverlayOp {
    RowAdded { row: TableRow },
    RowUpdated { row: TableRow },
    RowRemoved { handle: RowHandle },
    MarkerAdded { marker: Marker },
    MarkerMoved { marker: Marker },
    MarkerRemoved { handle: MarkerHandle },
}

/// Point-in-time copy of both projections.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct OverlaySnapshot {
    pub rows: Vec<TableRow>,
    pub markers: Vec<Marker>,
}

#[derive(Debug, Default)]
struct TableProjection {
    rows: BTreeMap<RowHandle, TableRow>,
    next: u64,
}

impl TableProjection {
    fn insert(&mut self, incident: &ConsolidatedIncident) -> TableRow {
        self.next += 1;
        let row = TableRow::render(RowHandle(self.next), incident);
        self.rows.insert(row.handle, row.clone());
        row
    }

    fn rewrite(&mut self, handle: RowHandle, incident: &ConsolidatedIncident) -> TableRow {
        let row = TableRow::render(handle, incident);
        self.rows.insert(handle, row.clone());
        row
    }

    fn delete(&mut self, handle: RowHandle) -> bool {
        self.rows.remove(&handle).is_some()
    }
}

#[derive(Debug, Default)]
struct MapProjection {
    markers: BTreeMap<MarkerHandle, Marker>,
    next: u64,
}

impl MapProjection {
    fn place(&mut self, position: GeoPoint, incident: &ConsolidatedIncident) -> Marker {
        self.next += 1;
        let marker = Marker::render(MarkerHandle(self.next), position, incident);
        self.markers.insert(marker.handle, marker.clone());
        marker
    }

    fn relocate(
        &mut self,
        handle: MarkerHandle,
        position: GeoPoint,
        incident: &ConsolidatedIncident,
    ) -> Marker {
        let marker = Marker::render(handle, position, incident);
        self.markers.insert(handle, marker.clone());
        marker
    }

    fn delete(&mut self, handle: MarkerHandle) -> bool {
        self.markers.remove(&handle).is_some()
    }
}

/// The dashboard's overlay sink: one table row per incident, one marker per
/// geolocated incident.
#[derive(Debug, Default)]
pub struct OverlayBoard {
    table: TableProjection,
    map: MapProjection,
    journal: Vec<OverlayOp>,
}

impl OverlayBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows in first-rendered order.
    pub fn rows(&self) -> impl Iterator<Item = &TableRow> {
        self.table.rows.values()
    }

    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.map.markers.values()
    }

    pub fn row(&self, handle: RowHandle) -> Option<&TableRow> {
        self.table.rows.get(&handle)
    }

    pub fn marker(&self, handle: MarkerHandle) -> Option<&Marker> {
        self.map.markers.get(&handle)
    }

    pub fn row_count(&self) -> usize {
        self.table.rows.len()
    }

    pub fn marker_count(&self) -> usize {
        self.map.markers.len()
    }

    pub fn snapshot(&self) -> OverlaySnapshot {
        OverlaySnapshot {
            rows: self.rows().cloned().collect(),
            markers: self.markers().cloned().collect(),
        }
    }

    /// Hand over the operations journalled since the last drain.
    pub fn drain_ops(&mut self) -> Vec<OverlayOp> {
        std::mem::take(&mut self.journal)
    }

    fn place_marker(&mut self, incident: &ConsolidatedIncident) -> Option<MarkerHandle> {
        let position = incident.position()?;
        let marker = self.map.place(position, incident);
        let handle = marker.handle;
        self.journal.push(OverlayOp::MarkerAdded { marker });
        Some(handle)
    }

    fn drop_marker(&mut self, handle: MarkerHandle) {
        if self.map.delete(handle) {
            self.journal.push(OverlayOp::MarkerRemoved { handle });
        }
    }
}

impl OverlaySink for OverlayBoard {
    fn add(&mut self, incident: &ConsolidatedIncident) -> OverlayHandles {
        let row = self.table.insert(incident);
        let row_handle = row.handle;
        self.journal.push(OverlayOp::RowAdded { row });
        let marker = self.place_marker(incident);
        trace!(incident = %incident.id, ?marker, "overlay add");
        OverlayHandles {
            row: row_handle,
            marker,
        }
    }

    fn update(
        &mut self,
        handles: OverlayHandles,
        incident: &ConsolidatedIncident,
    ) -> OverlayHandles {
        let row = self.table.rewrite(handles.row, incident);
        self.journal.push(OverlayOp::RowUpdated { row });

        // Gaining or losing a usable position is remove+add, never a move.
        let marker = match (handles.marker, incident.position()) {
            (Some(handle), Some(position)) => {
                let marker = self.map.relocate(handle, position, incident);
                self.journal.push(OverlayOp::MarkerMoved { marker });
                Some(handle)
            }
            (Some(handle), None) => {
                self.drop_marker(handle);
                None
            }
            (None, Some(_)) => self.place_marker(incident),
            (None, None) => None,
        };
        trace!(incident = %incident.id, ?marker, "overlay update");
        OverlayHandles {
            row: handles.row,
            marker,
        }
    }

    fn remove(&mut self, id: &IncidentId, handles: OverlayHandles) {
        if self.table.delete(handles.row) {
            self.journal
                .push(OverlayOp::RowRemoved { handle: handles.row });
        }
        if let Some(marker) = handles.marker {
            self.drop_marker(marker);
        }
        trace!(incident = %id, "overlay remove");
    }
}

fn cell(value: Option<&str>) -> String {
    match value {
        Some(text) if !text.trim().is_empty() => text.to_string(),
        _ => PLACEHOLDER.to_string(),
    }
}
