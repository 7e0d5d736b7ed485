//! Set reconciliation between the rendered view and a fresh incident set.
//!
//! The rendered view is the only state that survives between passes. It is
//! advanced exclusively by [`reconcile`], which swaps in the new baseline in a
//! single assignment after the sink has applied every operation.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::model::{ConsolidatedIncident, IncidentId};
use crate::overlay::{OverlayHandles, OverlaySink};

#[derive(Clone, Debug)]
struct ViewEntry {
    incident: ConsolidatedIncident,
    handles: OverlayHandles,
}

/// What is currently on screen, keyed by incident identifier.
#[derive(Debug, Default)]
pub struct RenderedView {
    entries: HashMap<IncidentId, ViewEntry>,
}

impl RenderedView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &IncidentId) -> bool {
        self.entries.contains_key(id)
    }

    /// Last applied incident for `id`. Useful for carrying a field forward
    /// when the newest pass omitted it.
    pub fn get(&self, id: &IncidentId) -> Option<&ConsolidatedIncident> {
        self.entries.get(id).map(|entry| &entry.incident)
    }

    pub fn handles(&self, id: &IncidentId) -> Option<OverlayHandles> {
        self.entries.get(id).map(|entry| entry.handles)
    }

    pub fn ids(&self) -> impl Iterator<Item = &IncidentId> {
        self.entries.keys()
    }
}

/// Operations that turn the previous view into the incoming set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReconcilePlan {
    pub to_add: Vec<ConsolidatedIncident>,
    pub to_update: Vec<ConsolidatedIncident>,
    pub to_remove: Vec<IncidentId>,
}

/// Identifier-level summary of a plan.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub to_add: Vec<IncidentId>,
    pub to_update: Vec<IncidentId>,
    pub to_remove: Vec<IncidentId>,
}

impl ReconcilePlan {
    pub fn report(&self) -> ReconcileReport {
        ReconcileReport {
            to_add: self.to_add.iter().map(|i| i.id.clone()).collect(),
            to_update: self.to_update.iter().map(|i| i.id.clone()).collect(),
            to_remove: self.to_remove.clone(),
        }
    }
}

/// Partition `previous ∪ incoming` identifiers into add, update and remove.
///
/// Identifiers seen on both sides are always updates; values are not compared.
/// Should `incoming` repeat an identifier, the last occurrence is used.
pub fn diff(previous: &RenderedView, incoming: Vec<ConsolidatedIncident>) -> ReconcilePlan {
    let incoming = dedupe(incoming);
    let incoming_ids: HashSet<&IncidentId> = incoming.iter().map(|i| &i.id).collect();

    let mut to_remove: Vec<(&IncidentId, &ViewEntry)> = previous
        .entries
        .iter()
        .filter(|(id, _)| !incoming_ids.contains(id))
        .collect();
    to_remove.sort_by_key(|(_, entry)| entry.handles.row);
    let to_remove = to_remove.into_iter().map(|(id, _)| id.clone()).collect();

    let (to_update, to_add): (Vec<_>, Vec<_>) = incoming
        .into_iter()
        .partition(|incident| previous.contains(&incident.id));

    ReconcilePlan {
        to_add,
        to_update,
        to_remove,
    }
}

/// Diff `incoming` against `view`, apply the result to `sink`, then advance
/// `view` to exactly `incoming`.
pub fn reconcile<S>(
    view: &mut RenderedView,
    incoming: Vec<ConsolidatedIncident>,
    sink: &mut S,
) -> ReconcileReport
where
    S: OverlaySink + ?Sized,
{
    let plan = diff(view, incoming);
    let report = plan.report();
    let mut next = HashMap::with_capacity(plan.to_add.len() + plan.to_update.len());

    for id in &plan.to_remove {
        if let Some(entry) = view.entries.get(id) {
            sink.remove(id, entry.handles);
        }
    }

    for incident in plan.to_update {
        let Some(previous) = view.entries.get(&incident.id) else {
            continue;
        };
        let handles = sink.update(previous.handles, &incident);
        next.insert(incident.id.clone(), ViewEntry { incident, handles });
    }

    for incident in plan.to_add {
        let handles = sink.add(&incident);
        next.insert(incident.id.clone(), ViewEntry { incident, handles });
    }

    view.entries = next;
    debug!(
        added = report.to_add.len(),
        updated = report.to_update.len(),
        removed = report.to_remove.len(),
        rendered = view.entries.len(),
        "view reconciled"
    );
    report
}

fn dedupe(incoming: Vec<ConsolidatedIncident>) -> Vec<ConsolidatedIncident> {
    let mut positions: HashMap<IncidentId, usize> = HashMap::with_capacity(incoming.len());
    let mut unique: Vec<ConsolidatedIncident> = Vec::with_capacity(incoming.len());
    for incident in incoming {
        match positions.get(&incident.id) {
            Some(&slot) => unique[slot] = incident,
            None => {
                positions.insert(incident.id.clone(), unique.len());
                unique.push(incident);
            }
        }
    }
    unique
}
