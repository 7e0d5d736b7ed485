use std::collections::HashMap;

use tracing::debug;

use crate::model::{ConsolidatedIncident, IncidentId, RawAlertRecord};

/// Merge raw fragments into one incident per identifier.
///
/// Records are folded in received order. A field present in a later record
/// overwrites the accumulated value; a field it omits keeps whatever earlier
/// records supplied. Records without a usable identifier are dropped. Output is
/// ordered by first appearance of each identifier.
///
/// Every call starts from an empty accumulator, so nothing leaks between passes.
pub fn consolidate<I>(records: I) -> Vec<ConsolidatedIncident>
where
    I: IntoIterator<Item = RawAlertRecord>,
{
    let mut incidents: Vec<ConsolidatedIncident> = Vec::new();
    let mut slots: HashMap<IncidentId, usize> = HashMap::new();
    let mut dropped = 0usize;

    for mut record in records {
        let Some(id) = record.incident_id.take().and_then(IncidentId::new) else {
            dropped += 1;
            continue;
        };
        let slot = *slots.entry(id.clone()).or_insert_with(|| {
            incidents.push(ConsolidatedIncident::new(id));
            incidents.len() - 1
        });
        incidents[slot].merge(record);
    }

    if dropped > 0 {
        debug!(
            dropped,
            kept = incidents.len(),
            "dropped alert records without an incident identifier"
        );
    }
    incidents
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(id: &str) -> RawAlertRecord {
        RawAlertRecord {
            incident_id: Some(id.to_string()),
            ..RawAlertRecord::default()
        }
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(consolidate(Vec::new()).is_empty());
    }

    #[test]
    fn location_and_resolution_fragments_merge() {
        let located = RawAlertRecord {
            lat: Some(10.0),
            lon: Some(20.0),
            ..fragment("A")
        };
        let resolved = RawAlertRecord {
            resolved: Some(true),
            resolved_by: Some("bob".into()),
            ..fragment("A")
        };

        let incidents = consolidate(vec![located, resolved]);
        assert_eq!(incidents.len(), 1);
        let a = &incidents[0];
        assert_eq!(a.id.as_str(), "A");
        assert_eq!(a.lat, Some(10.0));
        assert_eq!(a.lon, Some(20.0));
        assert_eq!(a.resolved, Some(true));
        assert_eq!(a.resolved_by.as_deref(), Some("bob"));
        assert_eq!(a.message, None);
    }

    #[test]
    fn last_record_specifying_a_field_wins() {
        // One entry per fragment: the message it carries, if any.
        let sequences: Vec<Vec<Option<&str>>> = vec![
            vec![Some("first"), None, None],
            vec![Some("first"), Some("second"), None],
            vec![None, None, Some("only")],
            vec![Some("a"), None, Some("b"), None],
            vec![None, None],
        ];

        for sequence in sequences {
            let expected = sequence.iter().rev().find_map(|v| *v).map(str::to_string);
            let records = sequence.iter().map(|message| RawAlertRecord {
                message: message.map(str::to_string),
                ..fragment("same")
            });
            let incidents = consolidate(records);
            assert_eq!(incidents.len(), 1);
            assert_eq!(incidents[0].message, expected, "sequence {sequence:?}");
        }
    }

    #[test]
    fn records_without_identifier_are_dropped() {
        let anonymous = RawAlertRecord {
            lat: Some(1.0),
            ..RawAlertRecord::default()
        };
        let blank = RawAlertRecord {
            incident_id: Some("  ".into()),
            lat: Some(2.0),
            ..RawAlertRecord::default()
        };
        let incidents = consolidate(vec![anonymous, blank, fragment("B")]);
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].id.as_str(), "B");
        assert_eq!(incidents[0].lat, None);
    }

    #[test]
    fn output_follows_first_appearance() {
        let records = vec![fragment("C"), fragment("A"), fragment("C"), fragment("B")];
        let ids: Vec<_> = consolidate(records)
            .into_iter()
            .map(|incident| incident.id.to_string())
            .collect();
        assert_eq!(ids, ["C", "A", "B"]);
    }

    #[test]
    fn each_pass_starts_from_scratch() {
        let first = consolidate(vec![RawAlertRecord {
            message: Some("help".into()),
            ..fragment("A")
        }]);
        assert_eq!(first[0].message.as_deref(), Some("help"));

        let second = consolidate(vec![fragment("A")]);
        assert_eq!(second[0].message, None);
    }
}
