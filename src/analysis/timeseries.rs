//! Chart-ready projection of selected fields.

use std::collections::BTreeMap;

use serde::Serialize;

use super::measurement;
use crate::data::model::Record;
use crate::data::schema::SchemaVersion;

/// One chart point. `index` is 1-based record position; each value is
/// `None` (serialised as `null`) where the chart should show a gap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub index: usize,
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<f64>>,
}

impl SeriesPoint {
    pub fn value(&self, field: &str) -> Option<f64> {
        self.values.get(field).copied().flatten()
    }
}

/// Project `fields` of every record, in record order.
///
/// Sentinel values, NaN, text and absent cells all project as gaps, so the
/// surviving values are exactly the ones the statistics use.
pub fn project(schema: SchemaVersion, records: &[Record], fields: &[&str]) -> Vec<SeriesPoint> {
    records
        .iter()
        .enumerate()
        .map(|(i, rec)| SeriesPoint {
            index: i + 1,
            values: fields
                .iter()
                .map(|&field| (field.to_string(), measurement(schema, rec, field)))
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::FieldValue;
    use crate::data::schema::{PING_MS, RSSI};

    fn rec(rssi: f64, ping: Option<f64>) -> Record {
        let mut r = Record::new();
        r.insert(RSSI, FieldValue::Number(rssi));
        if let Some(p) = ping {
            r.insert(PING_MS, FieldValue::Number(p));
        }
        r
    }

    #[test]
    fn failed_pings_become_gaps() {
        let recs = vec![rec(-50.0, Some(20.0)), rec(-60.0, Some(-1.0)), rec(-55.0, None)];
        let points = project(SchemaVersion::V1, &recs, &[RSSI, PING_MS]);

        assert_eq!(points.iter().map(|p| p.index).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(points[0].value(PING_MS), Some(20.0));
        assert_eq!(points[1].value(PING_MS), None);
        assert_eq!(points[1].value(RSSI), Some(-60.0));
        assert_eq!(points[2].value(PING_MS), None);
    }

    #[test]
    fn serializes_flat_with_nulls() {
        let recs = vec![rec(-60.0, Some(-1.0))];
        let series = project(SchemaVersion::V1, &recs, &[RSSI, PING_MS]);
        let json = serde_json::to_value(series).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"index": 1, "rssi": -60.0, "ping_ms": null}])
        );
    }

    #[test]
    fn empty_records_project_to_nothing() {
        assert!(project(SchemaVersion::V3, &[], &[RSSI]).is_empty());
    }
}
