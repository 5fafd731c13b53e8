//! Per-field descriptive statistics.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{filtered_values, round_to};
use crate::data::model::Record;
use crate::data::schema::SchemaVersion;

/// Summary of one numeric field, every figure rounded to 2 decimals.
///
/// Quantiles are nearest-rank picks from the sorted sample (no
/// interpolation), so `median` of an even-length sample is the upper middle
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub q1: f64,
    pub q3: f64,
}

/// Summarise `field`, or `None` when no usable value remains after dropping
/// NaN, missing cells and the field's sentinels.
pub fn summarize(
    schema: SchemaVersion,
    records: &[Record],
    field: &str,
) -> Option<SummaryStatistics> {
    summarize_values(filtered_values(schema, records, field).collect())
}

/// Summarise an already-filtered sample. Non-finite values are ignored.
pub fn summarize_values(mut values: Vec<f64>) -> Option<SummaryStatistics> {
    values.retain(|v| v.is_finite());
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);

    let n = values.len();
    let nf = n as f64;
    let min = values[0];
    let max = values[n - 1];
    let mean = (values.iter().sum::<f64>() / nf).clamp(min, max);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / nf;

    let at = |fraction: f64| values[((nf * fraction).floor() as usize).min(n - 1)];

    Some(SummaryStatistics {
        count: n,
        mean: round_to(mean, 2),
        std: round_to(variance.sqrt(), 2),
        min: round_to(min, 2),
        max: round_to(max, 2),
        median: round_to(values[n / 2], 2),
        q1: round_to(at(0.25), 2),
        q3: round_to(at(0.75), 2),
    })
}

/// Record count plus statistics for every metric field that has data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitoringOverview {
    pub total_count: usize,
    /// Fields with no usable values are absent, not zero-filled.
    pub fields: BTreeMap<String, SummaryStatistics>,
}

pub fn overview(schema: SchemaVersion, records: &[Record]) -> MonitoringOverview {
    let fields = schema
        .metric_fields()
        .filter_map(|field| summarize(schema, records, field).map(|s| (field.to_string(), s)))
        .collect();
    MonitoringOverview {
        total_count: records.len(),
        fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::FieldValue;
    use crate::data::schema::{LINK_SPEED, PING_MS, RSSI};

    fn records(field: &str, values: &[f64]) -> Vec<Record> {
        values
            .iter()
            .map(|v| {
                let mut r = Record::new();
                r.insert(field, FieldValue::Number(*v));
                r
            })
            .collect()
    }

    #[test]
    fn excludes_failed_pings() {
        let recs = records(PING_MS, &[20.0, -1.0, 30.0]);
        let s = summarize(SchemaVersion::V1, &recs, PING_MS).unwrap();
        assert_eq!(s.count, 2);
        assert_eq!(s.mean, 25.0);
        assert_eq!(s.min, 20.0);
        assert_eq!(s.max, 30.0);
        assert_eq!(s.std, 5.0);
    }

    #[test]
    fn nearest_rank_median_and_quartiles() {
        let s = summarize_values(vec![4.0, 1.0, 3.0, 2.0]).unwrap();
        // sorted [1,2,3,4]: median = sorted[2], q1 = sorted[1], q3 = sorted[3]
        assert_eq!(s.median, 3.0);
        assert_eq!(s.q1, 2.0);
        assert_eq!(s.q3, 4.0);

        let single = summarize_values(vec![7.5]).unwrap();
        assert_eq!(
            (single.min, single.q1, single.median, single.q3, single.max),
            (7.5, 7.5, 7.5, 7.5, 7.5)
        );
        assert_eq!(single.std, 0.0);
    }

    #[test]
    fn population_standard_deviation() {
        let s = summarize_values(vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(s.mean, 5.0);
        assert_eq!(s.std, 2.0);
    }

    #[test]
    fn rounds_to_two_decimals() {
        let s = summarize_values(vec![1.0, 1.0, 2.0]).unwrap();
        assert_eq!(s.mean, 1.33);
        assert_eq!(s.std, 0.47);
    }

    #[test]
    fn no_values_means_no_statistics() {
        assert!(summarize_values(Vec::new()).is_none());
        let recs = records(PING_MS, &[-1.0, f64::NAN]);
        assert!(summarize(SchemaVersion::V1, &recs, PING_MS).is_none());
        assert!(summarize(SchemaVersion::V1, &recs, RSSI).is_none());
    }

    #[test]
    fn overview_omits_fields_without_data() {
        let recs = records(RSSI, &[-50.0, -60.0]);
        let o = overview(SchemaVersion::V1, &recs);
        assert_eq!(o.total_count, 2);
        assert!(o.fields.contains_key(RSSI));
        assert!(!o.fields.contains_key(LINK_SPEED));
        assert!(!o.fields.contains_key("timestamp"));
    }
}
