//! Property-based checks of the reductions.
//!
//! Samples mix ordinary readings with the cells real walks contain: failed
//! probes (`-1`), unparsable numbers (NaN) and absent cells.

use proptest::prelude::*;

use wifi_archive::analysis::filtered_values;
use wifi_archive::analysis::histogram::histogram;
use wifi_archive::analysis::quality::failure_rate;
use wifi_archive::analysis::stats::summarize;
use wifi_archive::analysis::timeseries::project;
use wifi_archive::data::schema::{PING_MS, RSSI, TIMESTAMP};
use wifi_archive::{build_report, AnalysisConfig, FieldValue, Record, SchemaVersion};

fn cell() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        6 => (-200.0..800.0f64).prop_map(Some),
        1 => Just(Some(-1.0)),
        1 => Just(Some(f64::NAN)),
        1 => Just(None),
    ]
}

fn records(field: &'static str) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(cell(), 0..200).prop_map(move |cells| {
        cells
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                let mut r = Record::new();
                r.insert(TIMESTAMP, FieldValue::Number(i as f64 * 1000.0));
                if let Some(v) = value {
                    r.insert(field, FieldValue::Number(v));
                }
                r
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn quantiles_are_ordered(recs in records(PING_MS)) {
        if let Some(s) = summarize(SchemaVersion::V1, &recs, PING_MS) {
            prop_assert!(s.min <= s.q1);
            prop_assert!(s.q1 <= s.median);
            prop_assert!(s.median <= s.q3);
            prop_assert!(s.q3 <= s.max);
            prop_assert!(s.min <= s.mean && s.mean <= s.max);
            prop_assert!(s.std >= 0.0);
        }
    }

    #[test]
    fn count_matches_filtered_values(recs in records(PING_MS)) {
        let kept = filtered_values(SchemaVersion::V1, &recs, PING_MS).count();
        let count = summarize(SchemaVersion::V1, &recs, PING_MS).map_or(0, |s| s.count);
        prop_assert_eq!(count, kept);
        let mut values = filtered_values(SchemaVersion::V1, &recs, PING_MS);
        prop_assert!(values.all(|v| v.is_finite() && v != -1.0));
    }

    #[test]
    fn histogram_counts_every_filtered_value(recs in records(RSSI), bin_size in 0.5..50.0f64) {
        let bins = histogram(SchemaVersion::V1, &recs, RSSI, bin_size).unwrap();
        let total: usize = bins.iter().map(|b| b.count).sum();
        prop_assert_eq!(total, filtered_values(SchemaVersion::V1, &recs, RSSI).count());
    }

    #[test]
    fn histogram_bins_are_contiguous(recs in records(RSSI), bin_size in 0.5..50.0f64) {
        let bins = histogram(SchemaVersion::V1, &recs, RSSI, bin_size).unwrap();
        for pair in bins.windows(2) {
            let step = pair[1].lower_bound - pair[0].lower_bound;
            prop_assert!((step - bin_size).abs() < 1e-9 * bin_size.max(1.0) * 1e3);
        }
        for bin in &bins {
            let k = bin.lower_bound / bin_size;
            prop_assert!((k - k.round()).abs() < 1e-6);
        }
        if let (Some(first), Some(last)) = (bins.first(), bins.last()) {
            prop_assert!(first.count > 0);
            prop_assert!(last.count > 0);
        }
    }

    #[test]
    fn projection_round_trips_to_filtered_values(recs in records(PING_MS)) {
        let projected: Vec<f64> = project(SchemaVersion::V1, &recs, &[PING_MS])
            .iter()
            .filter_map(|p| p.value(PING_MS))
            .collect();
        let filtered: Vec<f64> = filtered_values(SchemaVersion::V1, &recs, PING_MS).collect();
        prop_assert_eq!(projected, filtered);
    }

    #[test]
    fn failure_rate_is_monotonic(total in 1usize..5_000, a in 0usize..5_000, b in 0usize..5_000) {
        let (lo, hi) = (a.min(b).min(total), a.max(b).min(total));
        prop_assert!(failure_rate(lo, total) <= failure_rate(hi, total));
        prop_assert!((0.0..=100.0).contains(&failure_rate(hi, total)));
    }

    #[test]
    fn reports_do_not_depend_on_call_count(recs in records(PING_MS)) {
        let config = AnalysisConfig { utc_offset_minutes: Some(0), ..AnalysisConfig::default() };
        let first = build_report(SchemaVersion::V1, &recs, &config).unwrap();
        let second = build_report(SchemaVersion::V1, &recs, &config).unwrap();
        prop_assert_eq!(first, second);
    }
}
