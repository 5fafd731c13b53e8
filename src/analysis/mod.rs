//! Reductions over a parsed record set.
//!
//! Every component here is a pure function of `(schema, records, parameters)`:
//! none keeps state between calls and none depends on another's output, so
//! they can run in any order (or in parallel) over the same `&[Record]`.

pub mod categorical;
pub mod histogram;
pub mod quality;
pub mod report;
pub mod stats;
pub mod timeseries;

use crate::data::model::Record;
use crate::data::schema::SchemaVersion;

/// Values of `field` that count as real measurements: finite numbers that
/// are not one of the field's declared sentinels, in record order.
pub fn filtered_values<'a>(
    schema: SchemaVersion,
    records: &'a [Record],
    field: &'a str,
) -> impl Iterator<Item = f64> + 'a {
    records
        .iter()
        .filter_map(move |r| measurement(schema, r, field))
}

/// The usable value of `field` in one record, if any.
pub(crate) fn measurement(schema: SchemaVersion, record: &Record, field: &str) -> Option<f64> {
    record
        .finite(field)
        .filter(|v| !schema.is_sentinel_in(record, field, *v))
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::FieldValue;

    #[test]
    fn filtered_values_drop_nan_missing_and_sentinels() {
        let records: Vec<Record> = [Some(20.0), Some(-1.0), Some(f64::NAN), None, Some(30.0)]
            .into_iter()
            .map(|v| {
                let mut r = Record::new();
                if let Some(v) = v {
                    r.insert("ping_ms", FieldValue::Number(v));
                }
                r
            })
            .collect();
        let kept: Vec<f64> = filtered_values(SchemaVersion::V1, &records, "ping_ms").collect();
        assert_eq!(kept, vec![20.0, 30.0]);

        let untyped: Vec<f64> =
            filtered_values(SchemaVersion::Untyped, &records, "ping_ms").collect();
        assert_eq!(untyped, vec![20.0, -1.0, 30.0]);
    }

    #[test]
    fn a_zero_coordinate_only_drops_out_with_its_partner() {
        let records: Vec<Record> = [(0.0, 127.0), (0.0, 0.0), (37.5, 0.0)]
            .into_iter()
            .map(|(lat, lon)| {
                let mut r = Record::new();
                r.insert("latitude", FieldValue::Number(lat));
                r.insert("longitude", FieldValue::Number(lon));
                r
            })
            .collect();
        let lat: Vec<f64> = filtered_values(SchemaVersion::V1, &records, "latitude").collect();
        let lon: Vec<f64> = filtered_values(SchemaVersion::V1, &records, "longitude").collect();
        assert_eq!(lat, vec![0.0, 37.5]);
        assert_eq!(lon, vec![127.0, 0.0]);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_to(33.333, 1), 33.3);
        assert_eq!(round_to(2.345, 0), 2.0);
        assert_eq!(round_to(-1.25, 1), -1.3);
    }
}
