//! Dataset-level quality indicators.

use std::fmt;

use chrono::TimeZone;
use serde::Serialize;

use super::round_to;
use crate::data::model::{epoch_millis_to_utc, Record};
use crate::data::schema::{SchemaVersion, LATITUDE, LONGITUDE, TIMESTAMP};
use crate::error::{EngineError, Result};

pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityMetrics {
    /// Mean gap between consecutive samples; `None` with fewer than two.
    pub avg_sample_interval_seconds: Option<f64>,
    /// Percentage of records whose probe failed, 1 decimal.
    pub failure_rate: f64,
    /// Percentage of records with a GPS fix, 1 decimal.
    pub valid_location_rate: f64,
    pub duration_minutes: Option<f64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Compute quality metrics for records in ascending timestamp order.
///
/// Start and end times are formatted in `zone`, each at its own offset.
/// Records whose timestamp is not a number are skipped for the interval,
/// duration and start/end figures but still count towards the rates.
pub fn analyze<Tz>(
    schema: SchemaVersion,
    records: &[Record],
    zone: &Tz,
) -> Result<QualityMetrics>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    if records.is_empty() {
        return Err(EngineError::EmptyInput("quality metrics need at least one record"));
    }
    let total = records.len() as f64;

    let timestamps: Vec<f64> = records.iter().filter_map(|r| r.finite(TIMESTAMP)).collect();

    let avg_sample_interval_seconds = if timestamps.len() < 2 {
        None
    } else {
        let gaps: f64 = timestamps.windows(2).map(|w| (w[1] - w[0]) / 1000.0).sum();
        Some(round_to(gaps / (timestamps.len() - 1) as f64, 2))
    };

    let failed = match schema.failure_field() {
        Some(field) => records
            .iter()
            .filter(|r| r.number(field).is_some_and(|v| schema.is_failed(field, v)))
            .count(),
        None => 0,
    };

    let located = records.iter().filter(|r| has_location_fix(r)).count();

    let (first, last) = (timestamps.first().copied(), timestamps.last().copied());
    let duration_minutes = first
        .zip(last)
        .map(|(a, b)| round_to((b - a) / 60_000.0, 2));

    let display = |ms: Option<f64>| {
        ms.and_then(epoch_millis_to_utc).map(|t| {
            t.with_timezone(zone)
                .format(DISPLAY_FORMAT)
                .to_string()
        })
    };

    Ok(QualityMetrics {
        avg_sample_interval_seconds,
        failure_rate: failure_rate(failed, records.len()),
        valid_location_rate: round_to(located as f64 / total * 100.0, 1),
        duration_minutes,
        start_time: display(first),
        end_time: display(last),
    })
}

/// Failed-probe percentage, rounded to 1 decimal; 0 for no records.
pub fn failure_rate(failed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_to(failed as f64 / total as f64 * 100.0, 1)
}

fn has_location_fix(record: &Record) -> bool {
    match (record.finite(LATITUDE), record.finite(LONGITUDE)) {
        (Some(lat), Some(lon)) => lat != 0.0 && lon != 0.0,
        _ => false,
    }
}
