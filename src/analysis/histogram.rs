//! Fixed-width, zero-filled histograms.

use serde::Serialize;

use super::filtered_values;
use crate::data::model::Record;
use crate::data::schema::SchemaVersion;
use crate::error::{EngineError, Result};

/// Upper bound on bins per histogram unless configured otherwise.
pub const DEFAULT_MAX_BINS: usize = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower_bound: f64,
    pub count: usize,
}

/// Bin `field` into buckets of width `bin_size`.
///
/// Buckets start at `floor(min / bin_size) * bin_size` and run through the
/// bucket holding the maximum; every bucket in between is present, empty ones
/// with a count of 0. A value `v` lands in the bucket starting at
/// `floor(v / bin_size) * bin_size`. No usable values → no bins.
pub fn histogram(
    schema: SchemaVersion,
    records: &[Record],
    field: &str,
    bin_size: f64,
) -> Result<Vec<HistogramBin>> {
    histogram_with_limit(schema, records, field, bin_size, DEFAULT_MAX_BINS)
}

pub fn histogram_with_limit(
    schema: SchemaVersion,
    records: &[Record],
    field: &str,
    bin_size: f64,
    max_bins: usize,
) -> Result<Vec<HistogramBin>> {
    if !(bin_size.is_finite() && bin_size > 0.0) {
        return Err(EngineError::InvalidBinSize(bin_size));
    }

    let values: Vec<f64> = filtered_values(schema, records, field).collect();
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let first = (min / bin_size).floor();
    let last = (max / bin_size).floor();

    let span = last - first + 1.0;
    if span > max_bins as f64 {
        return Err(EngineError::TooManyBins {
            field: field.to_string(),
            bins: span as usize,
            limit: max_bins,
        });
    }

    let mut bins: Vec<HistogramBin> = (0..span as usize)
        .map(|k| HistogramBin {
            // + 0.0 turns a -0.0 bound into 0.0
            lower_bound: (first + k as f64) * bin_size + 0.0,
            count: 0,
        })
        .collect();

    for v in values {
        let k = ((v / bin_size).floor() - first) as usize;
        if let Some(bin) = bins.get_mut(k) {
            bin.count += 1;
        }
    }

    Ok(bins)
}
