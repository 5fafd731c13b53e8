use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use super::model::{epoch_millis_to_utc, Record};
use super::schema::{FLOOR, TIMESTAMP};
use crate::error::{EngineError, Result};

/// Records per write request the store accepts comfortably.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Location label stored when no record names a floor.
pub const DEFAULT_FALLBACK_LOCATION: &str = "기타";

// ---------------------------------------------------------------------------
// Upload descriptor
// ---------------------------------------------------------------------------

/// Metadata row the store keeps for each uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadDescriptor {
    pub file_name: String,
    pub uploader: String,
    pub data_count: usize,
    /// Most frequent `floor` value of the upload.
    pub location: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl UploadDescriptor {
    pub fn describe(
        file_name: impl Into<String>,
        uploader: impl Into<String>,
        records: &[Record],
        fallback_location: &str,
    ) -> Self {
        let span = time_span(records);
        UploadDescriptor {
            file_name: file_name.into(),
            uploader: uploader.into(),
            data_count: records.len(),
            location: dominant_location(records, fallback_location),
            start_time: span.map(|(start, _)| start),
            end_time: span.map(|(_, end)| end),
        }
    }
}

/// The most frequent non-empty `floor` label. Ties go to the label seen first.
pub fn dominant_location(records: &[Record], fallback: &str) -> String {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for rec in records {
        let label = rec.value(FLOOR).to_string();
        if label.is_empty() {
            continue;
        }
        let n = counts.entry(label.clone()).or_insert(0);
        if *n == 0 {
            order.push(label);
        }
        *n += 1;
    }

    let mut best: Option<(&String, usize)> = None;
    for label in &order {
        let n = counts[label];
        if best.map_or(true, |(_, top)| n > top) {
            best = Some((label, n));
        }
    }

    match best {
        Some((label, _)) => label.clone(),
        None => fallback.to_string(),
    }
}

/// Earliest and latest timestamps, ignoring cells that are not numbers.
pub fn time_span(records: &[Record]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for ts in records.iter().filter_map(|r| r.finite(TIMESTAMP)) {
        lo = lo.min(ts);
        hi = hi.max(ts);
    }
    Some((epoch_millis_to_utc(lo)?, epoch_millis_to_utc(hi)?))
}

// ---------------------------------------------------------------------------
// Measurement rows & write batching
// ---------------------------------------------------------------------------

/// A measurement as written to the store: the record plus its upload key.
#[derive(Debug, Clone, Serialize)]
pub struct MeasurementRow<'a, Id> {
    pub upload_id: Id,
    #[serde(flatten)]
    pub record: &'a Record,
}

pub fn measurement_rows<Id: Clone>(
    upload_id: Id,
    records: &[Record],
) -> Vec<MeasurementRow<'_, Id>> {
    records
        .iter()
        .map(|record| MeasurementRow {
            upload_id: upload_id.clone(),
            record,
        })
        .collect()
}

/// Split records into contiguous write batches of at most `batch_size`.
pub fn batches(records: &[Record], batch_size: usize) -> Result<std::slice::Chunks<'_, Record>> {
    if batch_size == 0 {
        return Err(EngineError::InvalidBatchSize);
    }
    debug!(
        "{} records in {} batches of up to {batch_size}",
        records.len(),
        records.len().div_ceil(batch_size)
    );
    Ok(records.chunks(batch_size))
}
