//! Everything a dashboard view shows for one record set, in one bundle.

use std::collections::BTreeMap;

use chrono::Local;
use log::{debug, warn};
use serde::Serialize;

use super::categorical::{classify_bands, count_by, BandCounts, CategoricalCount};
use super::histogram::{histogram_with_limit, HistogramBin};
use super::quality::{analyze, QualityMetrics};
use super::stats::{overview, MonitoringOverview};
use super::timeseries::{project, SeriesPoint};
use crate::config::AnalysisConfig;
use crate::data::model::Record;
use crate::data::schema::{SchemaVersion, WIFI_FREQUENCY};
use crate::error::{EngineError, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub schema: SchemaVersion,
    pub overview: MonitoringOverview,
    /// `None` for an empty record set.
    pub quality: Option<QualityMetrics>,
    pub histograms: BTreeMap<String, Vec<HistogramBin>>,
    pub categories: BTreeMap<String, Vec<CategoricalCount>>,
    /// Only for layouts that carry a radio frequency.
    pub bands: Option<BandCounts>,
    pub series: Vec<SeriesPoint>,
}

/// Run every component over `records` with the settings in `config`.
///
/// An empty record set is not an error: each section comes back in its
/// empty form. Fields the schema does not declare as numeric are skipped
/// for histograms and series.
pub fn build_report(
    schema: SchemaVersion,
    records: &[Record],
    config: &AnalysisConfig,
) -> Result<DashboardReport> {
    let quality = match (records.is_empty(), config.display_offset()) {
        (true, _) => None,
        (false, Some(offset)) => Some(analyze(schema, records, &offset)?),
        (false, None) => Some(analyze(schema, records, &Local)?),
    };

    let mut histograms = BTreeMap::new();
    for (field, &bin_size) in &config.histogram_bins {
        if !schema.is_numeric(field) {
            continue;
        }
        let bins = match histogram_with_limit(schema, records, field, bin_size, config.max_bins) {
            Ok(bins) => bins,
            Err(err @ EngineError::TooManyBins { .. }) => {
                warn!("{err}; leaving the histogram empty");
                Vec::new()
            }
            Err(err) => return Err(err),
        };
        histograms.insert(field.clone(), bins);
    }

    let categories = config
        .categorical_fields
        .iter()
        .filter(|field| schema.declares(field) || records.iter().any(|r| r.contains(field)))
        .map(|field| (field.clone(), count_by(records, field)))
        .collect();

    let bands = schema
        .declares(WIFI_FREQUENCY)
        .then(|| classify_bands(records));

    let series_fields: Vec<&str> = config
        .series_fields
        .iter()
        .map(String::as_str)
        .filter(|field| schema.is_numeric(field))
        .collect();
    let charted = match config.series_limit {
        Some(limit) => &records[..records.len().min(limit)],
        None => records,
    };
    let series = project(schema, charted, &series_fields);

    debug!(
        "report over {} records: {} histograms, {} breakdowns, {} series points",
        records.len(),
        histograms.len(),
        config.categorical_fields.len(),
        series.len()
    );

    Ok(DashboardReport {
        schema,
        overview: overview(schema, records),
        quality,
        histograms,
        categories,
        bands,
        series,
    })
}
