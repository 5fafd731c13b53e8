//! Analysis configuration.
//!
//! Built from defaults, optionally replaced by a JSON file, then adjusted by
//! environment variables:
//!
//! - `WIFI_ARCHIVE_CONFIG` – path to a JSON config file
//! - `WIFI_ARCHIVE_DELIMITER` – single ASCII field separator (default `,`)
//! - `WIFI_ARCHIVE_BATCH_SIZE` – records per store write (default 1000)
//! - `WIFI_ARCHIVE_SERIES_LIMIT` – chart points per series, `0` for all (default 500)
//! - `WIFI_ARCHIVE_UTC_OFFSET_MINUTES` – display zone for times (default: local)

use std::collections::BTreeMap;
use std::env;
use std::path::Path;

use chrono::FixedOffset;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::analysis::histogram::DEFAULT_MAX_BINS;
use crate::data::loader::ParseOptions;
use crate::data::schema::{
    SchemaVersion, BSSID, CHANNEL_NUMBER, DNS_TIME, FLOOR, LINK_SPEED, NEIGHBOR_COUNT, PING_JITTER,
    PING_LOSS_RATE, PING_MS, RSSI, SSID,
};
use crate::data::upload::{DEFAULT_BATCH_SIZE, DEFAULT_FALLBACK_LOCATION};
use crate::error::{EngineError, Result};

pub const DEFAULT_SERIES_LIMIT: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub delimiter: char,
    /// Offset used to display start/end times; `None` uses the host zone.
    pub utc_offset_minutes: Option<i32>,
    /// Histogram bin width per field.
    pub histogram_bins: BTreeMap<String, f64>,
    pub categorical_fields: Vec<String>,
    pub series_fields: Vec<String>,
    /// Only the first N records are charted; `None` charts all of them.
    pub series_limit: Option<usize>,
    pub batch_size: usize,
    pub fallback_location: String,
    pub max_bins: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let histogram_bins = [
            (RSSI, 2.0),
            (PING_MS, 10.0),
            (LINK_SPEED, 50.0),
            (PING_LOSS_RATE, 5.0),
            (PING_JITTER, 5.0),
            (CHANNEL_NUMBER, 1.0),
            (NEIGHBOR_COUNT, 5.0),
        ]
        .into_iter()
        .map(|(field, size)| (field.to_string(), size))
        .collect();

        Self {
            delimiter: ',',
            utc_offset_minutes: None,
            histogram_bins,
            categorical_fields: strings(&[SSID, BSSID, FLOOR, CHANNEL_NUMBER]),
            series_fields: strings(&[
                RSSI,
                PING_MS,
                LINK_SPEED,
                PING_LOSS_RATE,
                PING_JITTER,
                DNS_TIME,
            ]),
            series_limit: Some(DEFAULT_SERIES_LIMIT),
            batch_size: DEFAULT_BATCH_SIZE,
            fallback_location: DEFAULT_FALLBACK_LOCATION.to_string(),
            max_bins: DEFAULT_MAX_BINS,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration: `WIFI_ARCHIVE_CONFIG` file (or defaults), then
    /// environment overrides.
    pub fn from_env() -> Result<Self> {
        let base = match env::var("WIFI_ARCHIVE_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_json_file(Path::new(path.trim()))?,
            _ => Self::default(),
        };
        Ok(base.with_overrides(|key| env::var(key).ok()))
    }

    /// Read a JSON config file; absent keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    /// Values that do not parse are ignored with a warning.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(d) = parsed(&lookup, "WIFI_ARCHIVE_DELIMITER") {
            self.delimiter = d;
        }
        if let Some(n) = parsed(&lookup, "WIFI_ARCHIVE_BATCH_SIZE") {
            self.batch_size = n;
        }
        if let Some(n) = parsed::<usize>(&lookup, "WIFI_ARCHIVE_SERIES_LIMIT") {
            self.series_limit = (n > 0).then_some(n);
        }
        if let Some(m) = parsed(&lookup, "WIFI_ARCHIVE_UTC_OFFSET_MINUTES") {
            self.utc_offset_minutes = Some(m);
        }
        self
    }

    /// The fixed offset start/end times are shown in. `None` means the host
    /// zone, applied per timestamp; an out-of-range offset also falls back.
    pub fn display_offset(&self) -> Option<FixedOffset> {
        self.utc_offset_minutes
            .and_then(|m| FixedOffset::east_opt(m.saturating_mul(60)))
    }

    pub fn parse_options(&self, schema: Option<SchemaVersion>) -> Result<ParseOptions> {
        if !self.delimiter.is_ascii() {
            return Err(EngineError::InvalidInput(format!(
                "delimiter '{}' is not a single ASCII character",
                self.delimiter
            )));
        }
        Ok(ParseOptions {
            delimiter: self.delimiter as u8,
            schema,
        })
    }
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    // untrimmed retry keeps a tab delimiter usable
    match raw.trim().parse().or_else(|_| raw.parse()) {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("ignoring {key}={raw:?}: not a valid value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_dashboard_presets() {
        let c = AnalysisConfig::default();
        assert_eq!(c.histogram_bins.get(RSSI), Some(&2.0));
        assert_eq!(c.histogram_bins.get(LINK_SPEED), Some(&50.0));
        assert_eq!(c.histogram_bins.get(CHANNEL_NUMBER), Some(&1.0));
        assert_eq!(c.batch_size, 1000);
        assert_eq!(c.series_limit, Some(500));
        assert_eq!(c.fallback_location, "기타");
    }

    #[test]
    fn env_overrides_apply_and_bad_values_are_ignored() {
        let c = AnalysisConfig::default().with_overrides(lookup(&[
            ("WIFI_ARCHIVE_BATCH_SIZE", "2500"),
            ("WIFI_ARCHIVE_SERIES_LIMIT", "0"),
            ("WIFI_ARCHIVE_UTC_OFFSET_MINUTES", "nine hours"),
            ("WIFI_ARCHIVE_DELIMITER", ";"),
        ]));
        assert_eq!(c.batch_size, 2500);
        assert_eq!(c.series_limit, None);
        assert_eq!(c.utc_offset_minutes, None);
        assert_eq!(c.delimiter, ';');
    }

    #[test]
    fn json_file_keeps_defaults_for_absent_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"batch_size": 200, "histogram_bins": {"rssi": 5}}"#).unwrap();

        let c = AnalysisConfig::from_json_file(&path).unwrap();
        assert_eq!(c.batch_size, 200);
        assert_eq!(c.histogram_bins.len(), 1);
        assert_eq!(c.series_limit, Some(DEFAULT_SERIES_LIMIT));
    }

    #[test]
    fn display_offset_uses_configured_minutes() {
        let c = AnalysisConfig {
            utc_offset_minutes: Some(540),
            ..AnalysisConfig::default()
        };
        assert_eq!(c.display_offset().map(|o| o.local_minus_utc()), Some(9 * 3600));
        assert_eq!(AnalysisConfig::default().display_offset(), None);
    }

    #[test]
    fn non_ascii_delimiter_is_rejected() {
        let c = AnalysisConfig {
            delimiter: '¦',
            ..AnalysisConfig::default()
        };
        assert!(matches!(c.parse_options(None), Err(EngineError::InvalidInput(_))));
        assert_eq!(AnalysisConfig::default().parse_options(None).unwrap().delimiter, b',');
    }
}
