use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::model::Record;
use crate::error::{EngineError, Result};

// ---------------------------------------------------------------------------
// Well-known column names
// ---------------------------------------------------------------------------

pub const TIMESTAMP: &str = "timestamp";
pub const RSSI: &str = "rssi";
pub const LINK_SPEED: &str = "link_speed";
pub const SSID: &str = "ssid";
pub const BSSID: &str = "bssid";
pub const PING_MS: &str = "ping_ms";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const FLOOR: &str = "floor";
pub const PING_LOSS_RATE: &str = "ping_loss_rate";
pub const PING_JITTER: &str = "ping_jitter";
pub const WIFI_FREQUENCY: &str = "wifi_frequency";
pub const CHANNEL_NUMBER: &str = "channel_number";
pub const NEIGHBOR_COUNT: &str = "neighbor_count";
pub const DNS_TIME: &str = "dns_time";

// ---------------------------------------------------------------------------
// Field declarations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Numeric,
    Categorical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SentinelKind {
    /// The measurement was attempted and failed (e.g. a ping timeout).
    Failed,
    /// The measurement was not available (e.g. no GPS fix).
    Unavailable,
}

/// A reserved numeric value that never counts as a real measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sentinel {
    pub value: f64,
    pub kind: SentinelKind,
    /// Field that must hold its own sentinel in the same record for this one
    /// to apply, as with the `0,0` no-fix coordinate pair.
    pub paired_with: Option<&'static str>,
}

impl Sentinel {
    pub fn matches(&self, value: f64) -> bool {
        value == self.value
    }
}

/// One column as declared by a schema version.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub sentinel: Option<Sentinel>,
}

impl FieldDef {
    const fn numeric(name: &'static str) -> Self {
        FieldDef {
            name,
            kind: FieldKind::Numeric,
            sentinel: None,
        }
    }

    const fn categorical(name: &'static str) -> Self {
        FieldDef {
            name,
            kind: FieldKind::Categorical,
            sentinel: None,
        }
    }

    const fn failed_when(name: &'static str, value: f64) -> Self {
        FieldDef {
            name,
            kind: FieldKind::Numeric,
            sentinel: Some(Sentinel {
                value,
                kind: SentinelKind::Failed,
                paired_with: None,
            }),
        }
    }

    const fn unavailable_with(name: &'static str, value: f64, pair: &'static str) -> Self {
        FieldDef {
            name,
            kind: FieldKind::Numeric,
            sentinel: Some(Sentinel {
                value,
                kind: SentinelKind::Unavailable,
                paired_with: Some(pair),
            }),
        }
    }
}

// Each version's list is self-contained: extending v3 never touches v1.

static V1_FIELDS: [FieldDef; 9] = [
    FieldDef::numeric(TIMESTAMP),
    FieldDef::numeric(RSSI),
    FieldDef::numeric(LINK_SPEED),
    FieldDef::categorical(SSID),
    FieldDef::categorical(BSSID),
    FieldDef::failed_when(PING_MS, -1.0),
    FieldDef::unavailable_with(LATITUDE, 0.0, LONGITUDE),
    FieldDef::unavailable_with(LONGITUDE, 0.0, LATITUDE),
    FieldDef::categorical(FLOOR),
];

static V3_FIELDS: [FieldDef; 15] = [
    FieldDef::numeric(TIMESTAMP),
    FieldDef::numeric(RSSI),
    FieldDef::numeric(LINK_SPEED),
    FieldDef::categorical(SSID),
    FieldDef::categorical(BSSID),
    FieldDef::failed_when(PING_MS, -1.0),
    FieldDef::unavailable_with(LATITUDE, 0.0, LONGITUDE),
    FieldDef::unavailable_with(LONGITUDE, 0.0, LATITUDE),
    FieldDef::categorical(FLOOR),
    FieldDef::numeric(PING_LOSS_RATE),
    FieldDef::failed_when(PING_JITTER, -1.0),
    FieldDef::numeric(WIFI_FREQUENCY),
    FieldDef::numeric(CHANNEL_NUMBER),
    FieldDef::numeric(NEIGHBOR_COUNT),
    FieldDef::failed_when(DNS_TIME, -1.0),
];

// ---------------------------------------------------------------------------
// SchemaVersion
// ---------------------------------------------------------------------------

/// Record layout version.
///
/// `Untyped` is never detected; callers pick it explicitly as the fallback
/// for files whose header matches no registered layout (every column is then
/// kept as text).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    V1,
    V3,
    Untyped,
}

/// The field sets declared by a schema version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSet {
    pub numeric_fields: Vec<&'static str>,
    pub categorical_fields: Vec<&'static str>,
    pub sentinels: Vec<(&'static str, Sentinel)>,
}

/// Look up the numeric/categorical split and sentinels for `version`.
pub fn fields_for(version: SchemaVersion) -> FieldSet {
    let fields = version.fields();
    FieldSet {
        numeric_fields: fields
            .iter()
            .filter(|f| f.kind == FieldKind::Numeric)
            .map(|f| f.name)
            .collect(),
        categorical_fields: fields
            .iter()
            .filter(|f| f.kind == FieldKind::Categorical)
            .map(|f| f.name)
            .collect(),
        sentinels: fields
            .iter()
            .filter_map(|f| f.sentinel.map(|s| (f.name, s)))
            .collect(),
    }
}

impl SchemaVersion {
    /// Versions that header detection may select, newest first.
    pub const DETECTABLE: [SchemaVersion; 2] = [SchemaVersion::V3, SchemaVersion::V1];

    pub fn fields(self) -> &'static [FieldDef] {
        match self {
            SchemaVersion::V1 => &V1_FIELDS,
            SchemaVersion::V3 => &V3_FIELDS,
            SchemaVersion::Untyped => &[],
        }
    }

    pub fn field(self, name: &str) -> Option<&'static FieldDef> {
        self.fields().iter().find(|f| f.name == name)
    }

    pub fn declares(self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn is_numeric(self, name: &str) -> bool {
        self.field(name)
            .is_some_and(|f| f.kind == FieldKind::Numeric)
    }

    pub fn sentinel(self, name: &str) -> Option<Sentinel> {
        self.field(name).and_then(|f| f.sentinel)
    }

    /// Whether `value` is the reserved sentinel (of any kind) for `name`,
    /// ignoring any pairing.
    pub fn is_sentinel(self, name: &str, value: f64) -> bool {
        self.sentinel(name).is_some_and(|s| s.matches(value))
    }

    /// Whether `value`, read from `name` in `record`, is a sentinel there. A
    /// paired sentinel applies only when its companion holds one too.
    pub fn is_sentinel_in(self, record: &Record, name: &str, value: f64) -> bool {
        match self.sentinel(name) {
            Some(s) if s.matches(value) => match s.paired_with {
                Some(other) => record
                    .number(other)
                    .is_some_and(|v| self.is_sentinel(other, v)),
                None => true,
            },
            _ => false,
        }
    }

    /// Whether `value` marks a failed measurement for `name`.
    pub fn is_failed(self, name: &str, value: f64) -> bool {
        self.sentinel(name)
            .is_some_and(|s| s.kind == SentinelKind::Failed && s.matches(value))
    }

    /// The field whose failed sentinel defines the dataset failure rate.
    pub fn failure_field(self) -> Option<&'static str> {
        match self {
            SchemaVersion::V1 | SchemaVersion::V3 => Some(PING_MS),
            SchemaVersion::Untyped => None,
        }
    }

    /// Numeric fields worth summarising (everything numeric but the clock).
    pub fn metric_fields(self) -> impl Iterator<Item = &'static str> {
        self.fields()
            .iter()
            .filter(|f| f.kind == FieldKind::Numeric && f.name != TIMESTAMP)
            .map(|f| f.name)
    }

    /// Select the layout of a file from its header.
    ///
    /// A header matches a version when it names the `timestamp` column; among
    /// matching versions the oldest one that declares every known column in
    /// the header wins, so any extended column promotes the file to `v3`.
    /// Columns no version knows are passed through as text and do not affect
    /// the choice.
    pub fn detect(headers: &[String]) -> Result<SchemaVersion> {
        if !headers.iter().any(|h| h == TIMESTAMP) {
            return Err(EngineError::UnknownSchema {
                columns: headers.to_vec(),
            });
        }

        let known: Vec<&String> = headers
            .iter()
            .filter(|h| Self::DETECTABLE.iter().any(|v| v.declares(h)))
            .collect();

        let mut chosen = SchemaVersion::V3;
        for version in Self::DETECTABLE.iter().rev() {
            if known.iter().all(|h| version.declares(h)) {
                chosen = *version;
                break;
            }
        }
        Ok(chosen)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaVersion::V1 => write!(f, "v1"),
            SchemaVersion::V3 => write!(f, "v3"),
            SchemaVersion::Untyped => write!(f, "untyped"),
        }
    }
}

impl FromStr for SchemaVersion {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" => Ok(SchemaVersion::V1),
            "v3" => Ok(SchemaVersion::V3),
            "untyped" => Ok(SchemaVersion::Untyped),
            other => Err(EngineError::UnknownVersion(other.to_string())),
        }
    }
}
