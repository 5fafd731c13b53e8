use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::schema::SchemaVersion;

// ---------------------------------------------------------------------------
// FieldValue – a single cell of a measurement row
// ---------------------------------------------------------------------------

/// A typed cell. Numeric columns hold `Number` (NaN when the text did not
/// parse); everything else is `Text`. `Missing` stands for a cell the row
/// never supplied.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Missing,
}

static MISSING: FieldValue = FieldValue::Missing;

/// Convert an epoch-milliseconds cell into a UTC instant.
pub fn epoch_millis_to_utc(ms: f64) -> Option<DateTime<Utc>> {
    if !ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(ms.round() as i64)
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(v) => write!(f, "{v}"),
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Missing => Ok(()),
        }
    }
}

impl FieldValue {
    /// The raw number, NaN included.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }
}

// ---------------------------------------------------------------------------
// Record – one measurement
// ---------------------------------------------------------------------------

/// One measurement row: column name → value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    /// The cell for `name`; columns the record does not carry read as `Missing`.
    pub fn value(&self, name: &str) -> &FieldValue {
        self.fields.get(name).unwrap_or(&MISSING)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Raw numeric cell, which may be NaN.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.value(name).as_f64()
    }

    /// Numeric cell that holds a usable (finite) measurement.
    pub fn finite(&self, name: &str) -> Option<f64> {
        self.number(name).filter(|v| v.is_finite())
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.value(name).as_str()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, FieldValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Record {
            fields: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// TelemetryDataset – the complete parsed file
// ---------------------------------------------------------------------------

/// A parsed telemetry file: its layout version, column order and rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryDataset {
    pub schema: SchemaVersion,
    /// Header columns in file order, followed by any schema field the
    /// header did not name.
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl TelemetryDataset {
    pub fn new(schema: SchemaVersion, header: Vec<String>, records: Vec<Record>) -> Self {
        let mut columns = header;
        for field in schema.fields() {
            if !columns.iter().any(|c| c == field.name) {
                columns.push(field.name.to_string());
            }
        }
        TelemetryDataset {
            schema,
            columns,
            records,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
