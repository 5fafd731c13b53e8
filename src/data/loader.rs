use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray, UInt32Array, UInt64Array,
};
use arrow::datatypes::DataType;
use log::{debug, info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{FieldValue, Record, TelemetryDataset};
use super::schema::SchemaVersion;
use crate::error::{EngineError, Result};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Field separator for delimited text.
    pub delimiter: u8,
    /// Force a layout instead of detecting it from the header.
    pub schema: Option<SchemaVersion>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            schema: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a telemetry file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – header line followed by one delimited row per line
/// * `.json`         – `[{ "timestamp": ..., "rssi": ..., ... }, ...]`
/// * `.parquet`      – one flat column per field
pub fn load_file(path: &Path, options: &ParseOptions) -> anyhow::Result<TelemetryDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" | "txt" => load_delimited(path, options),
        "json" => load_json(path, options),
        "parquet" | "pq" => load_parquet(path, options),
        other => bail!("Unsupported file extension: .{other}"),
    }?;

    info!(
        "loaded {} records from {} (schema {})",
        dataset.len(),
        path.display(),
        dataset.schema
    );
    Ok(dataset)
}

/// Parse delimited telemetry text.
///
/// Every line is one row split on the delimiter; quote characters are kept
/// as written. The first non-empty line is the header. Rows shorter than the header
/// leave their trailing fields `Missing`; values past the last header column
/// are dropped; numeric cells that do not parse become NaN. None of these
/// stop the parse. The only failure on well-formed UTF-8 is a text without a
/// header line, or a header no schema recognises when none was forced.
pub fn parse_text(text: &str, options: &ParseOptions) -> Result<TelemetryDataset> {
    let text = text.trim_start_matches('\u{feff}').trim();
    if text.is_empty() {
        return Err(EngineError::InvalidInput("no header line".to_string()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .delimiter(options.delimiter)
        .from_reader(text.as_bytes());

    let mut rows = reader.records();
    let header: Vec<String> = match rows.next() {
        Some(first) => first?.iter().map(str::to_string).collect(),
        None => return Err(EngineError::InvalidInput("no header line".to_string())),
    };

    let schema = match options.schema {
        Some(forced) => forced,
        None => SchemaVersion::detect(&header)?,
    };

    let mut records = Vec::new();
    let (mut short, mut long, mut unreadable) = (0usize, 0usize, 0usize);

    for (row_no, row) in rows.enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                unreadable += 1;
                warn!("skipping unreadable row {}: {e}", row_no + 2);
                continue;
            }
        };
        if row.len() < header.len() {
            short += 1;
        } else if row.len() > header.len() {
            long += 1;
        }
        records.push(build_record(schema, &header, |i| row.get(i)));
    }

    if short + long + unreadable > 0 {
        warn!(
            "{short} short, {long} long and {unreadable} unreadable rows recovered during parse"
        );
    }
    debug!("parsed {} records as {schema}", records.len());

    Ok(TelemetryDataset::new(schema, header, records))
}

/// Build one record: every schema field first (as `Missing`), then each
/// header column with the cell at its position.
fn build_record<'a>(
    schema: SchemaVersion,
    header: &[String],
    cell: impl Fn(usize) -> Option<&'a str>,
) -> Record {
    let mut record = Record::new();
    for field in schema.fields() {
        record.insert(field.name, FieldValue::Missing);
    }
    for (i, name) in header.iter().enumerate() {
        let value = match cell(i) {
            Some(raw) => coerce(schema, name, raw),
            None => FieldValue::Missing,
        };
        record.insert(name.clone(), value);
    }
    record
}

fn coerce(schema: SchemaVersion, name: &str, raw: &str) -> FieldValue {
    if schema.is_numeric(name) {
        FieldValue::Number(raw.trim().parse::<f64>().unwrap_or(f64::NAN))
    } else {
        FieldValue::Text(raw.to_string())
    }
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

fn load_delimited(path: &Path, options: &ParseOptions) -> anyhow::Result<TelemetryDataset> {
    let text = std::fs::read_to_string(path).context("reading telemetry file")?;
    let dataset = parse_text(&text, options)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON layout (one object per measurement, as exported by the store):
///
/// ```json
/// [
///   { "timestamp": 1700000000000, "rssi": -52, "ssid": "campus", "ping_ms": 18 },
///   ...
/// ]
/// ```
///
/// Entries that are not objects are skipped.
fn load_json(path: &Path, options: &ParseOptions) -> anyhow::Result<TelemetryDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;

    let mut header: Vec<String> = Vec::new();
    for obj in rows.iter().filter_map(JsonValue::as_object) {
        for key in obj.keys() {
            if !header.iter().any(|h| h == key) {
                header.push(key.clone());
            }
        }
    }
    if header.is_empty() {
        bail!(EngineError::InvalidInput("JSON array holds no objects".to_string()));
    }

    let schema = match options.schema {
        Some(forced) => forced,
        None => SchemaVersion::detect(&header)?,
    };

    let mut records = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let Some(obj) = row.as_object() else {
            warn!("skipping JSON entry {i}: not an object");
            continue;
        };
        let mut record = Record::new();
        for field in schema.fields() {
            record.insert(field.name, FieldValue::Missing);
        }
        for (key, val) in obj {
            record.insert(key.clone(), json_to_value(schema, key, val));
        }
        records.push(record);
    }

    Ok(TelemetryDataset::new(schema, header, records))
}

fn json_to_value(schema: SchemaVersion, name: &str, val: &JsonValue) -> FieldValue {
    match val {
        JsonValue::Null => FieldValue::Missing,
        JsonValue::Number(n) if schema.is_numeric(name) => {
            FieldValue::Number(n.as_f64().unwrap_or(f64::NAN))
        }
        JsonValue::String(s) => coerce(schema, name, s),
        JsonValue::Number(n) => FieldValue::Text(n.to_string()),
        other => coerce(schema, name, &other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one flat column per telemetry field.
///
/// Numeric columns may be Float64/Float32/Int64/Int32/UInt64/UInt32; text
/// columns Utf8/LargeUtf8; nulls become `Missing`. Values are then coerced to
/// the schema's declared kind, so a numeric field stored as text still parses.
fn load_parquet(path: &Path, options: &ParseOptions) -> anyhow::Result<TelemetryDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let header: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();

    let schema = match options.schema {
        Some(forced) => forced,
        None => SchemaVersion::detect(&header)?,
    };

    let reader = builder.build().context("building parquet reader")?;
    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let columns: Vec<(&String, &Arc<dyn Array>)> =
            header.iter().zip(batch.columns().iter()).collect();

        for row in 0..batch.num_rows() {
            let mut record = Record::new();
            for field in schema.fields() {
                record.insert(field.name, FieldValue::Missing);
            }
            for (name, col) in &columns {
                let value = match extract_cell(col, row) {
                    FieldValue::Number(v) if !schema.is_numeric(name) => {
                        FieldValue::Text(FieldValue::Number(v).to_string())
                    }
                    FieldValue::Text(s) => coerce(schema, name, &s),
                    other => other,
                };
                record.insert((*name).clone(), value);
            }
            records.push(record);
        }
    }

    Ok(TelemetryDataset::new(schema, header, records))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> FieldValue {
    if col.is_null(row) {
        return FieldValue::Missing;
    }
    let any = col.as_any();
    let number = match col.data_type() {
        DataType::Float64 => any.downcast_ref::<Float64Array>().map(|a| a.value(row)),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| a.value(row) as f64),
        DataType::Int64 => any.downcast_ref::<Int64Array>().map(|a| a.value(row) as f64),
        DataType::Int32 => any.downcast_ref::<Int32Array>().map(|a| a.value(row) as f64),
        DataType::UInt64 => any.downcast_ref::<UInt64Array>().map(|a| a.value(row) as f64),
        DataType::UInt32 => any.downcast_ref::<UInt32Array>().map(|a| a.value(row) as f64),
        DataType::Utf8 => {
            return any
                .downcast_ref::<StringArray>()
                .map(|s| FieldValue::Text(s.value(row).to_string()))
                .unwrap_or(FieldValue::Missing);
        }
        DataType::LargeUtf8 => {
            return FieldValue::Text(col.as_string::<i64>().value(row).to_string());
        }
        DataType::Boolean => {
            return any
                .downcast_ref::<BooleanArray>()
                .map(|b| FieldValue::Text(b.value(row).to_string()))
                .unwrap_or(FieldValue::Missing);
        }
        other => return FieldValue::Text(format!("{other:?}")),
    };
    number.map(FieldValue::Number).unwrap_or(FieldValue::Missing)
}
