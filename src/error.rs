use thiserror::Error;

/// Errors surfaced by the ingestion and aggregation engine.
///
/// Row-level anomalies (short/long rows, unparsable numbers) never show up
/// here: the parser absorbs them and keeps going.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input the engine cannot work with, such as text without a header line.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A component that needs at least one record was handed none.
    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    /// The header does not match any registered schema version.
    #[error("header does not match any known schema: [{}]", .columns.join(", "))]
    UnknownSchema { columns: Vec<String> },

    #[error("bin size must be positive and finite, got {0}")]
    InvalidBinSize(f64),

    #[error("histogram for '{field}' would need {bins} bins (limit {limit})")]
    TooManyBins {
        field: String,
        bins: usize,
        limit: usize,
    },

    #[error("batch size must be at least 1")]
    InvalidBatchSize,

    #[error("unknown schema version '{0}' (expected v1, v3 or untyped)")]
    UnknownVersion(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
