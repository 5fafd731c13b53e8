//! Ingestion and aggregation engine for WiFi measurement telemetry.
//!
//! ```text
//!  text / file ──► data::loader ──► TelemetryDataset ──┬─► analysis::stats
//!                      ▲                               ├─► analysis::quality
//!                 data::schema                         ├─► analysis::histogram
//!                                                      ├─► analysis::categorical
//!                                                      ├─► analysis::timeseries
//!                                                      └─► data::upload (descriptor, batches)
//! ```

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;

pub use analysis::report::{build_report, DashboardReport};
pub use config::AnalysisConfig;
pub use data::model::{FieldValue, Record, TelemetryDataset};
pub use data::schema::SchemaVersion;
pub use error::{EngineError, Result};
