/// Data layer: schemas, typed records, loading, upload bookkeeping, filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐   ┌──────────┐
///   │  loader   │◄──│  schema   │  header → SchemaVersion, field kinds, sentinels
///   └──────────┘   └──────────┘
///        │
///        ▼
///   ┌──────────────────┐
///   │ TelemetryDataset  │  Vec<Record>, column order
///   └──────────────────┘
///        │                      │
///        ▼                      ▼
///   ┌──────────┐          ┌──────────┐
///   │  upload   │ ───────► │  filter   │  descriptor predicates → upload indices
///   └──────────┘          └──────────┘
/// ```
pub mod filter;
pub mod loader;
pub mod model;
pub mod schema;
pub mod upload;
