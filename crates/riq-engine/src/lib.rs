//! RegionIQ observation query and scenario reconciliation engine
//!
//! Turns a declarative query (metrics × regions × years × scenarios) into
//! flat canonical rows and a year-pivoted matrix, correcting on the way for:
//! - per-level storage tables and the national metric-id prefix
//! - the Northern Ireland jobs series filed under the national code
//! - scenarios that select a measure rather than a stored column
//!
//! # Architecture
//!
//! ```text
//! JSON body ─▶ QuerySpec ─▶ ResolvedRequest ─▶ LevelRouter ─▶ ObservationStore (per level, concurrent)
//!                                                                  │
//!                            Matrix ◀─ CanonicalRow ◀─ RowBuilder ◀┘
//!                               └────────┴─▶ ExportAssembler ─▶ WorkbookWriter
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use riq_catalog::ReferenceData;
//! use riq_engine::{Engine, EngineConfig, InMemoryStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Engine::new(
//!     Arc::new(ReferenceData::builtin()?),
//!     Arc::new(InMemoryStore::from_path("fixtures.json")?),
//!     EngineConfig::default(),
//! );
//! let response = engine
//!     .query(&serde_json::json!({"metrics": ["population_total"], "regions": ["UKI"]}))
//!     .await?;
//! println!("{} rows", response.meta.returned_records);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod matrix;
pub mod request;
pub mod response;
pub mod router;
pub mod rows;
pub mod schema;
pub mod store;

// Re-exports
pub use compare::{Comparison, RegionSeries};
pub use config::{EngineConfig, LevelTables, Lifecycle, RestStoreConfig};
pub use engine::Engine;
pub use error::{
    ConfigError, EngineError, ErrorBody, ErrorResponse, StoreError, ValidationError, WriterError,
};
pub use export::{
    CsvBundleWriter, ExportFile, ExportLayout, InfoSheet, ProductMetadata, SingleSeries,
    Workbook, WorkbookWriter,
};
pub use matrix::{Matrix, MatrixRow};
pub use request::{ResolvedRequest, YearFilter};
pub use response::{QueryResponse, ResponseMeta};
pub use router::{FetchedLevel, LevelFetch, LevelRouter};
pub use rows::{BuiltRows, CanonicalRow};
pub use schema::SchemaDescription;
pub use store::{Filter, InMemoryStore, ObservationStore, RestStore, StoreQuery};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
