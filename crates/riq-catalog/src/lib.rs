//! RegionIQ reference data
//!
//! Immutable region and metric catalogs with O(1) lookup:
//! - **Region**: public code, storage code, level, name and parent
//! - **RegionCatalog**: lookup by public/storage code, per-level grouping
//! - **MetricCatalog**: public metrics plus storage companions
//! - **LabelLookup**: display labels for units, data types and sources
//!
//! # Example
//!
//! ```rust
//! use riq_catalog::{Level, ReferenceData};
//!
//! let data = ReferenceData::builtin().unwrap();
//! let london = data.regions().by_code("UKI").unwrap();
//! assert_eq!(london.level, Level::Itl1);
//! assert_eq!(london.db_code, "E12000007");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod builtin;
pub mod error;
pub mod labels;
pub mod level;
pub mod metric;
pub mod reference;
pub mod region;

// Re-exports
pub use error::CatalogError;
pub use labels::{DataType, DefaultLabels, LabelLookup};
pub use level::Level;
pub use metric::{Metric, MetricCatalog};
pub use reference::ReferenceData;
pub use region::{LevelPartition, Region, RegionCatalog};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
