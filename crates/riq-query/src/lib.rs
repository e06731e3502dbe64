//! RegionIQ query model
//!
//! Everything needed to interpret a request before any storage is touched:
//! - [`QuerySpec`]: typed, tolerant form of the inbound JSON query
//! - [`Selection`]: the `all` / `item` / `range` selection algebra
//! - [`Scenario`] / [`Measure`]: scenario-to-measure mapping and [`pick_value`]
//! - [`JobsRule`] / [`JobsRemapper`]: the jobs-metric region exception
//! - [`ObservationRow`]: one stored observation
//!
//! # Example
//!
//! ```rust
//! use riq_query::{Dimension, QuerySpec, Resolved, Selection};
//!
//! let spec = QuerySpec::new()
//!     .with(Dimension::Year, Selection::items(["2021", "2020", "2021"]));
//! assert_eq!(spec.years(), Resolved::Items(vec![2020, 2021]));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod dimension;
pub mod error;
pub mod observation;
pub mod remap;
pub mod scenario;
pub mod selection;
pub mod spec;

// Re-exports
pub use dimension::Dimension;
pub use error::QueryError;
pub use observation::{ColumnValue, ObservationRow};
pub use remap::{CodeMap, CodeMapConflict, JobsRemapper, JobsRule};
pub use scenario::{choose_measure, measure_for, pick_value, Measure, Scenario};
pub use selection::{NumericRange, Resolved, Selection};
pub use spec::QuerySpec;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
