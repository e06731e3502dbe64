//! Storage collaborator
//!
//! One table per geography level, queried with a PostgREST-like shape:
//! selected columns, `in` / `gte` / `lte` filters and an ordering.
//!
//! Adapters:
//! - [`InMemoryStore`]: fixture-backed, evaluates filters locally
//! - [`RestStore`]: paged HTTP reads against a PostgREST endpoint

mod memory;
mod rest;

pub use memory::InMemoryStore;
pub use rest::{build_params, RestStore};

use crate::error::StoreError;
use async_trait::async_trait;
use riq_query::ObservationRow;

/// Columns read from every level table
pub const SELECT_COLUMNS: &[&str] = &[
    "region_code",
    "region_name",
    "metric_id",
    "period",
    "value",
    "ci_lower",
    "ci_upper",
    "unit",
    "data_type",
    "vintage",
    "is_calculated",
];

/// Default result ordering
pub const DEFAULT_ORDER: &[&str] = &["metric_id", "region_code", "period"];

/// Row filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Column value is one of `values`
    In {
        /// Column name
        column: String,
        /// Accepted values
        values: Vec<String>,
    },
    /// Column value is at least `value`
    Gte {
        /// Column name
        column: String,
        /// Lower bound
        value: String,
    },
    /// Column value is at most `value`
    Lte {
        /// Column name
        column: String,
        /// Upper bound
        value: String,
    },
}

impl Filter {
    /// Create `in` filter
    pub fn is_in<I, S>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Create `gte` filter
    pub fn gte(column: impl Into<String>, value: impl ToString) -> Self {
        Self::Gte {
            column: column.into(),
            value: value.to_string(),
        }
    }

    /// Create `lte` filter
    pub fn lte(column: impl Into<String>, value: impl ToString) -> Self {
        Self::Lte {
            column: column.into(),
            value: value.to_string(),
        }
    }

    /// Column the filter applies to
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::In { column, .. } | Self::Gte { column, .. } | Self::Lte { column, .. } => column,
        }
    }

    /// PostgREST query parameter
    #[must_use]
    pub fn to_param(&self) -> (String, String) {
        match self {
            Self::In { column, values } => (column.clone(), format!("in.({})", values.join(","))),
            Self::Gte { column, value } => (column.clone(), format!("gte.{value}")),
            Self::Lte { column, value } => (column.clone(), format!("lte.{value}")),
        }
    }
}

/// A single-table read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreQuery {
    /// Table name
    pub table: String,
    /// Columns to return
    pub select: Vec<String>,
    /// Conjunctive filters
    pub filters: Vec<Filter>,
    /// Ascending sort columns
    pub order_by: Vec<String>,
}

impl StoreQuery {
    /// Create query for a table with the standard columns and ordering
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            select: SELECT_COLUMNS.iter().map(ToString::to_string).collect(),
            filters: Vec::new(),
            order_by: DEFAULT_ORDER.iter().map(ToString::to_string).collect(),
        }
    }

    /// With filter
    #[inline]
    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Values of the first `in` filter on `column`
    #[must_use]
    pub fn in_values(&self, column: &str) -> Option<&[String]> {
        self.filters.iter().find_map(|f| match f {
            Filter::In { column: c, values } if c == column => Some(values.as_slice()),
            _ => None,
        })
    }

    /// Copy with the `in` filter on `column` replaced by `values`
    #[must_use]
    pub fn with_in_values(&self, column: &str, values: &[String]) -> Self {
        let mut query = self.clone();
        for filter in &mut query.filters {
            if let Filter::In { column: c, values: v } = filter {
                if c == column {
                    *v = values.to_vec();
                }
            }
        }
        query
    }
}

/// Storage collaborator
#[async_trait]
pub trait ObservationStore: Send + Sync {
    /// Read all rows matching the query
    async fn query(&self, query: &StoreQuery) -> Result<Vec<ObservationRow>, StoreError>;
}
