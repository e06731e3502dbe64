//! Error types for the observation engine
//!
//! Three failure classes reach callers:
//! - Validation: the request names something that does not exist
//! - Upstream fetch: a level table could not be read; the whole call fails
//! - Writer/config: the export or the process setup is broken
//!
//! Soft degradation during comparisons is not an error; dropped peers are
//! reported on the comparison result instead.

use riq_query::{Dimension, QueryError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Request refers to unknown reference data or uses an unsupported selection
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Request could not be interpreted
    #[error("invalid query: {0}")]
    Query(#[from] QueryError),

    /// A level fetch failed
    #[error("failed to read table '{table}': {source}")]
    UpstreamFetch {
        /// Table that failed
        table: String,
        /// Underlying storage failure
        #[source]
        source: StoreError,
    },

    /// Workbook writer failed
    #[error("export failed: {0}")]
    Writer(#[from] WriterError),

    /// Configuration is invalid
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Create upstream fetch error
    #[inline]
    pub fn upstream(table: impl Into<String>, source: StoreError) -> Self {
        Self::UpstreamFetch {
            table: table.into(),
            source,
        }
    }

    /// Whether the caller sent a bad request (400-equivalent)
    #[inline]
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Query(_))
    }

    /// Whether retrying the same call could succeed
    ///
    /// This layer never retries; a transient storage failure is surfaced so
    /// the caller can decide.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Stable domain error code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(ValidationError::UnknownMetric(_)) => "UNKNOWN_METRIC",
            Self::Validation(ValidationError::UnknownRegion(_)) => "UNKNOWN_REGION",
            Self::Validation(_) | Self::Query(_) => "VALIDATION_ERROR",
            Self::UpstreamFetch { .. } => "DATA_UNAVAILABLE",
            Self::Writer(_) => "EXPORT_FAILED",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Structured details for the error envelope
    #[must_use]
    pub fn details(&self) -> Map<String, Value> {
        let value = match self {
            Self::Validation(ValidationError::UnknownMetric(id)) => json!({ "metric_id": id }),
            Self::Validation(ValidationError::UnknownRegion(code)) => json!({ "region_code": code }),
            Self::Validation(ValidationError::UnsupportedSelection { dimension, filter }) => {
                json!({ "dimension": dimension.code(), "filter": filter })
            }
            Self::Query(QueryError::InvalidValue { dimension, value }) => {
                json!({ "dimension": dimension.code(), "value": value })
            }
            Self::Query(QueryError::MalformedSelection { dimension, reason }) => {
                json!({ "dimension": dimension.code(), "reason": reason })
            }
            Self::Query(QueryError::UnsupportedRange { dimension }) => {
                json!({ "dimension": dimension.code(), "filter": "range" })
            }
            Self::UpstreamFetch { table, source } => {
                json!({ "table": table, "reason": source.to_string() })
            }
            Self::Query(QueryError::MalformedBody(_)) | Self::Writer(_) | Self::Config(_) => {
                json!({})
            }
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

/// Client-side validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Metric id is not published
    #[error("unknown metric: {0}")]
    UnknownMetric(String),

    /// Region code is not in the catalog
    #[error("unknown region: {0}")]
    UnknownRegion(String),

    /// Selection kind makes no sense for the dimension
    #[error("{filter} selection is not supported for dimension {dimension}")]
    UnsupportedSelection {
        /// Dimension the selection was given for
        dimension: Dimension,
        /// Selection kind (`range`, ...)
        filter: String,
    },
}

/// Storage collaborator failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Network or protocol failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Storage answered with an error status
    #[error("storage returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Table does not exist
    #[error("unknown table: {0}")]
    UnknownTable(String),

    /// Response rows could not be decoded
    #[error("failed to decode rows: {0}")]
    Decode(String),

    /// Storage refused the query
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether the failure is plausibly transient
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Unavailable(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::UnknownTable(_) | Self::Decode(_) => false,
        }
    }
}

/// Workbook writer failures
#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    /// CSV encoding failed
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Output buffer could not be flushed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Layout cannot be rendered by this writer
    #[error("unsupported layout: {0}")]
    Unsupported(String),
}

/// Configuration failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Required environment variable is missing or empty
    #[error("environment variable {0} must be set")]
    MissingEnv(&'static str),

    /// Values are inconsistent
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Error envelope returned to API callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error body
    pub error: ErrorBody,
}

/// Body of [`ErrorResponse`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable domain code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Structured details
    #[serde(default)]
    pub details: Map<String, Value>,
}

impl From<&EngineError> for ErrorResponse {
    fn from(err: &EngineError) -> Self {
        Self {
            error: ErrorBody {
                code: err.code().to_string(),
                message: err.to_string(),
                details: err.details(),
            },
        }
    }
}
