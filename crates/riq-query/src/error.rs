//! Error types for query parsing and validation

use crate::dimension::Dimension;

/// Query model errors
///
/// These are all client errors: the request itself is wrong and retrying it
/// unchanged cannot succeed.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Request body is not a JSON object
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    /// A selection value is not valid for its dimension
    #[error("invalid value '{value}' for dimension {dimension}")]
    InvalidValue { dimension: Dimension, value: String },

    /// A selection for a known dimension has the wrong shape
    #[error("malformed selection for dimension {dimension}: {reason}")]
    MalformedSelection { dimension: Dimension, reason: String },

    /// A range selector on a dimension that only takes items
    #[error("range selection is not supported for dimension {dimension}")]
    UnsupportedRange { dimension: Dimension },
}

impl QueryError {
    /// Create invalid value error
    #[inline]
    pub fn invalid_value(dimension: Dimension, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            dimension,
            value: value.into(),
        }
    }

    /// Create malformed selection error
    #[inline]
    pub fn malformed_selection(dimension: Dimension, reason: impl Into<String>) -> Self {
        Self::MalformedSelection {
            dimension,
            reason: reason.into(),
        }
    }

    /// Dimension the error is about, if any
    #[inline]
    #[must_use]
    pub fn dimension(&self) -> Option<Dimension> {
        match self {
            Self::InvalidValue { dimension, .. }
            | Self::MalformedSelection { dimension, .. }
            | Self::UnsupportedRange { dimension } => Some(*dimension),
            Self::MalformedBody(_) => None,
        }
    }

    /// Offending value, if the error names one
    #[inline]
    #[must_use]
    pub fn offending_value(&self) -> Option<&str> {
        match self {
            Self::InvalidValue { value, .. } => Some(value),
            Self::MalformedBody(_) | Self::MalformedSelection { .. } | Self::UnsupportedRange { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_display() {
        let err = QueryError::invalid_value(Dimension::Scenario, "sideways");
        assert_eq!(err.to_string(), "invalid value 'sideways' for dimension scenario");
        assert_eq!(err.offending_value(), Some("sideways"));
        assert_eq!(err.dimension(), Some(Dimension::Scenario));
    }

    #[test]
    fn selection_errors_name_dimension() {
        let err = QueryError::malformed_selection(Dimension::Region, "unknown variant `bogus`");
        assert_eq!(err.dimension(), Some(Dimension::Region));
        assert!(err.to_string().starts_with("malformed selection for dimension region"));

        let err = QueryError::UnsupportedRange { dimension: Dimension::Level };
        assert_eq!(err.to_string(), "range selection is not supported for dimension level");
        assert_eq!(err.offending_value(), None);
    }
}
