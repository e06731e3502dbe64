//! Error types for reference data loading

use crate::level::Level;

/// Errors raised while building or loading reference data
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Two regions share a public code
    #[error("duplicate region code: '{0}'")]
    DuplicateRegionCode(String),

    /// Two regions on the same level share a storage code
    #[error("duplicate storage code '{db_code}' on level {level}")]
    DuplicateDbCode { level: Level, db_code: String },

    /// Two metrics share an id
    #[error("duplicate metric id: '{0}'")]
    DuplicateMetricId(String),

    /// Companion metric points at a metric that does not exist
    #[error("metric '{metric}' is a companion of unknown metric '{standard}'")]
    DanglingCompanion { metric: String, standard: String },

    /// Level string not recognised
    #[error("unknown geography level: '{0}'")]
    UnknownLevel(String),

    /// Catalog document could not be decoded
    #[error("invalid catalog document: {0}")]
    Decode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_error_display() {
        let err = CatalogError::DuplicateRegionCode("UKI".to_string());
        assert_eq!(err.to_string(), "duplicate region code: 'UKI'");

        let err = CatalogError::DuplicateDbCode {
            level: Level::Itl1,
            db_code: "E12000007".to_string(),
        };
        assert!(err.to_string().contains("ITL1"));
    }
}
