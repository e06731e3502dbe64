//! Reference data service
//!
//! [`ReferenceData`] bundles the region catalog, metric catalog and label
//! lookup. It is built once at process start, wrapped in an `Arc` and shared
//! read-only by every query.

use crate::builtin;
use crate::error::CatalogError;
use crate::labels::{DefaultLabels, LabelLookup};
use crate::metric::MetricCatalog;
use crate::region::RegionCatalog;
use std::sync::Arc;

/// Immutable reference data injected into the engine
#[derive(Debug, Clone)]
pub struct ReferenceData {
    regions: RegionCatalog,
    metrics: MetricCatalog,
    labels: Arc<dyn LabelLookup>,
}

impl ReferenceData {
    /// Create from catalogs with default labels
    #[inline]
    #[must_use]
    pub fn new(regions: RegionCatalog, metrics: MetricCatalog) -> Self {
        Self {
            regions,
            metrics,
            labels: Arc::new(DefaultLabels::default()),
        }
    }

    /// Built-in UK geography and v1 metrics
    ///
    /// # Errors
    /// Only fails if the built-in tables are inconsistent
    pub fn builtin() -> Result<Self, CatalogError> {
        Ok(Self::new(
            RegionCatalog::new(builtin::regions())?,
            MetricCatalog::new(builtin::metrics())?,
        ))
    }

    /// With a custom label lookup
    #[inline]
    #[must_use]
    pub fn with_labels(mut self, labels: Arc<dyn LabelLookup>) -> Self {
        self.labels = labels;
        self
    }

    /// Region catalog
    #[inline]
    #[must_use]
    pub fn regions(&self) -> &RegionCatalog {
        &self.regions
    }

    /// Metric catalog
    #[inline]
    #[must_use]
    pub fn metrics(&self) -> &MetricCatalog {
        &self.metrics
    }

    /// Label lookup
    #[inline]
    #[must_use]
    pub fn labels(&self) -> &dyn LabelLookup {
        self.labels.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::DataType;

    #[derive(Debug)]
    struct UpperLabels;

    impl LabelLookup for UpperLabels {
        fn unit_label(&self, unit: &str) -> String {
            unit.to_uppercase()
        }
        fn data_type_label(&self, data_type: DataType) -> String {
            data_type.as_str().to_uppercase()
        }
        fn source_label(&self, _data_type: DataType) -> String {
            "TEST".to_string()
        }
    }

    #[test]
    fn builtin_reference_data() {
        let data = ReferenceData::builtin().unwrap();
        assert!(data.regions().by_code("UKI").is_some());
        assert!(data.metrics().public_by_id("population_total").is_some());
        assert_eq!(data.labels().data_type_label(DataType::Historical), "Historical");
    }

    #[test]
    fn custom_labels_are_used() {
        let data = ReferenceData::builtin().unwrap().with_labels(Arc::new(UpperLabels));
        assert_eq!(data.labels().unit_label("jobs"), "JOBS");
    }
}
