//! Metric reference data

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A published metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    /// Metric identifier as stored (without any level prefix)
    #[serde(alias = "metric_id")]
    pub id: String,
    /// Display name
    pub name: String,
    /// Unit of measure
    pub unit: String,
    /// Metric type (`level`, `rate`, ...)
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    /// Scale (`count`, `nominal`, ...)
    #[serde(default)]
    pub scale: String,
    /// Standard metric this one stands in for, when it is a storage companion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companion_of: Option<String>,
}

fn default_kind() -> String {
    "level".to_string()
}

impl Metric {
    /// Create new metric
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit: unit.into(),
            kind: default_kind(),
            scale: String::new(),
            companion_of: None,
        }
    }

    /// With scale
    #[inline]
    #[must_use]
    pub fn with_scale(mut self, scale: impl Into<String>) -> Self {
        self.scale = scale.into();
        self
    }

    /// Mark as a storage companion of `standard`
    #[inline]
    #[must_use]
    pub fn companion_of(mut self, standard: impl Into<String>) -> Self {
        self.companion_of = Some(standard.into());
        self
    }

    /// Whether this metric is exposed to callers
    #[inline]
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.companion_of.is_none()
    }
}

/// Immutable metric catalog
#[derive(Debug, Clone)]
pub struct MetricCatalog {
    metrics: Vec<Metric>,
    by_id: HashMap<String, usize>,
}

impl MetricCatalog {
    /// Build catalog from metrics
    ///
    /// # Errors
    /// Returns error on duplicate ids or a companion without its standard metric
    pub fn new(metrics: Vec<Metric>) -> Result<Self, CatalogError> {
        let mut by_id = HashMap::with_capacity(metrics.len());
        for (idx, metric) in metrics.iter().enumerate() {
            if by_id.insert(metric.id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateMetricId(metric.id.clone()));
            }
        }
        for metric in &metrics {
            if let Some(standard) = &metric.companion_of {
                if !by_id.contains_key(standard) {
                    return Err(CatalogError::DanglingCompanion {
                        metric: metric.id.clone(),
                        standard: standard.clone(),
                    });
                }
            }
        }
        Ok(Self { metrics, by_id })
    }

    /// Load from a JSON array of metrics
    ///
    /// # Errors
    /// Returns error on malformed JSON or inconsistent entries
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let metrics: Vec<Metric> = serde_json::from_str(json)?;
        Self::new(metrics)
    }

    /// Lookup by id (public or companion)
    #[inline]
    #[must_use]
    pub fn by_id(&self, id: &str) -> Option<&Metric> {
        self.by_id.get(id).map(|&idx| &self.metrics[idx])
    }

    /// Lookup a metric callers may request directly
    #[inline]
    #[must_use]
    pub fn public_by_id(&self, id: &str) -> Option<&Metric> {
        self.by_id(id).filter(|m| m.is_public())
    }

    /// Metric whose label a stored id should be displayed under
    ///
    /// Companion metrics display as their standard metric.
    #[must_use]
    pub fn display_metric(&self, id: &str) -> Option<&Metric> {
        let metric = self.by_id(id)?;
        match &metric.companion_of {
            Some(standard) => self.by_id(standard),
            None => Some(metric),
        }
    }

    /// Companion metric ids for a standard metric
    #[must_use]
    pub fn companions_of(&self, standard: &str) -> Vec<&Metric> {
        self.metrics
            .iter()
            .filter(|m| m.companion_of.as_deref() == Some(standard))
            .collect()
    }

    /// Public metrics in catalog order
    pub fn public(&self) -> impl Iterator<Item = &Metric> {
        self.metrics.iter().filter(|m| m.is_public())
    }

    /// Number of metrics, companions included
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Whether the catalog is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MetricCatalog {
        MetricCatalog::new(vec![
            Metric::new("emp_total_jobs", "Total Employment", "jobs"),
            Metric::new("emp_total_jobs_ni", "Total Employment (NI)", "jobs")
                .companion_of("emp_total_jobs"),
            Metric::new("population_total", "Total Population", "people"),
        ])
        .unwrap()
    }

    #[test]
    fn companion_displays_as_standard() {
        let catalog = sample();
        assert_eq!(
            catalog.display_metric("emp_total_jobs_ni").unwrap().name,
            "Total Employment"
        );
        assert!(catalog.public_by_id("emp_total_jobs_ni").is_none());
        assert!(catalog.by_id("emp_total_jobs_ni").is_some());
    }

    #[test]
    fn public_excludes_companions() {
        let catalog = sample();
        let ids: Vec<&str> = catalog.public().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["emp_total_jobs", "population_total"]);
        assert_eq!(catalog.companions_of("emp_total_jobs").len(), 1);
    }

    #[test]
    fn dangling_companion_rejected() {
        let result = MetricCatalog::new(vec![Metric::new("x_ni", "X", "u").companion_of("x")]);
        assert!(matches!(result, Err(CatalogError::DanglingCompanion { .. })));
    }

    #[test]
    fn from_json_accepts_metric_id_alias() {
        let json = r#"[{"metric_id":"population_total","name":"Total Population","unit":"people","type":"level","scale":"count"}]"#;
        let catalog = MetricCatalog::from_json_str(json).unwrap();
        assert_eq!(catalog.by_id("population_total").unwrap().scale, "count");
    }
}
