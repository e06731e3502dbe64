//! Schema description: what a caller may ask for

use crate::config::{EngineConfig, Lifecycle};
use riq_catalog::{DataType, Level, ReferenceData};
use riq_query::{Measure, Scenario};
use serde::Serialize;

/// Published metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricEntry {
    /// Metric id
    pub id: String,
    /// Display name
    pub name: String,
    /// Unit
    pub unit: String,
    /// Metric type
    #[serde(rename = "type")]
    pub kind: String,
    /// Scale
    pub scale: String,
}

/// Known region
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionEntry {
    /// Public code
    pub code: String,
    /// Display name
    pub name: String,
    /// Geography level
    pub level: Level,
    /// Parent region code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// Years the engine serves by default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeCoverage {
    /// First year
    pub min_year: i32,
    /// Last year
    pub max_year: i32,
}

/// Full schema description
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaDescription {
    /// Dataset name
    pub dataset: String,
    /// Release lifecycle
    pub lifecycle: Lifecycle,
    /// Published metrics, by id
    pub metrics: Vec<MetricEntry>,
    /// Regions, by code
    pub regions: Vec<RegionEntry>,
    /// Geography levels
    pub levels: Vec<Level>,
    /// Scenario names
    pub scenarios: Vec<Scenario>,
    /// Measure names
    pub measures: Vec<Measure>,
    /// Data types
    pub data_types: Vec<DataType>,
    /// Default year span
    pub time_coverage: TimeCoverage,
}

impl SchemaDescription {
    /// Describe reference data under a configuration
    #[must_use]
    pub fn describe(reference: &ReferenceData, config: &EngineConfig) -> Self {
        let mut metrics: Vec<MetricEntry> = reference
            .metrics()
            .public()
            .map(|m| MetricEntry {
                id: m.id.clone(),
                name: m.name.clone(),
                unit: m.unit.clone(),
                kind: m.kind.clone(),
                scale: m.scale.clone(),
            })
            .collect();
        metrics.sort_by(|a, b| a.id.cmp(&b.id));

        let mut regions: Vec<RegionEntry> = reference
            .regions()
            .iter()
            .map(|r| RegionEntry {
                code: r.code.clone(),
                name: r.name.clone(),
                level: r.level,
                parent: r.parent.clone(),
            })
            .collect();
        regions.sort_by(|a, b| a.code.cmp(&b.code));

        Self {
            dataset: config.dataset.clone(),
            lifecycle: config.lifecycle.clone(),
            metrics,
            regions,
            levels: Level::ALL.to_vec(),
            scenarios: Scenario::ALL.to_vec(),
            measures: vec![Measure::Value, Measure::CiLower, Measure::CiUpper],
            data_types: vec![DataType::Historical, DataType::Forecast],
            time_coverage: TimeCoverage {
                min_year: config.min_year,
                max_year: config.max_year,
            },
        }
    }
}
