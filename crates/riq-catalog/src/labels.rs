//! Display labels for units, data types and sources

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether an observation is measured or projected
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Published outturn
    Historical,
    /// Model projection
    Forecast,
}

impl DataType {
    /// Storage string form
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Historical => "historical",
            DataType::Forecast => "forecast",
        }
    }

    /// Parse storage string form
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "historical" => Some(DataType::Historical),
            "forecast" => Some(DataType::Forecast),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label lookup used when assembling canonical rows
pub trait LabelLookup: Send + Sync + fmt::Debug {
    /// Display label for a stored unit
    fn unit_label(&self, unit: &str) -> String;

    /// Display label for a data type
    fn data_type_label(&self, data_type: DataType) -> String;

    /// Attribution for a data type
    fn source_label(&self, data_type: DataType) -> String;
}

/// Labels used by the dashboard exports
#[derive(Debug, Clone)]
pub struct DefaultLabels {
    historical_source: String,
    forecast_source: String,
}

impl DefaultLabels {
    /// Create with default attributions
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With forecast attribution
    #[inline]
    #[must_use]
    pub fn with_forecast_source(mut self, source: impl Into<String>) -> Self {
        self.forecast_source = source.into();
        self
    }
}

impl Default for DefaultLabels {
    fn default() -> Self {
        Self {
            historical_source: "ONS".to_string(),
            forecast_source: "RegionIQ".to_string(),
        }
    }
}

impl LabelLookup for DefaultLabels {
    fn unit_label(&self, unit: &str) -> String {
        match unit {
            "people" => "People".to_string(),
            "jobs" => "Jobs".to_string(),
            "£m" | "gbp_mn" => "£ million".to_string(),
            "£" | "gbp" => "£".to_string(),
            "%" | "pct" => "%".to_string(),
            other => other.to_string(),
        }
    }

    fn data_type_label(&self, data_type: DataType) -> String {
        match data_type {
            DataType::Historical => "Historical".to_string(),
            DataType::Forecast => "Forecast".to_string(),
        }
    }

    fn source_label(&self, data_type: DataType) -> String {
        match data_type {
            DataType::Historical => self.historical_source.clone(),
            DataType::Forecast => self.forecast_source.clone(),
        }
    }
}
