//! Query dimensions

use serde::{Deserialize, Serialize};
use std::fmt;

/// A dimension a query can select on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Metric ids
    Metric,
    /// Public region codes
    Region,
    /// Scenario names
    Scenario,
    /// Years (`year`, `period` or `time_period` on the wire)
    Year,
    /// Historical / forecast
    DataType,
    /// Geography level
    Level,
    /// Explicit measure override
    Measure,
}

impl Dimension {
    /// Parse a wire dimension code; unknown codes yield `None`
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "metric" => Some(Self::Metric),
            "region" => Some(Self::Region),
            "scenario" => Some(Self::Scenario),
            "year" | "period" | "time_period" => Some(Self::Year),
            "data_type" => Some(Self::DataType),
            "level" => Some(Self::Level),
            "measure" => Some(Self::Measure),
            _ => None,
        }
    }

    /// Canonical wire code
    #[inline]
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Region => "region",
            Self::Scenario => "scenario",
            Self::Year => "year",
            Self::DataType => "data_type",
            Self::Level => "level",
            Self::Measure => "measure",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
