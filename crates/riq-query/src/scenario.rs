//! Scenario-to-measure mapping
//!
//! A scenario is not a stored column. It selects which measure of a forecast
//! row to read. Historical rows have no confidence bounds, so they always
//! yield their point value regardless of the scenario requested.

use crate::dimension::Dimension;
use crate::error::QueryError;
use crate::observation::ObservationRow;
use riq_catalog::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named measure selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// Central projection
    Baseline,
    /// Upper confidence bound
    Upside,
    /// Lower confidence bound
    Downside,
}

impl Scenario {
    /// All scenarios in presentation order
    pub const ALL: [Scenario; 3] = [Scenario::Baseline, Scenario::Upside, Scenario::Downside];

    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Baseline => "baseline",
            Scenario::Upside => "upside",
            Scenario::Downside => "downside",
        }
    }

    /// Display label
    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Scenario::Baseline => "Baseline",
            Scenario::Upside => "Upside",
            Scenario::Downside => "Downside",
        }
    }

    /// Sort priority (baseline first)
    #[inline]
    #[must_use]
    pub fn priority(&self) -> u8 {
        match self {
            Scenario::Baseline => 0,
            Scenario::Upside => 1,
            Scenario::Downside => 2,
        }
    }

    /// Parse a display label back to a scenario
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "baseline" => Ok(Scenario::Baseline),
            "upside" => Ok(Scenario::Upside),
            "downside" => Ok(Scenario::Downside),
            _ => Err(QueryError::invalid_value(Dimension::Scenario, s)),
        }
    }
}

/// Stored field a scenario resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    /// Point estimate
    Value,
    /// Lower confidence bound
    CiLower,
    /// Upper confidence bound
    CiUpper,
}

impl Measure {
    /// Column name
    #[inline]
    #[must_use]
    pub fn column(&self) -> &'static str {
        match self {
            Measure::Value => "value",
            Measure::CiLower => "ci_lower",
            Measure::CiUpper => "ci_upper",
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Measure {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "value" => Ok(Measure::Value),
            "ci_lower" => Ok(Measure::CiLower),
            "ci_upper" => Ok(Measure::CiUpper),
            _ => Err(QueryError::invalid_value(Dimension::Measure, s)),
        }
    }
}

/// Measure read for a scenario
#[inline]
#[must_use]
pub fn measure_for(scenario: Scenario) -> Measure {
    match scenario {
        Scenario::Baseline => Measure::Value,
        Scenario::Upside => Measure::CiUpper,
        Scenario::Downside => Measure::CiLower,
    }
}

/// Measure read for a scenario, honouring an explicit override
#[inline]
#[must_use]
pub fn choose_measure(scenario: Scenario, explicit: Option<Measure>) -> Measure {
    explicit.unwrap_or_else(|| measure_for(scenario))
}

/// Value of `row` under `measure`
///
/// Historical rows always yield `value`. Forecast rows yield the requested
/// bound, falling back to `value` when the bound is missing for that horizon.
#[must_use]
pub fn pick_value(row: &ObservationRow, measure: Measure) -> Option<f64> {
    if row.data_type == DataType::Historical {
        return row.value;
    }
    let picked = match measure {
        Measure::Value => row.value,
        Measure::CiLower => row.ci_lower,
        Measure::CiUpper => row.ci_upper,
    };
    picked.or(row.value)
}
