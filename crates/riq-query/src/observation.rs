//! Observation rows as read from a level table

use riq_catalog::DataType;
use serde::{Deserialize, Serialize};

/// One stored observation
///
/// `region_code` is the storage code and `metric_id` carries any level
/// prefix; both are translated back to public form by the row builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRow {
    /// Storage region code
    pub region_code: String,
    /// Region name as stored
    #[serde(default)]
    pub region_name: Option<String>,
    /// Stored metric id (possibly level-prefixed)
    pub metric_id: String,
    /// Year
    pub period: i32,
    /// Point estimate
    #[serde(default)]
    pub value: Option<f64>,
    /// Lower confidence bound
    #[serde(default)]
    pub ci_lower: Option<f64>,
    /// Upper confidence bound
    #[serde(default)]
    pub ci_upper: Option<f64>,
    /// Unit of measure
    #[serde(default)]
    pub unit: Option<String>,
    /// Historical or forecast
    pub data_type: DataType,
    /// Release vintage
    #[serde(default)]
    pub vintage: Option<String>,
    /// Whether the value was derived rather than published
    #[serde(default)]
    pub is_calculated: Option<bool>,
}

impl ObservationRow {
    /// Create a row with only the point value set
    #[must_use]
    pub fn new(
        region_code: impl Into<String>,
        metric_id: impl Into<String>,
        period: i32,
        value: f64,
        data_type: DataType,
    ) -> Self {
        Self {
            region_code: region_code.into(),
            region_name: None,
            metric_id: metric_id.into(),
            period,
            value: Some(value),
            ci_lower: None,
            ci_upper: None,
            unit: None,
            data_type,
            vintage: None,
            is_calculated: None,
        }
    }

    /// With confidence bounds
    #[inline]
    #[must_use]
    pub fn with_bounds(mut self, ci_lower: f64, ci_upper: f64) -> Self {
        self.ci_lower = Some(ci_lower);
        self.ci_upper = Some(ci_upper);
        self
    }

    /// With unit
    #[inline]
    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// With region name
    #[inline]
    #[must_use]
    pub fn with_region_name(mut self, name: impl Into<String>) -> Self {
        self.region_name = Some(name.into());
        self
    }

    /// With vintage
    #[inline]
    #[must_use]
    pub fn with_vintage(mut self, vintage: impl Into<String>) -> Self {
        self.vintage = Some(vintage.into());
        self
    }

    /// Read a column by name
    #[must_use]
    pub fn column(&self, name: &str) -> Option<ColumnValue<'_>> {
        match name {
            "region_code" => Some(ColumnValue::Text(&self.region_code)),
            "region_name" => self.region_name.as_deref().map(ColumnValue::Text),
            "metric_id" => Some(ColumnValue::Text(&self.metric_id)),
            "period" => Some(ColumnValue::Number(f64::from(self.period))),
            "value" => self.value.map(ColumnValue::Number),
            "ci_lower" => self.ci_lower.map(ColumnValue::Number),
            "ci_upper" => self.ci_upper.map(ColumnValue::Number),
            "unit" => self.unit.as_deref().map(ColumnValue::Text),
            "data_type" => Some(ColumnValue::Text(self.data_type.as_str())),
            "vintage" => self.vintage.as_deref().map(ColumnValue::Text),
            _ => None,
        }
    }
}

/// Borrowed column value used by filter evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnValue<'a> {
    /// Text column
    Text(&'a str),
    /// Numeric column
    Number(f64),
}

impl ColumnValue<'_> {
    /// Render for comparison against wire filter values
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            ColumnValue::Text(s) => (*s).to_string(),
            ColumnValue::Number(n) if n.fract() == 0.0 => format!("{n:.0}"),
            ColumnValue::Number(n) => n.to_string(),
        }
    }
}
