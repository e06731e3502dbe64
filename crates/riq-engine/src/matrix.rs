//! Pivot matrix
//!
//! Canonical rows grouped by (metric, region code, scenario), one column per
//! distinct year found anywhere in the result. Every row has a cell for every
//! year; absent observations are `None`. A parallel data-type map records
//! whether each present cell is historical or forecast.

use crate::rows::CanonicalRow;
use riq_query::Scenario;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

/// Leading non-year header columns
pub const FIXED_COLUMNS: [&str; 4] = ["Metric", "Region", "Scenario", "Units"];

/// One (metric, region, scenario) series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixRow {
    /// Metric label
    pub metric: String,
    /// Region label
    pub region: String,
    /// Public region code
    pub region_code: String,
    /// Scenario label
    pub scenario: String,
    /// Unit label
    pub units: String,
    /// Value per header year
    pub values: Vec<Option<f64>>,
    /// Data-type label per header year
    pub data_types: Vec<Option<String>>,
}

/// Year-columned pivot of canonical rows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Matrix {
    /// `Metric, Region, Scenario, Units`, then each year
    pub header: Vec<String>,
    /// Header years, ascending
    pub years: Vec<i32>,
    /// Series rows, sorted
    pub rows: Vec<MatrixRow>,
}

impl Matrix {
    /// Pivot canonical rows
    #[must_use]
    pub fn build(rows: &[CanonicalRow]) -> Self {
        let years: Vec<i32> = rows.iter().map(|r| r.year).collect::<BTreeSet<_>>().into_iter().collect();
        let column: HashMap<i32, usize> = years.iter().enumerate().map(|(i, y)| (*y, i)).collect();

        let mut index: HashMap<(&str, &str, &str), usize> = HashMap::new();
        let mut series: Vec<MatrixRow> = Vec::new();
        for row in rows {
            let key = (row.metric.as_str(), row.region_code.as_str(), row.scenario.as_str());
            let idx = *index.entry(key).or_insert_with(|| {
                series.push(MatrixRow {
                    metric: row.metric.clone(),
                    region: row.region.clone(),
                    region_code: row.region_code.clone(),
                    scenario: row.scenario.clone(),
                    units: row.units.clone(),
                    values: vec![None; years.len()],
                    data_types: vec![None; years.len()],
                });
                series.len() - 1
            });
            if let Some(&col) = column.get(&row.year) {
                series[idx].values[col] = row.value;
                series[idx].data_types[col] = Some(row.data_type.clone());
            }
        }

        series.sort_by(compare_rows);

        let mut header: Vec<String> = FIXED_COLUMNS.iter().map(ToString::to_string).collect();
        header.extend(years.iter().map(ToString::to_string));

        Self {
            header,
            years,
            rows: series,
        }
    }

    /// Whether the matrix has no year columns
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Cell by row index and year
    #[must_use]
    pub fn cell(&self, row: usize, year: i32) -> Option<f64> {
        let col = self.years.binary_search(&year).ok()?;
        self.rows.get(row)?.values[col]
    }
}

fn scenario_priority(label: &str) -> u8 {
    Scenario::from_label(label).map_or(u8::MAX, |s| s.priority())
}

fn compare_rows(a: &MatrixRow, b: &MatrixRow) -> Ordering {
    a.metric
        .cmp(&b.metric)
        .then_with(|| a.region.cmp(&b.region))
        .then_with(|| a.region_code.cmp(&b.region_code))
        .then_with(|| scenario_priority(&a.scenario).cmp(&scenario_priority(&b.scenario)))
}
