//! Fixture-backed store

use super::{Filter, ObservationStore, StoreQuery};
use crate::error::StoreError;
use async_trait::async_trait;
use riq_query::{ColumnValue, ObservationRow};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// In-memory level tables
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: HashMap<String, Vec<ObservationRow>>,
    failing: HashSet<String>,
}

impl InMemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With rows appended to a table
    #[must_use]
    pub fn with_rows(mut self, table: impl Into<String>, rows: impl IntoIterator<Item = ObservationRow>) -> Self {
        self.insert(table, rows);
        self
    }

    /// Append rows to a table
    pub fn insert(&mut self, table: impl Into<String>, rows: impl IntoIterator<Item = ObservationRow>) {
        self.tables.entry(table.into()).or_default().extend(rows);
    }

    /// Make every read of `table` fail
    #[must_use]
    pub fn failing(mut self, table: impl Into<String>) -> Self {
        self.failing.insert(table.into());
        self
    }

    /// Load from a JSON object of `{table: [rows]}`
    ///
    /// # Errors
    /// Returns error on malformed JSON
    pub fn from_json_str(json: &str) -> Result<Self, StoreError> {
        let tables: HashMap<String, Vec<ObservationRow>> =
            serde_json::from_str(json).map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(Self {
            tables,
            failing: HashSet::new(),
        })
    }

    /// Load a JSON fixture file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or decoded
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    /// Number of rows held for a table
    #[must_use]
    pub fn row_count(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, Vec::len)
    }
}

#[async_trait]
impl ObservationStore for InMemoryStore {
    async fn query(&self, query: &StoreQuery) -> Result<Vec<ObservationRow>, StoreError> {
        if self.failing.contains(&query.table) {
            return Err(StoreError::Unavailable(format!("table {} is offline", query.table)));
        }
        let Some(rows) = self.tables.get(&query.table) else {
            tracing::debug!(table = %query.table, "no fixture rows for table");
            return Ok(Vec::new());
        };

        let mut out: Vec<ObservationRow> = rows
            .iter()
            .filter(|row| query.filters.iter().all(|f| matches(row, f)))
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            query
                .order_by
                .iter()
                .map(|col| compare_column(a.column(col), b.column(col)))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        });
        Ok(out)
    }
}

fn matches(row: &ObservationRow, filter: &Filter) -> bool {
    let value = row.column(filter.column());
    match filter {
        Filter::In { values, .. } => value.is_some_and(|v| {
            let rendered = v.render();
            values.iter().any(|candidate| *candidate == rendered)
        }),
        Filter::Gte { value: bound, .. } => {
            compare_bound(value, bound).is_some_and(Ordering::is_ge)
        }
        Filter::Lte { value: bound, .. } => {
            compare_bound(value, bound).is_some_and(Ordering::is_le)
        }
    }
}

fn compare_bound(value: Option<ColumnValue<'_>>, bound: &str) -> Option<Ordering> {
    match value? {
        ColumnValue::Number(n) => n.partial_cmp(&bound.trim().parse::<f64>().ok()?),
        ColumnValue::Text(s) => Some(s.cmp(bound)),
    }
}

fn compare_column(a: Option<ColumnValue<'_>>, b: Option<ColumnValue<'_>>) -> Ordering {
    match (a, b) {
        (Some(ColumnValue::Number(x)), Some(ColumnValue::Number(y))) => {
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(ColumnValue::Text(x)), Some(ColumnValue::Text(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.render().cmp(&y.render()),
        // nulls last
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riq_catalog::DataType;

    fn row(region: &str, metric: &str, period: i32, data_type: DataType) -> ObservationRow {
        ObservationRow::new(region, metric, period, f64::from(period), data_type)
    }

    fn store() -> InMemoryStore {
        InMemoryStore::new().with_rows(
            "itl1_latest_all",
            [
                row("E12000007", "population_total", 2025, DataType::Forecast),
                row("E12000007", "population_total", 2023, DataType::Historical),
                row("E12000001", "population_total", 2023, DataType::Historical),
                row("E12000007", "emp_total_jobs", 2023, DataType::Historical),
            ],
        )
    }

    #[tokio::test]
    async fn filters_and_orders() {
        let query = StoreQuery::new("itl1_latest_all")
            .with_filter(Filter::is_in("region_code", ["E12000007"]))
            .with_filter(Filter::is_in("metric_id", ["population_total"]))
            .with_filter(Filter::gte("period", 2020))
            .with_filter(Filter::lte("period", 2030));
        let rows = store().query(&query).await.unwrap();
        let periods: Vec<i32> = rows.iter().map(|r| r.period).collect();
        assert_eq!(periods, vec![2023, 2025]);
    }

    #[tokio::test]
    async fn data_type_and_period_in() {
        let query = StoreQuery::new("itl1_latest_all")
            .with_filter(Filter::is_in("period", ["2023"]))
            .with_filter(Filter::is_in("data_type", ["historical"]));
        let rows = store().query(&query).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].metric_id, "emp_total_jobs");
        assert_eq!(rows[1].region_code, "E12000001");
    }

    #[tokio::test]
    async fn unknown_table_is_empty_and_failing_table_errors() {
        let store = store().failing("lad_latest_all");
        assert!(store.query(&StoreQuery::new("itl2_latest_all")).await.unwrap().is_empty());
        assert!(matches!(
            store.query(&StoreQuery::new("lad_latest_all")).await,
            Err(StoreError::Unavailable(_))
        ));
    }

    #[test]
    fn load_fixture_json() {
        let store = InMemoryStore::from_json_str(
            r#"{"uk_latest_all": [{"region_code": "K02000001", "metric_id": "uk_population_total",
                "period": 2024, "value": 68000000, "data_type": "historical"}]}"#,
        )
        .unwrap();
        assert_eq!(store.row_count("uk_latest_all"), 1);
        assert!(InMemoryStore::from_json_str("[]").is_err());
    }
}
