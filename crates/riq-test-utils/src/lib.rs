//! Testing utilities for the RegionIQ workspace
//!
//! Shared reference data, fixture stores and request-body builders.

#![allow(missing_docs)]

use async_trait::async_trait;
use riq_catalog::{DataType, ReferenceData};
use riq_engine::{Engine, EngineConfig, InMemoryStore, ObservationStore, StoreError, StoreQuery};
use riq_query::ObservationRow;
use serde_json::{json, Value};
use std::sync::Arc;

pub const ITL1_TABLE: &str = "itl1_latest_all";
pub const UK_TABLE: &str = "uk_latest_all";
pub const LONDON_DB: &str = "E12000007";
pub const NATIONAL_DB: &str = "K02000001";

pub fn reference_data() -> Arc<ReferenceData> {
    Arc::new(ReferenceData::builtin().unwrap())
}

pub fn engine_with(store: impl ObservationStore + 'static) -> Engine {
    Engine::new(reference_data(), Arc::new(store), EngineConfig::default())
}

pub fn engine_with_config(store: impl ObservationStore + 'static, config: EngineConfig) -> Engine {
    Engine::new(reference_data(), Arc::new(store), config)
}

/// London population: 2023-2024 historical, 2030 forecast with bounds
pub fn london_population_rows() -> Vec<ObservationRow> {
    vec![
        ObservationRow::new(LONDON_DB, "population_total", 2023, 8_945_309.0, DataType::Historical)
            .with_bounds(8_900_000.0, 9_000_000.0)
            .with_unit("people"),
        ObservationRow::new(LONDON_DB, "population_total", 2024, 9_089_736.0, DataType::Historical)
            .with_unit("people"),
        ObservationRow::new(LONDON_DB, "population_total", 2030, 9_600_000.0, DataType::Forecast)
            .with_bounds(9_350_000.0, 9_850_000.0)
            .with_unit("people"),
    ]
}

pub fn london_population_store() -> InMemoryStore {
    InMemoryStore::new().with_rows(ITL1_TABLE, london_population_rows())
}

/// Jobs at ITL1 with the Northern Ireland series filed under the national code
pub fn jobs_rows() -> Vec<ObservationRow> {
    vec![
        ObservationRow::new(NATIONAL_DB, "emp_total_jobs", 2024, 33_000_000.0, DataType::Historical),
        ObservationRow::new(NATIONAL_DB, "emp_total_jobs_ni", 2024, 950_000.0, DataType::Historical),
        ObservationRow::new(LONDON_DB, "emp_total_jobs", 2024, 6_200_000.0, DataType::Historical),
        ObservationRow::new(LONDON_DB, "emp_total_jobs_ni", 2024, 1.0, DataType::Historical),
    ]
}

pub fn jobs_store() -> InMemoryStore {
    InMemoryStore::new()
        .with_rows(ITL1_TABLE, jobs_rows())
        .with_rows(
            UK_TABLE,
            [ObservationRow::new(NATIONAL_DB, "uk_emp_total_jobs", 2024, 33_500_000.0, DataType::Historical)],
        )
}

/// One population row per ITL1 region for `year`
pub fn itl1_population_store(year: i32) -> InMemoryStore {
    let reference = reference_data();
    let rows: Vec<ObservationRow> = reference
        .regions()
        .regions_at_level(riq_catalog::Level::Itl1)
        .into_iter()
        .enumerate()
        .map(|(i, region)| {
            ObservationRow::new(
                region.db_code.clone(),
                "population_total",
                year,
                1_000_000.0 + i as f64,
                DataType::Historical,
            )
        })
        .collect();
    InMemoryStore::new().with_rows(ITL1_TABLE, rows)
}

pub fn request(metrics: &[&str], regions: &[&str], years: &[i32]) -> Value {
    json!({
        "metrics": metrics,
        "regions": regions,
        "selectedYears": years,
    })
}

pub fn request_with_scenarios(metrics: &[&str], regions: &[&str], years: &[i32], scenarios: &[&str]) -> Value {
    let mut body = request(metrics, regions, years);
    body["scenarios"] = json!(scenarios);
    body
}

/// Store that fails any read whose region filter names `failing_code`
#[derive(Debug, Clone)]
pub struct FlakyStore {
    inner: InMemoryStore,
    failing_code: String,
}

impl FlakyStore {
    pub fn new(inner: InMemoryStore, failing_code: impl Into<String>) -> Self {
        Self {
            inner,
            failing_code: failing_code.into(),
        }
    }
}

#[async_trait]
impl ObservationStore for FlakyStore {
    async fn query(&self, query: &StoreQuery) -> Result<Vec<ObservationRow>, StoreError> {
        let hit = query
            .in_values("region_code")
            .is_some_and(|codes| codes.iter().any(|c| *c == self.failing_code));
        if hit {
            return Err(StoreError::Unavailable(format!("{} timed out", self.failing_code)));
        }
        self.inner.query(query).await
    }
}
