//! Canonical row builder
//!
//! The only place [`CanonicalRow`]s are constructed. Each fetched observation
//! is translated back to public form (level prefix and jobs remap undone),
//! filtered by the jobs keep rule, then emitted once per requested scenario
//! with the value chosen by the scenario's measure.

use crate::config::EngineConfig;
use crate::router::{FetchedLevel, LevelRouter};
use riq_catalog::ReferenceData;
use riq_query::{choose_measure, pick_value, Measure, Scenario};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Normalised, display-labelled output record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRow {
    /// Metric display label
    #[serde(rename = "Metric")]
    pub metric: String,
    /// Region display label
    #[serde(rename = "Region")]
    pub region: String,
    /// Public region code
    #[serde(rename = "Region Code")]
    pub region_code: String,
    /// Year
    #[serde(rename = "Year")]
    pub year: i32,
    /// Scenario label
    #[serde(rename = "Scenario")]
    pub scenario: String,
    /// Value under the scenario's measure
    #[serde(rename = "Value")]
    pub value: Option<f64>,
    /// Unit label
    #[serde(rename = "Units")]
    pub units: String,
    /// Data-type label
    #[serde(rename = "Data Type")]
    pub data_type: String,
    /// Attribution
    #[serde(rename = "Source")]
    pub source: String,
}

impl CanonicalRow {
    /// Column names in serialisation order
    pub const COLUMNS: [&'static str; 9] = [
        "Metric",
        "Region",
        "Region Code",
        "Year",
        "Scenario",
        "Value",
        "Units",
        "Data Type",
        "Source",
    ];
}

/// Rows produced for one call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuiltRows {
    /// Canonical rows in emission order
    pub rows: Vec<CanonicalRow>,
    /// Whether the record cap cut the result short
    pub truncated: bool,
    /// Observations rejected as duplicate keys
    pub duplicates: usize,
}

/// Builds canonical rows from level reads
#[derive(Debug)]
pub struct RowBuilder<'a> {
    reference: &'a ReferenceData,
    router: LevelRouter<'a>,
    scenarios: &'a [Scenario],
    measure: Option<Measure>,
    max_records: usize,
    seen: HashSet<(String, String, i32, Scenario)>,
    out: BuiltRows,
}

impl<'a> RowBuilder<'a> {
    /// Create builder
    #[must_use]
    pub fn new(
        reference: &'a ReferenceData,
        config: &'a EngineConfig,
        router: LevelRouter<'a>,
        scenarios: &'a [Scenario],
        measure: Option<Measure>,
    ) -> Self {
        Self {
            reference,
            router,
            scenarios,
            measure,
            max_records: config.max_records,
            seen: HashSet::new(),
            out: BuiltRows::default(),
        }
    }

    /// Emit rows for one level read
    pub fn push_level(&mut self, fetched: &FetchedLevel) {
        let fetch = &fetched.fetch;
        let regions = self.reference.regions();
        let labels = self.reference.labels();

        for row in &fetched.rows {
            if self.out.truncated {
                return;
            }
            let metric_id = self.router.public_metric_id(fetch.level, &row.metric_id);
            if !fetch.reads_metric(metric_id) {
                tracing::trace!(metric = %row.metric_id, "unrequested metric skipped");
                continue;
            }
            let Some(metric) = self.reference.metrics().display_metric(metric_id) else {
                continue;
            };
            let Some(code) = fetch.remapper.output_code_for(metric_id, &row.region_code, regions) else {
                tracing::trace!(region = %row.region_code, "unknown storage code skipped");
                continue;
            };
            if !fetch.requested(&code) || !fetch.remapper.keep(metric_id, &code) {
                continue;
            }
            let Some(region) = regions.by_code(&code) else {
                continue;
            };

            let unit = row.unit.as_deref().unwrap_or(&metric.unit);
            for &scenario in self.scenarios {
                let key = (metric.id.clone(), code.clone(), row.period, scenario);
                if self.seen.contains(&key) {
                    self.out.duplicates += 1;
                    tracing::warn!(
                        metric = %metric.id,
                        region = %code,
                        year = row.period,
                        %scenario,
                        "duplicate observation dropped"
                    );
                    continue;
                }
                if self.out.rows.len() >= self.max_records {
                    self.out.truncated = true;
                    tracing::warn!(cap = self.max_records, "record cap reached");
                    return;
                }
                self.seen.insert(key);
                let measure = choose_measure(scenario, self.measure);
                self.out.rows.push(CanonicalRow {
                    metric: metric.name.clone(),
                    region: region.name.clone(),
                    region_code: code.clone(),
                    year: row.period,
                    scenario: scenario.label().to_string(),
                    value: pick_value(row, measure),
                    units: labels.unit_label(unit),
                    data_type: labels.data_type_label(row.data_type),
                    source: labels.source_label(row.data_type),
                });
            }
        }
    }

    /// Finish building
    #[must_use]
    pub fn finish(self) -> BuiltRows {
        self.out
    }
}

/// Build canonical rows from all level reads
#[must_use]
pub fn build_rows(
    reference: &ReferenceData,
    config: &EngineConfig,
    router: LevelRouter<'_>,
    scenarios: &[Scenario],
    measure: Option<Measure>,
    fetched: &[FetchedLevel],
) -> BuiltRows {
    let mut builder = RowBuilder::new(reference, config, router, scenarios, measure);
    for level in fetched {
        builder.push_level(level);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ResolvedRequest;
    use riq_catalog::DataType;
    use riq_query::{Dimension, JobsRule, ObservationRow, QuerySpec, Selection};

    fn build(spec: &QuerySpec, rows: Vec<ObservationRow>, config: &EngineConfig) -> BuiltRows {
        let reference = ReferenceData::builtin().unwrap();
        let rule = JobsRule::for_reference(&reference);
        let request = ResolvedRequest::resolve(spec, &reference, config).unwrap();
        let router = LevelRouter::new(&reference, config, &rule);
        let fetched: Vec<FetchedLevel> = router
            .plan(&request)
            .into_iter()
            .map(|fetch| {
                let rows = rows.iter().filter(|r| fetch.query.in_values("region_code").unwrap().contains(&r.region_code)).cloned().collect();
                FetchedLevel { fetch, rows }
            })
            .collect();
        build_rows(&reference, config, router, &request.scenarios, request.measure, &fetched)
    }

    #[test]
    fn jobs_two_rows_not_four() {
        let spec = QuerySpec::new()
            .with(Dimension::Metric, Selection::items(["emp_total_jobs"]))
            .with(Dimension::Region, Selection::items(["UKN", "UKI"]))
            .with(Dimension::Year, Selection::items(["2024"]));
        let rows = vec![
            ObservationRow::new("K02000001", "emp_total_jobs", 2024, 33_000_000.0, DataType::Historical),
            ObservationRow::new("K02000001", "emp_total_jobs_ni", 2024, 950_000.0, DataType::Historical),
            ObservationRow::new("E12000007", "emp_total_jobs", 2024, 6_200_000.0, DataType::Historical),
            ObservationRow::new("E12000007", "emp_total_jobs_ni", 2024, 1.0, DataType::Historical),
        ];
        let built = build(&spec, rows, &EngineConfig::default());

        assert_eq!(built.rows.len(), 2);
        let ni = built.rows.iter().find(|r| r.region_code == "UKN").unwrap();
        assert_eq!(ni.value, Some(950_000.0));
        assert_eq!(ni.metric, "Total Employment");
        let london = built.rows.iter().find(|r| r.region_code == "UKI").unwrap();
        assert_eq!(london.value, Some(6_200_000.0));
    }

    #[test]
    fn national_rows_unprefixed_and_labelled() {
        let spec = QuerySpec::new()
            .with(Dimension::Metric, Selection::items(["emp_total_jobs"]))
            .with(Dimension::Region, Selection::items(["UK"]));
        let rows = vec![
            ObservationRow::new("K02000001", "uk_emp_total_jobs", 2024, 33_000_000.0, DataType::Historical)
                .with_unit("jobs"),
        ];
        let built = build(&spec, rows, &EngineConfig::default());
        assert_eq!(built.rows.len(), 1);
        assert_eq!(built.rows[0].region, "United Kingdom");
        assert_eq!(built.rows[0].units, "Jobs");
        assert_eq!(built.rows[0].source, "ONS");
    }

    #[test]
    fn scenarios_fan_out_with_historical_override() {
        let spec = QuerySpec::new()
            .with(Dimension::Metric, Selection::items(["population_total"]))
            .with(Dimension::Region, Selection::items(["UKI"]))
            .with(Dimension::Scenario, Selection::all());
        let rows = vec![
            ObservationRow::new("E12000007", "population_total", 2024, 9.0, DataType::Historical)
                .with_bounds(8.0, 10.0),
            ObservationRow::new("E12000007", "population_total", 2030, 10.0, DataType::Forecast)
                .with_bounds(9.0, 11.0),
        ];
        let built = build(&spec, rows, &EngineConfig::default());
        assert_eq!(built.rows.len(), 6);

        let values = |year: i32| -> Vec<Option<f64>> {
            built.rows.iter().filter(|r| r.year == year).map(|r| r.value).collect()
        };
        assert_eq!(values(2024), vec![Some(9.0); 3]);
        assert_eq!(values(2030), vec![Some(10.0), Some(11.0), Some(9.0)]);
        assert_eq!(built.rows[5].data_type, "Forecast");
        assert_eq!(built.rows[5].scenario, "Downside");
    }

    #[test]
    fn record_cap_truncates() {
        let spec = QuerySpec::new()
            .with(Dimension::Metric, Selection::items(["population_total"]))
            .with(Dimension::Region, Selection::items(["UKI"]));
        let rows = (2000..2010)
            .map(|y| ObservationRow::new("E12000007", "population_total", y, 1.0, DataType::Historical))
            .collect();
        let built = build(&spec, rows, &EngineConfig::default().with_max_records(4));
        assert_eq!(built.rows.len(), 4);
        assert!(built.truncated);
    }

    #[test]
    fn duplicate_at_cap_does_not_truncate() {
        let spec = QuerySpec::new()
            .with(Dimension::Metric, Selection::items(["population_total"]))
            .with(Dimension::Region, Selection::items(["UKI"]));
        let row = ObservationRow::new("E12000007", "population_total", 2024, 1.0, DataType::Historical);
        let built = build(&spec, vec![row.clone(), row], &EngineConfig::default().with_max_records(1));
        assert_eq!(built.rows.len(), 1);
        assert_eq!(built.duplicates, 1);
        assert!(!built.truncated);
    }

    #[test]
    fn duplicate_observations_dropped() {
        let spec = QuerySpec::new()
            .with(Dimension::Metric, Selection::items(["population_total"]))
            .with(Dimension::Region, Selection::items(["UKI"]));
        let row = ObservationRow::new("E12000007", "population_total", 2024, 1.0, DataType::Historical);
        let built = build(&spec, vec![row.clone(), row], &EngineConfig::default());
        assert_eq!(built.rows.len(), 1);
        assert_eq!(built.duplicates, 1);
    }

    #[test]
    fn canonical_json_shape() {
        let row = CanonicalRow {
            metric: "Total Population".into(),
            region: "London".into(),
            region_code: "UKI".into(),
            year: 2024,
            scenario: "Baseline".into(),
            value: None,
            units: "People".into(),
            data_type: "Historical".into(),
            source: "ONS".into(),
        };
        let json = serde_json::to_value(&row).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        let mut expected = CanonicalRow::COLUMNS.to_vec();
        expected.sort_unstable();
        let mut keys = keys;
        keys.sort_unstable();
        assert_eq!(keys, expected);
        assert!(json["Value"].is_null());
    }
}
