//! Request resolution
//!
//! Turns a [`QuerySpec`] into concrete, validated lists: which public metric
//! ids, which public region codes, which years. Unknown ids are rejected
//! here; caps are applied here and reported as warnings.

use crate::config::EngineConfig;
use crate::error::{EngineError, ValidationError};
use riq_catalog::{DataType, Level, ReferenceData};
use riq_query::{Dimension, Measure, QuerySpec, Resolved, Scenario, Selection};
use std::collections::HashSet;

/// Year restriction sent to storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YearFilter {
    /// Explicit years, ascending
    Years(Vec<i32>),
    /// Inclusive span
    Between(i32, i32),
}

impl YearFilter {
    /// Resolve a year selection, defaulting to the configured span
    #[must_use]
    pub fn from_resolved(years: Resolved<i32>, config: &EngineConfig) -> Self {
        match years {
            Resolved::Items(years) => Self::Years(years),
            Resolved::Range(range) => {
                let (lo, hi) = range.year_bounds();
                Self::Between(lo, hi)
            }
            Resolved::All => Self::Between(config.min_year, config.max_year),
        }
    }

    /// Number of years covered
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Years(years) => years.len(),
            Self::Between(lo, hi) if lo <= hi => {
                usize::try_from(i64::from(*hi) - i64::from(*lo) + 1).unwrap_or(usize::MAX)
            }
            Self::Between(..) => 0,
        }
    }

    /// Whether no year can match
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Validated request
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest {
    /// Public metric ids, request order, capped
    pub metric_ids: Vec<String>,
    /// Public region codes, request order, capped
    pub region_codes: Vec<String>,
    /// Year restriction
    pub years: YearFilter,
    /// Scenarios to emit, in request order
    pub scenarios: Vec<Scenario>,
    /// Explicit measure override
    pub measure: Option<Measure>,
    /// Data-type restriction
    pub data_types: Option<Vec<DataType>>,
    /// Non-fatal notes for the caller
    pub warnings: Vec<String>,
}

impl ResolvedRequest {
    /// Resolve and validate a spec against reference data
    ///
    /// # Errors
    /// Unknown metric ids or region codes, range selections on id
    /// dimensions, and unparseable scenario/measure/level/data-type values
    pub fn resolve(
        spec: &QuerySpec,
        reference: &ReferenceData,
        config: &EngineConfig,
    ) -> Result<Self, EngineError> {
        let scenarios = spec.scenarios()?;
        let measure = spec.measure_override()?;
        let data_types = spec.data_types()?;
        let levels = spec.levels()?;
        let mut warnings = Vec::new();

        for dimension in [Dimension::Metric, Dimension::Region] {
            if matches!(spec.get(dimension), Some(Selection::Range { .. })) {
                return Err(unsupported(spec, dimension));
            }
        }

        let mut metric_ids = match spec.metric_ids() {
            Resolved::Items(ids) => {
                let ids = dedup(ids);
                if let Some(unknown) = ids.iter().find(|id| reference.metrics().public_by_id(id).is_none()) {
                    return Err(ValidationError::UnknownMetric(unknown.clone()).into());
                }
                ids
            }
            Resolved::All => reference.metrics().public().map(|m| m.id.clone()).collect(),
            Resolved::Range(_) => return Err(unsupported(spec, Dimension::Metric)),
        };

        let mut region_codes = match spec.region_codes() {
            Resolved::Items(codes) => {
                let codes = dedup(codes);
                if let Some(unknown) = codes.iter().find(|c| reference.regions().by_code(c).is_none()) {
                    return Err(ValidationError::UnknownRegion(unknown.clone()).into());
                }
                match &levels {
                    Some(levels) => {
                        let before = codes.len();
                        let kept: Vec<String> = codes
                            .into_iter()
                            .filter(|c| {
                                reference
                                    .regions()
                                    .by_code(c)
                                    .is_some_and(|r| levels.contains(&r.level))
                            })
                            .collect();
                        if kept.len() < before {
                            warnings.push(format!(
                                "{} region(s) outside the requested levels were ignored",
                                before - kept.len()
                            ));
                        }
                        kept
                    }
                    None => codes,
                }
            }
            Resolved::All => {
                let levels = levels.unwrap_or_else(|| Level::ALL.to_vec());
                levels
                    .iter()
                    .flat_map(|level| reference.regions().regions_at_level(*level))
                    .map(|r| r.code.clone())
                    .collect()
            }
            Resolved::Range(_) => return Err(unsupported(spec, Dimension::Region)),
        };

        if metric_ids.len() > config.max_metrics {
            warnings.push(format!(
                "metric selection truncated from {} to {} ids",
                metric_ids.len(),
                config.max_metrics
            ));
            tracing::warn!(requested = metric_ids.len(), cap = config.max_metrics, "metric ids truncated");
            metric_ids.truncate(config.max_metrics);
        }
        if region_codes.len() > config.max_regions {
            warnings.push(format!(
                "region selection truncated from {} to {} codes",
                region_codes.len(),
                config.max_regions
            ));
            tracing::warn!(requested = region_codes.len(), cap = config.max_regions, "region codes truncated");
            region_codes.truncate(config.max_regions);
        }

        Ok(Self {
            metric_ids,
            region_codes,
            years: YearFilter::from_resolved(spec.years(), config),
            scenarios,
            measure,
            data_types,
            warnings,
        })
    }

    /// One metric and one region: eligible for the single-series export
    #[must_use]
    pub fn is_single_series(&self) -> bool {
        self.metric_ids.len() == 1 && self.region_codes.len() == 1
    }
}

/// Estimated canonical row count for a spec, before validation
///
/// Unbounded dimensions count at catalog size or the configured year span.
#[must_use]
pub fn estimate_records(spec: &QuerySpec, reference: &ReferenceData, config: &EngineConfig) -> u64 {
    let metrics = match spec.metric_ids() {
        Resolved::Items(ids) => ids.len(),
        _ => reference.metrics().public().count(),
    };
    let regions = match (spec.region_codes(), spec.levels()) {
        (Resolved::Items(codes), _) => codes.len(),
        (_, Ok(Some(levels))) => levels
            .iter()
            .map(|l| reference.regions().regions_at_level(*l).len())
            .sum(),
        _ => reference.regions().len(),
    };
    let years = YearFilter::from_resolved(spec.years(), config).len();
    let scenarios = spec.scenarios().map_or(1, |s| s.len());

    [metrics, regions, years, scenarios]
        .into_iter()
        .map(|n| u64::try_from(n.max(1)).unwrap_or(u64::MAX))
        .fold(1u64, u64::saturating_mul)
}

fn dedup(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(values.len());
    values.into_iter().filter(|v| seen.insert(v.clone())).collect()
}

fn unsupported(spec: &QuerySpec, dimension: Dimension) -> EngineError {
    let filter = match spec.get(dimension) {
        Some(Selection::Range { .. }) => "range",
        Some(Selection::Item { .. }) => "item",
        Some(Selection::All) | None => "all",
    };
    ValidationError::UnsupportedSelection {
        dimension,
        filter: filter.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reference() -> ReferenceData {
        ReferenceData::builtin().unwrap()
    }

    fn spec(metrics: &[&str], regions: &[&str]) -> QuerySpec {
        QuerySpec::new()
            .with(Dimension::Metric, Selection::items(metrics.iter().copied()))
            .with(Dimension::Region, Selection::items(regions.iter().copied()))
    }

    #[test]
    fn resolves_explicit_lists() {
        let spec = spec(&["population_total", "population_total"], &["UKI", "TLI3", "UKI"])
            .with(Dimension::Year, Selection::items(["2024", "2023"]));
        let request = ResolvedRequest::resolve(&spec, &reference(), &EngineConfig::default()).unwrap();

        assert_eq!(request.metric_ids, vec!["population_total"]);
        assert_eq!(request.region_codes, vec!["UKI", "TLI3"]);
        assert_eq!(request.years, YearFilter::Years(vec![2023, 2024]));
        assert_eq!(request.scenarios, vec![Scenario::Baseline]);
        assert!(request.warnings.is_empty());
        assert!(!request.is_single_series());
    }

    #[test]
    fn unknown_ids_are_named() {
        let err = ResolvedRequest::resolve(
            &spec(&["population_total", "gdp_magic"], &["UKI"]),
            &reference(),
            &EngineConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_METRIC");
        assert!(err.to_string().contains("gdp_magic"));

        let err = ResolvedRequest::resolve(
            &spec(&["population_total"], &["UKI", "XX9"]),
            &reference(),
            &EngineConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_REGION");

        // companions are storage details, not requestable
        let err = ResolvedRequest::resolve(
            &spec(&["emp_total_jobs_ni"], &["UKN"]),
            &reference(),
            &EngineConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_METRIC");
    }

    #[test]
    fn range_on_ids_is_rejected() {
        let spec = QuerySpec::new().with(Dimension::Region, Selection::range(1, 5));
        let err = ResolvedRequest::resolve(&spec, &reference(), &EngineConfig::default()).unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(err.code(), "VALIDATION_ERROR");

        // non-numeric bounds must not widen to every metric
        let spec = QuerySpec::new().with(Dimension::Metric, Selection::range("a", "b"));
        let err = ResolvedRequest::resolve(&spec, &reference(), &EngineConfig::default()).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn range_on_scenario_is_rejected() {
        let spec = spec(&["population_total"], &["UKI"]).with(Dimension::Scenario, Selection::range(1, 3));
        let err = ResolvedRequest::resolve(&spec, &reference(), &EngineConfig::default()).unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(err.details()["dimension"], "scenario");
    }

    #[test]
    fn empty_region_list_resolves_to_nothing() {
        let spec = spec(&["population_total"], &[]);
        let request = ResolvedRequest::resolve(&spec, &reference(), &EngineConfig::default()).unwrap();
        assert!(request.region_codes.is_empty());
        assert_eq!(request.metric_ids, vec!["population_total"]);
    }

    #[test]
    fn all_enumerates_and_caps_with_warning() {
        let spec = QuerySpec::new()
            .with(Dimension::Metric, Selection::all())
            .with(Dimension::Region, Selection::all())
            .with(Dimension::Level, Selection::items(["ITL1"]));
        let config = EngineConfig::default().with_max_regions(5).with_max_metrics(2);
        let request = ResolvedRequest::resolve(&spec, &reference(), &config).unwrap();

        assert_eq!(request.region_codes, vec!["UKC", "UKD", "UKE", "UKF", "UKG"]);
        assert_eq!(request.metric_ids, vec!["population_total", "nominal_gva_mn_gbp"]);
        assert_eq!(request.warnings.len(), 2);
        assert_eq!(request.years, YearFilter::Between(1991, 2050));
    }

    #[test]
    fn level_filter_drops_explicit_regions() {
        let spec = spec(&["population_total"], &["UKI", "TLI3"])
            .with(Dimension::Level, Selection::items(["itl2"]));
        let request = ResolvedRequest::resolve(&spec, &reference(), &EngineConfig::default()).unwrap();
        assert_eq!(request.region_codes, vec!["TLI3"]);
        assert!(request.is_single_series());
        assert_eq!(request.warnings.len(), 1);
    }

    #[test]
    fn estimates() {
        let config = EngineConfig::default();
        let data = reference();
        let spec = spec(&["population_total"], &["UKI"])
            .with(Dimension::Year, Selection::range(2020, 2024))
            .with(Dimension::Scenario, Selection::all());
        assert_eq!(estimate_records(&spec, &data, &config), 15);

        let unbounded = QuerySpec::new();
        let expected = 4 * data.regions().len() as u64 * 60;
        assert_eq!(estimate_records(&unbounded, &data, &config), expected);
    }
}
