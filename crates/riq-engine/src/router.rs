//! Level router and fetcher
//!
//! Requested regions are bucketed by geography level. Each non-empty level
//! becomes one bounded read against that level's table:
//! - national reads prefix every metric id with the configured prefix
//! - the jobs companion is added only where its jurisdiction is requested
//! - storage codes come from the level's own [`JobsRemapper`]
//!
//! Level reads run concurrently and are joined before any row is built. One
//! failed read fails the call; no partial result is returned.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::request::{ResolvedRequest, YearFilter};
use crate::store::{Filter, ObservationStore, StoreQuery};
use futures::future::try_join_all;
use riq_catalog::{Level, ReferenceData, Region};
use riq_query::{JobsRemapper, JobsRule, ObservationRow};

/// One planned level read
#[derive(Debug, Clone)]
pub struct LevelFetch {
    /// Geography level
    pub level: Level,
    /// Table read
    pub table: String,
    /// Public regions requested at this level
    pub regions: Vec<Region>,
    /// Unprefixed metric ids read at this level
    pub metric_ids: Vec<String>,
    /// Remapper holding this level's translated codes
    pub remapper: JobsRemapper,
    /// Storage query
    pub query: StoreQuery,
}

impl LevelFetch {
    /// Whether `code` was requested at this level
    #[must_use]
    pub fn requested(&self, code: &str) -> bool {
        self.regions.iter().any(|r| r.code == code)
    }

    /// Whether `metric_id` (unprefixed) was read at this level
    #[must_use]
    pub fn reads_metric(&self, metric_id: &str) -> bool {
        self.metric_ids.iter().any(|m| m == metric_id)
    }
}

/// A completed level read
#[derive(Debug, Clone)]
pub struct FetchedLevel {
    /// The plan that was executed
    pub fetch: LevelFetch,
    /// Rows returned, in storage order
    pub rows: Vec<ObservationRow>,
}

/// Plans level reads
#[derive(Debug, Clone, Copy)]
pub struct LevelRouter<'a> {
    reference: &'a ReferenceData,
    config: &'a EngineConfig,
    rule: &'a JobsRule,
}

impl<'a> LevelRouter<'a> {
    /// Create router
    #[must_use]
    pub fn new(reference: &'a ReferenceData, config: &'a EngineConfig, rule: &'a JobsRule) -> Self {
        Self {
            reference,
            config,
            rule,
        }
    }

    /// Table holding a level
    #[inline]
    #[must_use]
    pub fn table_for(&self, level: Level) -> &'a str {
        self.config.tables.table_for(level)
    }

    /// Stored metric ids for a level
    #[must_use]
    pub fn metric_ids_for(&self, level: Level, ids: &[String]) -> Vec<String> {
        if level.is_national() {
            ids.iter()
                .map(|id| format!("{}{id}", self.config.uk_metric_prefix))
                .collect()
        } else {
            ids.to_vec()
        }
    }

    /// Unprefixed metric id for a stored id read at `level`
    #[must_use]
    pub fn public_metric_id<'s>(&self, level: Level, stored: &'s str) -> &'s str {
        if level.is_national() {
            stored
                .strip_prefix(self.config.uk_metric_prefix.as_str())
                .unwrap_or(stored)
        } else {
            stored
        }
    }

    /// Plan one read per non-empty level
    #[must_use]
    pub fn plan(&self, request: &ResolvedRequest) -> Vec<LevelFetch> {
        if request.metric_ids.is_empty() || request.years.is_empty() {
            return Vec::new();
        }
        let partition = self.reference.regions().partition_by_level(&request.region_codes);

        partition
            .by_level
            .into_iter()
            .map(|(level, regions)| self.plan_level(level, &regions, request))
            .collect()
    }

    fn plan_level(&self, level: Level, regions: &[&Region], request: &ResolvedRequest) -> LevelFetch {
        let metric_ids = if regions.iter().any(|r| self.rule.is_jurisdiction(&r.code)) {
            self.rule.expand_metric_ids(&request.metric_ids)
        } else {
            request.metric_ids.clone()
        };

        let mut remapper = JobsRemapper::new(self.rule.clone());
        let mut db_codes: Vec<String> = Vec::with_capacity(regions.len());
        for region in regions {
            for metric_id in &metric_ids {
                let code = remapper.query_code_for(metric_id, region);
                if !db_codes.contains(&code) {
                    db_codes.push(code);
                }
            }
        }

        let table = self.table_for(level).to_string();
        let mut query = StoreQuery::new(table.clone())
            .with_filter(Filter::is_in("region_code", db_codes))
            .with_filter(Filter::is_in("metric_id", self.metric_ids_for(level, &metric_ids)));
        query = match &request.years {
            YearFilter::Years(years) => {
                query.with_filter(Filter::is_in("period", years.iter().map(ToString::to_string)))
            }
            YearFilter::Between(lo, hi) => query
                .with_filter(Filter::gte("period", lo))
                .with_filter(Filter::lte("period", hi)),
        };
        if let Some(data_types) = &request.data_types {
            query = query.with_filter(Filter::is_in(
                "data_type",
                data_types.iter().map(|d| d.as_str()),
            ));
        }

        LevelFetch {
            level,
            table,
            regions: regions.iter().map(|r| (*r).clone()).collect(),
            metric_ids,
            remapper,
            query,
        }
    }
}

/// Execute level reads concurrently
///
/// # Errors
/// The first failing read, as [`EngineError::UpstreamFetch`] naming its table
pub async fn fetch_all(
    store: &dyn ObservationStore,
    fetches: Vec<LevelFetch>,
) -> Result<Vec<FetchedLevel>, EngineError> {
    let reads = fetches.into_iter().map(|fetch| async move {
        let rows = store
            .query(&fetch.query)
            .await
            .map_err(|e| EngineError::upstream(fetch.table.as_str(), e))?;
        tracing::debug!(level = %fetch.level, table = %fetch.table, rows = rows.len(), "level fetched");
        Ok::<_, EngineError>(FetchedLevel { fetch, rows })
    });
    try_join_all(reads).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use riq_query::{Dimension, QuerySpec, Selection};

    fn plan_for(spec: &QuerySpec) -> Vec<LevelFetch> {
        let reference = ReferenceData::builtin().unwrap();
        let config = EngineConfig::default();
        let rule = JobsRule::for_reference(&reference);
        let request = ResolvedRequest::resolve(spec, &reference, &config).unwrap();
        LevelRouter::new(&reference, &config, &rule).plan(&request)
    }

    #[test]
    fn one_read_per_level() {
        let spec = QuerySpec::new()
            .with(Dimension::Metric, Selection::items(["population_total"]))
            .with(Dimension::Region, Selection::items(["TLI3", "UK", "UKI", "E09000001"]));
        let plan = plan_for(&spec);

        let levels: Vec<Level> = plan.iter().map(|f| f.level).collect();
        assert_eq!(levels, vec![Level::Uk, Level::Itl1, Level::Itl2, Level::Lad]);

        let national = &plan[0];
        assert_eq!(national.table, "uk_latest_all");
        assert_eq!(national.query.in_values("metric_id"), Some(&["uk_population_total".to_string()][..]));
        assert_eq!(national.query.in_values("region_code"), Some(&["K02000001".to_string()][..]));

        let itl1 = &plan[1];
        assert_eq!(itl1.query.in_values("region_code"), Some(&["E12000007".to_string()][..]));
        assert!(itl1.query.filters.contains(&Filter::gte("period", 1991)));
        assert!(itl1.query.filters.contains(&Filter::lte("period", 2050)));
    }

    #[test]
    fn jobs_companion_only_where_needed() {
        let spec = QuerySpec::new()
            .with(Dimension::Metric, Selection::items(["emp_total_jobs", "population_total"]))
            .with(Dimension::Region, Selection::items(["UKN", "UKI", "TLI3"]))
            .with(Dimension::Year, Selection::items(["2024"]))
            .with(Dimension::DataType, Selection::items(["historical"]));
        let plan = plan_for(&spec);

        let itl1 = plan.iter().find(|f| f.level == Level::Itl1).unwrap();
        assert!(itl1.reads_metric("emp_total_jobs_ni"));
        assert_eq!(
            itl1.query.in_values("region_code").unwrap(),
            &["K02000001", "N92000002", "E12000007"].map(String::from)[..]
        );
        assert_eq!(itl1.remapper.remembered().public_for("K02000001"), Some("UKN"));
        assert!(itl1.query.filters.contains(&Filter::is_in("period", ["2024"])));
        assert!(itl1.query.filters.contains(&Filter::is_in("data_type", ["historical"])));

        let itl2 = plan.iter().find(|f| f.level == Level::Itl2).unwrap();
        assert!(!itl2.reads_metric("emp_total_jobs_ni"));
        assert!(itl2.remapper.remembered().is_empty());
    }

    #[test]
    fn prefix_round_trip() {
        let reference = ReferenceData::builtin().unwrap();
        let config = EngineConfig::default();
        let rule = JobsRule::for_reference(&reference);
        let router = LevelRouter::new(&reference, &config, &rule);

        assert_eq!(router.public_metric_id(Level::Uk, "uk_population_total"), "population_total");
        assert_eq!(router.public_metric_id(Level::Itl1, "uk_population_total"), "uk_population_total");
        assert_eq!(router.table_for(Level::Itl3), "itl3_latest_all");
    }

    #[test]
    fn empty_year_span_plans_nothing() {
        let spec = QuerySpec::new()
            .with(Dimension::Metric, Selection::items(["population_total"]))
            .with(Dimension::Region, Selection::items(["UKI"]))
            .with(Dimension::Year, Selection::range(2020.5, 2020.7));
        assert!(plan_for(&spec).is_empty());
    }
}
