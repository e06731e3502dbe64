//! Jobs-metric region remapping
//!
//! Northern Ireland's employment-jobs series is computed on a different basis
//! and stored as a companion metric under the national placeholder code
//! instead of the jurisdiction's own storage code. The remapper translates
//! the public code on the way in, remembers what it produced, and decides on
//! the way out which of the standard/companion rows survives for a region.
//!
//! The mapping is modelled as an explicit bidirectional table
//! ([`CodeMap`]) so that every translated storage code maps back to exactly
//! one public code.

use riq_catalog::{builtin, ReferenceData, Region, RegionCatalog};
use std::collections::HashMap;

/// Static description of the jobs-metric exception
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobsRule {
    /// Standard jobs metric id
    pub metric_id: String,
    /// Companion metric id holding the jurisdiction's series
    pub companion_id: String,
    /// Public code of the exceptional jurisdiction
    pub jurisdiction_code: String,
    /// Storage code the jurisdiction's jobs rows are filed under
    pub placeholder_code: String,
}

impl JobsRule {
    /// Create rule
    #[must_use]
    pub fn new(
        metric_id: impl Into<String>,
        companion_id: impl Into<String>,
        jurisdiction_code: impl Into<String>,
        placeholder_code: impl Into<String>,
    ) -> Self {
        Self {
            metric_id: metric_id.into(),
            companion_id: companion_id.into(),
            jurisdiction_code: jurisdiction_code.into(),
            placeholder_code: placeholder_code.into(),
        }
    }

    /// Rule for the built-in catalog: NI jobs filed under the national code
    #[must_use]
    pub fn for_reference(data: &ReferenceData) -> Self {
        let placeholder = data
            .regions()
            .national()
            .map_or(builtin::NATIONAL_DB_CODE, |r| r.db_code.as_str());
        let companion = data
            .metrics()
            .companions_of(builtin::JOBS_METRIC)
            .first()
            .map_or(builtin::JOBS_NI_METRIC, |m| m.id.as_str());
        Self::new(builtin::JOBS_METRIC, companion, builtin::NI_CODE, placeholder)
    }

    /// Whether a stored metric id is the jobs metric or its companion
    #[inline]
    #[must_use]
    pub fn covers(&self, metric_id: &str) -> bool {
        metric_id == self.metric_id || metric_id == self.companion_id
    }

    /// Whether a public region is the exceptional jurisdiction
    #[inline]
    #[must_use]
    pub fn is_jurisdiction(&self, public_code: &str) -> bool {
        public_code == self.jurisdiction_code
    }

    /// Metric ids to request, adding the companion when jobs is requested
    #[must_use]
    pub fn expand_metric_ids(&self, metric_ids: &[String]) -> Vec<String> {
        let mut out = metric_ids.to_vec();
        if out.iter().any(|m| *m == self.metric_id) && !out.iter().any(|m| *m == self.companion_id) {
            out.push(self.companion_id.clone());
        }
        out
    }

    /// Storage code to query for a region under a metric
    #[must_use]
    pub fn query_code_for(&self, metric_id: &str, region: &Region) -> String {
        if self.covers(metric_id) && self.is_jurisdiction(&region.code) {
            self.placeholder_code.clone()
        } else {
            region.db_code.clone()
        }
    }

    /// Public code for a storage code when no remembered mapping applies
    ///
    /// The placeholder is the national region's own storage code, so without
    /// a remembered mapping it resolves to the national region.
    #[must_use]
    pub fn output_code_for(storage_code: &str, regions: &RegionCatalog) -> Option<String> {
        regions.by_db_code(storage_code).map(|r| r.code.clone())
    }

    /// Whether a row for `metric_id` may be emitted for `public_code`
    ///
    /// Exactly one of standard/companion survives per region: the companion
    /// for the jurisdiction, the standard for everyone else.
    #[must_use]
    pub fn keep(&self, metric_id: &str, public_code: &str) -> bool {
        if metric_id == self.metric_id {
            !self.is_jurisdiction(public_code)
        } else if metric_id == self.companion_id {
            self.is_jurisdiction(public_code)
        } else {
            true
        }
    }
}

/// Conflicting entry in a [`CodeMap`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("storage code '{storage}' already maps to '{existing}', cannot map to '{public}'")]
pub struct CodeMapConflict {
    /// Storage code
    pub storage: String,
    /// Public code already recorded
    pub existing: String,
    /// Public code that was rejected
    pub public: String,
}

/// One-to-one public ↔ storage code table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeMap {
    forward: HashMap<String, String>,
    reverse: HashMap<String, String>,
}

impl CodeMap {
    /// Create empty map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `public → storage`
    ///
    /// # Errors
    /// Fails if either side is already bound to a different code
    pub fn insert(&mut self, public: &str, storage: &str) -> Result<(), CodeMapConflict> {
        if let Some(existing) = self.reverse.get(storage) {
            if existing != public {
                return Err(CodeMapConflict {
                    storage: storage.to_string(),
                    existing: existing.clone(),
                    public: public.to_string(),
                });
            }
            return Ok(());
        }
        if let Some(existing) = self.forward.get(public) {
            if existing != storage {
                return Err(CodeMapConflict {
                    storage: existing.clone(),
                    existing: public.to_string(),
                    public: storage.to_string(),
                });
            }
        }
        self.forward.insert(public.to_string(), storage.to_string());
        self.reverse.insert(storage.to_string(), public.to_string());
        Ok(())
    }

    /// Storage code recorded for a public code
    #[inline]
    #[must_use]
    pub fn storage_for(&self, public: &str) -> Option<&str> {
        self.forward.get(public).map(String::as_str)
    }

    /// Public code recorded for a storage code
    #[inline]
    #[must_use]
    pub fn public_for(&self, storage: &str) -> Option<&str> {
        self.reverse.get(storage).map(String::as_str)
    }

    /// Number of remembered pairs
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Whether nothing has been remembered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

/// Remapper scoped to one level fetch: applies a [`JobsRule`] and remembers
/// its output
#[derive(Debug, Clone)]
pub struct JobsRemapper {
    rule: JobsRule,
    remembered: CodeMap,
}

impl JobsRemapper {
    /// Create remapper for one level fetch
    #[inline]
    #[must_use]
    pub fn new(rule: JobsRule) -> Self {
        Self {
            rule,
            remembered: CodeMap::new(),
        }
    }

    /// The rule being applied
    #[inline]
    #[must_use]
    pub fn rule(&self) -> &JobsRule {
        &self.rule
    }

    /// Storage code for a region under a metric, remembering remapped codes
    pub fn query_code_for(&mut self, metric_id: &str, region: &Region) -> String {
        let storage = self.rule.query_code_for(metric_id, region);
        if storage != region.db_code {
            if let Err(conflict) = self.remembered.insert(&region.code, &storage) {
                tracing::warn!(%conflict, "jobs remap conflict");
            }
        }
        storage
    }

    /// Public code for a returned row
    ///
    /// Remembered mappings apply to the jobs metric and its companion only;
    /// other metrics found under the same storage code resolve through the
    /// catalog.
    #[must_use]
    pub fn output_code_for(
        &self,
        metric_id: &str,
        storage_code: &str,
        regions: &RegionCatalog,
    ) -> Option<String> {
        if self.rule.covers(metric_id) {
            if let Some(public) = self.remembered.public_for(storage_code) {
                return Some(public.to_string());
            }
        }
        JobsRule::output_code_for(storage_code, regions)
    }

    /// See [`JobsRule::keep`]
    #[inline]
    #[must_use]
    pub fn keep(&self, metric_id: &str, public_code: &str) -> bool {
        self.rule.keep(metric_id, public_code)
    }

    /// Remembered mappings
    #[inline]
    #[must_use]
    pub fn remembered(&self) -> &CodeMap {
        &self.remembered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> ReferenceData {
        ReferenceData::builtin().unwrap()
    }

    #[test]
    fn rule_from_builtin_reference() {
        let rule = JobsRule::for_reference(&reference());
        assert_eq!(rule.metric_id, "emp_total_jobs");
        assert_eq!(rule.companion_id, "emp_total_jobs_ni");
        assert_eq!(rule.jurisdiction_code, "UKN");
        assert_eq!(rule.placeholder_code, "K02000001");
    }

    #[test]
    fn query_code_is_identity_outside_the_exception() {
        let data = reference();
        let rule = JobsRule::for_reference(&data);
        let ni = data.regions().by_code("UKN").unwrap();
        let london = data.regions().by_code("UKI").unwrap();

        assert_eq!(rule.query_code_for("emp_total_jobs", london), "E12000007");
        assert_eq!(rule.query_code_for("population_total", ni), "N92000002");
        assert_eq!(rule.query_code_for("emp_total_jobs", ni), "K02000001");
        assert_eq!(rule.query_code_for("emp_total_jobs_ni", ni), "K02000001");
    }

    #[test]
    fn remapper_remembers_and_reverses() {
        let data = reference();
        let mut remapper = JobsRemapper::new(JobsRule::for_reference(&data));
        let ni = data.regions().by_code("UKN").unwrap();

        let storage = remapper.query_code_for("emp_total_jobs", ni);
        assert_eq!(remapper.remembered().public_for(&storage), Some("UKN"));

        assert_eq!(
            remapper.output_code_for("emp_total_jobs_ni", "K02000001", data.regions()),
            Some("UKN".to_string())
        );
        // Another metric under the placeholder resolves through the catalog
        assert_eq!(
            remapper.output_code_for("population_total", "K02000001", data.regions()),
            Some("UK".to_string())
        );
        assert_eq!(
            remapper.output_code_for("emp_total_jobs", "E12000007", data.regions()),
            Some("UKI".to_string())
        );
    }

    #[test]
    fn fresh_remapper_leaves_national_jobs_alone() {
        let data = reference();
        let remapper = JobsRemapper::new(JobsRule::for_reference(&data));
        assert!(remapper.remembered().is_empty());
        assert_eq!(
            remapper.output_code_for("emp_total_jobs", "K02000001", data.regions()),
            Some("UK".to_string())
        );
    }

    #[test]
    fn exactly_one_of_standard_and_companion_survives() {
        let rule = JobsRule::for_reference(&reference());
        for code in ["UKN", "UKI", "TLI3", "UK"] {
            let kept = [rule.keep("emp_total_jobs", code), rule.keep("emp_total_jobs_ni", code)];
            assert_eq!(kept.iter().filter(|k| **k).count(), 1, "region {code}");
        }
        assert!(rule.keep("emp_total_jobs_ni", "UKN"));
        assert!(rule.keep("population_total", "UKN"));
    }

    #[test]
    fn companion_added_once() {
        let rule = JobsRule::for_reference(&reference());
        let ids = rule.expand_metric_ids(&["population_total".to_string(), "emp_total_jobs".to_string()]);
        assert_eq!(ids.last().map(String::as_str), Some("emp_total_jobs_ni"));
        assert_eq!(rule.expand_metric_ids(&ids).len(), ids.len());
        assert_eq!(rule.expand_metric_ids(&["population_total".to_string()]).len(), 1);
    }

    #[test]
    fn code_map_is_one_to_one() {
        let mut map = CodeMap::new();
        map.insert("UKN", "K02000001").unwrap();
        map.insert("UKN", "K02000001").unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.insert("UKI", "K02000001").is_err());
        assert!(map.insert("UKN", "N92000002").is_err());
        assert_eq!(map.storage_for("UKN"), Some("K02000001"));
    }
}
