//! Region reference data
//!
//! Provides [`RegionCatalog`] for O(1) lookup of regions by public code or
//! storage code, plus per-level grouping computed once at construction.

use crate::error::CatalogError;
use crate::level::Level;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A geographic region
///
/// `code` is the externally visible identifier. `db_code` is the identifier
/// used in storage and may differ from `code` (ITL1 regions are stored under
/// ONS `E12…`/`S92…`/`W92…`/`N92…` codes but addressed as `UK*`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Public region code
    pub code: String,
    /// Storage-level region code
    #[serde(alias = "dbCode")]
    pub db_code: String,
    /// Geography level
    pub level: Level,
    /// Display name
    pub name: String,
    /// Public code of the enclosing region, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl Region {
    /// Create new region whose storage code equals its public code
    #[inline]
    #[must_use]
    pub fn new(code: impl Into<String>, level: Level, name: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            db_code: code.clone(),
            code,
            level,
            name: name.into(),
            parent: None,
        }
    }

    /// With a distinct storage code
    #[inline]
    #[must_use]
    pub fn with_db_code(mut self, db_code: impl Into<String>) -> Self {
        self.db_code = db_code.into();
        self
    }

    /// With parent region code
    #[inline]
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

/// Result of bucketing requested region codes by level
#[derive(Debug, Clone, Default)]
pub struct LevelPartition<'a> {
    /// Known regions, grouped by level, in request order within each level
    pub by_level: BTreeMap<Level, Vec<&'a Region>>,
    /// Requested codes that are not in the catalog
    pub unknown: Vec<String>,
}

impl LevelPartition<'_> {
    /// Total number of known regions
    #[must_use]
    pub fn region_count(&self) -> usize {
        self.by_level.values().map(Vec::len).sum()
    }
}

/// Immutable region catalog
#[derive(Debug, Clone)]
pub struct RegionCatalog {
    regions: Vec<Region>,
    by_code: HashMap<String, usize>,
    by_db_code: HashMap<String, usize>,
    by_level: BTreeMap<Level, Vec<usize>>,
}

impl RegionCatalog {
    /// Build catalog from a list of regions
    ///
    /// # Errors
    /// Returns error if a public code or storage code appears twice
    pub fn new(regions: Vec<Region>) -> Result<Self, CatalogError> {
        let mut by_code = HashMap::with_capacity(regions.len());
        let mut by_db_code = HashMap::with_capacity(regions.len());
        let mut by_level: BTreeMap<Level, Vec<usize>> = BTreeMap::new();

        for (idx, region) in regions.iter().enumerate() {
            if by_code.insert(region.code.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateRegionCode(region.code.clone()));
            }
            if by_db_code.insert(region.db_code.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateDbCode {
                    level: region.level,
                    db_code: region.db_code.clone(),
                });
            }
            by_level.entry(region.level).or_default().push(idx);
        }

        Ok(Self {
            regions,
            by_code,
            by_db_code,
            by_level,
        })
    }

    /// Load catalog from a JSON array of regions
    ///
    /// # Errors
    /// Returns error on malformed JSON or duplicate codes
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let regions: Vec<Region> = serde_json::from_str(json)?;
        Self::new(regions)
    }

    /// Lookup region by public code
    #[inline]
    #[must_use]
    pub fn by_code(&self, code: &str) -> Option<&Region> {
        self.by_code.get(code).map(|&idx| &self.regions[idx])
    }

    /// Lookup region by storage code
    #[inline]
    #[must_use]
    pub fn by_db_code(&self, db_code: &str) -> Option<&Region> {
        self.by_db_code.get(db_code).map(|&idx| &self.regions[idx])
    }

    /// All regions on a level, in catalog order
    #[must_use]
    pub fn regions_at_level(&self, level: Level) -> Vec<&Region> {
        self.by_level
            .get(&level)
            .map(|idxs| idxs.iter().map(|&idx| &self.regions[idx]).collect())
            .unwrap_or_default()
    }

    /// The national region, if the catalog has one
    #[must_use]
    pub fn national(&self) -> Option<&Region> {
        self.regions_at_level(Level::Uk).into_iter().next()
    }

    /// Same-level regions sharing a parent with `code` (excluding `code`)
    #[must_use]
    pub fn peers_of(&self, code: &str) -> Vec<&Region> {
        let Some(region) = self.by_code(code) else {
            return Vec::new();
        };
        self.regions_at_level(region.level)
            .into_iter()
            .filter(|r| r.code != region.code && r.parent == region.parent)
            .collect()
    }

    /// Bucket requested public codes per level
    ///
    /// Duplicate codes are collapsed; unknown codes are reported, not dropped
    /// silently, so callers can surface them as validation failures.
    #[must_use]
    pub fn partition_by_level<S: AsRef<str>>(&self, codes: &[S]) -> LevelPartition<'_> {
        let mut partition = LevelPartition::default();
        let mut seen = std::collections::HashSet::new();

        for code in codes {
            let code = code.as_ref();
            if !seen.insert(code) {
                continue;
            }
            match self.by_code(code) {
                Some(region) => partition.by_level.entry(region.level).or_default().push(region),
                None => partition.unknown.push(code.to_string()),
            }
        }

        partition
    }

    /// Iterate over all regions in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    /// Number of regions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the catalog is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
