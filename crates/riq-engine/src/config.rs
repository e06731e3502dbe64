//! Engine configuration
//!
//! Defaults match the production data service. A TOML file can override any
//! subset of fields; `FORECAST_VINTAGE` overrides the release vintage.

use crate::error::ConfigError;
use riq_catalog::Level;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Dataset name reported in response meta
    pub dataset: String,
    /// Earliest year when no year filter is given
    pub min_year: i32,
    /// Latest year when no year filter is given
    pub max_year: i32,
    /// Metric ids per call before truncation
    pub max_metrics: usize,
    /// Region codes per call before truncation
    pub max_regions: usize,
    /// Canonical rows per call before truncation
    pub max_records: usize,
    /// Metric-id prefix used by the national table
    pub uk_metric_prefix: String,
    /// Storage table per level
    pub tables: LevelTables,
    /// Release lifecycle reported with every result
    pub lifecycle: Lifecycle,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dataset: "regioniq_observations".to_string(),
            min_year: 1991,
            max_year: 2050,
            max_metrics: 50,
            max_regions: 500,
            max_records: 250_000,
            uk_metric_prefix: "uk_".to_string(),
            tables: LevelTables::default(),
            lifecycle: Lifecycle::default(),
        }
    }
}

impl EngineConfig {
    /// Create default config
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With default year span
    #[inline]
    #[must_use]
    pub fn with_year_span(mut self, min_year: i32, max_year: i32) -> Self {
        self.min_year = min_year;
        self.max_year = max_year;
        self
    }

    /// With metric cap
    #[inline]
    #[must_use]
    pub fn with_max_metrics(mut self, max: usize) -> Self {
        self.max_metrics = max;
        self
    }

    /// With region cap
    #[inline]
    #[must_use]
    pub fn with_max_regions(mut self, max: usize) -> Self {
        self.max_regions = max;
        self
    }

    /// With result row cap
    #[inline]
    #[must_use]
    pub fn with_max_records(mut self, max: usize) -> Self {
        self.max_records = max;
        self
    }

    /// With lifecycle
    #[inline]
    #[must_use]
    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// Returns error on invalid TOML or inconsistent values
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Apply overrides from the process environment
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(vintage) = lookup("FORECAST_VINTAGE").filter(|v| !v.trim().is_empty()) {
            self.lifecycle.vintage = vintage.trim().to_string();
        }
        self
    }

    /// Check values are usable
    ///
    /// # Errors
    /// Returns error on an inverted year span or a zero cap
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_year > self.max_year {
            return Err(ConfigError::Invalid(format!(
                "min_year {} is after max_year {}",
                self.min_year, self.max_year
            )));
        }
        for (name, value) in [
            ("max_metrics", self.max_metrics),
            ("max_regions", self.max_regions),
            ("max_records", self.max_records),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be positive")));
            }
        }
        Ok(())
    }

    /// Number of years in the default span
    #[must_use]
    pub fn year_span(&self) -> usize {
        usize::try_from(i64::from(self.max_year) - i64::from(self.min_year) + 1).unwrap_or(0)
    }
}

/// Storage table per geography level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelTables {
    /// National table
    pub uk: String,
    /// ITL1 table
    pub itl1: String,
    /// ITL2 table
    pub itl2: String,
    /// ITL3 table
    pub itl3: String,
    /// Local authority table
    pub lad: String,
}

impl Default for LevelTables {
    fn default() -> Self {
        Self {
            uk: "uk_latest_all".to_string(),
            itl1: "itl1_latest_all".to_string(),
            itl2: "itl2_latest_all".to_string(),
            itl3: "itl3_latest_all".to_string(),
            lad: "lad_latest_all".to_string(),
        }
    }
}

impl LevelTables {
    /// Table for a level
    #[must_use]
    pub fn table_for(&self, level: Level) -> &str {
        match level {
            Level::Uk => &self.uk,
            Level::Itl1 => &self.itl1,
            Level::Itl2 => &self.itl2,
            Level::Itl3 => &self.itl3,
            Level::Lad => &self.lad,
        }
    }
}

/// Release lifecycle of the served data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lifecycle {
    /// Release vintage
    pub vintage: String,
    /// Producing system
    pub source: String,
    /// Release status (`provisional`, `final`, ...)
    pub status: String,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            vintage: "unreleased".to_string(),
            source: "RegionIQ Forecast Engine v1".to_string(),
            status: "provisional".to_string(),
        }
    }
}

impl Lifecycle {
    /// Citation string for a given access time
    #[must_use]
    pub fn citation(&self, accessed_at: &str) -> String {
        format!(
            "RegionIQ Data API ({}). Accessed {}. Source: {}.",
            self.vintage, accessed_at, self.source
        )
    }
}

/// REST storage adapter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestStoreConfig {
    /// Service root, without trailing slash
    pub base_url: String,
    /// Anonymous API key
    pub api_key: String,
    /// Bearer token; the API key is used when absent
    #[serde(default)]
    pub bearer_token: Option<String>,
    /// Rows per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Region codes per request
    #[serde(default = "default_region_chunk")]
    pub region_chunk: usize,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_page_size() -> usize {
    10_000
}

fn default_region_chunk() -> usize {
    100
}

fn default_timeout_secs() -> u64 {
    15
}

impl RestStoreConfig {
    /// Create config with default paging
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            bearer_token: None,
            page_size: default_page_size(),
            region_chunk: default_region_chunk(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// With bearer token
    #[inline]
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// With page size
    #[inline]
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// With region chunk size
    #[inline]
    #[must_use]
    pub fn with_region_chunk(mut self, chunk: usize) -> Self {
        self.region_chunk = chunk.max(1);
        self
    }

    /// Read from the process environment
    ///
    /// # Errors
    /// Fails if `SUPABASE_URL` or `SUPABASE_ANON_KEY` is missing
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read from a variable lookup
    ///
    /// # Errors
    /// Fails if `SUPABASE_URL` or `SUPABASE_ANON_KEY` is missing
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingEnv(key))
        };
        let mut config = Self::new(required("SUPABASE_URL")?, required("SUPABASE_ANON_KEY")?);
        if let Some(token) = lookup("RIQ_BEARER_TOKEN").filter(|t| !t.trim().is_empty()) {
            config.bearer_token = Some(token.trim().to_string());
        }
        Ok(config)
    }

    /// Token sent in the `authorization` header
    #[must_use]
    pub fn bearer(&self) -> &str {
        self.bearer_token.as_deref().unwrap_or(&self.api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_service() {
        let config = EngineConfig::default();
        assert_eq!((config.min_year, config.max_year), (1991, 2050));
        assert_eq!(config.max_metrics, 50);
        assert_eq!(config.max_regions, 500);
        assert_eq!(config.max_records, 250_000);
        assert_eq!(config.tables.table_for(Level::Uk), "uk_latest_all");
        assert_eq!(config.year_span(), 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            max_regions = 20

            [tables]
            lad = "lad_v2"

            [lifecycle]
            vintage = "2026-Q1"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_regions, 20);
        assert_eq!(config.max_metrics, 50);
        assert_eq!(config.tables.table_for(Level::Lad), "lad_v2");
        assert_eq!(config.tables.table_for(Level::Itl1), "itl1_latest_all");
        assert_eq!(config.lifecycle.vintage, "2026-Q1");
        assert_eq!(config.lifecycle.status, "provisional");
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(EngineConfig::from_toml_str("min_year = 2060").is_err());
        assert!(EngineConfig::from_toml_str("max_records = 0").is_err());
        assert!(matches!(
            EngineConfig::from_toml_str("max_records = \"lots\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn vintage_override() {
        let config = EngineConfig::default().with_overrides_from(|key| {
            (key == "FORECAST_VINTAGE").then(|| " 2026-W03 ".to_string())
        });
        assert_eq!(config.lifecycle.vintage, "2026-W03");

        let untouched = EngineConfig::default().with_overrides_from(|_| Some(String::new()));
        assert_eq!(untouched.lifecycle.vintage, "unreleased");
    }

    #[test]
    fn citation_format() {
        let lifecycle = Lifecycle::default();
        assert_eq!(
            lifecycle.citation("2026-01-01T00:00:00Z"),
            "RegionIQ Data API (unreleased). Accessed 2026-01-01T00:00:00Z. Source: RegionIQ Forecast Engine v1."
        );
    }

    #[test]
    fn rest_config_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("SUPABASE_URL", "https://db.example.test/"),
            ("SUPABASE_ANON_KEY", "anon"),
        ]
        .into_iter()
        .collect();
        let config = RestStoreConfig::from_lookup(|k| vars.get(k).map(ToString::to_string)).unwrap();
        assert_eq!(config.base_url, "https://db.example.test");
        assert_eq!(config.bearer(), "anon");
        assert_eq!(config.page_size, 10_000);

        let missing = RestStoreConfig::from_lookup(|_| None);
        assert!(matches!(missing, Err(ConfigError::MissingEnv("SUPABASE_URL"))));
    }
}
