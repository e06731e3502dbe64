//! Configuration loading from disk

use riq_engine::{ConfigError, EngineConfig};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
dataset = "regioniq_staging"
max_records = 1000

[tables]
itl1 = "itl1_staging"

[lifecycle]
vintage = "2026-q3"
"#
    )
    .unwrap();

    let config = EngineConfig::from_path(file.path()).unwrap();
    assert_eq!(config.dataset, "regioniq_staging");
    assert_eq!(config.max_records, 1000);
    assert_eq!(config.tables.itl1, "itl1_staging");
    assert_eq!(config.tables.lad, "lad_latest_all");
    assert_eq!(config.lifecycle.vintage, "2026-q3");
    assert_eq!(config.lifecycle.status, "provisional");
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = EngineConfig::from_path(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_inverted_year_span_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "min_year = 2050\nmax_year = 2000").unwrap();
    let err = EngineConfig::from_path(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}
