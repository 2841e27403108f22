//! Integration tests for env parsing and env-to-config merging.

use milvus_otel_config::{HarnessConfig, HarnessEnv, MilvusAuth, apply_env_overrides};
use milvus_otel_shared::{ErrorCode, ErrorEnvelope};
use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(Path::parent)
        .map_or_else(|| manifest_dir.to_path_buf(), Path::to_path_buf)
}

fn read_env_map(relative: &str) -> Result<BTreeMap<String, String>, Box<dyn Error>> {
    let path = workspace_root()
        .join("crates")
        .join("testkit")
        .join("fixtures")
        .join("env")
        .join(relative);
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

#[test]
fn env_fixture_merges_into_effective_config() -> Result<(), Box<dyn Error>> {
    let env = HarnessEnv::from_map(&read_env_map("harness-env.valid.json")?)?;
    let config = apply_env_overrides(HarnessConfig::default(), &env)?;

    assert_eq!(config.milvus.uri.as_ref(), "https://milvus.internal:19530");
    assert_eq!(config.milvus.db_name.as_deref(), Some("harness"));
    assert_eq!(config.milvus.timeout_ms, 15_000);
    assert_eq!(config.milvus.load_timeout_ms, 120_000);
    assert!(matches!(config.milvus.auth(), MilvusAuth::Basic { .. }));

    assert!(config.telemetry.enabled);
    assert_eq!(config.telemetry.endpoint.as_ref(), "http://collector:4317");
    assert_eq!(config.telemetry.service_name.as_ref(), "milvus-client-ci");
    assert_eq!(config.telemetry.export_timeout_ms, 5_000);
    assert_eq!(config.telemetry.resource_attributes.len(), 2);
    Ok(())
}

#[test]
fn empty_env_yields_documented_defaults() -> Result<(), Box<dyn Error>> {
    let env = HarnessEnv::from_map(&BTreeMap::new())?;
    let config = apply_env_overrides(HarnessConfig::default(), &env)?;

    assert_eq!(config.milvus.uri.as_ref(), "http://localhost:19530");
    assert_eq!(config.milvus.timeout_ms, 30_000);
    assert_eq!(config.milvus.load_timeout_ms, 60_000);
    assert_eq!(config.milvus.auth(), MilvusAuth::None);
    assert_eq!(config.telemetry.endpoint.as_ref(), "http://localhost:4317");
    assert_eq!(config.telemetry.service_name.as_ref(), "milvus-client");
    assert_eq!(config.telemetry.export_timeout_ms, 10_000);
    assert!(config.telemetry.enabled);
    Ok(())
}

#[test]
fn sdk_disabled_turns_off_export() -> Result<(), Box<dyn Error>> {
    let mut map = BTreeMap::new();
    map.insert("OTEL_SDK_DISABLED".to_owned(), "true".to_owned());
    let env = HarnessEnv::from_map(&map)?;
    let config = apply_env_overrides(HarnessConfig::default(), &env)?;
    assert!(!config.telemetry.enabled);
    Ok(())
}

#[test]
fn out_of_range_env_timeout_fails_validation() -> Result<(), Box<dyn Error>> {
    let env = HarnessEnv::from_map(&read_env_map("harness-env.invalid-timeout.json")?)?;
    let error = apply_env_overrides(HarnessConfig::default(), &env)
        .err()
        .ok_or("expected a validation error")?;
    assert_eq!(error.code, ErrorCode::new("config", "invalid_timeout"));
    assert_eq!(error.metadata.get("value_ms").map(String::as_str), Some("5"));
    Ok(())
}

#[test]
fn invalid_uri_error_never_leaks_the_token() -> Result<(), Box<dyn Error>> {
    let error: ErrorEnvelope = HarnessEnv::from_map(&read_env_map("harness-env.secret-token.json")?)
        .err()
        .ok_or("expected a parse error")?
        .into();
    assert_eq!(error.code, ErrorCode::new("config", "invalid_env_url"));
    let rendered = format!("{error} {:?}", error.metadata);
    assert!(!rendered.contains("root:Milvus"));
    Ok(())
}
