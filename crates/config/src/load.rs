//! Config loading: defaults, then env overrides, then validation.

use crate::{HarnessConfig, HarnessEnv, ValidatedHarnessConfig};
use milvus_otel_shared::ErrorEnvelope;

/// Apply env overrides on top of `config` and validate the result.
pub fn apply_env_overrides(
    mut config: HarnessConfig,
    env: &HarnessEnv,
) -> Result<ValidatedHarnessConfig, ErrorEnvelope> {
    let milvus = &mut config.milvus;
    if let Some(uri) = &env.milvus_uri {
        milvus.uri.clone_from(uri);
    }
    if env.milvus_token.is_some() {
        milvus.token.clone_from(&env.milvus_token);
    }
    if env.milvus_user.is_some() {
        milvus.user.clone_from(&env.milvus_user);
    }
    if env.milvus_password.is_some() {
        milvus.password.clone_from(&env.milvus_password);
    }
    if env.milvus_db_name.is_some() {
        milvus.db_name.clone_from(&env.milvus_db_name);
    }
    if let Some(timeout_ms) = env.milvus_timeout_ms {
        milvus.timeout_ms = timeout_ms;
    }
    if let Some(load_timeout_ms) = env.milvus_load_timeout_ms {
        milvus.load_timeout_ms = load_timeout_ms;
    }

    let telemetry = &mut config.telemetry;
    if let Some(endpoint) = &env.otel_endpoint {
        telemetry.endpoint.clone_from(endpoint);
    }
    if let Some(service_name) = &env.otel_service_name {
        telemetry.service_name.clone_from(service_name);
    }
    if let Some(disabled) = env.otel_sdk_disabled {
        telemetry.enabled = !disabled;
    }
    if let Some(timeout_ms) = env.otel_export_timeout_ms {
        telemetry.export_timeout_ms = timeout_ms;
    }
    if let Some(attributes) = &env.otel_resource_attributes {
        telemetry.resource_attributes.extend(attributes.iter().cloned());
    }

    Ok(config.validate_and_normalize()?)
}

/// Load the config from defaults and the process environment.
pub fn load_harness_config_std_env() -> Result<ValidatedHarnessConfig, ErrorEnvelope> {
    let env = HarnessEnv::from_std_env()?;
    apply_env_overrides(HarnessConfig::default(), &env)
}
