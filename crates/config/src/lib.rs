//! # milvus-otel-config
//!
//! Configuration schema, env parsing, and validation for the quick-setup
//! harness. This crate depends on `shared` only.

/// Environment variable parsing.
pub mod env;
/// Config loading (defaults + env overrides).
pub mod load;
/// Configuration schema types and validation.
pub mod schema;

pub use env::{EnvParseError, HarnessEnv};
pub use load::{apply_env_overrides, load_harness_config_std_env};
pub use schema::{
    ConfigSchemaError, HarnessConfig, MilvusAuth, MilvusConfig, TelemetryConfig,
    ValidatedHarnessConfig,
};
