//! Environment variable parsing.
//!
//! Env parsing is:
//! - strict (present-but-invalid values fail fast)
//! - safe (secret values are redacted in error metadata)
//!
//! Absent variables parse to `None`; defaults live in [`crate::schema`].

use milvus_otel_shared::{ErrorCode, ErrorEnvelope, SecretString, is_secret_key, redact_if_secret};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// Env var: Milvus gRPC endpoint.
pub const ENV_MILVUS_URI: &str = "MILVUS_URI";
/// Env var: Milvus auth token (secret).
pub const ENV_MILVUS_TOKEN: &str = "MILVUS_TOKEN";
/// Env var: Milvus username.
pub const ENV_MILVUS_USER: &str = "MILVUS_USER";
/// Env var: Milvus password (secret).
pub const ENV_MILVUS_PASSWORD: &str = "MILVUS_PASSWORD";
/// Env var: Milvus database name.
pub const ENV_MILVUS_DB_NAME: &str = "MILVUS_DB_NAME";
/// Env var: per-call timeout in milliseconds.
pub const ENV_MILVUS_TIMEOUT_MS: &str = "MILVUS_TIMEOUT_MS";
/// Env var: wait-for-load timeout in milliseconds.
pub const ENV_MILVUS_LOAD_TIMEOUT_MS: &str = "MILVUS_LOAD_TIMEOUT_MS";

/// Env var: OTLP collector endpoint.
pub const ENV_OTEL_EXPORTER_OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
/// Env var: service name reported on every span.
pub const ENV_OTEL_SERVICE_NAME: &str = "OTEL_SERVICE_NAME";
/// Env var: disable span export.
pub const ENV_OTEL_SDK_DISABLED: &str = "OTEL_SDK_DISABLED";
/// Env var: OTLP export timeout in milliseconds.
pub const ENV_OTEL_EXPORTER_OTLP_TIMEOUT: &str = "OTEL_EXPORTER_OTLP_TIMEOUT";
/// Env var: extra resource attributes as `key=value` pairs separated by commas.
pub const ENV_OTEL_RESOURCE_ATTRIBUTES: &str = "OTEL_RESOURCE_ATTRIBUTES";

const ALL_VARS: [&str; 12] = [
    ENV_MILVUS_URI,
    ENV_MILVUS_TOKEN,
    ENV_MILVUS_USER,
    ENV_MILVUS_PASSWORD,
    ENV_MILVUS_DB_NAME,
    ENV_MILVUS_TIMEOUT_MS,
    ENV_MILVUS_LOAD_TIMEOUT_MS,
    ENV_OTEL_EXPORTER_OTLP_ENDPOINT,
    ENV_OTEL_SERVICE_NAME,
    ENV_OTEL_SDK_DISABLED,
    ENV_OTEL_EXPORTER_OTLP_TIMEOUT,
    ENV_OTEL_RESOURCE_ATTRIBUTES,
];

const MAX_RESOURCE_ATTRIBUTES: usize = 128;

/// Typed env-derived overrides for [`crate::HarnessConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarnessEnv {
    /// Override for `milvus.uri`.
    pub milvus_uri: Option<Box<str>>,
    /// Override for `milvus.token`.
    pub milvus_token: Option<SecretString>,
    /// Override for `milvus.user`.
    pub milvus_user: Option<Box<str>>,
    /// Override for `milvus.password`.
    pub milvus_password: Option<SecretString>,
    /// Override for `milvus.dbName`.
    pub milvus_db_name: Option<Box<str>>,
    /// Override for `milvus.timeoutMs`.
    pub milvus_timeout_ms: Option<u64>,
    /// Override for `milvus.loadTimeoutMs`.
    pub milvus_load_timeout_ms: Option<u64>,
    /// Override for `telemetry.endpoint`.
    pub otel_endpoint: Option<Box<str>>,
    /// Override for `telemetry.serviceName`.
    pub otel_service_name: Option<Box<str>>,
    /// Override for `telemetry.enabled` (inverted).
    pub otel_sdk_disabled: Option<bool>,
    /// Override for `telemetry.exportTimeoutMs`.
    pub otel_export_timeout_ms: Option<u64>,
    /// Extra resource attributes, in input order.
    pub otel_resource_attributes: Option<Vec<(Box<str>, Box<str>)>>,
}

impl HarnessEnv {
    /// Parse env overrides from a key/value map (useful for tests and fixtures).
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            milvus_uri: parse_optional_url(map, ENV_MILVUS_URI)?,
            milvus_token: parse_optional_secret(map, ENV_MILVUS_TOKEN)?,
            milvus_user: parse_optional_trimmed_string(map, ENV_MILVUS_USER)?,
            milvus_password: parse_optional_secret(map, ENV_MILVUS_PASSWORD)?,
            milvus_db_name: parse_optional_trimmed_string(map, ENV_MILVUS_DB_NAME)?,
            milvus_timeout_ms: parse_optional_u64(map, ENV_MILVUS_TIMEOUT_MS)?,
            milvus_load_timeout_ms: parse_optional_u64(map, ENV_MILVUS_LOAD_TIMEOUT_MS)?,
            otel_endpoint: parse_optional_url(map, ENV_OTEL_EXPORTER_OTLP_ENDPOINT)?,
            otel_service_name: parse_optional_trimmed_string(map, ENV_OTEL_SERVICE_NAME)?,
            otel_sdk_disabled: parse_optional_bool(map, ENV_OTEL_SDK_DISABLED)?,
            otel_export_timeout_ms: parse_optional_u64(map, ENV_OTEL_EXPORTER_OTLP_TIMEOUT)?,
            otel_resource_attributes: parse_optional_key_values(
                map,
                ENV_OTEL_RESOURCE_ATTRIBUTES,
            )?,
        })
    }

    /// Parse env overrides from the current process environment.
    ///
    /// Only the variables this crate knows about are read.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        let map = ALL_VARS
            .iter()
            .filter_map(|name| {
                std::env::var(name)
                    .ok()
                    .map(|value| ((*name).to_owned(), value))
            })
            .collect();
        Self::from_map(&map)
    }
}

/// Validation failures when parsing env variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// A secret env var was present but empty after trimming.
    EmptySecret {
        /// Env var name.
        var: &'static str,
    },
    /// Boolean env var had an invalid value.
    InvalidBool {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// Integer env var had an invalid value.
    InvalidInt {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// URL env var had an invalid value.
    InvalidUrl {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// A `key=value` list contained a malformed entry.
    InvalidKeyValue {
        /// Env var name.
        var: &'static str,
        /// Offending entry.
        entry: String,
    },
    /// A `key=value` list exceeds the safety limit.
    TooManyEntries {
        /// Env var name.
        var: &'static str,
        /// Number of parsed entries.
        len: usize,
        /// Maximum allowed.
        max: usize,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyValue { .. } | Self::EmptySecret { .. } => {
                ErrorCode::new("config", "empty_env_var")
            },
            Self::InvalidBool { .. } => ErrorCode::new("config", "invalid_env_bool"),
            Self::InvalidInt { .. } => ErrorCode::new("config", "invalid_env_int"),
            Self::InvalidUrl { .. } => ErrorCode::new("config", "invalid_env_url"),
            Self::InvalidKeyValue { .. } | Self::TooManyEntries { .. } => {
                ErrorCode::new("config", "invalid_env_key_values")
            },
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } | Self::EmptySecret { var } => {
                write!(formatter, "{var} must be non-empty")
            },
            Self::InvalidBool { var, .. } => write!(formatter, "{var} must be a boolean"),
            Self::InvalidInt { var, .. } => {
                write!(formatter, "{var} must be a non-negative integer")
            },
            Self::InvalidUrl { var, .. } => {
                write!(formatter, "{var} must be an http(s) URL")
            },
            Self::InvalidKeyValue { var, entry } => {
                write!(formatter, "{var} entry `{entry}` is not key=value")
            },
            Self::TooManyEntries { var, len, max } => {
                write!(formatter, "{var} is too large ({len} entries, max {max})")
            },
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());

        match error {
            EnvParseError::EmptyValue { var } | EnvParseError::EmptySecret { var } => {
                envelope.with_metadata("env_var", var)
            },
            EnvParseError::InvalidBool { var, value }
            | EnvParseError::InvalidInt { var, value }
            | EnvParseError::InvalidUrl { var, value } => envelope
                .with_metadata("env_var", var)
                .with_metadata("value", redact_if_secret(var, &value)),
            EnvParseError::InvalidKeyValue { var, entry } => envelope
                .with_metadata("env_var", var)
                .with_metadata("entry", entry),
            EnvParseError::TooManyEntries { var, len, max } => envelope
                .with_metadata("env_var", var)
                .with_metadata("len", len.to_string())
                .with_metadata("max", max.to_string()),
        }
    }
}

fn present<'a>(
    map: &'a BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<(&'a String, &'a str)>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(if is_secret_key(var) {
            EnvParseError::EmptySecret { var }
        } else {
            EnvParseError::EmptyValue { var }
        });
    }
    Ok(Some((raw, trimmed)))
}

fn parse_optional_trimmed_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    Ok(present(map, var)?.map(|(_, trimmed)| Box::from(trimmed)))
}

fn parse_optional_secret(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<SecretString>, EnvParseError> {
    Ok(present(map, var)?.map(|(_, trimmed)| SecretString::from(trimmed)))
}

fn parse_optional_u64(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<u64>, EnvParseError> {
    let Some((raw, trimmed)) = present(map, var)? else {
        return Ok(None);
    };

    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| EnvParseError::InvalidInt {
            var,
            value: raw.clone(),
        })
}

fn parse_optional_bool(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<bool>, EnvParseError> {
    let Some((raw, trimmed)) = present(map, var)? else {
        return Ok(None);
    };

    match trimmed.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(EnvParseError::InvalidBool {
            var,
            value: raw.clone(),
        }),
    }
}

fn parse_optional_url(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    let Some((raw, trimmed)) = present(map, var)? else {
        return Ok(None);
    };

    let invalid = || EnvParseError::InvalidUrl {
        var,
        value: raw.clone(),
    };
    let parsed = Url::parse(trimmed).map_err(|_| invalid())?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(invalid());
    }

    // Keep the caller's spelling; `Url` would append a trailing slash.
    Ok(Some(trimmed.into()))
}

fn parse_optional_key_values(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Vec<(Box<str>, Box<str>)>>, EnvParseError> {
    let Some((_, trimmed)) = present(map, var)? else {
        return Ok(None);
    };

    let mut pairs = Vec::new();
    for entry in trimmed.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        let Some((key, value)) = entry.split_once('=') else {
            return Err(EnvParseError::InvalidKeyValue {
                var,
                entry: entry.to_owned(),
            });
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(EnvParseError::InvalidKeyValue {
                var,
                entry: entry.to_owned(),
            });
        }
        pairs.push((Box::from(key), Box::from(value.trim())));
    }

    if pairs.len() > MAX_RESOURCE_ATTRIBUTES {
        return Err(EnvParseError::TooManyEntries {
            var,
            len: pairs.len(),
            max: MAX_RESOURCE_ATTRIBUTES,
        });
    }

    Ok(Some(pairs))
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[test]
    fn missing_vars_parse_to_none() -> Result<(), Box<dyn Error>> {
        let env = HarnessEnv::from_map(&BTreeMap::new())?;
        assert_eq!(env, HarnessEnv::default());
        Ok(())
    }

    #[test]
    fn url_validation_accepts_http_and_https_only() -> Result<(), Box<dyn Error>> {
        let env = HarnessEnv::from_map(&map(&[(ENV_MILVUS_URI, " https://milvus:443 ")]))?;
        assert_eq!(env.milvus_uri.as_deref(), Some("https://milvus:443"));

        let error = HarnessEnv::from_map(&map(&[(ENV_MILVUS_URI, "tcp://milvus:19530")])).err();
        assert!(matches!(error, Some(EnvParseError::InvalidUrl { .. })));
        Ok(())
    }

    #[test]
    fn bools_accept_common_spellings() -> Result<(), Box<dyn Error>> {
        for (raw, expected) in [("TRUE", true), ("1", true), ("off", false), ("no", false)] {
            let env = HarnessEnv::from_map(&map(&[(ENV_OTEL_SDK_DISABLED, raw)]))?;
            assert_eq!(env.otel_sdk_disabled, Some(expected), "input {raw}");
        }
        let error = HarnessEnv::from_map(&map(&[(ENV_OTEL_SDK_DISABLED, "maybe")])).err();
        assert!(matches!(error, Some(EnvParseError::InvalidBool { .. })));
        Ok(())
    }

    #[test]
    fn resource_attributes_keep_input_order() -> Result<(), Box<dyn Error>> {
        let env = HarnessEnv::from_map(&map(&[(
            ENV_OTEL_RESOURCE_ATTRIBUTES,
            "deployment.environment=ci, team = search,",
        )]))?;
        let pairs = env.otel_resource_attributes.unwrap_or_default();
        let pairs: Vec<(&str, &str)> = pairs
            .iter()
            .map(|(key, value)| (key.as_ref(), value.as_ref()))
            .collect();
        assert_eq!(pairs, vec![("deployment.environment", "ci"), ("team", "search")]);

        let error =
            HarnessEnv::from_map(&map(&[(ENV_OTEL_RESOURCE_ATTRIBUTES, "novalue")])).err();
        assert!(matches!(error, Some(EnvParseError::InvalidKeyValue { .. })));
        Ok(())
    }

    #[test]
    fn empty_secret_is_reported_without_its_value() -> Result<(), Box<dyn Error>> {
        let error = HarnessEnv::from_map(&map(&[(ENV_MILVUS_TOKEN, "  ")]))
            .err()
            .ok_or("expected an error")?;
        assert_eq!(error, EnvParseError::EmptySecret { var: ENV_MILVUS_TOKEN });

        let envelope = ErrorEnvelope::from(error);
        assert_eq!(envelope.code, ErrorCode::new("config", "empty_env_var"));
        assert!(!envelope.metadata.contains_key("value"));
        Ok(())
    }

    #[test]
    fn invalid_values_for_plain_vars_are_echoed() -> Result<(), Box<dyn Error>> {
        let error = HarnessEnv::from_map(&map(&[(ENV_MILVUS_TIMEOUT_MS, "soon")]))
            .err()
            .ok_or("expected an error")?;
        let envelope = ErrorEnvelope::from(error);
        assert_eq!(envelope.metadata.get("value").map(String::as_str), Some("soon"));
        assert_eq!(
            redact_if_secret(ENV_MILVUS_PASSWORD, "hunter2"),
            milvus_otel_shared::REDACTED
        );
        Ok(())
    }
}
