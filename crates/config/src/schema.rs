//! Harness configuration schema and validation.

use milvus_otel_shared::{ErrorCode, ErrorEnvelope, SecretString};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Default Milvus gRPC endpoint.
pub const DEFAULT_MILVUS_URI: &str = "http://localhost:19530";
/// Default OTLP/gRPC collector endpoint.
pub const DEFAULT_OTLP_ENDPOINT: &str = "http://localhost:4317";
/// Default `service.name` resource attribute.
pub const DEFAULT_SERVICE_NAME: &str = "milvus-client";

const MILVUS_TIMEOUT_MIN_MS: u64 = 100;
const MILVUS_TIMEOUT_MAX_MS: u64 = 600_000;
const MILVUS_LOAD_TIMEOUT_MIN_MS: u64 = 1_000;
const MILVUS_LOAD_TIMEOUT_MAX_MS: u64 = 3_600_000;
const OTLP_TIMEOUT_MIN_MS: u64 = 100;
const OTLP_TIMEOUT_MAX_MS: u64 = 120_000;

/// Top-level harness configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarnessConfig {
    /// Milvus client settings.
    pub milvus: MilvusConfig,
    /// Tracing and export settings.
    pub telemetry: TelemetryConfig,
}

impl HarnessConfig {
    /// Validate and normalize the config.
    pub fn validate_and_normalize(mut self) -> Result<ValidatedHarnessConfig, ConfigSchemaError> {
        self.milvus.validate()?;
        self.telemetry.normalize();
        self.telemetry.validate()?;
        Ok(ValidatedHarnessConfig { raw: self })
    }
}

/// Config that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedHarnessConfig {
    raw: HarnessConfig,
}

impl ValidatedHarnessConfig {
    /// Consume the wrapper and return the raw config.
    #[must_use]
    pub fn into_inner(self) -> HarnessConfig {
        self.raw
    }
}

impl AsRef<HarnessConfig> for ValidatedHarnessConfig {
    fn as_ref(&self) -> &HarnessConfig {
        &self.raw
    }
}

impl std::ops::Deref for ValidatedHarnessConfig {
    type Target = HarnessConfig;

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

/// Milvus client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilvusConfig {
    /// gRPC endpoint (`http://` or `https://`).
    pub uri: Box<str>,
    /// Database name sent as `dbname` metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_name: Option<Box<str>>,
    /// Optional auth token (kept in memory; not serialized).
    #[serde(skip_serializing)]
    pub token: Option<SecretString>,
    /// Optional auth username.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Box<str>>,
    /// Optional auth password (kept in memory; not serialized).
    #[serde(skip_serializing)]
    pub password: Option<SecretString>,
    /// Per-call timeout (ms).
    pub timeout_ms: u64,
    /// Upper bound on waiting for a collection to load (ms).
    pub load_timeout_ms: u64,
}

impl Default for MilvusConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_MILVUS_URI.into(),
            db_name: None,
            token: None,
            user: None,
            password: None,
            timeout_ms: 30_000,
            load_timeout_ms: 60_000,
        }
    }
}

/// Credentials resolved from [`MilvusConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MilvusAuth {
    /// No credentials.
    None,
    /// API token.
    Token(SecretString),
    /// Username and password.
    Basic {
        /// Username.
        user: Box<str>,
        /// Password.
        password: SecretString,
    },
}

impl MilvusConfig {
    /// Resolve credentials. A token wins over username/password.
    #[must_use]
    pub fn auth(&self) -> MilvusAuth {
        match (&self.token, &self.user, &self.password) {
            (Some(token), _, _) => MilvusAuth::Token(token.clone()),
            (None, Some(user), Some(password)) => MilvusAuth::Basic {
                user: user.clone(),
                password: password.clone(),
            },
            _ => MilvusAuth::None,
        }
    }

    /// Per-call timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Wait-for-load timeout.
    #[must_use]
    pub const fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    fn validate(&self) -> Result<(), ConfigSchemaError> {
        validate_http_url("milvus", "uri", &self.uri)?;
        validate_timeout_ms(
            "milvus",
            "timeoutMs",
            self.timeout_ms,
            MILVUS_TIMEOUT_MIN_MS,
            MILVUS_TIMEOUT_MAX_MS,
        )?;
        validate_timeout_ms(
            "milvus",
            "loadTimeoutMs",
            self.load_timeout_ms,
            MILVUS_LOAD_TIMEOUT_MIN_MS,
            MILVUS_LOAD_TIMEOUT_MAX_MS,
        )?;
        if self.token.is_none() && self.user.is_some() != self.password.is_some() {
            return Err(ConfigSchemaError::IncompleteCredentials {
                missing: if self.user.is_some() {
                    "password"
                } else {
                    "user"
                },
            });
        }
        Ok(())
    }
}

/// OpenTelemetry settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryConfig {
    /// Export spans over OTLP. Console logging stays on either way.
    pub enabled: bool,
    /// OTLP/gRPC collector endpoint.
    pub endpoint: Box<str>,
    /// `service.name` resource attribute.
    pub service_name: Box<str>,
    /// Export timeout (ms).
    pub export_timeout_ms: u64,
    /// Extra resource attributes, in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resource_attributes: Vec<(Box<str>, Box<str>)>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_OTLP_ENDPOINT.into(),
            service_name: DEFAULT_SERVICE_NAME.into(),
            export_timeout_ms: 10_000,
            resource_attributes: Vec::new(),
        }
    }
}

impl TelemetryConfig {
    /// Export timeout.
    #[must_use]
    pub const fn export_timeout(&self) -> Duration {
        Duration::from_millis(self.export_timeout_ms)
    }

    fn normalize(&mut self) {
        // Later duplicates win, keeping the position of the first.
        let mut deduped: Vec<(Box<str>, Box<str>)> = Vec::new();
        for (key, value) in self.resource_attributes.drain(..) {
            match deduped.iter_mut().find(|(existing, _)| *existing == key) {
                Some(slot) => slot.1 = value,
                None => deduped.push((key, value)),
            }
        }
        self.resource_attributes = deduped;
    }

    fn validate(&self) -> Result<(), ConfigSchemaError> {
        validate_http_url("telemetry", "endpoint", &self.endpoint)?;
        if self.service_name.trim().is_empty() {
            return Err(ConfigSchemaError::EmptyField {
                section: "telemetry",
                field: "serviceName",
            });
        }
        validate_timeout_ms(
            "telemetry",
            "exportTimeoutMs",
            self.export_timeout_ms,
            OTLP_TIMEOUT_MIN_MS,
            OTLP_TIMEOUT_MAX_MS,
        )
    }
}

/// Typed validation errors for the configuration schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSchemaError {
    /// A timeout value is out of bounds.
    TimeoutOutOfRange {
        /// Schema section (e.g. `milvus`).
        section: &'static str,
        /// Field name (e.g. `timeoutMs`).
        field: &'static str,
        /// Value provided (ms).
        value_ms: u64,
        /// Minimum allowed value (ms).
        min_ms: u64,
        /// Maximum allowed value (ms).
        max_ms: u64,
    },
    /// A URL entry is invalid.
    InvalidUrl {
        /// Schema section.
        section: &'static str,
        /// Field name.
        field: &'static str,
        /// Invalid URL value.
        url: String,
    },
    /// A required string is empty.
    EmptyField {
        /// Schema section.
        section: &'static str,
        /// Field name.
        field: &'static str,
    },
    /// Only one half of username/password was supplied.
    IncompleteCredentials {
        /// The missing half.
        missing: &'static str,
    },
}

impl ConfigSchemaError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::TimeoutOutOfRange { .. } => ErrorCode::new("config", "invalid_timeout"),
            Self::InvalidUrl { .. } => ErrorCode::new("config", "invalid_url"),
            Self::EmptyField { .. } => ErrorCode::new("config", "empty_field"),
            Self::IncompleteCredentials { .. } => {
                ErrorCode::new("config", "incomplete_credentials")
            },
        }
    }
}

impl fmt::Display for ConfigSchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimeoutOutOfRange {
                section,
                field,
                value_ms,
                min_ms,
                max_ms,
            } => write!(
                formatter,
                "{section}.{field} must be within [{min_ms}, {max_ms}] ms (got {value_ms})"
            ),
            Self::InvalidUrl { section, field, .. } => {
                write!(formatter, "invalid URL for {section}.{field}")
            },
            Self::EmptyField { section, field } => {
                write!(formatter, "{section}.{field} must be non-empty")
            },
            Self::IncompleteCredentials { missing } => {
                write!(formatter, "milvus credentials are missing the {missing}")
            },
        }
    }
}

impl std::error::Error for ConfigSchemaError {}

impl From<ConfigSchemaError> for ErrorEnvelope {
    fn from(error: ConfigSchemaError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());

        match error {
            ConfigSchemaError::TimeoutOutOfRange {
                section,
                field,
                value_ms,
                min_ms,
                max_ms,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("value_ms", value_ms.to_string())
                .with_metadata("min_ms", min_ms.to_string())
                .with_metadata("max_ms", max_ms.to_string()),
            ConfigSchemaError::InvalidUrl {
                section,
                field,
                url,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("url", url),
            ConfigSchemaError::EmptyField { section, field } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field),
            ConfigSchemaError::IncompleteCredentials { missing } => {
                envelope.with_metadata("missing", missing)
            },
        }
    }
}

const fn validate_timeout_ms(
    section: &'static str,
    field: &'static str,
    value_ms: u64,
    min_ms: u64,
    max_ms: u64,
) -> Result<(), ConfigSchemaError> {
    if value_ms < min_ms || value_ms > max_ms {
        return Err(ConfigSchemaError::TimeoutOutOfRange {
            section,
            field,
            value_ms,
            min_ms,
            max_ms,
        });
    }
    Ok(())
}

fn validate_http_url(
    section: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), ConfigSchemaError> {
    let invalid = || ConfigSchemaError::InvalidUrl {
        section,
        field,
        url: value.to_owned(),
    };
    let parsed = Url::parse(value).map_err(|_| invalid())?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(invalid());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = HarnessConfig::default().validate_and_normalize();
        assert!(config.is_ok_and(|config| config.milvus.uri.as_ref() == DEFAULT_MILVUS_URI
            && config.telemetry.service_name.as_ref() == DEFAULT_SERVICE_NAME));
    }

    #[test]
    fn token_wins_over_basic_auth() {
        let config = MilvusConfig {
            token: Some(SecretString::from("root:Milvus")),
            user: Some("root".into()),
            password: Some(SecretString::from("Milvus")),
            ..MilvusConfig::default()
        };
        assert!(matches!(config.auth(), MilvusAuth::Token(_)));

        let basic = MilvusConfig {
            token: None,
            ..config
        };
        assert!(matches!(basic.auth(), MilvusAuth::Basic { ref user, .. } if user.as_ref() == "root"));
    }

    #[test]
    fn half_credentials_are_rejected() {
        let mut config = HarnessConfig::default();
        config.milvus.user = Some("root".into());
        let error = config.validate_and_normalize().err();
        assert_eq!(
            error,
            Some(ConfigSchemaError::IncompleteCredentials { missing: "password" })
        );
    }

    #[test]
    fn out_of_range_timeout_is_rejected() {
        let mut config = HarnessConfig::default();
        config.milvus.timeout_ms = 1;
        let error = config.validate_and_normalize().err();
        assert!(matches!(
            error,
            Some(ConfigSchemaError::TimeoutOutOfRange { field: "timeoutMs", .. })
        ));
    }

    #[test]
    fn duplicate_resource_attributes_keep_last_value() -> Result<(), ConfigSchemaError> {
        let mut config = HarnessConfig::default();
        config.telemetry.resource_attributes = vec![
            ("team".into(), "a".into()),
            ("env".into(), "ci".into()),
            ("team".into(), "b".into()),
        ];
        let config = config.validate_and_normalize()?;
        let pairs: Vec<(&str, &str)> = config
            .telemetry
            .resource_attributes
            .iter()
            .map(|(key, value)| (key.as_ref(), value.as_ref()))
            .collect();
        assert_eq!(pairs, vec![("team", "b"), ("env", "ci")]);
        Ok(())
    }

    #[test]
    fn secrets_are_never_serialized() -> Result<(), serde_json::Error> {
        let config = MilvusConfig {
            token: Some(SecretString::from("root:Milvus")),
            ..MilvusConfig::default()
        };
        let json = serde_json::to_string(&config)?;
        assert!(!json.contains("root:Milvus"));
        assert!(!json.contains("token"));
        Ok(())
    }
}
