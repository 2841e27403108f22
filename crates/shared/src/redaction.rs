//! Keeping secrets out of logs, reports and error metadata.

use std::fmt;

/// Placeholder printed instead of a secret.
pub const REDACTED: &str = "[REDACTED]";

const SECRET_MARKERS: [&str; 5] = ["TOKEN", "SECRET", "PASSWORD", "CREDENTIAL", "AUTH"];

/// Returns true when a variable or metadata key names a secret.
///
/// ```
/// use milvus_otel_shared::is_secret_key;
///
/// assert!(is_secret_key("MILVUS_TOKEN"));
/// assert!(is_secret_key("milvus_password"));
/// assert!(!is_secret_key("MILVUS_URI"));
/// ```
pub fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    key.ends_with("_KEY") || SECRET_MARKERS.iter().any(|marker| key.contains(marker))
}

/// Returns [`REDACTED`] for secret keys and the value otherwise.
pub fn redact_if_secret(key: &str, value: &str) -> String {
    if is_secret_key(key) {
        REDACTED.to_owned()
    } else {
        value.to_owned()
    }
}

/// String that never prints its contents.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SecretString(Box<str>);

impl SecretString {
    /// Wrap a secret value.
    pub fn new(value: impl Into<Box<str>>) -> Self {
        Self(value.into())
    }

    /// Borrow the secret. Call sites are the only place it leaves the wrapper.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(REDACTED)
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(REDACTED)
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value.into_boxed_str())
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_harness_secrets() {
        assert!(is_secret_key("MILVUS_TOKEN"));
        assert!(is_secret_key("MILVUS_PASSWORD"));
        assert!(is_secret_key("authorization"));
        assert!(is_secret_key("OTEL_API_KEY"));
    }

    #[test]
    fn leaves_plain_settings_alone() {
        assert!(!is_secret_key("MILVUS_URI"));
        assert!(!is_secret_key("MILVUS_USER"));
        assert!(!is_secret_key("OTEL_SERVICE_NAME"));
        assert!(!is_secret_key("MILVUS_TIMEOUT_MS"));
        assert_eq!(redact_if_secret("MILVUS_DB_NAME", "default"), "default");
        assert_eq!(redact_if_secret("MILVUS_TOKEN", "root:Milvus"), REDACTED);
    }

    #[test]
    fn secret_string_never_formats_its_value() {
        let secret = SecretString::from("root:Milvus");
        assert_eq!(secret.to_string(), REDACTED);
        assert_eq!(format!("{secret:?}"), REDACTED);
        assert_eq!(secret.expose(), "root:Milvus");
    }
}
