//! # milvus-otel-shared
//!
//! Shared result types, error envelopes, and request context for the
//! milvus-otel workspace.
//!
//! - Result and error envelope types
//! - Request-scoped context (correlation id + cancellation)
//! - Secret redaction helpers
//!
//! ## Design Principles
//!
//! 1. **No workspace dependencies** - This crate only depends on external crates
//! 2. **Serde-compatible** - Error envelopes serialize for reports and logs

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod context;
pub mod errors;
pub mod redaction;
pub mod result;
pub mod timeout;

pub use context::{CancellationToken, CorrelationId, RequestContext};
pub use errors::{
    ErrorClass, ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata, STEP_METADATA_KEY,
};
pub use redaction::{REDACTED, SecretString, is_secret_key, redact_if_secret};
pub use result::Result;
pub use timeout::timeout_with_context;
