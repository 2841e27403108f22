//! Error fixtures shared by the test doubles.

use crate::in_memory::Operation;
use milvus_otel_shared::{ErrorClass, ErrorCode, ErrorEnvelope};

/// Code carried by every injected failure.
pub fn injected_failure_code() -> ErrorCode {
    ErrorCode::new("testkit", "injected_failure")
}

/// Failure returned by [`crate::FaultyVectorDb`] for `operation`.
pub fn injected_failure(operation: Operation) -> ErrorEnvelope {
    ErrorEnvelope::unexpected(
        injected_failure_code(),
        format!("injected failure in {}", operation.as_str()),
        ErrorClass::NonRetriable,
    )
    .with_metadata("operation", operation.as_str())
}

/// Error for calls made after `close`.
pub fn closed_error(operation: Operation) -> ErrorEnvelope {
    ErrorEnvelope::expected(
        ErrorCode::new("vector", "vdb_closed"),
        "vector DB client is closed",
    )
    .with_metadata("operation", operation.as_str())
}

/// Error for operations on a collection that does not exist.
pub fn collection_not_found(name: &str) -> ErrorEnvelope {
    ErrorEnvelope::expected(
        ErrorCode::new("vector", "vdb_collection_not_found"),
        format!("collection not found: {name}"),
    )
    .with_metadata("collection", name)
}
