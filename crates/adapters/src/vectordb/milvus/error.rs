//! Milvus error mapping helpers.

use crate::vectordb::milvus::proto::common::{ErrorCode as ProtoErrorCode, Status};
use milvus_otel_shared::{ErrorClass, ErrorCode, ErrorEnvelope};

/// Provider identifier recorded in error metadata.
pub const PROVIDER_ID: &str = "milvus_grpc";

#[derive(Debug, Clone)]
/// Context payload attached to Milvus error envelopes.
pub struct MilvusErrorContext {
    /// Operation label for tracing failures.
    pub operation: &'static str,
    /// Collection name, when the request is collection-scoped.
    pub collection_name: Option<String>,
}

impl MilvusErrorContext {
    fn annotate(&self, envelope: ErrorEnvelope) -> ErrorEnvelope {
        let envelope = envelope
            .with_metadata("provider", PROVIDER_ID)
            .with_metadata("operation", self.operation);
        match self.collection_name.as_ref() {
            Some(collection) => envelope.with_metadata("collection", collection.to_owned()),
            None => envelope,
        }
    }
}

/// Maps a tonic gRPC status into the shared error envelope format.
pub fn map_grpc_error(status: &tonic::Status, ctx: &MilvusErrorContext) -> ErrorEnvelope {
    let code = match status.code() {
        tonic::Code::Unauthenticated | tonic::Code::PermissionDenied => vdb_auth_code(),
        tonic::Code::DeadlineExceeded => vdb_timeout_code(),
        tonic::Code::Unavailable => vdb_connection_code(),
        tonic::Code::InvalidArgument => vdb_query_invalid_code(),
        tonic::Code::NotFound => vdb_collection_not_found_code(),
        _ => vdb_unknown_code(),
    };
    let class = class_for(&code);

    let envelope = ErrorEnvelope::unexpected(code, status.message().to_owned(), class)
        .with_metadata("grpc_code", status.code().to_string());
    ctx.annotate(envelope)
}

/// Maps a non-success Milvus `Status` into a shared error envelope.
///
/// The legacy `error_code` wins when set; otherwise the reason text decides.
pub fn map_status_error(status: &Status, ctx: &MilvusErrorContext) -> ErrorEnvelope {
    let legacy = ProtoErrorCode::try_from(status.error_code).ok();
    let error_code = match legacy {
        Some(ProtoErrorCode::Success) | None => choose_code_from_reason(&status.reason),
        Some(ProtoErrorCode::PermissionDenied) => vdb_auth_code(),
        Some(ProtoErrorCode::ConnectFailed) => vdb_connection_code(),
        Some(ProtoErrorCode::CollectionNotExists) => vdb_collection_not_found_code(),
        Some(
            ProtoErrorCode::IllegalArgument
            | ProtoErrorCode::IllegalTopk
            | ProtoErrorCode::IllegalCollectionName,
        ) => vdb_query_invalid_code(),
        Some(
            ProtoErrorCode::IllegalDimension
            | ProtoErrorCode::IllegalIndexType
            | ProtoErrorCode::IllegalMetricType,
        ) => vdb_schema_mismatch_code(),
        Some(ProtoErrorCode::UnexpectedError) => vdb_unknown_code(),
    };
    let class = if status.retriable {
        ErrorClass::Retriable
    } else {
        class_for(&error_code)
    };

    let envelope = ErrorEnvelope::unexpected(error_code, status.reason.clone(), class)
        .with_metadata("status_code", status.code.to_string())
        .with_metadata("legacy_error_code", status.error_code.to_string());
    ctx.annotate(envelope)
}

/// Fails with the mapped error unless `status` reports success.
pub fn ensure_status_ok(status: &Status, ctx: &MilvusErrorContext) -> Result<(), ErrorEnvelope> {
    if status.is_success() {
        return Ok(());
    }
    Err(map_status_error(status, ctx))
}

fn class_for(code: &ErrorCode) -> ErrorClass {
    match code.code() {
        "vdb_timeout" | "vdb_connection" => ErrorClass::Retriable,
        _ => ErrorClass::NonRetriable,
    }
}

fn choose_code_from_reason(reason: &str) -> ErrorCode {
    let reason = reason.to_ascii_lowercase();
    if reason.contains("collection not found") || reason.contains("can't find collection") {
        return vdb_collection_not_found_code();
    }
    if reason.contains("timeout") || reason.contains("deadline") {
        return vdb_timeout_code();
    }
    if reason.contains("unauthorized") || reason.contains("permission") || reason.contains("auth")
    {
        return vdb_auth_code();
    }
    if reason.contains("schema")
        || reason.contains("dimension")
        || reason.contains("datatype")
        || reason.contains("field")
    {
        return vdb_schema_mismatch_code();
    }
    if reason.contains("invalid") || reason.contains("illegal") {
        return vdb_query_invalid_code();
    }

    vdb_unknown_code()
}

fn vdb_auth_code() -> ErrorCode {
    ErrorCode::new("vector", "vdb_auth")
}

fn vdb_timeout_code() -> ErrorCode {
    ErrorCode::new("vector", "vdb_timeout")
}

fn vdb_connection_code() -> ErrorCode {
    ErrorCode::new("vector", "vdb_connection")
}

fn vdb_collection_not_found_code() -> ErrorCode {
    ErrorCode::new("vector", "vdb_collection_not_found")
}

fn vdb_schema_mismatch_code() -> ErrorCode {
    ErrorCode::new("vector", "vdb_schema_mismatch")
}

fn vdb_query_invalid_code() -> ErrorCode {
    ErrorCode::new("vector", "vdb_query_invalid")
}

fn vdb_unknown_code() -> ErrorCode {
    ErrorCode::new("vector", "vdb_unknown")
}
