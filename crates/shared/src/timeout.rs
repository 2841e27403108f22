//! Deadline for a single remote call, racing the run's cancellation.

use crate::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result};
use std::future::Future;
use std::time::Duration;

/// Await `fut` for at most `timeout`, or until `ctx` is cancelled.
///
/// Elapsed deadlines map to a retriable `core:timeout` error carrying the
/// operation name and the limit in milliseconds.
pub async fn timeout_with_context<T, F>(
    ctx: &RequestContext,
    timeout: Duration,
    operation: &'static str,
    fut: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    ctx.ensure_not_cancelled(operation)?;

    tokio::select! {
        () = ctx.cancelled() => Err(
            ErrorEnvelope::cancelled("operation cancelled").with_metadata("operation", operation)
        ),
        res = tokio::time::timeout(timeout, fut) => res.unwrap_or_else(|_| {
            Err(ErrorEnvelope::unexpected(
                ErrorCode::timeout(),
                format!("{operation} timed out"),
                ErrorClass::Retriable,
            )
            .with_metadata("operation", operation)
            .with_metadata("timeoutMs", timeout.as_millis().to_string()))
        }),
    }
}
