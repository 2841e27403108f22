//! Request-scoped context: correlation id plus cooperative cancellation.

use crate::{ErrorCode, ErrorEnvelope, Result};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Notify;

static RUN_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identifier stamped on every log line and span of one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(Arc<str>);

impl CorrelationId {
    /// Parse a caller-supplied id. The value is trimmed and must be non-empty.
    pub fn parse(value: impl AsRef<str>) -> Result<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "correlation id must be non-empty",
            ));
        }
        Ok(Self(Arc::from(trimmed)))
    }

    /// Next `run_<n>` id, unique within the process.
    #[must_use]
    pub fn next_run_id() -> Self {
        let n = RUN_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(Arc::from(format!("run_{n}")))
    }

    /// Borrow the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Clonable, awaitable cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<CancellationState>,
}

#[derive(Debug, Default)]
struct CancellationState {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancellationToken {
    /// New token in the non-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel and wake all waiters. Idempotent.
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    /// Returns true once cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve when the token is cancelled.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Context passed to every port call of a run.
#[derive(Debug, Clone)]
pub struct RequestContext {
    correlation_id: CorrelationId,
    cancellation: CancellationToken,
}

impl RequestContext {
    /// Context with a fresh cancellation token.
    #[must_use]
    pub fn new(correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id,
            cancellation: CancellationToken::new(),
        }
    }

    /// Context with an auto-generated `run_*` id.
    #[must_use]
    pub fn new_run() -> Self {
        Self::new(CorrelationId::next_run_id())
    }

    /// Return the correlation id.
    #[must_use]
    pub const fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    /// Same correlation id with a new, non-cancelled token.
    ///
    /// Used for cleanup calls that must still run after the run was
    /// cancelled.
    #[must_use]
    pub fn detached(&self) -> Self {
        Self::new(self.correlation_id.clone())
    }

    /// Clone of the cancellation token, for handing to another task.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Returns true if the run was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Cancel the run.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Resolve on cancellation.
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await;
    }

    /// Fail with `core:cancelled` if the run was cancelled.
    pub fn ensure_not_cancelled(&self, operation: &'static str) -> Result<()> {
        if self.is_cancelled() {
            return Err(ErrorEnvelope::cancelled("operation cancelled")
                .with_metadata("operation", operation)
                .with_metadata("correlationId", self.correlation_id.as_str()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_id_rejects_blank_input() {
        assert!(CorrelationId::parse("   ").is_err());
        assert!(matches!(CorrelationId::parse(" run_a "), Ok(id) if id.as_str() == "run_a"));
    }

    #[test]
    fn run_ids_are_distinct() {
        let first = CorrelationId::next_run_id();
        let second = CorrelationId::next_run_id();
        assert_ne!(first, second);
        assert!(first.as_str().starts_with("run_"));
    }

    #[test]
    fn cancelled_context_fails_fast() {
        let ctx = RequestContext::new_run();
        assert!(ctx.ensure_not_cancelled("insert").is_ok());
        ctx.cancel();
        let error = ctx.ensure_not_cancelled("insert").err();
        assert!(error.is_some_and(|error| error.is_cancelled()
            && error.metadata.get("operation").map(String::as_str) == Some("insert")));
    }

    #[test]
    fn detached_context_keeps_the_id_but_not_the_cancellation() {
        let ctx = RequestContext::new_run();
        ctx.cancel();
        let detached = ctx.detached();
        assert_eq!(detached.correlation_id(), ctx.correlation_id());
        assert!(detached.ensure_not_cancelled("drop_collection").is_ok());
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn cancellation_wakes_waiters() {
        let ctx = RequestContext::new_run();
        let token = ctx.cancellation_token();
        let waiter = tokio::spawn(async move { ctx.cancelled().await });
        tokio::task::yield_now().await;
        token.cancel();
        assert!(waiter.await.is_ok());
    }
}
