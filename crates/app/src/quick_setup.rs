//! Quick-setup run: drop any leftover collection, create it, read its load
//! state, insert the batch, check the reported count and drop it again.
//!
//! [`run_quick_setup`] executes inside the `test_milvus_otel` span.
//! [`run_harness`] adds the `milvus_client_setup` span around client
//! construction and closes the client afterwards.

use crate::fixture::{QUICK_SETUP_RECORD_COUNT, quick_setup_batch, quick_setup_collection};
use milvus_otel_domain::{CollectionName, InsertOutcome, LoadState, RecordBatch};
use milvus_otel_ports::VectorDbPort;
use milvus_otel_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// Phase span wrapping client construction.
pub const SETUP_SPAN: &str = "milvus_client_setup";

/// Phase span wrapping the collection lifecycle.
pub const EXECUTION_SPAN: &str = "test_milvus_otel";

/// Step names recorded in logs and in the `step` error metadata.
pub mod step {
    /// Client construction.
    pub const CONNECT: &str = "connect";
    /// Existence check before creation.
    pub const HAS_COLLECTION: &str = "has_collection";
    /// Drop of a leftover collection.
    pub const DROP_EXISTING: &str = "drop_existing";
    /// Collection creation.
    pub const CREATE_COLLECTION: &str = "create_collection";
    /// Load state query.
    pub const GET_LOAD_STATE: &str = "get_load_state";
    /// Batch insert.
    pub const INSERT: &str = "insert";
    /// Insert count check.
    pub const ASSERT_INSERT_COUNT: &str = "assert_insert_count";
    /// Final drop.
    pub const DROP_COLLECTION: &str = "drop_collection";
    /// Client shutdown.
    pub const CLOSE: &str = "close";
}

/// What happens to the collection when a step fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupPolicy {
    /// Drop the collection even after a failure. Drop errors are logged and
    /// the original error is returned.
    #[default]
    Always,
    /// Only drop as the last step of a successful run.
    OnSuccess,
}

impl CleanupPolicy {
    /// Stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::OnSuccess => "on_success",
        }
    }
}

/// Input payload for a quick-setup run.
#[derive(Debug, Clone)]
pub struct QuickSetupInput {
    /// Collection to create and drop.
    pub collection_name: CollectionName,
    /// Rows to insert; its dimension is the collection dimension.
    pub batch: RecordBatch,
    /// Count the store must report for the insert.
    pub expected_insert_count: u64,
    /// Cleanup behavior on failure.
    pub cleanup: CleanupPolicy,
}

impl QuickSetupInput {
    /// `quick_setup`, dimension 5, the ten literal records, expecting 10.
    pub fn fixture() -> Result<Self> {
        Ok(Self {
            collection_name: quick_setup_collection()?,
            batch: quick_setup_batch()?,
            expected_insert_count: QUICK_SETUP_RECORD_COUNT,
            cleanup: CleanupPolicy::default(),
        })
    }

    /// Replace the collection name.
    #[must_use]
    pub fn with_collection(mut self, collection_name: CollectionName) -> Self {
        self.collection_name = collection_name;
        self
    }

    /// Replace the cleanup policy.
    #[must_use]
    pub const fn with_cleanup(mut self, cleanup: CleanupPolicy) -> Self {
        self.cleanup = cleanup;
        self
    }
}

/// Dependencies required by quick-setup.
#[derive(Clone)]
pub struct QuickSetupDeps {
    /// Vector DB adapter.
    pub vectordb: Arc<dyn VectorDbPort>,
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickSetupReport {
    /// Collection name.
    pub collection: String,
    /// Vector dimension.
    pub dimension: u32,
    /// A leftover collection was dropped first.
    pub dropped_existing: bool,
    /// Load state observed after creation.
    pub load_state: LoadState,
    /// Count reported by the store.
    pub insert_count: u64,
    /// The collection was dropped at the end.
    pub cleaned_up: bool,
    /// Wall time of the run.
    pub elapsed_ms: u64,
}

/// Run the procedure inside the `test_milvus_otel` span.
pub async fn run_quick_setup(
    ctx: &RequestContext,
    deps: &QuickSetupDeps,
    input: QuickSetupInput,
) -> Result<QuickSetupReport> {
    let span = tracing::info_span!(
        EXECUTION_SPAN,
        collection = %input.collection_name,
        correlation_id = ctx.correlation_id().as_str(),
    );
    execute(ctx, deps, input).instrument(span).await
}

/// Build the client inside `milvus_client_setup`, run the procedure, then
/// close the client.
///
/// A close failure only fails the run when the procedure succeeded.
pub async fn run_harness<C, F>(
    ctx: &RequestContext,
    connect: C,
    input: QuickSetupInput,
) -> Result<QuickSetupReport>
where
    C: FnOnce() -> F,
    F: Future<Output = Result<Arc<dyn VectorDbPort>>>,
{
    let vectordb = connect()
        .instrument(tracing::info_span!(SETUP_SPAN))
        .await
        .map_err(|error| error.with_step(step::CONNECT))?;
    tracing::debug!(provider = %vectordb.provider().id, "vector db client ready");

    let deps = QuickSetupDeps { vectordb };
    let result = run_quick_setup(ctx, &deps, input).await;
    let closed = deps.vectordb.close().await;

    match (result, closed) {
        (Ok(report), Ok(())) => Ok(report),
        (Ok(_), Err(error)) => Err(error.with_step(step::CLOSE)),
        (Err(error), closed) => {
            if let Err(close_error) = closed {
                tracing::warn!(
                    code = %close_error.code,
                    message = %close_error.message,
                    "close after failed run also failed"
                );
            }
            Err(error)
        },
    }
}

#[derive(Debug, Default)]
struct Progress {
    // Set once creation was attempted and cleared by a successful final drop.
    collection_may_exist: bool,
}

async fn execute(
    ctx: &RequestContext,
    deps: &QuickSetupDeps,
    input: QuickSetupInput,
) -> Result<QuickSetupReport> {
    let started_at = Instant::now();
    tracing::info!(
        provider = %deps.vectordb.provider().id,
        collection = %input.collection_name,
        dimension = input.batch.dimension().get(),
        records = input.batch.len(),
        cleanup = input.cleanup.as_str(),
        "quick setup started"
    );

    let mut progress = Progress::default();
    let result = run_steps(ctx, deps, &input, &mut progress).await;
    let duration_ms = duration_ms(started_at);

    match result {
        Ok(mut report) => {
            report.elapsed_ms = duration_ms;
            tracing::info!(
                collection = %report.collection,
                insert_count = report.insert_count,
                load_state = %report.load_state,
                duration_ms,
                "quick setup completed"
            );
            Ok(report)
        },
        Err(error) => {
            let step = error.step().unwrap_or("unknown");
            if error.is_cancelled() {
                tracing::warn!(step, duration_ms, "quick setup aborted");
            } else {
                tracing::error!(
                    step,
                    code = %error.code,
                    message = %error.message,
                    duration_ms,
                    "quick setup failed"
                );
            }
            if input.cleanup == CleanupPolicy::Always && progress.collection_may_exist {
                // A cancelled context would refuse the drop; keep the id only.
                let cleanup_ctx = if ctx.is_cancelled() {
                    ctx.detached()
                } else {
                    ctx.clone()
                };
                drop_after_failure(&cleanup_ctx, deps, &input.collection_name).await;
            }
            Err(error)
        },
    }
}

async fn run_steps(
    ctx: &RequestContext,
    deps: &QuickSetupDeps,
    input: &QuickSetupInput,
    progress: &mut Progress,
) -> Result<QuickSetupReport> {
    let vectordb = &deps.vectordb;
    let name = &input.collection_name;
    let dimension = input.batch.dimension();

    let exists = run_step(
        ctx,
        step::HAS_COLLECTION,
        vectordb.has_collection(ctx, name.clone()),
    )
    .await?;
    if exists {
        run_step(
            ctx,
            step::DROP_EXISTING,
            vectordb.drop_collection(ctx, name.clone()),
        )
        .await?;
    }

    progress.collection_may_exist = true;
    run_step(
        ctx,
        step::CREATE_COLLECTION,
        vectordb.create_collection(ctx, name.clone(), dimension),
    )
    .await?;

    let load_state = run_step(
        ctx,
        step::GET_LOAD_STATE,
        vectordb.get_load_state(ctx, name.clone()),
    )
    .await?;
    tracing::debug!(load_state = %load_state, "load state observed");

    let outcome = run_step(
        ctx,
        step::INSERT,
        vectordb.insert(ctx, name.clone(), input.batch.clone()),
    )
    .await?;
    check_insert_count(input.expected_insert_count, &outcome)
        .map_err(|error| error.with_step(step::ASSERT_INSERT_COUNT))?;

    run_step(
        ctx,
        step::DROP_COLLECTION,
        vectordb.drop_collection(ctx, name.clone()),
    )
    .await?;
    progress.collection_may_exist = false;

    Ok(QuickSetupReport {
        collection: name.to_string(),
        dimension: dimension.get(),
        dropped_existing: exists,
        load_state,
        insert_count: outcome.insert_count,
        cleaned_up: true,
        elapsed_ms: 0,
    })
}

async fn run_step<T, F>(ctx: &RequestContext, step: &'static str, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if let Err(error) = ctx.ensure_not_cancelled(step) {
        return Err(error.with_step(step));
    }
    tracing::debug!(step, "step started");
    let value = call.await.map_err(|error| error.with_step(step))?;
    tracing::debug!(step, "step completed");
    Ok(value)
}

/// Fails with `harness:insert_count_mismatch` unless the store reported
/// exactly `expected` rows.
pub fn check_insert_count(expected: u64, outcome: &InsertOutcome) -> Result<()> {
    let actual = outcome.insert_count;
    if actual == expected {
        return Ok(());
    }
    Err(ErrorEnvelope::expected(
        ErrorCode::new("harness", "insert_count_mismatch"),
        format!("insert_count mismatch: expected {expected}, got {actual}"),
    )
    .with_metadata("expected", expected.to_string())
    .with_metadata("actual", actual.to_string()))
}

async fn drop_after_failure(
    ctx: &RequestContext,
    deps: &QuickSetupDeps,
    collection_name: &CollectionName,
) {
    match deps
        .vectordb
        .drop_collection(ctx, collection_name.clone())
        .await
    {
        Ok(()) => {
            tracing::info!(collection = %collection_name, "collection dropped after failure");
        },
        Err(error) => {
            tracing::warn!(
                collection = %collection_name,
                code = %error.code,
                message = %error.message,
                "cleanup drop failed"
            );
        },
    }
}

fn duration_ms(started_at: Instant) -> u64 {
    u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_count_passes() -> Result<()> {
        let outcome = InsertOutcome {
            insert_count: 10,
            ids: (0..10).collect(),
        };
        check_insert_count(10, &outcome)
    }

    #[test]
    fn mismatch_names_expected_and_actual() {
        let outcome = InsertOutcome {
            insert_count: 9,
            ids: Vec::new(),
        };
        let error = check_insert_count(10, &outcome).expect_err("mismatch");
        assert_eq!(error.code, ErrorCode::new("harness", "insert_count_mismatch"));
        assert!(error.message.contains("expected 10"));
        assert!(error.message.contains("got 9"));
        assert_eq!(error.metadata.get("expected").map(String::as_str), Some("10"));
        assert_eq!(error.metadata.get("actual").map(String::as_str), Some("9"));
    }

    #[test]
    fn fixture_input_defaults_to_always_cleanup() -> Result<()> {
        let input = QuickSetupInput::fixture()?;
        assert_eq!(input.collection_name.as_str(), "quick_setup");
        assert_eq!(input.batch.dimension().get(), 5);
        assert_eq!(input.expected_insert_count, 10);
        assert_eq!(input.cleanup, CleanupPolicy::Always);
        Ok(())
    }

    #[test]
    fn report_serializes_in_camel_case() -> std::result::Result<(), serde_json::Error> {
        let report = QuickSetupReport {
            collection: "quick_setup".to_owned(),
            dimension: 5,
            dropped_existing: false,
            load_state: LoadState::Loaded,
            insert_count: 10,
            cleaned_up: true,
            elapsed_ms: 12,
        };
        let json = serde_json::to_value(&report)?;
        assert_eq!(
            json,
            serde_json::json!({
                "collection": "quick_setup",
                "dimension": 5,
                "droppedExisting": false,
                "loadState": "loaded",
                "insertCount": 10,
                "cleanedUp": true,
                "elapsedMs": 12,
            })
        );
        Ok(())
    }
}
