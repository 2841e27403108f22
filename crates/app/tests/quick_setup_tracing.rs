//! Phase spans and telemetry failure handling around the quick-setup run.

use milvus_otel_adapters::{LogFormat, init_telemetry, init_telemetry_with_exporter};
use milvus_otel_app::{EXECUTION_SPAN, QuickSetupInput, SETUP_SPAN, run_harness};
use milvus_otel_config::TelemetryConfig;
use milvus_otel_ports::VectorDbPort;
use milvus_otel_shared::{ErrorEnvelope, RequestContext, Result};
use milvus_otel_testkit::{FaultyVectorDb, InMemoryVectorDb};
use opentelemetry::trace::SpanId;
use opentelemetry_sdk::trace::{InMemorySpanExporter, SpanData};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn find<'a>(spans: &'a [SpanData], name: &str) -> &'a SpanData {
    spans
        .iter()
        .find(|span| span.name == name)
        .unwrap_or_else(|| unreachable!("span {name} not exported"))
}

fn attribute(span: &SpanData, key: &str) -> Option<String> {
    span.attributes
        .iter()
        .find(|kv| kv.key.as_str() == key)
        .map(|kv| kv.value.as_str().into_owned())
}

#[tokio::test(flavor = "multi_thread")]
async fn phase_spans_are_exported_as_separate_roots() -> Result<()> {
    let exporter = InMemorySpanExporter::default();
    let (guard, _tracing) = init_telemetry_with_exporter(
        &TelemetryConfig::default(),
        LogFormat::Text,
        exporter.clone(),
    );
    let ctx = RequestContext::new_run();
    let store = Arc::new(InMemoryVectorDb::default());
    let connected = store.clone();

    let report = run_harness(
        &ctx,
        || async move { Ok::<Arc<dyn VectorDbPort>, ErrorEnvelope>(connected) },
        QuickSetupInput::fixture()?,
    )
    .await?;
    assert_eq!(report.insert_count, 10);

    guard.force_flush().expect("flush");
    let spans = exporter.get_finished_spans().expect("finished spans");
    let setup = find(&spans, SETUP_SPAN);
    let execution = find(&spans, EXECUTION_SPAN);

    assert_eq!(setup.parent_span_id, SpanId::INVALID);
    assert_eq!(execution.parent_span_id, SpanId::INVALID);
    assert_ne!(
        setup.span_context.trace_id(),
        execution.span_context.trace_id()
    );
    assert_eq!(
        attribute(execution, "collection").as_deref(),
        Some("quick_setup")
    );
    assert_eq!(
        attribute(execution, "correlation_id").as_deref(),
        Some(ctx.correlation_id().as_str())
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn execution_span_ends_when_the_run_fails() -> Result<()> {
    let exporter = InMemorySpanExporter::default();
    let (guard, _tracing) = init_telemetry_with_exporter(
        &TelemetryConfig::default(),
        LogFormat::Json,
        exporter.clone(),
    );
    let ctx = RequestContext::new_run();
    let store: Arc<dyn VectorDbPort> =
        Arc::new(FaultyVectorDb::default().reporting_insert_count(3));

    let result = run_harness(
        &ctx,
        || async move { Ok::<_, ErrorEnvelope>(store) },
        QuickSetupInput::fixture()?,
    )
    .await;
    assert!(result.is_err());

    guard.force_flush().expect("flush");
    let spans = exporter.get_finished_spans().expect("finished spans");
    find(&spans, SETUP_SPAN);
    find(&spans, EXECUTION_SPAN);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_exporter_does_not_affect_the_run() -> Result<()> {
    let config = TelemetryConfig {
        endpoint: "http://127.0.0.1:1".into(),
        export_timeout_ms: 200,
        ..TelemetryConfig::default()
    };
    let (guard, tracing) = init_telemetry(&config, LogFormat::Text).expect("telemetry init");
    assert!(tracing.is_exporting());

    let ctx = RequestContext::new_run();
    let store = Arc::new(InMemoryVectorDb::default());
    let connected = store.clone();
    let report = run_harness(
        &ctx,
        || async move { Ok::<Arc<dyn VectorDbPort>, ErrorEnvelope>(connected) },
        QuickSetupInput::fixture()?,
    )
    .await?;

    assert_eq!(report.insert_count, 10);
    assert!(store.collection_names().await.is_empty());

    // Export failures are logged by the guard, never returned.
    let started = Instant::now();
    drop(guard);
    assert!(started.elapsed() < Duration::from_secs(30));
    Ok(())
}
