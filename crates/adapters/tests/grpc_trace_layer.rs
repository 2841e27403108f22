//! Client span and `traceparent` injection through the tower layer.

use milvus_otel_adapters::{
    GrpcTraceLayer, LogFormat, TracingContext, init_telemetry_with_exporter,
};
use milvus_otel_config::TelemetryConfig;
use opentelemetry::trace::SpanKind;
use opentelemetry_sdk::trace::{InMemorySpanExporter, SpanData};
use std::convert::Infallible;
use tonic::codegen::http::Request;
use tower::{Layer, ServiceExt, service_fn};
use tracing::Instrument;

const INSERT_PATH: &str = "/milvus.proto.milvus.MilvusService/Insert";

fn echo_traceparent(
    layer: &GrpcTraceLayer,
) -> impl tower::Service<Request<()>, Response = Option<String>, Error = Infallible> {
    layer.layer(service_fn(|request: Request<()>| async move {
        Ok::<_, Infallible>(
            request
                .headers()
                .get("traceparent")
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned),
        )
    }))
}

fn attribute(span: &SpanData, key: &str) -> Option<String> {
    span.attributes
        .iter()
        .find(|kv| kv.key.as_str() == key)
        .map(|kv| kv.value.as_str().into_owned())
}

fn find<'a>(spans: &'a [SpanData], name: &str) -> &'a SpanData {
    spans
        .iter()
        .find(|span| span.name == name)
        .unwrap_or_else(|| unreachable!("span {name} not exported"))
}

#[tokio::test(flavor = "multi_thread")]
async fn client_span_is_child_of_current_span_and_is_propagated() {
    let exporter = InMemorySpanExporter::default();
    let (guard, tracing_ctx) = init_telemetry_with_exporter(
        &TelemetryConfig::default(),
        LogFormat::Text,
        exporter.clone(),
    );
    let layer = GrpcTraceLayer::new(tracing_ctx, "localhost:19530");

    let request = Request::builder()
        .uri(INSERT_PATH)
        .body(())
        .expect("request");
    let traceparent = echo_traceparent(&layer)
        .oneshot(request)
        .instrument(tracing::info_span!("test_milvus_otel"))
        .await
        .expect("infallible")
        .expect("traceparent header injected");

    guard.force_flush().expect("flush");
    let spans = exporter.get_finished_spans().expect("finished spans");
    let phase = find(&spans, "test_milvus_otel");
    let client = find(&spans, "milvus.proto.milvus.MilvusService/Insert");

    assert_eq!(client.span_kind, SpanKind::Client);
    assert_eq!(client.parent_span_id, phase.span_context.span_id());
    assert_eq!(
        client.span_context.trace_id(),
        phase.span_context.trace_id()
    );
    assert_eq!(attribute(client, "rpc.system").as_deref(), Some("grpc"));
    assert_eq!(
        attribute(client, "rpc.service").as_deref(),
        Some("milvus.proto.milvus.MilvusService")
    );
    assert_eq!(attribute(client, "rpc.method").as_deref(), Some("Insert"));
    assert_eq!(
        attribute(client, "server.address").as_deref(),
        Some("localhost:19530")
    );

    assert_eq!(
        traceparent,
        format!(
            "00-{}-{}-01",
            client.span_context.trace_id(),
            client.span_context.span_id()
        )
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn non_grpc_paths_are_traced_with_the_raw_path() {
    let exporter = InMemorySpanExporter::default();
    let (guard, tracing_ctx) = init_telemetry_with_exporter(
        &TelemetryConfig::default(),
        LogFormat::Text,
        exporter.clone(),
    );
    let layer = GrpcTraceLayer::new(tracing_ctx, "localhost:19530");

    let request = Request::builder().uri("/healthz").body(()).expect("request");
    let traceparent = echo_traceparent(&layer)
        .oneshot(request)
        .await
        .expect("infallible");
    assert!(traceparent.is_some());

    guard.force_flush().expect("flush");
    let spans = exporter.get_finished_spans().expect("finished spans");
    let client = find(&spans, "/healthz");
    assert_eq!(attribute(client, "rpc.method"), None);
    assert_eq!(attribute(client, "rpc.system").as_deref(), Some("grpc"));
}

#[tokio::test]
async fn without_an_exporter_nothing_is_injected() {
    let layer = GrpcTraceLayer::new(TracingContext::disabled("milvus-client"), "localhost:19530");
    let request = Request::builder().uri(INSERT_PATH).body(()).expect("request");
    let traceparent = echo_traceparent(&layer)
        .oneshot(request)
        .instrument(tracing::info_span!("test_milvus_otel"))
        .await
        .expect("infallible");
    assert_eq!(traceparent, None);
}
