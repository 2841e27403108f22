//! OpenTelemetry bootstrap for the tracing subscriber.
//!
//! [`init_telemetry`] builds an OTLP/gRPC tracer provider, composes it with
//! console logging and installs the result as the scoped default
//! subscriber. The returned [`TelemetryGuard`] owns both; dropping it
//! flushes and shuts down the provider. Export failures never reach the
//! caller: the batch processor logs them and moves on.

use milvus_otel_config::TelemetryConfig;
use opentelemetry::KeyValue;
use opentelemetry::propagation::{Injector, TextMapPropagator};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{SdkTracerProvider, SpanExporter};
use std::fmt;
use std::sync::Arc;
use tonic::codegen::http::{HeaderMap, HeaderName, HeaderValue};
use tracing::Span;
use tracing::subscriber::DefaultGuard;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer, fmt as fmt_layer};

/// Instrumentation scope name for spans produced by this workspace.
pub const TRACER_NAME: &str = "milvus-otel";

/// Resource attribute identifying the harness.
pub const APPLICATION_ATTRIBUTE: (&str, &str) = ("application", "milvus-otel-test");

/// `RUST_LOG` fallback.
pub const DEFAULT_LOG_FILTER: &str = "info,milvus_otel=debug";

/// Console log format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Telemetry setup failures.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The OTLP exporter could not be built (bad endpoint, no runtime).
    #[error("failed to build OTLP span exporter: {0}")]
    Exporter(#[from] opentelemetry_otlp::ExporterBuildError),
    /// Flushing buffered spans failed.
    #[error("failed to flush spans: {0}")]
    Flush(String),
    /// Provider shutdown failed.
    #[error("failed to shut down tracer provider: {0}")]
    Shutdown(String),
}

/// Handle passed to instrumented clients.
///
/// Carries the W3C propagator used to inject `traceparent` into outbound
/// requests and the service identity spans are reported under.
#[derive(Clone)]
pub struct TracingContext {
    service_name: Arc<str>,
    propagator: Arc<TraceContextPropagator>,
    exporting: bool,
}

impl fmt::Debug for TracingContext {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TracingContext")
            .field("service_name", &self.service_name)
            .field("exporting", &self.exporting)
            .finish_non_exhaustive()
    }
}

impl TracingContext {
    fn new(service_name: &str, exporting: bool) -> Self {
        Self {
            service_name: Arc::from(service_name),
            propagator: Arc::new(TraceContextPropagator::new()),
            exporting,
        }
    }

    /// Context with no exporter behind it. Injection is a no-op unless some
    /// other subscriber attached OpenTelemetry data to the span.
    #[must_use]
    pub fn disabled(service_name: &str) -> Self {
        Self::new(service_name, false)
    }

    /// Service name reported in the resource.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// True when spans are exported somewhere.
    pub const fn is_exporting(&self) -> bool {
        self.exporting
    }

    /// Writes the trace context of `span` into `headers`.
    pub fn inject(&self, span: &Span, headers: &mut HeaderMap) {
        let context = span.context();
        self.propagator
            .inject_context(&context, &mut HeaderInjector(headers));
    }
}

struct HeaderInjector<'a>(&'a mut HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        let Ok(name) = HeaderName::from_bytes(key.as_bytes()) else {
            return;
        };
        let Ok(value) = HeaderValue::from_str(&value) else {
            return;
        };
        self.0.insert(name, value);
    }
}

/// Owns the tracer provider and the scoped subscriber.
///
/// Dropping the guard flushes pending spans, shuts the provider down and
/// then restores the previous default subscriber. Failures are logged at
/// `warn` and discarded.
#[must_use = "dropping the guard uninstalls telemetry"]
pub struct TelemetryGuard {
    provider: Option<SdkTracerProvider>,
    _subscriber: DefaultGuard,
}

impl fmt::Debug for TelemetryGuard {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TelemetryGuard")
            .field("exporting", &self.provider.is_some())
            .finish_non_exhaustive()
    }
}

impl TelemetryGuard {
    /// Exports every finished span now.
    pub fn force_flush(&self) -> Result<(), TelemetryError> {
        match self.provider.as_ref() {
            Some(provider) => provider
                .force_flush()
                .map_err(|error| TelemetryError::Flush(error.to_string())),
            None => Ok(()),
        }
    }

    /// Flushes and shuts the provider down. Later calls are no-ops.
    pub fn shutdown(&mut self) -> Result<(), TelemetryError> {
        let Some(provider) = self.provider.take() else {
            return Ok(());
        };
        if let Err(error) = provider.force_flush() {
            tracing::warn!(error = %error, "span flush failed");
        }
        provider
            .shutdown()
            .map_err(|error| TelemetryError::Shutdown(error.to_string()))
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Err(error) = self.shutdown() {
            tracing::warn!(error = %error, "telemetry shutdown failed");
        }
    }
}

/// Installs console logging plus, when enabled, OTLP/gRPC span export.
///
/// Must run inside a tokio runtime: the tonic exporter spawns its
/// connection task there. The endpoint is not probed.
pub fn init_telemetry(
    config: &TelemetryConfig,
    format: LogFormat,
) -> Result<(TelemetryGuard, TracingContext), TelemetryError> {
    if !config.enabled {
        return Ok(install(None, config, format));
    }

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(config.endpoint.to_string())
        .with_timeout(config.export_timeout())
        .build()?;
    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(build_resource(config))
        .build();
    Ok(install(Some(provider), config, format))
}

/// Same as [`init_telemetry`] with a caller-supplied exporter.
///
/// Spans are exported synchronously as they end, so tests can inspect an
/// in-memory exporter without waiting on a batch.
pub fn init_telemetry_with_exporter<E>(
    config: &TelemetryConfig,
    format: LogFormat,
    exporter: E,
) -> (TelemetryGuard, TracingContext)
where
    E: SpanExporter + 'static,
{
    let provider = SdkTracerProvider::builder()
        .with_simple_exporter(exporter)
        .with_resource(build_resource(config))
        .build();
    install(Some(provider), config, format)
}

fn build_resource(config: &TelemetryConfig) -> Resource {
    let (app_key, app_value) = APPLICATION_ATTRIBUTE;
    let extra = config
        .resource_attributes
        .iter()
        .map(|(key, value)| KeyValue::new(key.to_string(), value.to_string()));

    // Later attributes win on merge: service identity overrides extra pairs.
    Resource::builder()
        .with_attributes(extra)
        .with_service_name(config.service_name.to_string())
        .with_attribute(KeyValue::new(app_key, app_value))
        .build()
}

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn install(
    provider: Option<SdkTracerProvider>,
    config: &TelemetryConfig,
    format: LogFormat,
) -> (TelemetryGuard, TracingContext) {
    let otel_layer = provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer()
            .with_tracer(provider.tracer(TRACER_NAME))
            .with_filter(LevelFilter::INFO)
    });
    let text_layer = (format == LogFormat::Text).then(|| {
        fmt_layer::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_filter(log_filter())
    });
    let json_layer = (format == LogFormat::Json).then(|| {
        fmt_layer::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .with_filter(log_filter())
    });

    let subscriber = tracing_subscriber::registry()
        .with(otel_layer)
        .with(text_layer)
        .with(json_layer);
    let subscriber_guard = tracing::subscriber::set_default(subscriber);

    let exporting = provider.is_some();
    tracing::debug!(
        service = %config.service_name,
        exporting,
        endpoint = %config.endpoint,
        "telemetry initialized"
    );
    (
        TelemetryGuard {
            provider,
            _subscriber: subscriber_guard,
        },
        TracingContext::new(&config.service_name, exporting),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_context_injects_nothing() {
        let context = TracingContext::disabled("svc");
        let mut headers = HeaderMap::new();
        let span = tracing::info_span!("no_subscriber");
        context.inject(&span, &mut headers);
        assert!(headers.is_empty());
        assert!(!context.is_exporting());
        assert_eq!(context.service_name(), "svc");
    }

    #[test]
    fn injector_skips_invalid_header_values() {
        let mut headers = HeaderMap::new();
        let mut injector = HeaderInjector(&mut headers);
        injector.set("traceparent", "00-abc".to_owned());
        injector.set("bad header", "x".to_owned());
        injector.set("tracestate", "line\nbreak".to_owned());
        assert_eq!(headers.len(), 1);
        assert_eq!(
            headers.get("traceparent").and_then(|v| v.to_str().ok()),
            Some("00-abc")
        );
    }

    fn resource_value(resource: &Resource, key: &'static str) -> Option<String> {
        resource
            .get(&opentelemetry::Key::from_static_str(key))
            .map(|value| value.to_string())
    }

    #[test]
    fn resource_keeps_service_identity_over_extra_attributes() {
        let config = TelemetryConfig {
            service_name: "milvus-client".into(),
            resource_attributes: vec![
                ("service.name".into(), "from-env-attrs".into()),
                ("application".into(), "other-app".into()),
                ("deployment.environment".into(), "ci".into()),
            ],
            ..TelemetryConfig::default()
        };

        let resource = build_resource(&config);

        assert_eq!(
            resource_value(&resource, "service.name").as_deref(),
            Some("milvus-client")
        );
        assert_eq!(
            resource_value(&resource, "application").as_deref(),
            Some("milvus-otel-test")
        );
        assert_eq!(
            resource_value(&resource, "deployment.environment").as_deref(),
            Some("ci")
        );
    }

    #[tokio::test]
    async fn disabled_telemetry_installs_console_logging_only() {
        let config = TelemetryConfig {
            enabled: false,
            ..TelemetryConfig::default()
        };
        let result = init_telemetry(&config, LogFormat::Text);
        assert!(result.is_ok());
        if let Ok((mut guard, context)) = result {
            assert!(!context.is_exporting());
            assert!(guard.force_flush().is_ok());
            assert!(guard.shutdown().is_ok());
        }
    }
}
