//! Tracing setup and client instrumentation.

mod grpc_trace;
mod otel;

pub use grpc_trace::{GrpcTraceLayer, GrpcTraceService};
pub use otel::{
    APPLICATION_ATTRIBUTE, DEFAULT_LOG_FILTER, LogFormat, TRACER_NAME, TelemetryError,
    TelemetryGuard, TracingContext, init_telemetry, init_telemetry_with_exporter,
};
