//! Client-side gRPC tracing middleware.
//!
//! [`GrpcTraceLayer`] wraps the transport under a tonic client. Each
//! request gets a `client` span named `<service>/<method>`, parented on
//! whatever span is current at call time, and the span's W3C trace
//! context is written into the request headers.

use crate::telemetry::otel::TracingContext;
use std::sync::Arc;
use std::task::{Context, Poll};
use tonic::codegen::http::Request;
use tower::{Layer, Service};
use tracing::Instrument;
use tracing::field::Empty;
use tracing::instrument::Instrumented;

/// Tower layer producing [`GrpcTraceService`].
#[derive(Debug, Clone)]
pub struct GrpcTraceLayer {
    tracing: TracingContext,
    server_address: Arc<str>,
}

impl GrpcTraceLayer {
    /// `server_address` is recorded on every span as `server.address`.
    pub fn new(tracing: TracingContext, server_address: impl Into<Arc<str>>) -> Self {
        Self {
            tracing,
            server_address: server_address.into(),
        }
    }
}

impl<S> Layer<S> for GrpcTraceLayer {
    type Service = GrpcTraceService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GrpcTraceService {
            inner,
            tracing: self.tracing.clone(),
            server_address: Arc::clone(&self.server_address),
        }
    }
}

/// Service that traces each outbound request.
#[derive(Debug, Clone)]
pub struct GrpcTraceService<S> {
    inner: S,
    tracing: TracingContext,
    server_address: Arc<str>,
}

impl<S, B> Service<Request<B>> for GrpcTraceService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Instrumented<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<B>) -> Self::Future {
        let rpc = RpcName::from_path(request.uri().path());
        let span = tracing::info_span!(
            "grpc.client",
            otel.name = %rpc.span_name,
            otel.kind = "client",
            rpc.system = "grpc",
            rpc.service = Empty,
            rpc.method = Empty,
            server.address = %self.server_address,
        );
        if let Some((service, method)) = rpc.parts.as_ref() {
            span.record("rpc.service", service.as_str());
            span.record("rpc.method", method.as_str());
        }

        self.tracing.inject(&span, request.headers_mut());
        self.inner.call(request).instrument(span)
    }
}

#[derive(Debug, PartialEq, Eq)]
struct RpcName {
    span_name: String,
    parts: Option<(String, String)>,
}

impl RpcName {
    /// `/pkg.Service/Method` splits into service and method; anything else
    /// keeps the raw path as the span name.
    fn from_path(path: &str) -> Self {
        let parts = path
            .strip_prefix('/')
            .and_then(|rest| rest.split_once('/'))
            .filter(|(service, method)| {
                !service.is_empty() && !method.is_empty() && !method.contains('/')
            });
        match parts {
            Some((service, method)) => Self {
                span_name: format!("{service}/{method}"),
                parts: Some((service.to_owned(), method.to_owned())),
            },
            None => Self {
                span_name: path.to_owned(),
                parts: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grpc_paths_split_into_service_and_method() {
        let rpc = RpcName::from_path("/milvus.proto.milvus.MilvusService/Insert");
        assert_eq!(rpc.span_name, "milvus.proto.milvus.MilvusService/Insert");
        assert_eq!(
            rpc.parts,
            Some((
                "milvus.proto.milvus.MilvusService".to_owned(),
                "Insert".to_owned()
            ))
        );
    }

    #[test]
    fn other_paths_keep_the_raw_path() {
        for path in ["/healthz", "/", "", "/a/b/c", "//Method", "/svc/"] {
            let rpc = RpcName::from_path(path);
            assert_eq!(rpc.span_name, path);
            assert_eq!(rpc.parts, None, "{path}");
        }
    }
}
