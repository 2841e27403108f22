//! # milvus-otel-adapters
//!
//! Adapter implementations for ports: the Milvus gRPC vector DB client and
//! the OpenTelemetry setup it is instrumented with.
//! This crate depends on `ports`, `shared`, `domain`, and `config`.

pub mod telemetry;
pub mod vectordb;

pub use telemetry::{
    GrpcTraceLayer, LogFormat, TelemetryError, TelemetryGuard, TracingContext, init_telemetry,
    init_telemetry_with_exporter,
};
pub use vectordb::milvus::{MilvusGrpcConfig, MilvusGrpcVectorDb};

#[cfg(test)]
mod tests {
    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut deps = Vec::new();
        let mut in_deps = false;
        let mut in_dev_deps = false;

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') {
                in_deps = line == "[dependencies]";
                in_dev_deps = line == "[dev-dependencies]";
                continue;
            }
            if !(in_deps || in_dev_deps) {
                continue;
            }
            if line.starts_with("milvus-otel-") {
                let key = line.split('=').next().unwrap_or("").trim();
                let name = key.split('.').next().unwrap_or("").trim();
                deps.push(name.to_string());
            }
        }

        deps
    }

    #[test]
    fn adapters_do_not_depend_on_app_or_testkit() {
        let deps = workspace_deps();
        let forbidden = ["milvus-otel-app", "milvus-otel-testkit"];

        for dep in &deps {
            assert!(
                !forbidden.contains(&dep.as_str()),
                "forbidden dependency found: {dep}"
            );
        }
    }
}
