//! `milvus-otel-smoke`: runs the quick-setup procedure against the Milvus
//! named by the environment, with span export per the OTEL_* variables.

mod error;

use clap::{Parser, ValueEnum};
use error::{CliError, ExitCode};
use milvus_otel_adapters::{LogFormat, MilvusGrpcConfig, MilvusGrpcVectorDb, init_telemetry};
use milvus_otel_app::{
    CleanupPolicy, QUICK_SETUP_COLLECTION, QuickSetupInput, QuickSetupReport, run_harness,
};
use milvus_otel_config::{ValidatedHarnessConfig, load_harness_config_std_env};
use milvus_otel_domain::CollectionName;
use milvus_otel_ports::VectorDbPort;
use milvus_otel_shared::{ErrorEnvelope, RequestContext};
use serde::Serialize;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::instrument::WithSubscriber;

#[derive(Debug, Parser)]
#[command(
    name = "milvus-otel-smoke",
    version,
    about = "Create, fill and drop a traced Milvus quick-setup collection",
    long_about = None
)]
struct Cli {
    /// Collection to create and drop.
    #[arg(long, default_value = QUICK_SETUP_COLLECTION)]
    collection: String,
    /// Whether to drop the collection when a step fails.
    #[arg(long, value_enum, default_value_t = CleanupArg::Always)]
    cleanup: CleanupArg,
    /// Emit logs as JSON lines on stderr.
    #[arg(long)]
    log_json: bool,
    /// Print the effective configuration and exit.
    #[arg(long)]
    print_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CleanupArg {
    /// Drop even after a failure.
    Always,
    /// Drop only at the end of a successful run.
    OnSuccess,
}

impl From<CleanupArg> for CleanupPolicy {
    fn from(value: CleanupArg) -> Self {
        match value {
            CleanupArg::Always => Self::Always,
            CleanupArg::OnSuccess => Self::OnSuccess,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SuccessOutput<'a> {
    status: &'static str,
    correlation_id: &'a str,
    report: &'a QuickSetupReport,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureOutput<'a> {
    status: &'static str,
    error: &'a ErrorEnvelope,
}

struct CliOutput {
    stdout: String,
    exit_code: ExitCode,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(output) => match write_stdout(&output.stdout) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&CliError::Io(error)),
        },
        Err(error) => exit_with_error(&error),
    }
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    if let Some(envelope) = error.envelope() {
        let output = FailureOutput {
            status: "failed",
            error: envelope,
        };
        if let Ok(json) = serde_json::to_string_pretty(&output) {
            let _ = write_stdout(&json);
        }
    }
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn write_stdout(text: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{text}")?;
    stdout.flush()
}

fn run(cli: &Cli) -> Result<CliOutput, CliError> {
    let config = load_harness_config_std_env().map_err(CliError::InvalidInput)?;
    if cli.print_config {
        return Ok(CliOutput {
            stdout: serde_json::to_string_pretty(&*config)?,
            exit_code: ExitCode::Ok,
        });
    }

    let collection_name = CollectionName::parse(&cli.collection)
        .map_err(|error| CliError::InvalidInput(ErrorEnvelope::from(error)))?;
    let input = QuickSetupInput::fixture()
        .map_err(CliError::InvalidInput)?
        .with_collection(collection_name)
        .with_cleanup(cli.cleanup.into());
    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };

    let ctx = RequestContext::new_run();
    let report = run_smoke(&ctx, &config, format, input)?;
    let output = SuccessOutput {
        status: "ok",
        correlation_id: ctx.correlation_id().as_str(),
        report: &report,
    };
    Ok(CliOutput {
        stdout: serde_json::to_string_pretty(&output)?,
        exit_code: ExitCode::Ok,
    })
}

fn run_smoke(
    ctx: &RequestContext,
    config: &ValidatedHarnessConfig,
    format: LogFormat,
    input: QuickSetupInput,
) -> Result<QuickSetupReport, CliError> {
    // Multi-threaded: the batch span exporter flushes from its own thread
    // through a channel driven by this runtime.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let (guard, tracing_ctx) = init_telemetry(&config.telemetry, format)?;
        spawn_cancel_on_ctrl_c(ctx);

        let milvus = MilvusGrpcConfig::from(&config.milvus);
        let result = run_harness(
            ctx,
            || async move {
                let client = MilvusGrpcVectorDb::connect(milvus, &tracing_ctx).await?;
                Ok::<Arc<dyn VectorDbPort>, ErrorEnvelope>(Arc::new(client))
            },
            input,
        )
        .await;

        drop(guard);
        result.map_err(CliError::Run)
    })
}

fn spawn_cancel_on_ctrl_c(ctx: &RequestContext) {
    let handle = cancel_on(ctx, async {
        // A failed signal registration means no interrupt will ever arrive.
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    });
    drop(handle);
}

/// Cancels `ctx` once `signal` resolves.
///
/// The subscriber is installed per thread, so the task carries the
/// caller's dispatcher onto whichever worker runs it.
fn cancel_on<F>(ctx: &RequestContext, signal: F) -> tokio::task::JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let ctx = ctx.clone();
    let task = async move {
        signal.await;
        tracing::warn!(
            correlation_id = ctx.correlation_id().as_str(),
            "interrupt received, cancelling run"
        );
        ctx.cancel();
    };
    tokio::spawn(task.with_current_subscriber())
}
