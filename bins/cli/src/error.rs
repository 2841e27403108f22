use milvus_otel_adapters::TelemetryError;
use milvus_otel_shared::ErrorEnvelope;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Ok = 0,
    Failure = 1,
    InvalidInput = 2,
}

impl ExitCode {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

#[derive(Debug)]
pub enum CliError {
    /// Bad flags or environment.
    InvalidInput(ErrorEnvelope),
    /// The procedure failed.
    Run(ErrorEnvelope),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Serialization(serde_json::Error),
}

impl CliError {
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidInput(_) => ExitCode::InvalidInput,
            Self::Run(_) | Self::Telemetry(_) | Self::Io(_) | Self::Serialization(_) => {
                ExitCode::Failure
            },
        }
    }

    /// The structured error, when there is one to report.
    #[must_use]
    pub const fn envelope(&self) -> Option<&ErrorEnvelope> {
        match self {
            Self::InvalidInput(error) | Self::Run(error) => Some(error),
            Self::Telemetry(_) | Self::Io(_) | Self::Serialization(_) => None,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(error) => {
                write!(formatter, "invalid input: {}: {}", error.code, error.message)
            },
            Self::Run(error) => match error.step() {
                Some(step) => write!(
                    formatter,
                    "quick setup failed at {step}: {}: {}",
                    error.code, error.message
                ),
                None => write!(formatter, "quick setup failed: {}: {}", error.code, error.message),
            },
            Self::Telemetry(error) => write!(formatter, "telemetry error: {error}"),
            Self::Io(error) => write!(formatter, "io error: {error}"),
            Self::Serialization(error) => write!(formatter, "serialization error: {error}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<TelemetryError> for CliError {
    fn from(error: TelemetryError) -> Self {
        Self::Telemetry(error)
    }
}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error)
    }
}
