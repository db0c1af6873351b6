//! Shared error type across metrica crates.

use thiserror::Error;

/// Stable error codes (safe to log, match on, or expose to callers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// A value that cannot be recorded (e.g. `null`).
    InvalidValue,
    /// A structurally invalid argument (negative offset, bad range, bad duration).
    InvalidArgument,
    /// Free-text date expression could not be parsed.
    ParseFailure,
    /// Configuration could not be read or decoded.
    Config,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Operation needs a tokio runtime and none is running.
    Runtime,
}

impl ErrorCode {
    /// String representation used in logs and rendered output.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidValue => "INVALID_VALUE",
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::ParseFailure => "PARSE_FAILURE",
            ErrorCode::Config => "CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Runtime => "RUNTIME",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MetricaError>;

/// Unified error type used by core and registry.
#[derive(Debug, Error)]
pub enum MetricaError {
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Parse(#[from] ParseFailure),
    #[error("config: {0}")]
    Config(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("runtime: {0}")]
    Runtime(String),
}

impl MetricaError {
    /// Map to a stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            MetricaError::InvalidValue(_) => ErrorCode::InvalidValue,
            MetricaError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            MetricaError::Parse(_) => ErrorCode::ParseFailure,
            MetricaError::Config(_) => ErrorCode::Config,
            MetricaError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            MetricaError::Runtime(_) => ErrorCode::Runtime,
        }
    }
}

/// A date expression that could not be understood.
///
/// Lookups driven by free text hand this back as a value instead of failing
/// the whole call, so the offending input is always available to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse date expression {input:?}: {reason}")]
pub struct ParseFailure {
    /// The exact text that was rejected.
    pub input: String,
    /// Short human-readable cause.
    pub reason: String,
}

impl ParseFailure {
    pub fn new(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            reason: reason.into(),
        }
    }
}
