use thiserror::Error;

use crate::logger::format::LoggerFormat;

/// Failures while installing the global subscriber.
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("log format '{0}' is not available in this build")]
    Unsupported(LoggerFormat),
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
    #[error("logger setup failed: {0}")]
    InitializationFailed(String),
    #[error("invalid log filter '{directives}': {reason}")]
    InvalidLogLevel { directives: String, reason: String },
}
