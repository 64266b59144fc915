use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid log level: {0} (expected: debug|info|warn|error)")]
    InvalidLogLevel(String),
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
