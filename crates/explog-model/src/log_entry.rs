use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ModelError, Timestamp};

/// Severity of a remote log entry.
///
/// The numeric values match the server's `level_value` column; filtering by a level returns entries at or above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    #[serde(alias = "WARNING")]
    Warn,
    Error,
}

impl LogLevel {
    pub const ALL: [LogLevel; 4] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    pub fn value(&self) -> i32 {
        match self {
            LogLevel::Debug => 10,
            LogLevel::Info => 20,
            LogLevel::Warn => 30,
            LogLevel::Error => 40,
        }
    }

    /// Query-string form expected by `GET /logs/{run_id}?level=`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_uppercase();
        if norm == "WARNING" {
            return Ok(LogLevel::Warn);
        }
        LogLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == norm)
            .ok_or_else(|| ModelError::InvalidLogLevel(s.to_string()))
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single log record shipped by an experiment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    /// Timestamp as formatted by the producer's logger.
    #[serde(default)]
    pub timestamp_string: String,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub logger: Option<String>,
    #[serde(default)]
    pub config_name: Option<String>,
    #[serde(default)]
    pub step_name: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub function_name: Option<String>,
    #[serde(default)]
    pub line_number: Option<i64>,
    /// Level name as sent by the producer; may be outside [`LogLevel`].
    pub level: String,
    #[serde(default)]
    pub level_value: Option<i32>,
    #[serde(default)]
    pub stack_info: Option<String>,
    pub message: String,
}

impl LogEntry {
    /// Parsed level, `None` for names the viewer doesn't know.
    pub fn log_level(&self) -> Option<LogLevel> {
        self.level.parse().ok()
    }

    /// `file:line` of the call site, when reported.
    pub fn location(&self) -> Option<String> {
        let file = self.filename.as_deref()?;
        match self.line_number {
            Some(line) if line >= 0 => Some(format!("{file}:{line}")),
            _ => Some(file.to_string()),
        }
    }
}
