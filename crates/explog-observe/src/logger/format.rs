use std::fmt;

use clap::ValueEnum;

/// Output of the global subscriber. Usable directly as a `clap` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LoggerFormat {
    /// Human-readable lines on stderr.
    #[default]
    Text,
    /// One JSON object per event on stderr.
    Json,
    /// The systemd journal.
    #[value(alias = "journal")]
    Journald,
}

impl LoggerFormat {
    /// Whether this build can install the format. Journald needs Linux and the `journald` feature.
    pub fn is_supported(self) -> bool {
        match self {
            LoggerFormat::Text | LoggerFormat::Json => true,
            LoggerFormat::Journald => cfg!(all(target_os = "linux", feature = "journald")),
        }
    }
}

impl fmt::Display for LoggerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_possible_value() {
            Some(value) => f.write_str(value.get_name()),
            None => Ok(()),
        }
    }
}
