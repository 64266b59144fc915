use std::fmt;

use serde::{Deserialize, Serialize};

/// Execution state of a single configuration within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigStatus {
    /// No `finished` timestamp yet.
    Running,
    /// Finished without errors.
    Succeeded,
    /// Finished with `has_errors` set.
    Failed,
}

/// Overall state of a run, derived from its fields or its configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Nothing has been reported for the run yet.
    Pending,
    /// At least one configuration is still executing.
    Running,
    /// Every configuration finished cleanly.
    Succeeded,
    /// At least one configuration reported errors.
    Failed,
    /// The producer was stopped before finishing.
    Killed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Succeeded | RunStatus::Failed | RunStatus::Killed
        )
    }

    pub fn is_active(&self) -> bool {
        matches!(self, RunStatus::Pending | RunStatus::Running)
    }
}

impl fmt::Display for ConfigStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConfigStatus::Running => "running",
            ConfigStatus::Succeeded => "succeeded",
            ConfigStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed => "failed",
            RunStatus::Killed => "killed",
        };
        f.write_str(s)
    }
}
