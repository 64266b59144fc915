use serde::{Deserialize, Serialize};

use crate::run::run_status;
use crate::{ExperimentId, RunId, RunStatus, Timestamp};

/// Experiment as listed by `GET /experiments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub id: ExperimentId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Most recent run, without its configuration map.
    #[serde(default)]
    pub last_run: Option<RunSummary>,
}

/// Run fields embedded into experiment listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub id: RunId,
    #[serde(default)]
    pub started: Option<Timestamp>,
    #[serde(default)]
    pub finished: Option<Timestamp>,
    #[serde(default)]
    pub has_errors: bool,
    #[serde(default)]
    pub finished_configs: i64,
    #[serde(default)]
    pub number_of_configs: i64,
}

impl Experiment {
    /// Status of the last run; `Pending` for experiments that never ran.
    pub fn status(&self) -> RunStatus {
        self.last_run
            .as_ref()
            .map(RunSummary::status)
            .unwrap_or(RunStatus::Pending)
    }
}

impl RunSummary {
    pub fn status(&self) -> RunStatus {
        run_status(false, self.finished.is_some(), self.has_errors)
    }
}
