use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{ConfigStatus, Elapsed, RunId, RunStatus, Timestamp};

/// One execution attempt of an experiment, as returned by `GET /experiments_runs/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRun {
    pub id: RunId,
    /// Set by the server when the run is created; tolerated as absent.
    #[serde(default)]
    pub started: Option<Timestamp>,
    #[serde(default)]
    pub finished: Option<Timestamp>,
    #[serde(default)]
    pub has_errors: bool,
    #[serde(default)]
    pub killed: bool,
    #[serde(default)]
    pub finished_configs: i64,
    /// `-1` while the producer hasn't announced its configuration count.
    #[serde(default = "unknown_count")]
    pub number_of_configs: i64,
    /// Configuration name to execution record.
    #[serde(default)]
    pub configs_execution: Option<BTreeMap<String, ConfigExecution>>,
}

/// Execution record of a single named configuration within a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigExecution {
    #[serde(default)]
    pub config_name: String,
    #[serde(default)]
    pub steps: Vec<String>,
    /// Step reported while the configuration executes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<CurrentStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_errors: Option<bool>,
    #[serde(default)]
    pub steps_completed: BTreeMap<String, Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    /// Derived by the aggregator; never read from the wire.
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<Elapsed>,
}

/// `current_step` as producers send it: the step's name, or its index into `steps`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CurrentStep {
    Index(i64),
    Name(String),
}

impl From<i64> for CurrentStep {
    fn from(idx: i64) -> Self {
        CurrentStep::Index(idx)
    }
}

impl From<&str> for CurrentStep {
    fn from(name: &str) -> Self {
        CurrentStep::Name(name.to_string())
    }
}

fn unknown_count() -> i64 {
    -1
}

impl ExperimentRun {
    /// Empty run record, as the server reports it right after creation.
    pub fn new(id: RunId) -> Self {
        Self {
            id,
            started: None,
            finished: None,
            has_errors: false,
            killed: false,
            finished_configs: 0,
            number_of_configs: unknown_count(),
            configs_execution: None,
        }
    }

    /// Overall state from the run-level fields alone.
    pub fn status(&self) -> RunStatus {
        run_status(self.killed, self.finished.is_some(), self.has_errors)
    }

    /// Number of announced configurations, if the producer reported it.
    pub fn expected_configs(&self) -> Option<usize> {
        usize::try_from(self.number_of_configs).ok()
    }

    /// Iterate over configuration executions; empty when none were reported.
    pub fn executions(&self) -> impl Iterator<Item = &ConfigExecution> {
        self.configs_execution.iter().flat_map(|m| m.values())
    }
}

impl ConfigExecution {
    pub fn is_running(&self) -> bool {
        self.finished.is_none()
    }

    pub fn has_errors(&self) -> bool {
        self.has_errors.unwrap_or(false)
    }

    pub fn status(&self) -> ConfigStatus {
        match (self.finished.is_some(), self.has_errors()) {
            (false, _) => ConfigStatus::Running,
            (true, true) => ConfigStatus::Failed,
            (true, false) => ConfigStatus::Succeeded,
        }
    }

    /// Position of the current step in `steps`; `None` when absent or not one of `steps`.
    pub fn current_step_index(&self) -> Option<usize> {
        match self.current_step.as_ref()? {
            CurrentStep::Index(idx) => usize::try_from(*idx)
                .ok()
                .filter(|idx| *idx < self.steps.len()),
            CurrentStep::Name(name) => self.steps.iter().position(|s| s == name),
        }
    }

    /// Name of the step currently executing, if it is one of `steps`.
    pub fn current_step_name(&self) -> Option<&str> {
        self.current_step_index().map(|idx| self.steps[idx].as_str())
    }

    /// Number of `steps` that have a completion timestamp.
    pub fn steps_done(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| self.steps_completed.contains_key(s.as_str()))
            .count()
    }
}

pub(crate) fn run_status(killed: bool, finished: bool, has_errors: bool) -> RunStatus {
    if killed {
        RunStatus::Killed
    } else if !finished {
        RunStatus::Running
    } else if has_errors {
        RunStatus::Failed
    } else {
        RunStatus::Succeeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUN: &str = r#"{
        "id": 7,
        "started": "2024-01-01T00:00:00Z",
        "finished": null,
        "has_errors": false,
        "killed": false,
        "finished_configs": 1,
        "number_of_configs": 2,
        "configs_execution": {
            "lr-0.1": {
                "config_name": "lr-0.1",
                "steps": ["load", "train", "eval"],
                "current_step": 1,
                "has_errors": false,
                "steps_completed": {"load": "2024-01-01-00:01:00"}
            },
            "lr-0.01": {
                "config_name": "lr-0.01",
                "steps": ["load", "train", "eval"],
                "has_errors": true,
                "finished": 1704067530000,
                "error_message": "boom",
                "stack_trace": "Traceback ..."
            }
        }
    }"#;

    #[test]
    fn decodes_run_from_wire() {
        let run: ExperimentRun = serde_json::from_str(RUN).unwrap();
        assert_eq!(run.id, 7);
        assert_eq!(run.status(), RunStatus::Running);
        assert_eq!(run.expected_configs(), Some(2));
        assert_eq!(run.executions().count(), 2);

        let cfgs = run.configs_execution.as_ref().unwrap();
        let running = &cfgs["lr-0.1"];
        assert_eq!(running.status(), ConfigStatus::Running);
        assert_eq!(running.current_step, Some(CurrentStep::Index(1)));
        assert_eq!(running.current_step_name(), Some("train"));
        assert_eq!(running.steps_done(), 1);

        let failed = &cfgs["lr-0.01"];
        assert_eq!(failed.status(), ConfigStatus::Failed);
        assert_eq!(failed.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let run: ExperimentRun = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert!(run.started.is_none());
        assert!(run.configs_execution.is_none());
        assert_eq!(run.number_of_configs, -1);
        assert_eq!(run.expected_configs(), None);
        assert_eq!(run.executions().count(), 0);
    }

    #[test]
    fn elapsed_on_the_wire_is_ignored() {
        let exec: ConfigExecution = serde_json::from_str(
            r#"{"config_name": "a", "elapsed": {"days": 9, "hours": 9, "minutes": 9, "seconds": 9}}"#,
        )
        .unwrap();
        assert!(exec.elapsed.is_none());
    }

    #[test]
    fn absent_has_errors_counts_as_success() {
        let exec: ConfigExecution =
            serde_json::from_str(r#"{"config_name": "a", "finished": "2024-01-01T00:00:00Z"}"#)
                .unwrap();
        assert_eq!(exec.status(), ConfigStatus::Succeeded);
    }

    #[test]
    fn killed_run_status_wins() {
        assert_eq!(run_status(true, false, true), RunStatus::Killed);
        assert_eq!(run_status(false, true, true), RunStatus::Failed);
        assert_eq!(run_status(false, true, false), RunStatus::Succeeded);
    }

    #[test]
    fn current_step_out_of_range() {
        let exec = ConfigExecution {
            steps: vec!["a".into()],
            current_step: Some(4.into()),
            ..Default::default()
        };
        assert_eq!(exec.current_step_index(), None);
        assert_eq!(exec.current_step_name(), None);
    }

    #[test]
    fn current_step_sent_by_name() {
        let run: ExperimentRun = serde_json::from_str(
            r#"{
                "id": 3,
                "started": "2024-01-01T00:00:00Z",
                "configs_execution": {
                    "a": {
                        "config_name": "a",
                        "steps": ["load", "train", "eval"],
                        "current_step": "train",
                        "steps_completed": {"load": "2024-01-01-00:01:00"}
                    }
                }
            }"#,
        )
        .unwrap();
        let exec = &run.configs_execution.as_ref().unwrap()["a"];
        assert_eq!(exec.current_step, Some(CurrentStep::Name("train".into())));
        assert_eq!(exec.current_step_index(), Some(1));
        assert_eq!(exec.current_step_name(), Some("train"));
    }

    #[test]
    fn unknown_step_name_has_no_index() {
        let exec = ConfigExecution {
            steps: vec!["load".into()],
            current_step: Some("warmup".into()),
            ..Default::default()
        };
        assert_eq!(exec.current_step_index(), None);
    }
}
