use std::cmp::Reverse;

use explog_model::{ConfigExecution, ConfigStatus, Elapsed, ExperimentRun, RunStatus};
use tracing::{debug, warn};

use crate::elapsed::ElapsedMode;

/// Configuration executions of one run, grouped by state.
///
/// Every finished execution carries an `elapsed` annotation; running ones never do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunBreakdown {
    /// Still executing, most advanced `current_step` first.
    pub running: Vec<ConfigExecution>,
    /// Finished cleanly, most recently finished first.
    pub succeeded: Vec<ConfigExecution>,
    /// Finished with errors, most recently finished first.
    pub failed: Vec<ConfigExecution>,
    /// Step names shared by the run's configurations.
    pub steps: Vec<String>,
}

/// Groups a run's configurations and annotates finished ones with their elapsed time.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    mode: ElapsedMode,
}

/// Aggregate with the default [`ElapsedMode`].
pub fn aggregate(run: &ExperimentRun) -> RunBreakdown {
    Aggregator::default().aggregate(run)
}

impl Aggregator {
    pub fn new(mode: ElapsedMode) -> Self {
        Self { mode }
    }

    /// Build the breakdown for `run`.
    ///
    /// The run itself is left untouched; groups hold annotated copies. Configurations are visited in name order,
    /// which is also the tie-break order after sorting.
    pub fn aggregate(&self, run: &ExperimentRun) -> RunBreakdown {
        let mut out = RunBreakdown::default();

        for exec in run.executions() {
            if out.steps.is_empty() && !exec.steps.is_empty() {
                out.steps = exec.steps.clone();
            }

            let mut exec = exec.clone();
            exec.elapsed = None;

            let Some(finished) = exec.finished else {
                out.running.push(exec);
                continue;
            };

            exec.elapsed = Some(match &run.started {
                Some(started) => self.mode.decompose(finished.since(started)),
                None => {
                    warn!(
                        "run {} has no start time; elapsed of '{}' reported as zero",
                        run.id, exec.config_name
                    );
                    Elapsed::ZERO
                }
            });

            if exec.has_errors() {
                out.failed.push(exec);
            } else {
                out.succeeded.push(exec);
            }
        }

        // `sort_by` is stable, so equal keys keep name order.
        out.succeeded.sort_by(|a, b| b.finished.cmp(&a.finished));
        out.failed.sort_by(|a, b| b.finished.cmp(&a.finished));
        // Unresolvable steps compare as `None` and sink to the end.
        out.running.sort_by_cached_key(|e| Reverse(e.current_step_index()));

        debug!(
            "run {} aggregated: running={}, succeeded={}, failed={}",
            run.id,
            out.running.len(),
            out.succeeded.len(),
            out.failed.len()
        );
        out
    }
}

impl RunBreakdown {
    pub fn total(&self) -> usize {
        self.running.len() + self.succeeded.len() + self.failed.len()
    }

    pub fn finished(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Share of finished configurations in `0.0..=1.0`; `0.0` for an empty run.
    pub fn progress(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.finished() as f64 / total as f64,
        }
    }

    /// Overall state as seen through the configurations.
    pub fn status(&self) -> RunStatus {
        if self.is_empty() {
            RunStatus::Pending
        } else if !self.running.is_empty() {
            RunStatus::Running
        } else if !self.failed.is_empty() {
            RunStatus::Failed
        } else {
            RunStatus::Succeeded
        }
    }

    pub fn group(&self, status: ConfigStatus) -> &[ConfigExecution] {
        match status {
            ConfigStatus::Running => &self.running,
            ConfigStatus::Succeeded => &self.succeeded,
            ConfigStatus::Failed => &self.failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use explog_model::{CurrentStep, Timestamp};
    use time::UtcOffset;

    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn running(name: &str, step: Option<i64>) -> ConfigExecution {
        ConfigExecution {
            config_name: name.to_string(),
            steps: vec!["load".into(), "train".into(), "eval".into(), "save".into()],
            current_step: step.map(CurrentStep::Index),
            ..Default::default()
        }
    }

    fn finished(name: &str, at: &str, has_errors: Option<bool>) -> ConfigExecution {
        ConfigExecution {
            config_name: name.to_string(),
            steps: vec!["load".into(), "train".into(), "eval".into(), "save".into()],
            finished: Some(ts(at)),
            has_errors,
            ..Default::default()
        }
    }

    fn run_with(execs: Vec<ConfigExecution>) -> ExperimentRun {
        let mut run = ExperimentRun::new(1);
        run.started = Some(ts("2024-01-01T00:00:00Z"));
        run.configs_execution = Some(
            execs
                .into_iter()
                .map(|e| (e.config_name.clone(), e))
                .collect::<BTreeMap<_, _>>(),
        );
        run
    }

    fn names(group: &[ConfigExecution]) -> Vec<&str> {
        group.iter().map(|e| e.config_name.as_str()).collect()
    }

    #[test]
    fn absent_config_map_yields_empty_breakdown() {
        let run = ExperimentRun::new(1);
        let out = aggregate(&run);
        assert!(out.running.is_empty());
        assert!(out.succeeded.is_empty());
        assert!(out.failed.is_empty());
        assert!(out.steps.is_empty());
        assert_eq!(out.status(), RunStatus::Pending);
        assert_eq!(out.progress(), 0.0);
    }

    #[test]
    fn empty_config_map_yields_empty_breakdown() {
        let out = aggregate(&run_with(vec![]));
        assert!(out.is_empty());
        assert!(out.steps.is_empty());
    }

    #[test]
    fn single_success_gets_elapsed() {
        let run = run_with(vec![finished("a", "2024-01-01T00:05:30Z", Some(false))]);
        let out = aggregate(&run);

        assert!(out.running.is_empty());
        assert!(out.failed.is_empty());
        assert_eq!(names(&out.succeeded), vec!["a"]);
        assert_eq!(out.succeeded[0].elapsed, Some(Elapsed::new(0, 0, 5, 30)));
        assert_eq!(out.status(), RunStatus::Succeeded);
    }

    #[test]
    fn calendar_mode_reproduces_legacy_fields() {
        let run = run_with(vec![finished("a", "2024-01-01T00:05:30Z", None)]);
        let out = Aggregator::new(ElapsedMode::Calendar {
            offset: UtcOffset::UTC,
        })
        .aggregate(&run);
        assert_eq!(out.succeeded[0].elapsed, Some(Elapsed::new(0, -1, 5, 30)));
    }

    #[test]
    fn errors_route_to_failed() {
        let run = run_with(vec![
            finished("ok", "2024-01-01T01:00:00Z", Some(false)),
            finished("bad", "2024-01-01T02:00:00Z", Some(true)),
        ]);
        let out = aggregate(&run);

        assert!(out.running.is_empty());
        assert_eq!(names(&out.succeeded), vec!["ok"]);
        assert_eq!(names(&out.failed), vec!["bad"]);
        assert_eq!(out.status(), RunStatus::Failed);
        assert_eq!(out.progress(), 1.0);
    }

    #[test]
    fn running_sorted_by_current_step_desc() {
        let run = run_with(vec![
            running("a", Some(1)),
            running("b", Some(3)),
            running("c", None),
        ]);
        let out = aggregate(&run);

        let steps: Vec<_> = out.running.iter().map(|e| e.current_step_index()).collect();
        assert_eq!(steps, vec![Some(3), Some(1), None]);
        assert!(out.running.iter().all(|e| e.elapsed.is_none()));
        assert_eq!(out.status(), RunStatus::Running);
    }

    #[test]
    fn finished_sorted_most_recent_first_with_stable_ties() {
        let run = run_with(vec![
            finished("a", "2024-01-01T01:00:00Z", None),
            finished("b", "2024-01-01T03:00:00Z", None),
            finished("c", "2024-01-01T01:00:00Z", None),
            finished("d", "2024-01-01T02:00:00Z", Some(true)),
            finished("e", "2024-01-01T04:00:00Z", Some(true)),
        ]);
        let out = aggregate(&run);

        assert_eq!(names(&out.succeeded), vec!["b", "a", "c"]);
        assert_eq!(names(&out.failed), vec!["e", "d"]);
    }

    #[test]
    fn step_names_and_indices_sort_together() {
        let mut by_name = running("a", None);
        by_name.current_step = Some("eval".into());
        let mut unknown = running("b", None);
        unknown.current_step = Some("warmup".into());
        let run = run_with(vec![by_name, unknown, running("c", Some(1)), running("d", Some(3))]);
        let out = aggregate(&run);

        assert_eq!(names(&out.running), vec!["d", "a", "c", "b"]);
    }

    #[test]
    fn steps_taken_from_first_non_empty() {
        let mut first = running("a", Some(0));
        first.steps.clear();
        let run = run_with(vec![first, running("b", Some(1))]);
        let out = aggregate(&run);
        assert_eq!(out.steps, vec!["load", "train", "eval", "save"]);
    }

    #[test]
    fn input_is_not_mutated() {
        let run = run_with(vec![finished("a", "2024-01-01T00:05:30Z", None)]);
        let before = run.clone();
        let _ = aggregate(&run);
        assert_eq!(run, before);
        assert!(run.executions().all(|e| e.elapsed.is_none()));
    }

    #[test]
    fn aggregate_is_idempotent() {
        let run = run_with(vec![
            running("a", Some(2)),
            running("b", Some(2)),
            finished("c", "2024-01-01T00:01:00Z", None),
            finished("d", "2024-01-01T00:01:00Z", Some(true)),
        ]);
        assert_eq!(aggregate(&run), aggregate(&run));
    }

    #[test]
    fn each_execution_lands_in_exactly_one_group() {
        let run = run_with(vec![
            running("a", Some(0)),
            finished("b", "2024-01-01T00:01:00Z", None),
            finished("c", "2024-01-01T00:02:00Z", Some(false)),
            finished("d", "2024-01-01T00:03:00Z", Some(true)),
        ]);
        let out = aggregate(&run);
        assert_eq!(out.total(), 4);
        for status in [
            ConfigStatus::Running,
            ConfigStatus::Succeeded,
            ConfigStatus::Failed,
        ] {
            assert!(out.group(status).iter().all(|e| e.status() == status));
        }
    }

    #[test]
    fn missing_start_yields_zero_elapsed() {
        let mut run = run_with(vec![finished("a", "2024-01-01T00:05:30Z", None)]);
        run.started = None;
        let out = aggregate(&run);
        assert_eq!(out.succeeded[0].elapsed, Some(Elapsed::ZERO));
    }

    #[test]
    fn decodes_and_aggregates_wire_run() {
        let run: ExperimentRun = serde_json::from_str(
            r#"{
                "id": 9,
                "started": "2024-01-01T00:00:00Z",
                "configs_execution": {
                    "x": {"config_name": "x", "steps": ["s"], "finished": 1704067530000, "has_errors": false},
                    "y": {"config_name": "y", "steps": ["s"], "current_step": "s"}
                }
            }"#,
        )
        .unwrap();
        let out = aggregate(&run);
        assert_eq!(names(&out.succeeded), vec!["x"]);
        assert_eq!(names(&out.running), vec!["y"]);
        assert_eq!(out.succeeded[0].elapsed, Some(Elapsed::new(0, 0, 5, 30)));
    }
}
