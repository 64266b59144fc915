//! In-memory [`LogsApi`] used by the unit tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use explog_model::{
    AuthToken, Credentials, Experiment, ExperimentId, ExperimentRun, LogEntry, LogQuery, Page,
    RunId, Timestamp, User,
};

use crate::api::LogsApi;
use crate::error::ApiError;

#[derive(Default)]
pub(crate) struct FakeApi {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    experiments: Vec<Experiment>,
    runs: BTreeMap<RunId, ExperimentRun>,
    logs: Vec<LogEntry>,
    fail_next: Option<ApiError>,
    calls: usize,
}

impl FakeApi {
    pub(crate) fn fail_next(&self, err: ApiError) {
        self.state.lock().unwrap().fail_next = Some(err);
    }

    pub(crate) fn put_run(&self, run: ExperimentRun) {
        self.state.lock().unwrap().runs.insert(run.id, run);
    }

    pub(crate) fn put_experiment(&self, id: ExperimentId, name: &str) {
        self.state.lock().unwrap().experiments.push(Experiment {
            url: None,
            id,
            name: name.to_string(),
            description: None,
            last_run: None,
        });
    }

    pub(crate) fn put_logs(&self, levels: &[&str]) {
        let mut state = self.state.lock().unwrap();
        let base = state.logs.len() as i64;
        for (i, level) in levels.iter().enumerate() {
            state.logs.push(log_entry(base + i as i64, level));
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    fn enter(&self) -> Result<std::sync::MutexGuard<'_, FakeState>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        match state.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(state),
        }
    }
}

pub(crate) fn log_entry(id: i64, level: &str) -> LogEntry {
    LogEntry {
        id,
        timestamp_string: String::new(),
        timestamp: Timestamp::parse("2024-01-01T00:00:00Z").unwrap(),
        logger: None,
        config_name: None,
        step_name: None,
        filename: None,
        function_name: None,
        line_number: None,
        level: level.to_string(),
        level_value: level.parse::<explog_model::LogLevel>().ok().map(|l| l.value()),
        stack_info: None,
        message: format!("entry {id}"),
    }
}

fn ada() -> User {
    User {
        url: None,
        id: 1,
        username: "ada".to_string(),
        email: None,
    }
}

#[async_trait]
impl LogsApi for FakeApi {
    async fn version(&self) -> Result<String, ApiError> {
        self.enter()?;
        Ok("1.0.0".to_string())
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthToken, ApiError> {
        self.enter()?;
        if credentials.password == "pw" {
            Ok(AuthToken::new(format!("token-{}", credentials.username)))
        } else {
            Err(ApiError::Unauthorized("Invalid login or password".into()))
        }
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.enter()?;
        Ok(())
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        self.enter()?;
        Ok(ada())
    }

    async fn list_experiments(&self) -> Result<Vec<Experiment>, ApiError> {
        Ok(self.enter()?.experiments.clone())
    }

    async fn get_experiment(&self, id: ExperimentId) -> Result<Experiment, ApiError> {
        self.enter()?
            .experiments
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("experiment {id}")))
    }

    async fn remove_experiment(&self, id: ExperimentId) -> Result<(), ApiError> {
        self.enter()?.experiments.retain(|e| e.id != id);
        Ok(())
    }

    async fn list_runs(
        &self,
        _experiment_name: Option<&str>,
    ) -> Result<Vec<ExperimentRun>, ApiError> {
        Ok(self.enter()?.runs.values().rev().cloned().collect())
    }

    async fn get_run(&self, id: RunId) -> Result<ExperimentRun, ApiError> {
        self.enter()?
            .runs
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("run {id}")))
    }

    async fn remove_run(&self, id: RunId) -> Result<(), ApiError> {
        self.enter()?.runs.remove(&id);
        Ok(())
    }

    async fn get_logs(&self, _run_id: RunId, query: &LogQuery) -> Result<Page<LogEntry>, ApiError> {
        let state = self.enter()?;
        let matching: Vec<_> = state
            .logs
            .iter()
            .filter(|e| match (query.level, e.level_value) {
                (Some(min), Some(v)) => v >= min.value(),
                _ => true,
            })
            .cloned()
            .collect();

        let results: Vec<_> = matching
            .iter()
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect();
        let next = (query.offset + results.len() < matching.len())
            .then(|| format!("/logs?offset={}", query.offset + results.len()));

        Ok(Page {
            count: matching.len(),
            next,
            previous: None,
            results,
        })
    }
}
