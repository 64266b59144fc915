use async_trait::async_trait;
use explog_model::{
    AuthToken, Credentials, Experiment, ExperimentId, ExperimentRun, LogEntry, LogQuery, Page,
    RunId, User,
};

use crate::error::ApiError;

/// Remote experiment-log API.
///
/// Views and the CLI only talk to the server through this trait, so tests can substitute an
/// in-memory implementation for the HTTP one.
#[async_trait]
pub trait LogsApi: Send + Sync + 'static {
    /// Server version string. Doesn't require a session.
    async fn version(&self) -> Result<String, ApiError>;

    /// Exchange credentials for an API token.
    async fn login(&self, credentials: &Credentials) -> Result<AuthToken, ApiError>;

    /// Invalidate the current token on the server.
    async fn logout(&self) -> Result<(), ApiError>;

    /// Account the current token belongs to.
    async fn current_user(&self) -> Result<User, ApiError>;

    async fn list_experiments(&self) -> Result<Vec<Experiment>, ApiError>;

    async fn get_experiment(&self, id: ExperimentId) -> Result<Experiment, ApiError>;

    async fn remove_experiment(&self, id: ExperimentId) -> Result<(), ApiError>;

    /// Runs, newest first, optionally restricted to one experiment.
    async fn list_runs(&self, experiment_name: Option<&str>)
    -> Result<Vec<ExperimentRun>, ApiError>;

    async fn get_run(&self, id: RunId) -> Result<ExperimentRun, ApiError>;

    async fn remove_run(&self, id: RunId) -> Result<(), ApiError>;

    /// One page of a run's log entries, newest first.
    async fn get_logs(&self, run_id: RunId, query: &LogQuery)
    -> Result<Page<LogEntry>, ApiError>;
}
