use std::sync::Arc;

use explog_model::{ExperimentRun, RunId, Timestamp};
use tracing::{debug, warn};

use super::{Refresh, RefreshPolicy, ViewState};
use crate::aggregate::{Aggregator, RunBreakdown};
use crate::api::LogsApi;
use crate::error::ApiError;
use crate::session::Session;

/// Details of one run: the raw record plus its configuration breakdown.
pub struct RunDetails {
    api: Arc<dyn LogsApi>,
    session: Session,
    run_id: RunId,
    aggregator: Aggregator,
    refresh: Refresh,
    run: Option<ExperimentRun>,
    breakdown: Option<RunBreakdown>,
}

impl RunDetails {
    pub fn new(api: Arc<dyn LogsApi>, session: Session, run_id: RunId) -> Self {
        Self {
            api,
            session,
            run_id,
            aggregator: Aggregator::default(),
            refresh: Refresh::new(RefreshPolicy::KeepStale),
            run: None,
            breakdown: None,
        }
    }

    pub fn with_aggregator(mut self, aggregator: Aggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn with_policy(mut self, policy: RefreshPolicy) -> Self {
        self.refresh.policy = policy;
        self
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn run(&self) -> Option<&ExperimentRun> {
        self.run.as_ref()
    }

    pub fn breakdown(&self) -> Option<&RunBreakdown> {
        self.breakdown.as_ref()
    }

    pub fn state(&self) -> ViewState {
        self.refresh.state
    }

    /// When the shown data was fetched; kept across failed refreshes.
    pub fn refreshed_at(&self) -> Option<Timestamp> {
        self.refresh.refreshed_at
    }

    pub fn last_error(&self) -> Option<&str> {
        self.refresh.last_error.as_deref()
    }

    /// Fetch the run and rebuild the breakdown from scratch.
    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        if self.refresh.begin() {
            self.run = None;
            self.breakdown = None;
        }
        debug!("fetching run {}", self.run_id);

        match self.api.get_run(self.run_id).await {
            Ok(run) => {
                self.breakdown = Some(self.aggregator.aggregate(&run));
                self.run = Some(run);
                self.refresh.succeed();
                Ok(())
            }
            Err(e) => {
                warn!("refresh of run {} failed: {}", self.run_id, e);
                self.session.observe_error(&e);
                self.refresh.fail(&e);
                Err(e)
            }
        }
    }

    /// Delete the run on the server and forget local data.
    pub async fn remove(&mut self) -> Result<(), ApiError> {
        self.api.remove_run(self.run_id).await.inspect_err(|e| {
            self.session.observe_error(e);
        })?;
        self.run = None;
        self.breakdown = None;
        Ok(())
    }
}
