use std::sync::Arc;

use async_trait::async_trait;
use std::fmt::Display;

use explog_model::{Experiment, ExperimentId, ExperimentRun, RunId};
use tracing::{debug, info, warn};

use super::{Refresh, RefreshPolicy, ViewState};
use crate::api::LogsApi;
use crate::error::ApiError;
use crate::session::Session;

/// Source of a list view: how to fetch the items and how to delete one.
#[async_trait]
pub trait Listing: Send + Sync {
    type Item: Send;
    type Id: Copy + Display + Send + Sync + 'static;

    async fn fetch(&self, api: &dyn LogsApi) -> Result<Vec<Self::Item>, ApiError>;

    async fn remove(&self, api: &dyn LogsApi, id: Self::Id) -> Result<(), ApiError>;

    fn describe(&self) -> String;
}

/// All experiments.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExperimentListing;

/// Runs of one experiment, newest first.
#[derive(Debug, Clone)]
pub struct RunListing {
    pub experiment_name: String,
}

#[async_trait]
impl Listing for ExperimentListing {
    type Item = Experiment;
    type Id = ExperimentId;

    async fn fetch(&self, api: &dyn LogsApi) -> Result<Vec<Experiment>, ApiError> {
        api.list_experiments().await
    }

    async fn remove(&self, api: &dyn LogsApi, id: ExperimentId) -> Result<(), ApiError> {
        api.remove_experiment(id).await
    }

    fn describe(&self) -> String {
        "experiments".to_string()
    }
}

#[async_trait]
impl Listing for RunListing {
    type Item = ExperimentRun;
    type Id = RunId;

    async fn fetch(&self, api: &dyn LogsApi) -> Result<Vec<ExperimentRun>, ApiError> {
        api.list_runs(Some(&self.experiment_name)).await
    }

    async fn remove(&self, api: &dyn LogsApi, id: RunId) -> Result<(), ApiError> {
        api.remove_run(id).await
    }

    fn describe(&self) -> String {
        format!("runs of '{}'", self.experiment_name)
    }
}

/// Refreshable list of experiments or runs.
///
/// Defaults to [`RefreshPolicy::Clear`]: a refresh first empties the list.
pub struct ListView<L: Listing> {
    api: Arc<dyn LogsApi>,
    session: Session,
    listing: L,
    refresh: Refresh,
    items: Option<Vec<L::Item>>,
}

impl<L: Listing> ListView<L> {
    pub fn new(api: Arc<dyn LogsApi>, session: Session, listing: L) -> Self {
        Self {
            api,
            session,
            listing,
            refresh: Refresh::new(RefreshPolicy::Clear),
            items: None,
        }
    }

    pub fn with_policy(mut self, policy: RefreshPolicy) -> Self {
        self.refresh.policy = policy;
        self
    }

    /// `None` until the first successful fetch, or while cleared.
    pub fn items(&self) -> Option<&[L::Item]> {
        self.items.as_deref()
    }

    pub fn state(&self) -> ViewState {
        self.refresh.state
    }

    pub fn last_error(&self) -> Option<&str> {
        self.refresh.last_error.as_deref()
    }

    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        if self.refresh.begin() {
            self.items = None;
        }
        debug!("fetching {}", self.listing.describe());

        match self.listing.fetch(self.api.as_ref()).await {
            Ok(items) => {
                self.items = Some(items);
                self.refresh.succeed();
                Ok(())
            }
            Err(e) => {
                warn!("fetching {} failed: {}", self.listing.describe(), e);
                self.session.observe_error(&e);
                self.refresh.fail(&e);
                Err(e)
            }
        }
    }

    /// Delete one item on the server, then refresh.
    pub async fn remove(&mut self, id: L::Id) -> Result<(), ApiError> {
        if let Err(e) = self.listing.remove(self.api.as_ref(), id).await {
            self.session.observe_error(&e);
            return Err(e);
        }
        info!("removed {} from {}", id, self.listing.describe());
        self.refresh().await
    }
}
