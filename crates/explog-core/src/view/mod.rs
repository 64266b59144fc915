//! Refresh-driven views over the remote API.
//!
//! Each view runs `Idle -> Fetching -> Idle` on every refresh. A view is driven through `&mut self`,
//! so at most one fetch per view is in flight and the last completed one is what the view shows.

mod list;
mod logs;
mod run;

pub use list::{ExperimentListing, ListView, Listing, RunListing};
pub use logs::LogFeed;
pub use run::RunDetails;

use explog_model::Timestamp;

/// What a view shows while a refresh is running or after it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPolicy {
    /// Keep the previous data until new data arrives; keep it after a failure.
    #[default]
    KeepStale,
    /// Drop the data when the refresh starts; a failure leaves the view empty.
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Idle,
    Fetching,
}

/// Bookkeeping shared by every view.
#[derive(Debug, Clone, Default)]
pub(crate) struct Refresh {
    pub(crate) policy: RefreshPolicy,
    pub(crate) state: ViewState,
    pub(crate) last_error: Option<String>,
    pub(crate) refreshed_at: Option<Timestamp>,
}

impl Refresh {
    pub(crate) fn new(policy: RefreshPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    /// Enter `Fetching`; returns whether the caller should drop its data now.
    pub(crate) fn begin(&mut self) -> bool {
        self.state = ViewState::Fetching;
        self.policy == RefreshPolicy::Clear
    }

    pub(crate) fn succeed(&mut self) {
        self.state = ViewState::Idle;
        self.last_error = None;
        self.refreshed_at = Some(Timestamp::now());
    }

    pub(crate) fn fail(&mut self, err: &crate::ApiError) {
        self.state = ViewState::Idle;
        self.last_error = Some(err.to_string());
    }
}
