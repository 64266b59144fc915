//! Client-side logic of the experiment-log viewer: run aggregation, session handling and refreshable views.

mod error;
pub use error::ApiError;

mod api;
pub use api::LogsApi;

pub mod elapsed;
pub use elapsed::ElapsedMode;

pub mod aggregate;
pub use aggregate::{Aggregator, RunBreakdown, aggregate};

pub mod session;
pub use session::Session;

pub mod view;
pub use view::{
    ExperimentListing, ListView, Listing, LogFeed, RefreshPolicy, RunDetails, RunListing,
    ViewState,
};

pub use explog_model as model;

#[cfg(test)]
mod testing;
