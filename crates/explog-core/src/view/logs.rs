use std::sync::Arc;

use explog_model::{LogEntry, LogLevel, LogQuery, RunId};
use tracing::{debug, warn};

use super::{Refresh, RefreshPolicy, ViewState};
use crate::api::LogsApi;
use crate::error::ApiError;
use crate::session::Session;

/// Paged log entries of one run, newest first, with an optional minimum level.
pub struct LogFeed {
    api: Arc<dyn LogsApi>,
    session: Session,
    run_id: RunId,
    query: LogQuery,
    refresh: Refresh,
    entries: Vec<LogEntry>,
    total: usize,
    has_more: bool,
}

impl LogFeed {
    pub fn new(api: Arc<dyn LogsApi>, session: Session, run_id: RunId) -> Self {
        Self {
            api,
            session,
            run_id,
            query: LogQuery::new(),
            refresh: Refresh::new(RefreshPolicy::Clear),
            entries: Vec::new(),
            total: 0,
            has_more: false,
        }
    }

    pub fn with_page_size(mut self, limit: usize) -> Self {
        self.query = self.query.with_limit(limit);
        self
    }

    pub fn with_level(mut self, level: Option<LogLevel>) -> Self {
        self.query.level = level;
        self
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Number of matching entries on the server, as of the last page.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn level(&self) -> Option<LogLevel> {
        self.query.level
    }

    pub fn state(&self) -> ViewState {
        self.refresh.state
    }

    /// Start over from the newest entry.
    pub async fn load_first(&mut self) -> Result<usize, ApiError> {
        self.refresh.begin();
        self.entries.clear();
        self.total = 0;
        self.has_more = false;
        self.query.offset = 0;
        self.fetch().await
    }

    /// Append the next page; returns how many entries were added.
    pub async fn load_more(&mut self) -> Result<usize, ApiError> {
        if !self.has_more {
            return Ok(0);
        }
        self.refresh.begin();
        self.query = self.query.clone().with_offset(self.entries.len());
        self.fetch().await
    }

    /// Change the minimum level and reload from the first page.
    pub async fn set_level(&mut self, level: Option<LogLevel>) -> Result<usize, ApiError> {
        self.query.level = level;
        self.load_first().await
    }

    async fn fetch(&mut self) -> Result<usize, ApiError> {
        debug!(
            "fetching logs of run {} (offset={}, limit={}, level={:?})",
            self.run_id, self.query.offset, self.query.limit, self.query.level
        );
        match self.api.get_logs(self.run_id, &self.query).await {
            Ok(page) => {
                let added = page.results.len();
                self.total = page.count;
                self.has_more = page.has_next() && added > 0;
                self.entries.extend(page.results);
                self.refresh.succeed();
                Ok(added)
            }
            Err(e) => {
                warn!("fetching logs of run {} failed: {}", self.run_id, e);
                self.session.observe_error(&e);
                self.refresh.fail(&e);
                Err(e)
            }
        }
    }
}
