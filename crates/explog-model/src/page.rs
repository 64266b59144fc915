use serde::{Deserialize, Serialize};

use crate::LogLevel;

pub const DEFAULT_LIMIT: usize = 25;
const MAX_LIMIT: usize = 1000;

/// Query parameters for paging through a run's log entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub level: Option<LogLevel>,
    pub limit: usize,
    pub offset: usize,
}

/// One page of a limit/offset listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Total number of items matching the query, across all pages.
    pub count: usize,
    /// URL of the following page, absent on the last one.
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl LogQuery {
    pub fn new() -> Self {
        Self {
            level: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.clamp(1, MAX_LIMIT);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Query for the page right after one holding `fetched` items.
    pub fn advanced(&self, fetched: usize) -> Self {
        Self {
            offset: self.offset + fetched,
            ..self.clone()
        }
    }
}

impl Default for LogQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_server_paging() {
        let q = LogQuery::new();
        assert_eq!(q.limit, DEFAULT_LIMIT);
        assert_eq!(q.offset, 0);
        assert!(q.level.is_none());
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(LogQuery::new().with_limit(0).limit, 1);
        assert_eq!(LogQuery::new().with_limit(50_000).limit, MAX_LIMIT);
    }

    #[test]
    fn advanced_keeps_filter() {
        let q = LogQuery::new()
            .with_level(LogLevel::Warn)
            .with_offset(25)
            .advanced(25);
        assert_eq!(q.offset, 50);
        assert_eq!(q.level, Some(LogLevel::Warn));
    }

    #[test]
    fn decodes_page() {
        let page: Page<u32> = serde_json::from_str(
            r#"{"count": 3, "next": "http://x/api/logs/1?limit=2&offset=2", "previous": null, "results": [1, 2]}"#,
        )
        .unwrap();
        assert!(page.has_next());
        assert_eq!(page.results, vec![1, 2]);
    }
}
