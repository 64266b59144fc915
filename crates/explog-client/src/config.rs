pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, including the `/api` prefix.
    pub base_url: String,
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: 15_000,
            user_agent: concat!("explog/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
