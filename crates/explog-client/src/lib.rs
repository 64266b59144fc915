mod config;
pub use config::{ClientConfig, DEFAULT_BASE_URL};

mod errors;
pub use errors::ClientError;

mod http;
pub use http::HttpLogsApi;
