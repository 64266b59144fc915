use explog_core::ApiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid base url: {0}")]
    InvalidUrl(String),

    #[error("http request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("unauthorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::InvalidUrl(msg) => ApiError::Transport(format!("invalid url: {msg}")),
            ClientError::HttpRequest(e) => ApiError::Transport(e.to_string()),
            ClientError::Unauthorized { message, .. } => ApiError::Unauthorized(message),
            ClientError::NotFound(what) => ApiError::NotFound(what),
            ClientError::Status { status, message } => ApiError::Server { status, message },
            ClientError::InvalidResponse(msg) => ApiError::InvalidResponse(msg),
        }
    }
}
