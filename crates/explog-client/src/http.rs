use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use explog_core::{ApiError, LogsApi, Session};
use explog_model::{
    AuthToken, Credentials, Experiment, ExperimentId, ExperimentRun, LogEntry, LogQuery, Page,
    RunId, User,
};

use crate::config::ClientConfig;
use crate::errors::ClientError;

/// Longest slice of an error body kept in error messages.
const MAX_ERROR_BODY: usize = 512;

/// [`LogsApi`] over the server's REST endpoints.
///
/// Authenticated calls carry `Authorization: Token <key>` taken from the shared [`Session`] at request time,
/// so logging in through one handle is visible to every other holder of the session.
pub struct HttpLogsApi {
    http: reqwest::Client,
    base: Url,
    session: Session,
}

#[derive(Deserialize)]
struct VersionResponse {
    version: String,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: AuthToken,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "detail")]
    message: String,
}

impl HttpLogsApi {
    pub fn new(config: &ClientConfig, session: Session) -> Result<Self, ClientError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(config.base_url.clone()));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            base,
            session,
        })
    }

    /// `base` + `segments`; an empty trailing segment yields a trailing slash.
    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => req.header(AUTHORIZATION, token.header_value()),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, ClientError> {
        let response = self.authorize(req).send().await?;
        trace!("{} {}", response.status(), response.url());
        check_status(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        debug!("GET {}", url);
        let response = self.send(self.http.get(url)).await?;
        decode(response).await
    }

    async fn delete(&self, url: Url) -> Result<(), ClientError> {
        debug!("DELETE {}", url);
        self.send(self.http.delete(url)).await?;
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let path = response.url().path().to_string();
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| status.to_string());

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized {
            status: status.as_u16(),
            message,
        },
        StatusCode::NOT_FOUND => ClientError::NotFound(path),
        _ => ClientError::Status {
            status: status.as_u16(),
            message,
        },
    })
}

fn error_message(body: &str) -> Option<String> {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return Some(parsed.message);
    }
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    Some(body.chars().take(MAX_ERROR_BODY).collect())
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        let excerpt: String = body.chars().take(MAX_ERROR_BODY).collect();
        ClientError::InvalidResponse(format!("failed to parse response: {}, body: {}", e, excerpt))
    })
}

#[async_trait]
impl LogsApi for HttpLogsApi {
    async fn version(&self) -> Result<String, ApiError> {
        let url = self.url(&["version"])?;
        let res: VersionResponse = self.get_json(url).await?;
        Ok(res.version)
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthToken, ApiError> {
        let url = self.url(&["auth", "login"])?;
        debug!("POST {} as {}", url, credentials.username);
        // Credentials go out without any stale token.
        let response = self
            .http
            .post(url)
            .json(credentials)
            .send()
            .await
            .map_err(ClientError::from)?;
        let response = check_status(response).await?;
        let res: LoginResponse = decode(response).await?;
        Ok(res.token)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let url = self.url(&["auth", "logout"])?;
        debug!("POST {}", url);
        self.send(self.http.post(url).json(&serde_json::json!({})))
            .await?;
        Ok(())
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        let url = self.url(&["user"])?;
        Ok(self.get_json(url).await?)
    }

    async fn list_experiments(&self) -> Result<Vec<Experiment>, ApiError> {
        let url = self.url(&["experiments", ""])?;
        Ok(self.get_json(url).await?)
    }

    async fn get_experiment(&self, id: ExperimentId) -> Result<Experiment, ApiError> {
        let url = self.url(&["experiments", &id.to_string(), ""])?;
        Ok(self.get_json(url).await?)
    }

    async fn remove_experiment(&self, id: ExperimentId) -> Result<(), ApiError> {
        let url = self.url(&["experiments", &id.to_string(), ""])?;
        Ok(self.delete(url).await?)
    }

    async fn list_runs(
        &self,
        experiment_name: Option<&str>,
    ) -> Result<Vec<ExperimentRun>, ApiError> {
        let mut url = self.url(&["experiments_runs", ""])?;
        if let Some(name) = experiment_name {
            url.query_pairs_mut().append_pair("experiment_name", name);
        }
        Ok(self.get_json(url).await?)
    }

    async fn get_run(&self, id: RunId) -> Result<ExperimentRun, ApiError> {
        let url = self.url(&["experiments_runs", &id.to_string(), ""])?;
        Ok(self.get_json(url).await?)
    }

    async fn remove_run(&self, id: RunId) -> Result<(), ApiError> {
        let url = self.url(&["experiments_runs", &id.to_string(), ""])?;
        Ok(self.delete(url).await?)
    }

    async fn get_logs(
        &self,
        run_id: RunId,
        query: &LogQuery,
    ) -> Result<Page<LogEntry>, ApiError> {
        let mut url = self.url(&["logs", &run_id.to_string(), ""])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("limit", &query.limit.to_string())
                .append_pair("offset", &query.offset.to_string());
            if let Some(level) = query.level {
                pairs.append_pair("level", level.as_str());
            }
        }
        Ok(self.get_json(url).await?)
    }
}
