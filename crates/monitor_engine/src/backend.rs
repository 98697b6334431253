use std::time::Duration;

use futures_util::StreamExt;
use monitor_logging::monitor_debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::wire::{self, CommandReply, ErrorBody, LogFileEntry, SessionFileEntry};
use crate::{ApiError, ApiErrorKind, Artifact, ArtifactKind, RunParams, StartOutcome, TaskStatus};

#[derive(Debug, Clone)]
pub struct BackendSettings {
    /// Base of the REST API, e.g. `http://localhost:5000/api`.
    pub api_base: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Upper bound for a downloaded artifact.
    pub max_artifact_bytes: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:5000/api".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_artifact_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Logical operations offered by the automation backend.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn start(&self, params: &RunParams) -> Result<StartOutcome, ApiError>;

    async fn status(&self, task_id: &str) -> Result<TaskStatus, ApiError>;

    async fn list_artifacts(&self, kind: ArtifactKind) -> Result<Vec<Artifact>, ApiError>;

    async fn launch_login(&self, params: &RunParams) -> Result<(), ApiError>;

    /// Saves the freshly authenticated session and starts the run.
    async fn confirm_session(&self, params: &RunParams) -> Result<String, ApiError>;

    async fn fetch_artifact(&self, file_name: &str) -> Result<Vec<u8>, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: BackendSettings,
    base: Url,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: BackendSettings) -> Result<Self, ApiError> {
        let base = Url::parse(&settings.api_base)
            .map_err(|err| ApiError::new(ApiErrorKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::new(
                ApiErrorKind::InvalidUrl,
                format!("{} cannot be used as a base url", settings.api_base),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(ApiErrorKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base,
            client,
        })
    }

    /// Appends percent-encoded path segments to the API base.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::new(ApiErrorKind::InvalidUrl, "api base has no path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        monitor_debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode_json(response).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, ApiError> {
        monitor_debug!("POST {}", url);
        let payload = serde_json::to_vec(body)
            .map_err(|err| ApiError::new(ApiErrorKind::Decode, err.to_string()))?;
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode_json(response).await
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn start(&self, params: &RunParams) -> Result<StartOutcome, ApiError> {
        let reply: CommandReply = self.post_json(self.endpoint(&["run"])?, params).await?;
        match reply.status.as_str() {
            "started" => Ok(StartOutcome::Started {
                task_id: require_task_id(reply)?,
            }),
            "login_required" => Ok(StartOutcome::LoginRequired),
            _ => Err(unexpected(reply)),
        }
    }

    async fn status(&self, task_id: &str) -> Result<TaskStatus, ApiError> {
        self.get_json(self.endpoint(&["task_status", task_id])?)
            .await
    }

    async fn list_artifacts(&self, kind: ArtifactKind) -> Result<Vec<Artifact>, ApiError> {
        let url = self.endpoint(&[wire::listing_path(kind)])?;
        let artifacts = match kind {
            ArtifactKind::Logs => self
                .get_json::<Vec<LogFileEntry>>(url)
                .await?
                .into_iter()
                .map(Artifact::from)
                .collect(),
            ArtifactKind::Sessions => self
                .get_json::<Vec<SessionFileEntry>>(url)
                .await?
                .into_iter()
                .map(Artifact::from)
                .collect(),
        };
        Ok(artifacts)
    }

    async fn launch_login(&self, params: &RunParams) -> Result<(), ApiError> {
        let mut url = self.endpoint(&["login"])?;
        url.query_pairs_mut()
            .append_pair("cookie_name", &params.session_name)
            .append_pair("start_row", &params.start_row.to_string())
            .append_pair("end_row", &params.end_row.to_string());
        let reply: CommandReply = self.get_json(url).await?;
        if reply.status == "browser_opened" {
            Ok(())
        } else {
            Err(unexpected(reply))
        }
    }

    async fn confirm_session(&self, params: &RunParams) -> Result<String, ApiError> {
        let reply: CommandReply = self
            .post_json(self.endpoint(&["save_cookies"])?, params)
            .await?;
        if reply.status == "started" {
            require_task_id(reply)
        } else {
            Err(unexpected(reply))
        }
    }

    async fn fetch_artifact(&self, file_name: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(&["logs", file_name])?;
        monitor_debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;

        let max_bytes = self.settings.max_artifact_bytes;
        if response.content_length().is_some_and(|len| len > max_bytes) {
            return Err(ApiError::new(
                ApiErrorKind::TooLarge { max_bytes },
                "artifact too large",
            ));
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                return Err(ApiError::new(
                    ApiErrorKind::TooLarge { max_bytes },
                    "artifact too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await.unwrap_or_default();
    let detail = serde_json::from_slice::<ErrorBody>(&body)
        .ok()
        .and_then(|body| body.message.or(body.error))
        .unwrap_or_else(|| status.to_string());
    Err(ApiError::new(ApiErrorKind::HttpStatus(status.as_u16()), detail))
}

async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let response = ensure_success(response).await?;
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&body).map_err(|err| ApiError::new(ApiErrorKind::Decode, err.to_string()))
}

fn require_task_id(reply: CommandReply) -> Result<String, ApiError> {
    match reply.task_id {
        Some(task_id) if !task_id.is_empty() => Ok(task_id),
        _ => Err(ApiError::new(
            ApiErrorKind::UnexpectedReply,
            "started reply without task_id",
        )),
    }
}

fn unexpected(reply: CommandReply) -> ApiError {
    let detail = match reply.message {
        Some(message) => format!("status {}: {}", reply.status, message),
        None => format!("status {}", reply.status),
    };
    ApiError::new(ApiErrorKind::UnexpectedReply, detail)
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(ApiErrorKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(ApiErrorKind::Decode, err.to_string());
    }
    ApiError::new(ApiErrorKind::Network, err.to_string())
}
