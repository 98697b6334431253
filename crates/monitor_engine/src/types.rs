use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::persist::PersistError;
use crate::wire::TaskStatus;

/// Parameters of a run, serialized the way the backend expects them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunParams {
    pub start_row: u32,
    pub end_row: u32,
    #[serde(rename = "cookie_name")]
    pub session_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started { task_id: String },
    LoginRequired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Logs,
    Sessions,
}

/// A listed log or session file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub file_name: String,
    pub size: Option<u64>,
    pub modified: Option<String>,
}

#[derive(Debug)]
pub enum EngineEvent {
    /// Reply to the start call tagged `request_id`.
    StartCompleted {
        request_id: u64,
        result: Result<StartOutcome, ApiError>,
    },
    LoginLaunched(Result<(), ApiError>),
    SessionSaved {
        request_id: u64,
        result: Result<String, ApiError>,
    },
    StatusFetched {
        task_id: String,
        result: Result<TaskStatus, ApiError>,
    },
    ArtifactsListed {
        kind: ArtifactKind,
        result: Result<Vec<Artifact>, ApiError>,
    },
    ArtifactDownloaded {
        name: String,
        result: Result<PathBuf, DownloadError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
    UnexpectedReply,
    TooLarge { max_bytes: u64 },
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::InvalidUrl => write!(f, "invalid url"),
            ApiErrorKind::HttpStatus(code) => write!(f, "http status {code}"),
            ApiErrorKind::Timeout => write!(f, "timeout"),
            ApiErrorKind::Network => write!(f, "network error"),
            ApiErrorKind::Decode => write!(f, "malformed response"),
            ApiErrorKind::UnexpectedReply => write!(f, "unexpected reply"),
            ApiErrorKind::TooLarge { max_bytes } => {
                write!(f, "response larger than {max_bytes} bytes")
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("fetch failed: {0}")]
    Api(#[from] ApiError),
    #[error("save failed: {0}")]
    Persist(#[from] PersistError),
}
