use crate::{ArtifactKind, ArtifactRef, JobId, JobStatus, RequestId, RunRequest};

/// Reply to a start request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartReply {
    Started { job_id: JobId },
    LoginRequired,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Presentation layer is up; greet and load artifact listings.
    Init,
    /// Operator submitted a row range and session identifier.
    StartRequested(RunRequest),
    /// Backend answered the start request `request_id`.
    StartResponded {
        request_id: RequestId,
        result: Result<StartReply, String>,
    },
    /// Operator asked the backend to open a browser for manual login.
    ManualLoginRequested,
    ManualLoginResponded(Result<(), String>),
    /// Operator finished logging in; save the session and run.
    ConfirmSessionRequested,
    ConfirmSessionResponded {
        request_id: RequestId,
        result: Result<JobId, String>,
    },
    /// Operator closed the login prompt without continuing.
    LoginDismissed,
    /// One poll tick completed for `job_id`.
    StatusPolled {
        job_id: JobId,
        result: Result<JobStatus, String>,
    },
    ArtifactsRequested(ArtifactKind),
    ArtifactsListed {
        kind: ArtifactKind,
        result: Result<Vec<ArtifactRef>, String>,
    },
    /// Operator asked for an artifact to be saved locally.
    DownloadRequested(String),
    /// Download finished; `Ok` carries the saved path.
    DownloadFinished {
        name: String,
        result: Result<String, String>,
    },
    ClearConsole,
    /// Operator cleared the current job.
    Reset,
}
