use crate::{ArtifactKind, JobId, LoginRequest, RequestId, RunRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartJob {
        request_id: RequestId,
        request: RunRequest,
    },
    LaunchLogin(LoginRequest),
    SaveSession {
        request_id: RequestId,
        request: LoginRequest,
    },
    /// Begin polling `job_id`, replacing any poller already running.
    StartPolling { job_id: JobId },
    StopPolling,
    ListArtifacts(ArtifactKind),
    DownloadArtifact { name: String },
}
