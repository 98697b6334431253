use monitor_logging::{monitor_debug, monitor_info, monitor_warn};

use crate::state::PendingRequest;
use crate::{AppState, ArtifactKind, Effect, JobPhase, Msg, Severity, StartReply, TaskPhase};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Init => {
            state.log(
                Severity::Info,
                "System initialized. Ready for automation tasks.",
            );
            vec![
                Effect::ListArtifacts(ArtifactKind::Logs),
                Effect::ListArtifacts(ArtifactKind::Sessions),
            ]
        }
        Msg::StartRequested(request) => {
            if state.pending().is_some() {
                monitor_debug!("Start ignored: a request is already in flight");
                state.log(Severity::Warning, "⏳ A request is already in progress");
                return (state, Vec::new());
            }
            if state.phase().is_active() {
                state.log(Severity::Error, "❌ A task is already running");
                return (state, Vec::new());
            }
            let request = match request.validated() {
                Ok(request) => request,
                Err(err) => {
                    monitor_info!("Rejected start request: {}", err);
                    state.log(
                        Severity::Error,
                        format!("❌ Invalid input parameters: {err}"),
                    );
                    return (state, Vec::new());
                }
            };

            state.return_to_idle();
            state.log(
                Severity::Info,
                format!(
                    "🚀 Initiating automation for session: {}",
                    request.session_name
                ),
            );
            state.log(
                Severity::Info,
                format!(
                    "📊 Processing rows {} to {}",
                    request.start_row, request.end_row
                ),
            );
            let request_id = state.next_request_id();
            state.set_pending(PendingRequest::Start {
                id: request_id,
                request: request.clone(),
            });
            vec![Effect::StartJob {
                request_id,
                request,
            }]
        }
        Msg::StartResponded { request_id, result } => {
            let request = match state.take_pending(request_id) {
                Some(PendingRequest::Start { request, .. }) => request,
                other => {
                    monitor_debug!(
                        "Dropping start reply #{}, pending={:?}",
                        request_id,
                        other
                    );
                    return (state, Vec::new());
                }
            };
            match result {
                Ok(StartReply::Started { job_id }) => {
                    monitor_info!("Job {} started", job_id);
                    state.begin_job(job_id.clone(), JobPhase::Running, 0.0);
                    state.log(Severity::Success, "✅ Automation task started successfully");
                    vec![Effect::StartPolling { job_id }]
                }
                Ok(StartReply::LoginRequired) => {
                    state.require_login(request);
                    state.log(
                        Severity::Warning,
                        "⚠️ Session not found. Manual login required.",
                    );
                    Vec::new()
                }
                Err(err) => {
                    monitor_warn!("Start request failed: {}", err);
                    state.log(
                        Severity::Error,
                        format!("❌ Failed to start automation task: {err}"),
                    );
                    Vec::new()
                }
            }
        }
        Msg::ManualLoginRequested => match state.login_request().cloned() {
            Some(request) if state.phase() == TaskPhase::LoginRequired => {
                state.log(
                    Severity::Info,
                    "🌐 Opening browser for manual authentication...",
                );
                vec![Effect::LaunchLogin(request)]
            }
            _ => {
                monitor_debug!("Manual login ignored outside the login flow");
                Vec::new()
            }
        },
        Msg::ManualLoginResponded(result) => {
            match result {
                Ok(()) => state.log(
                    Severity::Success,
                    "✅ Browser launched. Please complete authentication.",
                ),
                Err(err) => {
                    monitor_warn!("Manual login launch failed: {}", err);
                    state.log(
                        Severity::Error,
                        format!("❌ Failed to launch authentication browser: {err}"),
                    );
                }
            }
            Vec::new()
        }
        Msg::ConfirmSessionRequested => {
            if state.pending().is_some() {
                monitor_debug!("Confirm ignored: a request is already in flight");
                state.log(Severity::Warning, "⏳ A request is already in progress");
                return (state, Vec::new());
            }
            match state.login_request().cloned() {
                Some(request) if state.phase() == TaskPhase::LoginRequired => {
                    state.log(Severity::Info, "💾 Saving authentication session...");
                    let request_id = state.next_request_id();
                    state.set_pending(PendingRequest::ConfirmSession { id: request_id });
                    vec![Effect::SaveSession {
                        request_id,
                        request,
                    }]
                }
                _ => {
                    monitor_debug!("Confirm ignored outside the login flow");
                    Vec::new()
                }
            }
        }
        Msg::ConfirmSessionResponded { request_id, result } => {
            match state.take_pending(request_id) {
                Some(PendingRequest::ConfirmSession { .. }) => {}
                other => {
                    monitor_debug!(
                        "Dropping save-session reply #{}, pending={:?}",
                        request_id,
                        other
                    );
                    return (state, Vec::new());
                }
            }
            match result {
                Ok(job_id) => {
                    monitor_info!("Session saved, job {} started", job_id);
                    state.begin_job(job_id.clone(), JobPhase::SavingSession, 10.0);
                    state.log(Severity::Success, "✅ Session saved. Starting automation...");
                    vec![
                        Effect::StartPolling { job_id },
                        Effect::ListArtifacts(ArtifactKind::Sessions),
                    ]
                }
                Err(err) => {
                    monitor_warn!("Save session failed: {}", err);
                    state.log(
                        Severity::Error,
                        format!("❌ Failed to save session and start automation: {err}"),
                    );
                    Vec::new()
                }
            }
        }
        Msg::LoginDismissed => {
            state.dismiss_login();
            Vec::new()
        }
        Msg::StatusPolled { job_id, result } => match result {
            Ok(status) => match state.apply_status(&job_id, status) {
                Some(TaskPhase::Completed) => {
                    monitor_info!("Job {} completed", job_id);
                    vec![
                        Effect::StopPolling,
                        Effect::ListArtifacts(ArtifactKind::Logs),
                    ]
                }
                Some(TaskPhase::Failed) => {
                    monitor_info!("Job {} failed", job_id);
                    vec![Effect::StopPolling]
                }
                _ => Vec::new(),
            },
            Err(err) => {
                if state.handle().is_some_and(|h| h.id == job_id) {
                    // Polling keeps going; the remote job may still be alive.
                    monitor_warn!("Status fetch for {} failed: {}", job_id, err);
                    state.log(Severity::Error, "❌ Failed to fetch task status");
                }
                Vec::new()
            }
        },
        Msg::ArtifactsRequested(kind) => vec![Effect::ListArtifacts(kind)],
        Msg::ArtifactsListed { kind, result } => {
            match result {
                Ok(artifacts) => state.set_artifacts(kind, artifacts),
                Err(err) => {
                    monitor_warn!("Listing {} failed: {}", kind.label(), err);
                    state.log(
                        Severity::Error,
                        format!("❌ Failed to fetch {}", kind.label()),
                    );
                }
            }
            Vec::new()
        }
        Msg::DownloadRequested(name) => {
            state.log(Severity::Info, format!("📥 Downloading log file: {name}"));
            vec![Effect::DownloadArtifact { name }]
        }
        Msg::DownloadFinished { name, result } => {
            match result {
                Ok(path) => {
                    monitor_info!("Saved {} to {}", name, path);
                    state.log(Severity::Success, format!("✅ Downloaded: {name}"));
                }
                Err(err) => {
                    monitor_warn!("Download of {} failed: {}", name, err);
                    state.log(Severity::Error, format!("❌ Failed to download: {name}"));
                }
            }
            Vec::new()
        }
        Msg::ClearConsole => {
            state.clear_console();
            state.log(Severity::Info, "🔄 Console cleared");
            Vec::new()
        }
        Msg::Reset => {
            if state.reset() {
                vec![Effect::StopPolling]
            } else {
                Vec::new()
            }
        }
    };

    (state, effects)
}
