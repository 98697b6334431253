use std::sync::{mpsc, Arc};

use monitor_core::{
    ArtifactKind, ArtifactRef, CurrentItem, Effect, JobPhase, JobResult, JobStatus, LogLine, Msg,
    RunRequest, Severity, StartReply,
};
use monitor_engine::{
    ApiError, Artifact, EngineConfig, EngineEvent, EngineHandle, EventSink, RunParams,
    StartOutcome, TaskResult, TaskState, TaskStatus,
};
use monitor_logging::{monitor_debug, monitor_info, monitor_warn};

use super::app::UiEvent;

/// Executes core effects against the engine.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(config: EngineConfig, ui_tx: mpsc::Sender<UiEvent>) -> Result<Self, ApiError> {
        let sink = Arc::new(MsgSink { tx: ui_tx });
        let engine = EngineHandle::new(config, sink)?;
        Ok(Self { engine })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartJob {
                    request_id,
                    request,
                } => {
                    monitor_info!(
                        "StartJob #{} session={} rows={}..={}",
                        request_id,
                        request.session_name,
                        request.start_row,
                        request.end_row
                    );
                    self.engine.start(request_id, to_params(request));
                }
                Effect::LaunchLogin(request) => {
                    monitor_info!("LaunchLogin session={}", request.session_name);
                    self.engine.launch_login(to_params(request));
                }
                Effect::SaveSession {
                    request_id,
                    request,
                } => {
                    monitor_info!(
                        "SaveSession #{} session={}",
                        request_id,
                        request.session_name
                    );
                    self.engine.save_session(request_id, to_params(request));
                }
                Effect::StartPolling { job_id } => self.engine.start_polling(job_id),
                Effect::StopPolling => self.engine.stop_polling(),
                Effect::ListArtifacts(kind) => self.engine.list_artifacts(engine_kind(kind)),
                Effect::DownloadArtifact { name } => self.engine.download(name),
            }
        }
    }
}

/// Forwards engine events into the UI loop as core messages.
struct MsgSink {
    tx: mpsc::Sender<UiEvent>,
}

impl EventSink for MsgSink {
    fn emit(&self, event: EngineEvent) {
        let msg = map_event(event);
        if self.tx.send(UiEvent::Msg(msg)).is_err() {
            monitor_debug!("UI loop closed; engine event dropped");
        }
    }
}

fn to_params(request: RunRequest) -> RunParams {
    RunParams {
        start_row: request.start_row,
        end_row: request.end_row,
        session_name: request.session_name,
    }
}

fn engine_kind(kind: ArtifactKind) -> monitor_engine::ArtifactKind {
    match kind {
        ArtifactKind::Logs => monitor_engine::ArtifactKind::Logs,
        ArtifactKind::Sessions => monitor_engine::ArtifactKind::Sessions,
    }
}

fn core_kind(kind: monitor_engine::ArtifactKind) -> ArtifactKind {
    match kind {
        monitor_engine::ArtifactKind::Logs => ArtifactKind::Logs,
        monitor_engine::ArtifactKind::Sessions => ArtifactKind::Sessions,
    }
}

pub(crate) fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::StartCompleted { request_id, result } => Msg::StartResponded {
            request_id,
            result: result
                .map(|outcome| match outcome {
                    StartOutcome::Started { task_id } => StartReply::Started { job_id: task_id },
                    StartOutcome::LoginRequired => StartReply::LoginRequired,
                })
                .map_err(|err| err.to_string()),
        },
        EngineEvent::LoginLaunched(result) => {
            Msg::ManualLoginResponded(result.map_err(|err| err.to_string()))
        }
        EngineEvent::SessionSaved { request_id, result } => Msg::ConfirmSessionResponded {
            request_id,
            result: result.map_err(|err| err.to_string()),
        },
        EngineEvent::StatusFetched { task_id, result } => Msg::StatusPolled {
            job_id: task_id,
            result: result.map(map_status).map_err(|err| {
                monitor_warn!("Status poll failed: {}", err);
                err.to_string()
            }),
        },
        EngineEvent::ArtifactsListed { kind, result } => Msg::ArtifactsListed {
            kind: core_kind(kind),
            result: result
                .map(|items| items.into_iter().map(map_artifact).collect())
                .map_err(|err| err.to_string()),
        },
        EngineEvent::ArtifactDownloaded { name, result } => Msg::DownloadFinished {
            name,
            result: result
                .map(|path| path.display().to_string())
                .map_err(|err| err.to_string()),
        },
    }
}

pub(crate) fn map_status(status: TaskStatus) -> JobStatus {
    let phase = match status.status {
        TaskState::Initializing | TaskState::Running => JobPhase::Running,
        TaskState::SavingCookies => JobPhase::SavingSession,
        TaskState::Completed => JobPhase::Completed,
        TaskState::Failed => JobPhase::Failed,
    };

    let log_lines = status
        .console_logs
        .iter()
        .map(|line| LogLine {
            message: line.message().to_string(),
            severity: line.level().and_then(Severity::from_level),
        })
        .collect();

    let current_item = match (status.current_member, status.current_family) {
        (Some(member_id), Some(family_id)) => Some(CurrentItem {
            member_id,
            family_id,
        }),
        _ => None,
    };

    JobStatus {
        phase,
        progress: status.progress,
        started_at: status.start_time,
        ended_at: status.end_time,
        result: status.result.map(map_result),
        error_message: status.error,
        log_lines,
        current_item,
    }
}

fn map_result(result: TaskResult) -> JobResult {
    JobResult {
        processed_count: result.total_processed,
        success_count: result.success_count,
        failure_count: result.fail_count,
        success_artifact: result.success_file,
        failure_artifact: result.fail_file,
    }
}

fn map_artifact(artifact: Artifact) -> ArtifactRef {
    ArtifactRef {
        name: artifact.name,
        file_name: artifact.file_name,
        size: artifact.size,
        modified: artifact.modified,
    }
}
