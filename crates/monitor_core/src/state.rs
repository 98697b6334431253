use monitor_logging::monitor_debug;
use thiserror::Error;

use crate::{Clock, ConsoleBuffer, LogReconciler, Severity};

pub type JobId = String;

/// Serial of a start or save-session call, echoed back with its reply.
pub type RequestId = u64;

/// Operator-side lifecycle of the single in-flight job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskPhase {
    #[default]
    Idle,
    LoginRequired,
    SavingSession,
    Running,
    Completed,
    Failed,
}

impl TaskPhase {
    /// Active phases are the ones the poller runs in.
    pub fn is_active(self) -> bool {
        matches!(self, TaskPhase::Running | TaskPhase::SavingSession)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskPhase::Completed | TaskPhase::Failed)
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskPhase::Idle => "idle",
            TaskPhase::LoginRequired => "login required",
            TaskPhase::SavingSession => "saving session",
            TaskPhase::Running => "running",
            TaskPhase::Completed => "completed",
            TaskPhase::Failed => "failed",
        }
    }
}

/// Phase as reported by the backend for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Running,
    SavingSession,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub id: JobId,
    pub phase: JobPhase,
}

/// Row range and session identifier for one automation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub start_row: u32,
    pub end_row: u32,
    pub session_name: String,
}

/// Parameters held while the manual login detour is open.
pub type LoginRequest = RunRequest;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("session identifier is empty")]
    EmptySession,
    #[error("start row {start_row} must be below end row {end_row}")]
    EmptyRange { start_row: u32, end_row: u32 },
}

impl RunRequest {
    pub fn new(start_row: u32, end_row: u32, session_name: impl Into<String>) -> Self {
        Self {
            start_row,
            end_row,
            session_name: session_name.into(),
        }
    }

    /// Checks the request and returns it with the session name trimmed.
    pub fn validated(&self) -> Result<RunRequest, ValidationError> {
        let session_name = self.session_name.trim();
        if session_name.is_empty() {
            return Err(ValidationError::EmptySession);
        }
        if self.start_row >= self.end_row {
            return Err(ValidationError::EmptyRange {
                start_row: self.start_row,
                end_row: self.end_row,
            });
        }
        Ok(RunRequest::new(self.start_row, self.end_row, session_name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobResult {
    pub processed_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub success_artifact: Option<String>,
    pub failure_artifact: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CurrentItem {
    pub member_id: String,
    pub family_id: String,
}

/// One server log line, optionally carrying an explicit level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub message: String,
    pub severity: Option<Severity>,
}

impl LogLine {
    pub fn plain(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: None,
        }
    }
}

/// Status snapshot received from one poll.
#[derive(Debug, Clone, PartialEq)]
pub struct JobStatus {
    pub phase: JobPhase,
    pub progress: Option<f64>,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub result: Option<JobResult>,
    pub error_message: Option<String>,
    pub log_lines: Vec<LogLine>,
    pub current_item: Option<CurrentItem>,
}

impl JobStatus {
    pub fn new(phase: JobPhase) -> Self {
        Self {
            phase,
            progress: None,
            started_at: None,
            ended_at: None,
            result: None,
            error_message: None,
            log_lines: Vec::new(),
            current_item: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Logs,
    Sessions,
}

impl ArtifactKind {
    pub fn label(self) -> &'static str {
        match self {
            ArtifactKind::Logs => "log files",
            ArtifactKind::Sessions => "session data",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub name: String,
    pub file_name: String,
    pub size: Option<u64>,
    pub modified: Option<String>,
}

/// A start or save-session call awaiting its reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PendingRequest {
    Start { id: RequestId, request: RunRequest },
    ConfirmSession { id: RequestId },
}

impl PendingRequest {
    pub(crate) fn id(&self) -> RequestId {
        match self {
            PendingRequest::Start { id, .. } | PendingRequest::ConfirmSession { id } => *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    phase: TaskPhase,
    handle: Option<JobHandle>,
    login: Option<LoginRequest>,
    pending: Option<PendingRequest>,
    last_request_id: RequestId,
    progress: Option<f64>,
    last_status: Option<JobStatus>,
    console: ConsoleBuffer,
    reconciler: LogReconciler,
    logs: Vec<ArtifactRef>,
    sessions: Vec<ArtifactRef>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            console: ConsoleBuffer::new(clock),
            ..Self::default()
        }
    }

    pub fn phase(&self) -> TaskPhase {
        self.phase
    }

    pub fn handle(&self) -> Option<&JobHandle> {
        self.handle.as_ref()
    }

    pub fn login_request(&self) -> Option<&LoginRequest> {
        self.login.as_ref()
    }

    pub fn console(&self) -> &ConsoleBuffer {
        &self.console
    }

    pub(crate) fn pending(&self) -> Option<&PendingRequest> {
        self.pending.as_ref()
    }

    pub(crate) fn progress(&self) -> Option<f64> {
        self.progress
    }

    pub(crate) fn last_status(&self) -> Option<&JobStatus> {
        self.last_status.as_ref()
    }

    pub(crate) fn artifacts(&self, kind: ArtifactKind) -> &[ArtifactRef] {
        match kind {
            ArtifactKind::Logs => &self.logs,
            ArtifactKind::Sessions => &self.sessions,
        }
    }

    /// Returns and resets the dirty flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn log(&mut self, severity: Severity, message: impl Into<String>) {
        self.console.append(severity, message);
        self.dirty = true;
    }

    pub(crate) fn clear_console(&mut self) {
        self.console.clear();
        self.dirty = true;
    }

    /// Hands out a serial that no earlier request used, even across resets.
    pub(crate) fn next_request_id(&mut self) -> RequestId {
        self.last_request_id += 1;
        self.last_request_id
    }

    pub(crate) fn set_pending(&mut self, pending: PendingRequest) {
        self.pending = Some(pending);
        self.dirty = true;
    }

    /// Takes the pending request only if `id` is its serial; replies to
    /// requests dropped by a reset find nothing.
    pub(crate) fn take_pending(&mut self, id: RequestId) -> Option<PendingRequest> {
        if self.pending.as_ref().map(PendingRequest::id) != Some(id) {
            return None;
        }
        self.dirty = true;
        self.pending.take()
    }

    /// Leaves a terminal phase so a new run can be submitted.
    pub(crate) fn return_to_idle(&mut self) {
        if self.phase.is_terminal() {
            self.phase = TaskPhase::Idle;
            self.dirty = true;
        }
    }

    pub(crate) fn require_login(&mut self, request: LoginRequest) {
        self.phase = TaskPhase::LoginRequired;
        self.login = Some(request);
        self.dirty = true;
    }

    pub(crate) fn dismiss_login(&mut self) -> bool {
        if self.phase != TaskPhase::LoginRequired {
            return false;
        }
        self.phase = TaskPhase::Idle;
        self.login = None;
        self.dirty = true;
        true
    }

    /// Installs a fresh job handle: clears the console and the reconciler
    /// so the new job's log stream is read from its first line.
    pub(crate) fn begin_job(&mut self, id: JobId, phase: JobPhase, initial_progress: f64) {
        self.console.clear();
        self.reconciler.reset();
        self.phase = match phase {
            JobPhase::SavingSession => TaskPhase::SavingSession,
            _ => TaskPhase::Running,
        };
        self.handle = Some(JobHandle { id, phase });
        self.login = None;
        self.progress = Some(initial_progress);
        self.last_status = None;
        self.dirty = true;
    }

    /// Applies a poll result for `job_id`. Returns `None` when the result
    /// belongs to a job that is no longer current.
    pub(crate) fn apply_status(&mut self, job_id: &str, status: JobStatus) -> Option<TaskPhase> {
        match &self.handle {
            Some(handle) if handle.id == job_id => {}
            _ => {
                monitor_debug!("Ignoring status for stale job {}", job_id);
                return None;
            }
        }

        for (severity, message) in self.reconciler.reconcile(&status) {
            self.console.append(severity, message);
        }

        // Arrival order wins: a late response overwrites a newer one.
        self.progress = status.progress;
        self.phase = match status.phase {
            JobPhase::Running => TaskPhase::Running,
            JobPhase::SavingSession => TaskPhase::SavingSession,
            JobPhase::Completed => TaskPhase::Completed,
            JobPhase::Failed => TaskPhase::Failed,
        };
        if self.phase.is_terminal() {
            self.handle = None;
        } else if let Some(handle) = self.handle.as_mut() {
            handle.phase = status.phase;
        }
        self.last_status = Some(status);
        self.dirty = true;
        Some(self.phase)
    }

    /// Drops the current job and any open login flow. Returns whether the
    /// poller was running.
    pub(crate) fn reset(&mut self) -> bool {
        let was_active = self.phase.is_active();
        self.phase = TaskPhase::Idle;
        self.handle = None;
        self.login = None;
        self.pending = None;
        self.progress = None;
        self.last_status = None;
        self.reconciler.reset();
        self.dirty = true;
        was_active
    }

    pub(crate) fn set_artifacts(&mut self, kind: ArtifactKind, artifacts: Vec<ArtifactRef>) {
        match kind {
            ArtifactKind::Logs => self.logs = artifacts,
            ArtifactKind::Sessions => self.sessions = artifacts,
        }
        self.dirty = true;
    }
}
