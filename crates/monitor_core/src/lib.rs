//! Job monitor core: pure task state machine, log reconciliation and view-model helpers.
mod classify;
mod console;
mod effect;
mod msg;
mod reconcile;
mod state;
mod update;
mod view_model;

pub use classify::{classify_line, severity_for_line};
pub use console::{Clock, ConsoleBuffer, ConsoleEntry, Severity, CONSOLE_CAPACITY};
pub use effect::Effect;
pub use msg::{Msg, StartReply};
pub use reconcile::LogReconciler;
pub use state::{
    AppState, ArtifactKind, ArtifactRef, CurrentItem, JobHandle, JobId, JobPhase, JobResult,
    JobStatus, LogLine, LoginRequest, RequestId, RunRequest, TaskPhase, ValidationError,
};
pub use update::update;
pub use view_model::{clamp_progress, format_file_size, progress_percent, AppViewModel};
