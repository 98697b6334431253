//! Job monitor engine: backend client, poller and effect execution.
mod backend;
mod engine;
mod persist;
mod poller;
mod types;
mod wire;

pub use backend::{Backend, BackendSettings, ReqwestBackend};
pub use engine::{ChannelEventSink, EngineConfig, EngineHandle, EventSink};
pub use persist::{ensure_artifact_dir, ArtifactWriter, PersistError};
pub use poller::{spawn_poller, PollHandle};
pub use types::{
    ApiError, ApiErrorKind, Artifact, ArtifactKind, DownloadError, EngineEvent, RunParams,
    StartOutcome,
};
pub use wire::{ConsoleLine, TaskResult, TaskState, TaskStatus};
