use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use monitor_logging::{monitor_error, monitor_info, monitor_warn};

use crate::persist::checked_name;
use crate::poller::{spawn_poller, PollHandle};
use crate::{
    ApiError, ArtifactKind, ArtifactWriter, Backend, BackendSettings, DownloadError,
    EngineEvent, ReqwestBackend, RunParams,
};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub backend: BackendSettings,
    pub poll_interval: Duration,
    pub download_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: BackendSettings::default(),
            poll_interval: Duration::from_secs(1),
            download_dir: PathBuf::from("downloads"),
        }
    }
}

/// Receiver of engine results.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

enum EngineCommand {
    StartPolling { task_id: String },
    StopPolling,
    Io(IoCommand),
}

/// Commands that run as independent tasks on the runtime.
enum IoCommand {
    Start { request_id: u64, params: RunParams },
    LaunchLogin(RunParams),
    SaveSession { request_id: u64, params: RunParams },
    ListArtifacts(ArtifactKind),
    Download { name: String },
}

/// Front of the IO thread. Commands are executed on a private tokio
/// runtime; results arrive through the [`EventSink`] given at construction.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig, sink: Arc<dyn EventSink>) -> Result<Self, ApiError> {
        let backend = Arc::new(ReqwestBackend::new(config.backend.clone())?);
        Ok(Self::with_backend(config, backend, sink))
    }

    pub fn with_backend(
        config: EngineConfig,
        backend: Arc<dyn Backend>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let writer = ArtifactWriter::new(config.download_dir.clone());
            let mut poller: Option<PollHandle> = None;

            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::StartPolling { task_id } => {
                        if let Some(previous) = poller.take() {
                            previous.stop();
                        }
                        monitor_info!("Polling {} every {:?}", task_id, config.poll_interval);
                        poller = Some(spawn_poller(
                            runtime.handle(),
                            backend.clone(),
                            task_id,
                            config.poll_interval,
                            sink.clone(),
                        ));
                    }
                    EngineCommand::StopPolling => {
                        if let Some(previous) = poller.take() {
                            previous.stop();
                        }
                    }
                    EngineCommand::Io(command) => {
                        let backend = backend.clone();
                        let sink = sink.clone();
                        let writer = writer.clone();
                        runtime.spawn(async move {
                            let event = handle_command(backend.as_ref(), &writer, command).await;
                            sink.emit(event);
                        });
                    }
                }
            }

            if let Some(previous) = poller.take() {
                previous.stop();
            }
            monitor_info!("Engine thread exiting");
        });

        Self { cmd_tx }
    }

    /// Starts a run; the reply carries `request_id` back.
    pub fn start(&self, request_id: u64, params: RunParams) {
        self.send(EngineCommand::Io(IoCommand::Start { request_id, params }));
    }

    pub fn launch_login(&self, params: RunParams) {
        self.send(EngineCommand::Io(IoCommand::LaunchLogin(params)));
    }

    pub fn save_session(&self, request_id: u64, params: RunParams) {
        self.send(EngineCommand::Io(IoCommand::SaveSession { request_id, params }));
    }

    pub fn start_polling(&self, task_id: impl Into<String>) {
        self.send(EngineCommand::StartPolling {
            task_id: task_id.into(),
        });
    }

    pub fn stop_polling(&self) {
        self.send(EngineCommand::StopPolling);
    }

    pub fn list_artifacts(&self, kind: ArtifactKind) {
        self.send(EngineCommand::Io(IoCommand::ListArtifacts(kind)));
    }

    pub fn download(&self, name: impl Into<String>) {
        self.send(EngineCommand::Io(IoCommand::Download { name: name.into() }));
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            monitor_error!("Engine thread is gone; command dropped");
        }
    }
}

async fn handle_command(
    backend: &dyn Backend,
    writer: &ArtifactWriter,
    command: IoCommand,
) -> EngineEvent {
    match command {
        IoCommand::Start { request_id, params } => EngineEvent::StartCompleted {
            request_id,
            result: backend.start(&params).await,
        },
        IoCommand::LaunchLogin(params) => {
            EngineEvent::LoginLaunched(backend.launch_login(&params).await)
        }
        IoCommand::SaveSession { request_id, params } => EngineEvent::SessionSaved {
            request_id,
            result: backend.confirm_session(&params).await,
        },
        IoCommand::ListArtifacts(kind) => EngineEvent::ArtifactsListed {
            kind,
            result: backend.list_artifacts(kind).await,
        },
        IoCommand::Download { name } => {
            let result = download(backend, writer, &name).await;
            if let Err(err) = &result {
                monitor_warn!("Download of {} failed: {}", name, err);
            }
            EngineEvent::ArtifactDownloaded { name, result }
        }
    }
}

async fn download(
    backend: &dyn Backend,
    writer: &ArtifactWriter,
    name: &str,
) -> Result<PathBuf, DownloadError> {
    let name = checked_name(name)?;
    let bytes = backend.fetch_artifact(name).await?;
    Ok(writer.write(name, &bytes)?)
}
