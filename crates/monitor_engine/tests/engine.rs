use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use monitor_engine::{
    ApiError, ApiErrorKind, Artifact, ArtifactKind, Backend, ChannelEventSink, DownloadError,
    EngineConfig, EngineEvent, EngineHandle, RunParams, StartOutcome, TaskState, TaskStatus,
};
use tempfile::TempDir;

/// In-memory backend recording every status call.
#[derive(Default)]
struct FakeBackend {
    status_calls: Mutex<Vec<String>>,
    fetch_calls: Mutex<Vec<String>>,
}

fn running_status() -> TaskStatus {
    serde_json::from_value(serde_json::json!({"status": "running"})).unwrap()
}

#[async_trait::async_trait]
impl Backend for FakeBackend {
    async fn start(&self, params: &RunParams) -> Result<StartOutcome, ApiError> {
        if params.session_name == "missing" {
            Ok(StartOutcome::LoginRequired)
        } else {
            Ok(StartOutcome::Started {
                task_id: format!("{}_{}", params.session_name, params.start_row),
            })
        }
    }

    async fn status(&self, task_id: &str) -> Result<TaskStatus, ApiError> {
        self.status_calls.lock().unwrap().push(task_id.to_string());
        Ok(running_status())
    }

    async fn list_artifacts(&self, _kind: ArtifactKind) -> Result<Vec<Artifact>, ApiError> {
        Ok(vec![Artifact {
            name: "a.csv".to_string(),
            file_name: "a.csv".to_string(),
            size: Some(3),
            modified: None,
        }])
    }

    async fn launch_login(&self, _params: &RunParams) -> Result<(), ApiError> {
        Err(ApiError {
            kind: ApiErrorKind::Network,
            message: "refused".to_string(),
        })
    }

    async fn confirm_session(&self, _params: &RunParams) -> Result<String, ApiError> {
        Ok("T2".to_string())
    }

    async fn fetch_artifact(&self, file_name: &str) -> Result<Vec<u8>, ApiError> {
        self.fetch_calls.lock().unwrap().push(file_name.to_string());
        Ok(file_name.as_bytes().to_vec())
    }
}

type TestEngine = (EngineHandle, mpsc::Receiver<EngineEvent>, Arc<FakeBackend>);

fn engine(download_dir: &TempDir) -> TestEngine {
    let (tx, rx) = mpsc::channel();
    let backend = Arc::new(FakeBackend::default());
    let config = EngineConfig {
        poll_interval: Duration::from_millis(20),
        download_dir: download_dir.path().to_path_buf(),
        ..EngineConfig::default()
    };
    let handle = EngineHandle::with_backend(
        config,
        backend.clone(),
        Arc::new(ChannelEventSink::new(tx)),
    );
    (handle, rx, backend)
}

fn next_event(rx: &mpsc::Receiver<EngineEvent>) -> EngineEvent {
    rx.recv_timeout(Duration::from_secs(2)).expect("engine event")
}

fn params(session: &str) -> RunParams {
    RunParams {
        start_row: 3,
        end_row: 9,
        session_name: session.to_string(),
    }
}

#[test]
fn start_and_login_results_come_back_as_events() {
    let dir = TempDir::new().unwrap();
    let (engine, rx, _) = engine(&dir);

    engine.start(1, params("ward_a"));
    match next_event(&rx) {
        EngineEvent::StartCompleted {
            request_id,
            result: Ok(StartOutcome::Started { task_id }),
        } => {
            assert_eq!(request_id, 1);
            assert_eq!(task_id, "ward_a_3");
        }
        other => panic!("unexpected {other:?}"),
    }

    engine.start(2, params("missing"));
    assert!(matches!(
        next_event(&rx),
        EngineEvent::StartCompleted {
            request_id: 2,
            result: Ok(StartOutcome::LoginRequired)
        }
    ));

    engine.launch_login(params("missing"));
    assert!(matches!(
        next_event(&rx),
        EngineEvent::LoginLaunched(Err(ApiError {
            kind: ApiErrorKind::Network,
            ..
        }))
    ));

    engine.save_session(3, params("missing"));
    assert!(matches!(
        next_event(&rx),
        EngineEvent::SessionSaved { request_id: 3, result: Ok(task_id) } if task_id == "T2"
    ));
}

#[test]
fn start_polling_replaces_previous_poller() {
    let dir = TempDir::new().unwrap();
    let (engine, rx, backend) = engine(&dir);

    engine.start_polling("T1");
    match next_event(&rx) {
        EngineEvent::StatusFetched { task_id, result } => {
            assert_eq!(task_id, "T1");
            assert_eq!(result.unwrap().status, TaskState::Running);
        }
        other => panic!("unexpected {other:?}"),
    }

    engine.start_polling("T2");
    std::thread::sleep(Duration::from_millis(150));
    engine.stop_polling();
    std::thread::sleep(Duration::from_millis(60));

    let calls = backend.status_calls.lock().unwrap().clone();
    let first_t2 = calls.iter().position(|id| id == "T2").expect("T2 polled");
    assert!(calls[first_t2..].iter().all(|id| id == "T2"));

    let settled = backend.status_calls.lock().unwrap().len();
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(backend.status_calls.lock().unwrap().len(), settled);
}

#[test]
fn download_writes_into_download_dir() {
    let dir = TempDir::new().unwrap();
    let (engine, rx, backend) = engine(&dir);

    engine.download("report.csv");
    match next_event(&rx) {
        EngineEvent::ArtifactDownloaded { name, result } => {
            assert_eq!(name, "report.csv");
            let path = result.expect("saved");
            assert_eq!(path, dir.path().join("report.csv"));
            assert_eq!(std::fs::read(path).unwrap(), b"report.csv");
        }
        other => panic!("unexpected {other:?}"),
    }

    engine.download("../escape.csv");
    assert!(matches!(
        next_event(&rx),
        EngineEvent::ArtifactDownloaded {
            result: Err(DownloadError::Persist(_)),
            ..
        }
    ));
    assert_eq!(
        backend.fetch_calls.lock().unwrap().clone(),
        vec!["report.csv".to_string()]
    );
}

#[test]
fn listing_reports_kind() {
    let dir = TempDir::new().unwrap();
    let (engine, rx, _) = engine(&dir);

    engine.list_artifacts(ArtifactKind::Sessions);
    match next_event(&rx) {
        EngineEvent::ArtifactsListed { kind, result } => {
            assert_eq!(kind, ArtifactKind::Sessions);
            assert_eq!(result.unwrap().len(), 1);
        }
        other => panic!("unexpected {other:?}"),
    }
}
