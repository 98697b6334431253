use crate::{
    AppState, ArtifactKind, ArtifactRef, ConsoleEntry, CurrentItem, JobResult, LoginRequest,
    TaskPhase,
};

/// Immutable snapshot handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub phase: TaskPhase,
    pub job_id: Option<String>,
    pub login_request: Option<LoginRequest>,
    pub request_in_flight: bool,
    /// Progress clamped to `[0, 100]`.
    pub progress: Option<f64>,
    pub current_item: Option<CurrentItem>,
    pub result: Option<JobResult>,
    pub error_message: Option<String>,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub console: Vec<ConsoleEntry>,
    pub logs: Vec<ArtifactRef>,
    pub sessions: Vec<ArtifactRef>,
    pub dirty: bool,
}

impl AppViewModel {
    /// Progress as a whole percentage for display.
    pub fn progress_percent(&self) -> Option<u32> {
        self.progress.map(progress_percent)
    }
}

impl AppState {
    pub fn view(&self) -> AppViewModel {
        let status = self.last_status();
        AppViewModel {
            phase: self.phase(),
            job_id: self.handle().map(|h| h.id.clone()),
            login_request: self.login_request().cloned(),
            request_in_flight: self.pending().is_some(),
            progress: self.progress().map(clamp_progress),
            current_item: status.and_then(|s| s.current_item.clone()),
            result: status.and_then(|s| s.result.clone()),
            error_message: status.and_then(|s| s.error_message.clone()),
            started_at: status.and_then(|s| s.started_at.clone()),
            ended_at: status.and_then(|s| s.ended_at.clone()),
            console: self.console().snapshot(),
            logs: self.artifacts(ArtifactKind::Logs).to_vec(),
            sessions: self.artifacts(ArtifactKind::Sessions).to_vec(),
            dirty: self.is_dirty(),
        }
    }
}

/// Clamps a raw backend progress value into `[0, 100]`. NaN reads as 0.
pub fn clamp_progress(raw: f64) -> f64 {
    if raw.is_nan() {
        return 0.0;
    }
    raw.clamp(0.0, 100.0)
}

/// Clamped progress rounded to the nearest whole percent.
pub fn progress_percent(raw: f64) -> u32 {
    clamp_progress(raw).round() as u32
}

/// Human readable size: `0 Bytes`, `1.5 KB`, `2 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", text, UNITS[unit])
}
