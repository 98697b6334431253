//! JSON shapes exchanged with the automation backend.

use serde::{Deserialize, Deserializer};

use crate::{Artifact, ArtifactKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Accepted but not yet driving the browser.
    Initializing,
    Running,
    SavingCookies,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct TaskResult {
    pub total_processed: u64,
    pub success_count: u64,
    pub fail_count: u64,
    pub success_file: Option<String>,
    pub fail_file: Option<String>,
}

/// A log line as either bare text or an object with an explicit level.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ConsoleLine {
    Text(String),
    Structured {
        message: String,
        #[serde(default)]
        level: Option<String>,
    },
}

impl ConsoleLine {
    pub fn message(&self) -> &str {
        match self {
            ConsoleLine::Text(message) | ConsoleLine::Structured { message, .. } => message,
        }
    }

    pub fn level(&self) -> Option<&str> {
        match self {
            ConsoleLine::Text(_) => None,
            ConsoleLine::Structured { level, .. } => level.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskStatus {
    pub status: TaskState,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub result: Option<TaskResult>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub console_logs: Vec<ConsoleLine>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub current_member: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub current_family: Option<String>,
}

/// Reply of `/run`, `/login` and `/save_cookies`.
#[derive(Debug, Deserialize)]
pub(crate) struct CommandReply {
    pub status: String,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body the backend sends alongside 4xx/5xx statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LogFileEntry {
    pub filename: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub modified: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SessionFileEntry {
    pub name: String,
    pub filename: String,
    #[serde(default)]
    pub modified: Option<String>,
}

impl From<LogFileEntry> for Artifact {
    fn from(entry: LogFileEntry) -> Self {
        Artifact {
            name: entry.filename.clone(),
            file_name: entry.filename,
            size: entry.size,
            modified: entry.modified,
        }
    }
}

impl From<SessionFileEntry> for Artifact {
    fn from(entry: SessionFileEntry) -> Self {
        Artifact {
            name: entry.name,
            file_name: entry.filename,
            size: None,
            modified: entry.modified,
        }
    }
}

pub(crate) fn listing_path(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Logs => "logs",
        ArtifactKind::Sessions => "cookies",
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ConsoleLine>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<ConsoleLine>>::deserialize(deserializer)?.unwrap_or_default())
}

// Member and family ids come straight from a spreadsheet and may arrive as numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Id>::deserialize(deserializer)? {
        Some(Id::Text(text)) if text.trim().is_empty() => None,
        Some(Id::Text(text)) => Some(text),
        Some(Id::Int(n)) => Some(n.to_string()),
        Some(Id::Float(n)) => Some(n.to_string()),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_full_status() {
        let json = r#"{
            "status": "completed",
            "progress": 100,
            "start_time": "2024-01-01T10:00:00",
            "result": {"total_processed": 3, "success_count": 2, "fail_count": 1,
                       "success_file": "logs/s.csv", "fail_file": "logs/f.csv"},
            "console_logs": ["🚀 System initialized", {"message": "hi", "level": "warn"}],
            "current_member": 12345,
            "current_family": "F-9"
        }"#;
        let status: TaskStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.status, TaskState::Completed);
        assert_eq!(status.progress, Some(100.0));
        assert_eq!(status.result.as_ref().map(|r| r.fail_count), Some(1));
        assert_eq!(status.console_logs.len(), 2);
        assert_eq!(status.console_logs[1].level(), Some("warn"));
        assert_eq!(status.current_member.as_deref(), Some("12345"));
        assert_eq!(status.current_family.as_deref(), Some("F-9"));
    }

    #[test]
    fn tolerates_missing_and_null_fields() {
        let json = r#"{"status": "initializing", "console_logs": null, "current_member": null}"#;
        let status: TaskStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.status, TaskState::Initializing);
        assert!(status.console_logs.is_empty());
        assert_eq!(status.current_member, None);
        assert_eq!(status.progress, None);
    }

    #[test]
    fn rejects_unknown_state() {
        assert!(serde_json::from_str::<TaskStatus>(r#"{"status": "not_found"}"#).is_err());
    }
}
