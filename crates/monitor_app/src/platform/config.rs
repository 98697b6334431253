use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use monitor_engine::{BackendSettings, EngineConfig};
use monitor_logging::monitor_info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base: String,
    pub poll_interval_ms: u64,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub max_artifact_bytes: u64,
    pub download_dir: PathBuf,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let backend = BackendSettings::default();
        Self {
            api_base: backend.api_base,
            poll_interval_ms: 1000,
            connect_timeout_ms: backend.connect_timeout.as_millis() as u64,
            request_timeout_ms: backend.request_timeout.as_millis() as u64,
            max_artifact_bytes: backend.max_artifact_bytes,
            download_dir: PathBuf::from("./downloads"),
            log_file: PathBuf::from("./job-monitor.log"),
        }
    }
}

impl AppConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            backend: BackendSettings {
                api_base: self.api_base.clone(),
                connect_timeout: Duration::from_millis(self.connect_timeout_ms),
                request_timeout: Duration::from_millis(self.request_timeout_ms),
                max_artifact_bytes: self.max_artifact_bytes,
            },
            // A zero period would spin the poller.
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(100)),
            download_dir: self.download_dir.clone(),
        }
    }
}

/// Reads the config file at `path`, falling back to defaults when it is absent.
pub fn load(path: &Path) -> Result<AppConfig> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            monitor_info!("No config at {:?}, using defaults", path);
            return Ok(AppConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to read config {:?}", path));
        }
    };
    ron::from_str(&content).with_context(|| format!("Failed to parse config {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = load(&temp.path().join("absent.ron")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.api_base, "http://localhost:5000/api");
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("job-monitor.ron");
        fs::write(
            &path,
            r#"(api_base: "http://automation:8080/api", poll_interval_ms: 250)"#,
        )
        .unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.api_base, "http://automation:8080/api");
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.download_dir, PathBuf::from("./downloads"));

        let engine = config.engine_config();
        assert_eq!(engine.poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.ron");
        fs::write(&path, "(api_base: 12").unwrap();
        assert!(load(&path).is_err());
    }
}
