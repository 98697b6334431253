use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("artifact directory missing or not writable: {0}")]
    ArtifactDir(String),
    #[error("refusing to save artifact under name {0:?}")]
    InvalidName(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure the download directory exists; create if missing.
pub fn ensure_artifact_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::ArtifactDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::ArtifactDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::ArtifactDir(e.to_string()))?;
    }
    Ok(())
}

/// Saves downloaded artifacts into one directory, atomically per file.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Writes `bytes` to `{dir}/{name}` through a temp file and a rename.
    /// Names that would leave the directory are rejected.
    pub fn write(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, PersistError> {
        let name = checked_name(name)?;
        ensure_artifact_dir(&self.dir)?;

        let target = self.dir.join(name);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

/// Rejects names that are empty or would leave the artifact directory.
pub(crate) fn checked_name(name: &str) -> Result<&str, PersistError> {
    let trimmed = name.trim();
    let bad = trimmed.is_empty()
        || trimmed == "."
        || trimmed.contains("..")
        || trimmed.contains(['/', '\\', '\0']);
    if bad {
        Err(PersistError::InvalidName(name.to_string()))
    } else {
        Ok(trimmed)
    }
}
