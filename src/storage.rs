use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ChatResult;
use crate::export::{TranscriptExport, export_file_name};

/// Writes transcript exports to disk and reads them back
pub struct StorageManager {
    export_dir: PathBuf,
}

impl StorageManager {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
        }
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    pub fn ensure_directories(&self) -> ChatResult<()> {
        fs::create_dir_all(&self.export_dir)?;
        Ok(())
    }

    /// Write `export` as `docker-k8s-chat-<date>.json`, replacing any export
    /// from the same day. Returns the written path.
    pub fn write_export(&self, export: &TranscriptExport, at: DateTime<Utc>) -> ChatResult<PathBuf> {
        self.ensure_directories()?;

        let path = self.export_dir.join(export_file_name(at));
        fs::write(&path, export.to_json()?)?;
        tracing::info!(path = %path.display(), messages = export.messages.len(), "transcript exported");

        Ok(path)
    }
}

/// Read an export file written by [`StorageManager::write_export`]
pub fn read_export(path: &Path) -> ChatResult<TranscriptExport> {
    let content = fs::read_to_string(path)?;
    TranscriptExport::from_json(&content)
}
