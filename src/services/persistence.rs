use std::path::{Path, PathBuf};
use tokio::fs;

use crate::dto::draft_dto::DraftState;
use crate::error::PersistError;

/// Write-through JSON mirror of the draft state.
///
/// The file is only ever written, never read back: a restarted process
/// starts from an empty draft.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrites whatever a previous run left behind with an empty draft.
    pub async fn reset(&self) -> Result<(), PersistError> {
        self.save(&DraftState::default()).await
    }

    /// Replaces the file wholesale. The state is written to a sibling temp
    /// file first and renamed over the target.
    pub async fn save(&self, state: &DraftState) -> Result<(), PersistError> {
        let bytes = serde_json::to_vec_pretty(state)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|source| self.io_error(source))?;
        }

        let staging = self.staging_path();
        fs::write(&staging, &bytes)
            .await
            .map_err(|source| self.io_error(source))?;
        fs::rename(&staging, &self.path)
            .await
            .map_err(|source| self.io_error(source))?;
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> PersistError {
        PersistError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
