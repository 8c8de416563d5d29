use std::path::{Path, PathBuf};

use tempfile::TempDir;
use uuid::Uuid;

use crate::error::PredictionError;

/// Raw bytes of one uploaded file plus the name the client declared.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Writes the upload into a fresh scratch directory under `upload_dir`.
    pub fn save(&self, upload_dir: &Path) -> Result<ScratchFile, PredictionError> {
        std::fs::create_dir_all(upload_dir).map_err(|e| {
            PredictionError::Inference(format!(
                "Failed to create upload directory {}: {e}",
                upload_dir.display()
            ))
        })?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("req-{}-", Uuid::new_v4()))
            .tempdir_in(upload_dir)
            .map_err(|e| PredictionError::Inference(format!("Failed to create scratch directory: {e}")))?;
        let path = dir.path().join(sanitize_filename(&self.filename).to_ascii_lowercase());
        std::fs::write(&path, &self.bytes)
            .map_err(|e| PredictionError::Inference(format!("Failed to save upload: {e}")))?;
        Ok(ScratchFile { dir: Some(dir), path })
    }
}

/// A saved upload. The file and its per-request directory are removed
/// when this value is dropped.
#[derive(Debug)]
pub struct ScratchFile {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let dir_path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                log::warn!("Failed to remove scratch directory {}: {e}", dir_path.display());
            }
        }
    }
}

/// Reduces a client-supplied filename to a single safe path component.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    let trimmed = cleaned.trim_start_matches(['.', '_']);
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}
