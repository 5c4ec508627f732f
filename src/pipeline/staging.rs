//! Transient store: materialise an in-memory upload as a temp file.
//!
//! The remote upload API reads from a path, so the bytes are written to a
//! [`tempfile`]-named file first. The name keeps the original extension
//! (`notes.pdf` → `unishare-XXXXXX.pdf`) so the service can fall back on it
//! when no MIME type is known.
//!
//! A [`StagedFile`] owns its path. [`StagedFile::release`] deletes it and is
//! idempotent; `Drop` calls it too, so a panic or a dropped future still
//! cleans up. Removal failures are logged and swallowed: they must never
//! replace the outcome the caller is waiting for.

use crate::error::SummaryError;
use crate::request::UploadedBlob;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, warn};

/// Prefix of every staged file name.
pub const STAGE_PREFIX: &str = "unishare-";

/// An upload written to disk for the duration of one request.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    temp: Option<TempPath>,
    filename: String,
    content_type: Option<String>,
    size: u64,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Filename the uploader declared.
    pub fn original_name(&self) -> &str {
        &self.filename
    }

    /// Content type the uploader declared, if any.
    pub fn declared_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_released(&self) -> bool {
        self.temp.is_none()
    }

    /// Delete the staged file. Safe to call any number of times.
    pub fn release(&mut self) {
        let Some(temp) = self.temp.take() else {
            return;
        };
        match temp.close() {
            Ok(()) => debug!("Released staged file {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Staged file {} already gone", self.path.display())
            }
            Err(e) => warn!(
                "Failed to remove staged file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        self.release();
    }
}

/// Suffix for the staged name: the original extension with its leading dot,
/// or nothing when the filename has no extension.
pub fn suffix_for(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| format!(".{e}"))
        .unwrap_or_default()
}

/// Write `blob` to a fresh temp file in `dir` (or the system temp dir).
///
/// The write runs on the blocking pool; uploads can be hundreds of MB.
pub async fn stage(blob: UploadedBlob, dir: Option<&Path>) -> Result<StagedFile, SummaryError> {
    let UploadedBlob {
        bytes,
        filename,
        content_type,
    } = blob;
    let suffix = suffix_for(&filename);
    let dir = dir.map(Path::to_path_buf);
    let size = bytes.len() as u64;

    let written = tokio::task::spawn_blocking(move || -> std::io::Result<TempPath> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGE_PREFIX).suffix(&suffix);
        let mut file = match dir {
            Some(ref d) => builder.tempfile_in(d)?,
            None => builder.tempfile()?,
        };
        file.write_all(&bytes)?;
        file.flush()?;
        Ok(file.into_temp_path())
    })
    .await
    .map_err(|e| SummaryError::Unexpected(format!("Staging task panicked: {e}")))?;

    let temp = written.map_err(|source| SummaryError::StageFailed {
        filename: filename.clone(),
        source,
    })?;
    let path = temp.to_path_buf();
    debug!("Staged {} ({} bytes) at {}", filename, size, path.display());

    Ok(StagedFile {
        path,
        temp: Some(temp),
        filename,
        content_type,
        size,
    })
}

/// Remove a staged path directly. Missing files are not an error.
pub fn release_path(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
    }
}
