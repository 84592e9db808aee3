//! Scoped temporary storage for downloaded media.
//!
//! A `StagedArtifact` owns a uniquely named file in the scratch directory.
//! The file is removed when the artifact is dropped, whichever way the relay
//! exits.

use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// A temporary file holding downloaded media bytes
#[derive(Debug)]
pub struct StagedArtifact {
    writer: Option<File>,
    path: Option<TempPath>,
    location: PathBuf,
    extension: &'static str,
    size_bytes: u64,
}

impl StagedArtifact {
    /// Create a fresh file in `scratch_dir`, creating the directory if absent
    pub async fn create(scratch_dir: &Path, extension: &'static str) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(scratch_dir).await?;

        let suffix = format!(".{}", extension);
        let named = tempfile::Builder::new()
            .prefix("media-")
            .suffix(&suffix)
            .tempfile_in(scratch_dir)?;
        let (file, path) = named.into_parts();
        let location = path.to_path_buf();

        debug!(path = %location.display(), "Created staging file");

        Ok(Self {
            writer: Some(File::from_std(file)),
            path: Some(path),
            location,
            extension,
            size_bytes: 0,
        })
    }

    /// Append bytes, returning the running total
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> std::io::Result<u64> {
        let writer = self.writer.as_mut().ok_or_else(closed_error)?;
        writer.write_all(chunk).await?;
        self.size_bytes += chunk.len() as u64;
        Ok(self.size_bytes)
    }

    /// Flush and close the writer, returning the size on disk
    pub async fn finish(&mut self) -> std::io::Result<u64> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().await?;
            writer.sync_all().await?;
        }

        let metadata = tokio::fs::metadata(&self.location).await?;
        self.size_bytes = metadata.len();
        Ok(self.size_bytes)
    }

    pub fn path(&self) -> &Path {
        &self.location
    }

    pub fn extension(&self) -> &'static str {
        self.extension
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Filename suggested to the chat when uploading
    pub fn file_name(&self) -> String {
        format!("video.{}", self.extension)
    }
}

impl Drop for StagedArtifact {
    fn drop(&mut self) {
        self.writer.take();

        if let Some(path) = self.path.take() {
            match path.close() {
                Ok(()) => debug!(path = %self.location.display(), "Removed staging file"),
                Err(e) => warn!(
                    path = %self.location.display(),
                    error = %e,
                    "Failed to remove staging file"
                ),
            }
        }
    }
}

fn closed_error() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, "staging file already finished")
}
