//! On-disk storage for uploaded binaries and saved session transcripts.

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Manages the uploads directory. Uploaded files are stored under a unique
/// name so colliding original filenames never overwrite each other.
pub struct FileStorage {
    base_dir: PathBuf,
}

impl FileStorage {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Create the uploads directory if it does not exist yet.
    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.base_dir)
            .await
            .context("Failed to create uploads directory")?;
        Ok(())
    }

    /// Store uploaded bytes, returns the absolute path of the stored file.
    pub async fn store(&self, original_filename: &str, data: &[u8]) -> Result<PathBuf> {
        let ext = Path::new(original_filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");
        let stored_name = format!("{}-{}.{}", Utc::now().timestamp_millis(), Uuid::new_v4(), ext);

        let path = self.base_dir.join(stored_name);
        fs::write(&path, data)
            .await
            .context("Failed to write uploaded file")?;
        Ok(path)
    }

    /// Write a named text file (session transcripts) into the uploads
    /// directory, returns its absolute path.
    pub async fn write_named(&self, filename: &str, contents: &str) -> Result<PathBuf> {
        let path = self.base_dir.join(filename);
        fs::write(&path, contents)
            .await
            .context("Failed to write session file")?;
        Ok(path)
    }

    /// Delete a stored file. Missing files are not an error.
    pub async fn delete(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to delete stored file"),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}
