use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Context, Result};
use crate::utils::sanitize_file_name;

pub const CSV_MIME: &str = "text/csv";

/// Destination for delivered export files.
pub trait FileSink {
    fn write_file(&self, content: &str, filename: &str, mime_type: &str) -> Result<PathBuf>;
}

/// Writes deliveries into a directory on disk, the terminal analogue of a browser download.
#[derive(Debug, Clone)]
pub struct DownloadDir {
    dir: PathBuf,
}

impl DownloadDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }
}

impl FileSink for DownloadDir {
    fn write_file(&self, content: &str, filename: &str, mime_type: &str) -> Result<PathBuf> {
        let name = sanitize_file_name(filename)
            .ok_or_else(|| AppError::message(format!("Invalid download filename `{filename}`")))?;

        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create download directory {}", self.dir.display())
        })?;

        // The staged file is removed on drop unless it is persisted below.
        let mut staged = tempfile::Builder::new()
            .prefix(".download-")
            .suffix(".part")
            .tempfile_in(&self.dir)
            .with_context(|| format!("Failed to stage download in {}", self.dir.display()))?;
        staged
            .write_all(content.as_bytes())
            .context("Failed to write download contents")?;
        staged.flush()?;

        let target = self.dir.join(&name);
        staged
            .persist(&target)
            .map_err(|err| err.error)
            .with_context(|| format!("Failed to save {}", target.display()))?;

        log::debug!(
            "saved {} ({} bytes, {})",
            target.display(),
            content.len(),
            mime_type
        );
        Ok(target)
    }
}

/// Hand `content` to the sink under `filename`. Failures are logged, never returned.
pub fn save(sink: &dyn FileSink, content: &str, filename: &str, mime_type: &str) {
    match sink.write_file(content, filename, mime_type) {
        Ok(path) => log::info!("Downloaded {}", path.display()),
        Err(err) => log::error!("Failed to deliver {}: {}", filename, err),
    }
}
