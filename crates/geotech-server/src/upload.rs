//! Upload scoping.
//!
//! Each upload lands in its own uniquely named temporary file that keeps the
//! original extension (the text extractor dispatches on it). The file is
//! removed when the returned handle drops, whichever way the request ends.

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};

/// Where uploads are written.
#[derive(Debug, Clone, Default)]
pub struct UploadDir {
    dir: Option<PathBuf>,
}

impl UploadDir {
    /// Write under `dir`, or the system temp directory when `None`.
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    /// Configured directory, if any.
    pub fn path(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Persist `bytes` for the lifetime of the returned handle.
    pub fn store(&self, file_name: &str, bytes: &[u8]) -> std::io::Result<NamedTempFile> {
        let suffix = extension_suffix(file_name);
        let mut builder = Builder::new();
        builder.prefix("upload-").suffix(&suffix);

        let mut file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.flush()?;
        Ok(file)
    }
}

/// `.pdf` for `Report.PDF`; empty when the name has no extension.
fn extension_suffix(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}
