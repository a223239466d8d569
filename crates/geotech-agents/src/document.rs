//! Document to text extraction.
//!
//! Extraction is synchronous and may be slow for large PDFs; callers run it
//! on the blocking pool.

use geotech_core::ExtractionError;
use std::path::Path;
use tracing::debug;

/// Turns a file on disk into plain text.
pub trait TextExtractor: Send + Sync {
    /// Extract the text content of `path`.
    fn extract(&self, path: &Path) -> Result<String, ExtractionError>;
}

/// Kinds of documents the default extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Portable Document Format
    Pdf,
    /// Plain text or Markdown
    Text,
}

impl DocumentKind {
    /// Classify by file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" | "md" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Default extractor: PDFs through `pdf-extract`, text files as UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTextExtractor;

impl FileTextExtractor {
    fn extract_pdf(bytes: &[u8], file: &str) -> Result<String, ExtractionError> {
        // pdf-extract panics on some malformed inputs.
        let result = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes));

        let text = match result {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                return Err(ExtractionError::Failed {
                    file: file.to_string(),
                    message: e.to_string(),
                })
            }
            Err(_) => {
                return Err(ExtractionError::Failed {
                    file: file.to_string(),
                    message: "PDF parser panicked".to_string(),
                })
            }
        };

        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

impl TextExtractor for FileTextExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        let file = path.display().to_string();
        let kind = DocumentKind::from_path(path)
            .ok_or_else(|| ExtractionError::Unsupported { file: file.clone() })?;

        let bytes = std::fs::read(path).map_err(|source| ExtractionError::Io {
            file: file.clone(),
            source,
        })?;

        let text = match kind {
            DocumentKind::Pdf => Self::extract_pdf(&bytes, &file)?,
            DocumentKind::Text => {
                String::from_utf8(bytes).map_err(|e| ExtractionError::Failed {
                    file: file.clone(),
                    message: format!("not valid UTF-8: {e}"),
                })?
            }
        };

        debug!(file = %file, kind = ?kind, chars = text.len(), "Extracted document text");
        Ok(text)
    }
}
