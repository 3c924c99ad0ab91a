use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("unsupported document format: {0}")]
    Unsupported(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for document text extraction backends.
///
/// Implementors turn a file on disk into plain text; locating and segmenting
/// the reference list happens in [`crate::Paper::from_text`].
pub trait TextBackend: Send + Sync {
    /// Extract the full text content of a document.
    fn extract_text(&self, path: &Path) -> Result<String, BackendError>;
}

/// Reads the file as UTF-8, replacing invalid sequences.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextBackend;

impl TextBackend for PlainTextBackend {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        let bytes = std::fs::read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
