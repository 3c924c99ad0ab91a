use std::io::Cursor;
use std::path::Path;

use thiserror::Error;
use zombie_core::{BackendError, Paper, TextBackend};

pub mod docx;
pub mod rtf;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("unsupported document format: {0}")]
    Unsupported(String),
    #[error("DOCX container error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("DOCX XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("PDF extraction error: {0}")]
    Pdf(BackendError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IngestError> for BackendError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::Unsupported(what) => BackendError::Unsupported(what),
            IngestError::Io(e) => BackendError::Io(e),
            IngestError::Pdf(e) => e,
            other => BackendError::ExtractionError(other.to_string()),
        }
    }
}

/// Document formats the ingester recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Plain text, TeX, Markdown, BibTeX.
    Text,
    Docx,
    Rtf,
    /// Needs the `pdf` feature.
    Pdf,
}

impl DocumentFormat {
    /// Format implied by a file extension, if it is one we know.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" | "text" | "tex" | "latex" | "ltx" | "md" | "markdown" | "bib" | "bbl" => {
                Some(DocumentFormat::Text)
            }
            "docx" => Some(DocumentFormat::Docx),
            "rtf" => Some(DocumentFormat::Rtf),
            "pdf" => Some(DocumentFormat::Pdf),
            _ => None,
        }
    }

    /// Guess the format from the leading bytes. Anything unrecognized is text.
    pub fn sniff(data: &[u8]) -> Self {
        if data.starts_with(b"PK\x03\x04") {
            DocumentFormat::Docx
        } else if data.starts_with(b"{\\rtf") {
            DocumentFormat::Rtf
        } else if data.starts_with(b"%PDF-") {
            DocumentFormat::Pdf
        } else {
            DocumentFormat::Text
        }
    }

    /// Detect by extension first, then fall back to magic bytes.
    pub fn detect(path: &Path, data: &[u8]) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .unwrap_or_else(|| Self::sniff(data))
    }
}

/// Extract the plain text of a document.
///
/// Dispatches on the file extension:
/// - `.txt`, `.tex`, `.md`, `.bib`, ... → read as UTF-8 (lossy)
/// - `.docx` → paragraphs of `word/document.xml`
/// - `.rtf` → RTF with control words stripped
/// - `.pdf` → MuPDF page text (`pdf` feature)
/// - anything else → sniffed from the leading bytes
pub fn extract_text(path: &Path) -> Result<String, IngestError> {
    let data = std::fs::read(path)?;
    let format = DocumentFormat::detect(path, &data);
    tracing::debug!(path = %path.display(), ?format, bytes = data.len(), "extracting document text");

    match format {
        DocumentFormat::Text => Ok(String::from_utf8_lossy(&data).into_owned()),
        DocumentFormat::Docx => docx::docx_text(Cursor::new(data)),
        DocumentFormat::Rtf => Ok(rtf::rtf_to_text(&String::from_utf8_lossy(&data))),
        DocumentFormat::Pdf => extract_pdf(path),
    }
}

#[cfg(feature = "pdf")]
fn extract_pdf(path: &Path) -> Result<String, IngestError> {
    zombie_pdf::MupdfBackend::default()
        .extract_text(path)
        .map_err(IngestError::Pdf)
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(path: &Path) -> Result<String, IngestError> {
    Err(IngestError::Unsupported(format!(
        "{} is a PDF and PDF support is not compiled in (enable the `pdf` feature of zombie-ingest)",
        path.display()
    )))
}

/// [`TextBackend`] that understands every format in [`DocumentFormat`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentBackend;

impl TextBackend for DocumentBackend {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        extract_text(path).map_err(BackendError::from)
    }
}

/// Read a manuscript in any supported format and extract its references.
pub fn load_paper(path: &Path) -> Result<Paper, zombie_core::Error> {
    Paper::from_path_with(path, &DocumentBackend)
}
