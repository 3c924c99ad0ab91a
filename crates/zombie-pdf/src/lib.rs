//! PDF text extraction through MuPDF.
//!
//! Only this crate links the AGPL-licensed MuPDF library; `zombie-ingest`
//! pulls it in behind its `pdf` feature.

use std::path::Path;

use mupdf::{Document, Page, TextPageFlags};
use zombie_core::{BackendError, TextBackend};

/// [`TextBackend`] for PDF manuscripts.
///
/// Running heads and page footers ("Journal of X 12(3) 45") otherwise land in
/// the middle of references that span a page break, so text blocks lying
/// entirely in the top or bottom margin band of a page are dropped.
#[derive(Debug, Clone, Copy)]
pub struct MupdfBackend {
    /// Fraction of page height at the top treated as header.
    header_margin: Option<f32>,
    /// Fraction of page height at the bottom treated as footer.
    footer_margin: Option<f32>,
}

impl Default for MupdfBackend {
    fn default() -> Self {
        Self {
            header_margin: Some(0.04),
            footer_margin: Some(0.05),
        }
    }
}

impl MupdfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Header band as a fraction of page height; `0.0` keeps every block.
    pub fn with_header_margin(mut self, ratio: f32) -> Self {
        self.header_margin = (ratio > 0.0).then_some(ratio);
        self
    }

    /// Footer band as a fraction of page height; `0.0` keeps every block.
    pub fn with_footer_margin(mut self, ratio: f32) -> Self {
        self.footer_margin = (ratio > 0.0).then_some(ratio);
        self
    }

    fn page_text(&self, page: &Page) -> Result<String, BackendError> {
        let bounds = page.bounds().map_err(extraction_error)?;
        let height = bounds.y1 - bounds.y0;
        let header_end = self.header_margin.map(|r| bounds.y0 + height * r);
        let footer_start = self.footer_margin.map(|r| bounds.y1 - height * r);

        let text_page = page
            .to_text_page(TextPageFlags::empty())
            .map_err(extraction_error)?;

        let mut text = String::new();
        for block in text_page.blocks() {
            let block_bounds = block.bounds();
            if header_end.is_some_and(|y| block_bounds.y1 <= y)
                || footer_start.is_some_and(|y| block_bounds.y0 >= y)
            {
                continue;
            }
            for line in block.lines() {
                text.extend(line.chars().map(|c| c.char().unwrap_or('\u{FFFD}')));
                text.push('\n');
            }
        }
        Ok(text)
    }
}

impl TextBackend for MupdfBackend {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        // Surface a missing file as I/O rather than a MuPDF open failure.
        std::fs::metadata(path)?;
        let path_str = path.to_str().ok_or_else(|| {
            BackendError::ExtractionError(format!("{} is not a UTF-8 path", path.display()))
        })?;

        let document = Document::open(path_str).map_err(extraction_error)?;
        let mut pages = Vec::new();
        for page in document.pages().map_err(extraction_error)? {
            let page = page.map_err(extraction_error)?;
            pages.push(self.page_text(&page)?);
        }

        tracing::debug!(path = %path.display(), pages = pages.len(), "extracted PDF text");
        Ok(pages.join("\n"))
    }
}

fn extraction_error(e: impl std::fmt::Display) -> BackendError {
    BackendError::ExtractionError(e.to_string())
}
