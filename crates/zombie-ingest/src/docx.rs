//! Text extraction from Office Open XML (`.docx`) documents.
//!
//! Only the main document part is read:
//! ```xml
//! <w:document>
//!   <w:body>
//!     <w:p><w:r><w:t>References</w:t></w:r></w:p>
//!     <w:p><w:r><w:t xml:space="preserve">[1] J. Smith. </w:t></w:r>...</w:p>
//!   </w:body>
//! </w:document>
//! ```
//! Runs are concatenated within a paragraph; paragraphs are separated by a
//! blank line.

use std::io::{Read, Seek};

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::IngestError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Extract the text of a `.docx` container.
pub fn docx_text<R: Read + Seek>(reader: R) -> Result<String, IngestError> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let mut xml = String::new();
    archive.by_name(DOCUMENT_PART)?.read_to_string(&mut xml)?;
    document_xml_text(&xml)
}

/// Extract paragraph text from the `word/document.xml` part.
pub fn document_xml_text(xml: &str) -> Result<String, IngestError> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => current.clear(),
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" | b"w:cr" => current.push('\n'),
                b"w:p" => paragraphs.push(String::new()),
                _ => {}
            },
            Event::Text(e) if in_text => current.push_str(&e.unescape()?),
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs.join("\n\n"))
}
