//! Reading manuscripts in each supported format through [`load_paper`].

use std::io::Write;
use std::path::Path;

use zip::write::SimpleFileOptions;
use zombie_core::RetractionDatabase;
use zombie_ingest::{IngestError, extract_text, load_paper};

fn paragraph(text: &str) -> String {
    format!(r#"<w:p><w:r><w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#)
}

fn write_docx(path: &Path, paragraphs: &[&str]) {
    let body: String = paragraphs.iter().map(|p| paragraph(p)).collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );

    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    zip.start_file("[Content_Types].xml", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(b"<?xml version=\"1.0\"?><Types/>").unwrap();
    zip.start_file("word/document.xml", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(xml.as_bytes()).unwrap();
    zip.finish().unwrap();
}

/// One-page Helvetica PDF with `lines` set from the top of the page down.
#[cfg(feature = "pdf")]
fn write_pdf(path: &Path, lines: &[&str]) {
    let mut content = String::from("BT /F1 10 Tf 12 TL 72 740 Td\n");
    for line in lines {
        let escaped = line.replace('(', "\\(").replace(')', "\\)");
        content.push_str(&format!("({escaped}) Tj T*\n"));
    }
    content.push_str("ET\n");

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>".to_string(),
        format!("<< /Length {} >>\nstream\n{content}endstream", content.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];
    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }
    let xref = pdf.len();
    let size = objects.len() + 1;
    pdf.extend_from_slice(format!("xref\n0 {size}\n0000000000 65535 f \n").as_bytes());
    for offset in offsets {
        pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!("trailer\n<< /Size {size} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n").as_bytes(),
    );
    std::fs::write(path, pdf).unwrap();
}

const DATABASE: &str = "OriginalPaperDOI,Title,RetractionNature\n10.5555/zombie.1,Zombie Papers Walk Among Us,Retraction\n";

#[test]
fn docx_references_are_matched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manuscript.docx");
    write_docx(
        &path,
        &[
            "Introduction",
            "We cite things.",
            "References",
            "[1] J. Smith. Zombie papers walk among us. Journal of Undead Studies, 2020.",
            "[2] A. Doe. Healthy living data. Journal of Good Results, 2019.",
        ],
    );

    let paper = load_paper(&path).unwrap();
    assert_eq!(paper.len(), 2);
    assert_eq!(paper.source(), Some(path.display().to_string().as_str()));

    let db = RetractionDatabase::load(DATABASE.as_bytes()).unwrap();
    let report = paper.report(&db);
    assert!(report.results()[0].is_zombie());
    assert!(!report.results()[1].is_zombie());
}

#[test]
fn extensionless_docx_is_sniffed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manuscript");
    write_docx(&path, &["References", "[1] A. Doe. Some title here. 2019."]);

    let text = extract_text(&path).unwrap();
    assert!(text.starts_with("References\n\n[1] A. Doe."));
}

#[test]
fn docx_without_document_part_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.docx");
    let file = std::fs::File::create(&path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    zip.start_file("word/styles.xml", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(b"<styles/>").unwrap();
    zip.finish().unwrap();

    assert!(matches!(extract_text(&path), Err(IngestError::Zip(_))));
    assert!(matches!(
        load_paper(&path),
        Err(zombie_core::Error::Backend(_))
    ));
}

#[test]
fn rtf_manuscript() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manuscript.rtf");
    std::fs::write(
        &path,
        r"{\rtf1\ansi{\fonttbl{\f0 Arial;}}\f0 References\par
[1] J. Smith. {\b Zombie papers walk among us}. Nature, 2020. doi:10.5555/zombie.1\par
}",
    )
    .unwrap();

    let paper = load_paper(&path).unwrap();
    assert_eq!(paper.len(), 1);
    assert_eq!(
        paper.references()[0].doi.as_deref(),
        Some("10.5555/zombie.1")
    );
}

#[test]
fn tex_manuscript_with_bibitems() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("paper.tex");
    std::fs::write(
        &path,
        "\\section{Intro}\nText.\n\\begin{thebibliography}{9}\n\\bibitem{smith} J. Smith.\n\\newblock Zombie papers walk among us.\n\\newblock Nature, 2020.\n\\bibitem{doe} A. Doe.\n\\newblock Healthy living data.\n\\end{thebibliography}\n",
    )
    .unwrap();

    let paper = load_paper(&path).unwrap();
    assert_eq!(paper.len(), 2);
    assert_eq!(
        paper.references()[0].title.as_deref(),
        Some("Zombie papers walk among us")
    );
}

#[cfg(feature = "pdf")]
#[test]
fn pdf_references_are_matched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manuscript.pdf");
    write_pdf(
        &path,
        &[
            "Introduction",
            "We cite things.",
            "References",
            "[1] J. Smith. Zombie papers walk among us. Nature, 2020. https://doi.org/10.5555/zombie.1",
            "[2] A. Doe. Healthy living data. Journal of Good Results, 2019.",
        ],
    );

    let paper = load_paper(&path).unwrap();
    assert_eq!(paper.len(), 2);
    assert_eq!(
        paper.references()[0].doi.as_deref(),
        Some("10.5555/zombie.1")
    );

    let db = RetractionDatabase::load(DATABASE.as_bytes()).unwrap();
    let report = paper.report(&db);
    assert_eq!(
        report.results()[0].confidence(),
        zombie_core::MatchConfidence::ExactDoi
    );
    assert!(!report.results()[1].is_zombie());
}

#[cfg(feature = "pdf")]
#[test]
fn extensionless_pdf_is_sniffed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manuscript");
    write_pdf(&path, &["References", "[1] A. Doe. Some title here. 2019."]);

    let text = extract_text(&path).unwrap();
    assert!(text.contains("Some title here"));
}
