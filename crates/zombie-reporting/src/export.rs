use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use zombie_core::{MatchConfidence, MatchResult, Report, ReportSummary, RetractionRecord};

use crate::{ExportFormat, ReportError};

/// Write `report` to `writer` in the given format.
///
/// `source` names the manuscript (usually its path) in the output header.
pub fn export_report<W: Write>(
    report: &Report<'_>,
    source: Option<&str>,
    format: ExportFormat,
    mut writer: W,
) -> Result<(), ReportError> {
    match format {
        ExportFormat::Json => export_json(report, source, &mut writer)?,
        ExportFormat::Csv => export_csv(report, &mut writer)?,
        ExportFormat::Markdown => writer.write_all(export_markdown(report, source).as_bytes())?,
        ExportFormat::Text => writer.write_all(export_text(report, source).as_bytes())?,
    }
    writer.flush()?;
    Ok(())
}

/// Render `report` to a string.
pub fn render_report(
    report: &Report<'_>,
    source: Option<&str>,
    format: ExportFormat,
) -> Result<String, ReportError> {
    let mut buf = Vec::new();
    export_report(report, source, format, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Export `report` to a file, replacing it if it exists.
pub fn export_to_path(
    report: &Report<'_>,
    source: Option<&str>,
    format: ExportFormat,
    path: &Path,
) -> Result<(), ReportError> {
    let file = std::fs::File::create(path)?;
    export_report(report, source, format, std::io::BufWriter::new(file))
}

/// One-line description of a retraction notice:
/// `Retraction - 2021-03-14 - see https://doi.org/10.1000/notice`.
pub fn notice_summary(record: &RetractionRecord) -> String {
    let nature = record.nature.as_deref().unwrap_or("Retracted");
    let date = record
        .retraction_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "date unknown".to_string());
    match record.notice_url() {
        Some(url) => format!("{} - {} - see {}", nature, date, url),
        None => format!("{} - {}", nature, date),
    }
}

/// Human-readable description of how a reference matched.
pub fn confidence_label(result: &MatchResult<'_>) -> String {
    match result.confidence() {
        MatchConfidence::ExactDoi => "matched by DOI".to_string(),
        MatchConfidence::TitleMatch if result.is_ambiguous() => format!(
            "matched by title ({} candidates, verify manually)",
            result.ambiguity().len()
        ),
        MatchConfidence::TitleMatch => "matched by title".to_string(),
        MatchConfidence::None => "no retraction found".to_string(),
    }
}

fn summary_line(s: &ReportSummary) -> String {
    format!(
        "{} references | {} matched by DOI | {} matched by title ({} ambiguous) | {} clean",
        s.total, s.exact_doi, s.title_match, s.ambiguous, s.clean
    )
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct JsonReport<'a> {
    source: Option<&'a str>,
    summary: JsonSummary,
    references: Vec<JsonReference<'a>>,
}

#[derive(Serialize)]
struct JsonSummary {
    total: usize,
    zombies: usize,
    exact_doi: usize,
    title_match: usize,
    ambiguous: usize,
    clean: usize,
}

#[derive(Serialize)]
struct JsonReference<'a> {
    number: usize,
    raw_text: &'a str,
    doi: Option<&'a str>,
    title: Option<&'a str>,
    confidence: &'static str,
    zombie: bool,
    ambiguous: bool,
    record: Option<JsonRecord<'a>>,
    /// Every record behind the match when there is more than one.
    candidates: Vec<JsonRecord<'a>>,
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    record_id: Option<&'a str>,
    doi: Option<&'a str>,
    doi_url: Option<String>,
    title: &'a str,
    authors: &'a [String],
    journal: Option<&'a str>,
    retraction_date: Option<String>,
    nature: Option<&'a str>,
    reason: Option<&'a str>,
    notice_doi: Option<&'a str>,
    notice_url: Option<String>,
}

impl<'a> From<&'a RetractionRecord> for JsonRecord<'a> {
    fn from(r: &'a RetractionRecord) -> Self {
        Self {
            record_id: r.record_id.as_deref(),
            doi: r.doi.as_deref(),
            doi_url: r.doi_url(),
            title: &r.title,
            authors: &r.authors,
            journal: r.journal.as_deref(),
            retraction_date: r.retraction_date.map(|d| d.to_string()),
            nature: r.nature.as_deref(),
            reason: r.reason.as_deref(),
            notice_doi: r.notice_doi.as_deref(),
            notice_url: r.notice_url(),
        }
    }
}

fn export_json<W: Write>(
    report: &Report<'_>,
    source: Option<&str>,
    writer: &mut W,
) -> Result<(), ReportError> {
    let s = report.summary();
    let doc = JsonReport {
        source,
        summary: JsonSummary {
            total: s.total,
            zombies: s.zombies(),
            exact_doi: s.exact_doi,
            title_match: s.title_match,
            ambiguous: s.ambiguous,
            clean: s.clean,
        },
        references: report
            .iter()
            .map(|result| {
                let reference = result.reference();
                let records = result.records();
                JsonReference {
                    number: reference.number,
                    raw_text: &reference.raw_text,
                    doi: reference.doi.as_deref(),
                    title: reference.title.as_deref(),
                    confidence: result.confidence().as_str(),
                    zombie: result.is_zombie(),
                    ambiguous: result.is_ambiguous(),
                    record: result.matched_record().map(JsonRecord::from),
                    candidates: if records.len() > 1 {
                        records.into_iter().map(JsonRecord::from).collect()
                    } else {
                        Vec::new()
                    },
                }
            })
            .collect(),
    };

    serde_json::to_writer_pretty(&mut *writer, &doc)?;
    writeln!(writer)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

const CSV_HEADER: [&str; 13] = [
    "number",
    "confidence",
    "ambiguous",
    "candidates",
    "reference_doi",
    "reference_title",
    "record_doi",
    "record_title",
    "nature",
    "retraction_date",
    "notice_url",
    "reason",
    "raw_text",
];

#[derive(Serialize)]
struct CsvRow<'a> {
    number: usize,
    confidence: &'static str,
    ambiguous: bool,
    candidates: usize,
    reference_doi: Option<&'a str>,
    reference_title: Option<&'a str>,
    record_doi: Option<&'a str>,
    record_title: Option<&'a str>,
    nature: Option<&'a str>,
    retraction_date: Option<String>,
    notice_url: Option<String>,
    reason: Option<&'a str>,
    raw_text: &'a str,
}

fn export_csv<W: Write>(report: &Report<'_>, writer: &mut W) -> Result<(), ReportError> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(CSV_HEADER)?;

    for result in report {
        let reference = result.reference();
        let record = result.matched_record();
        csv.serialize(CsvRow {
            number: reference.number,
            confidence: result.confidence().as_str(),
            ambiguous: result.is_ambiguous(),
            candidates: result.records().len(),
            reference_doi: reference.doi.as_deref(),
            reference_title: reference.title.as_deref(),
            record_doi: record.and_then(|r| r.doi.as_deref()),
            record_title: record.map(|r| r.title.as_str()),
            nature: record.and_then(|r| r.nature.as_deref()),
            retraction_date: record.and_then(|r| r.retraction_date).map(|d| d.to_string()),
            notice_url: record.and_then(RetractionRecord::notice_url),
            reason: record.and_then(|r| r.reason.as_deref()),
            raw_text: &reference.raw_text,
        })?;
    }
    csv.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Markdown
// ---------------------------------------------------------------------------

fn md_escape(s: &str) -> String {
    s.replace('|', "\\|")
}

fn export_markdown(report: &Report<'_>, source: Option<&str>) -> String {
    let mut out = String::from("# Zombie Citation Report\n\n");
    if let Some(source) = source {
        let _ = writeln!(out, "**Source:** `{}`\n", source);
    }

    let s = report.summary();
    out.push_str("| References | Matched by DOI | Matched by title | Ambiguous | Clean |\n");
    out.push_str("|---:|---:|---:|---:|---:|\n");
    let _ = writeln!(
        out,
        "| {} | {} | {} | {} | {} |\n",
        s.total, s.exact_doi, s.title_match, s.ambiguous, s.clean
    );

    if !report.has_zombies() {
        out.push_str("No references cite retracted work.\n");
        return out;
    }

    out.push_str("## Flagged references\n");
    for result in report.zombies() {
        let reference = result.reference();
        let _ = writeln!(
            out,
            "\n### [{}] {}\n",
            reference.number,
            md_escape(reference.label())
        );
        let _ = writeln!(out, "- {}", confidence_label(result));
        if let Some(doi) = &reference.doi {
            let _ = writeln!(out, "- Cited DOI: `{}`", doi);
        }
        for record in result.records() {
            let notice = match record.notice_url() {
                Some(url) => format!("[notice]({})", url),
                None => "no notice DOI".to_string(),
            };
            let date = record
                .retraction_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "date unknown".to_string());
            let _ = writeln!(
                out,
                "- **{}** ({}): {}, {}",
                md_escape(record.nature.as_deref().unwrap_or("Retracted")),
                date,
                md_escape(&record.title),
                notice
            );
            if let Some(reason) = &record.reason {
                let _ = writeln!(out, "  - Reason: {}", md_escape(reason));
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Plain text
// ---------------------------------------------------------------------------

fn export_text(report: &Report<'_>, source: Option<&str>) -> String {
    let title = match source {
        Some(source) => format!("Zombie citation report: {}", source),
        None => "Zombie citation report".to_string(),
    };
    let mut out = format!("{}\n{}\n", title, "=".repeat(title.chars().count()));
    let _ = writeln!(out, "  {}\n", summary_line(&report.summary()));

    for result in report {
        let reference = result.reference();
        let mark = if result.is_zombie() { "\u{2757}" } else { "\u{2714}" };
        let _ = writeln!(out, "{} [{}] {}", mark, reference.number, reference.label());
        if !result.is_zombie() {
            continue;
        }
        let _ = writeln!(out, "    {}", confidence_label(result));
        for record in result.records() {
            let _ = writeln!(out, "    \u{2757} {}", notice_summary(record));
            if result.confidence() == MatchConfidence::TitleMatch {
                let _ = writeln!(
                    out,
                    "       {}{}",
                    record.title,
                    record
                        .doi
                        .as_deref()
                        .map(|d| format!(" ({})", d))
                        .unwrap_or_default()
                );
            }
        }
    }
    out
}
