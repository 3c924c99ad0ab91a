use std::io::Write;

use owo_colors::OwoColorize;
use zombie_core::{LoadStats, Paper, Report, RetractionDatabase, RetractionRecord};
use zombie_reporting::export::{confidence_label, notice_summary};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the per-reference check marks and retraction notices, followed by a
/// summary.
pub fn print_report(
    w: &mut dyn Write,
    report: &Report<'_>,
    source: &str,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}", "Checking".bold(), source)?;
    } else {
        writeln!(w, "Checking {}", source)?;
    }
    writeln!(w)?;

    for result in report {
        let reference = result.reference();
        let label = format!("[{}] {}", reference.number, reference.label());

        if !result.is_zombie() {
            if color.enabled() {
                writeln!(w, "{} {}", "\u{2714}".green(), label.dimmed())?;
            } else {
                writeln!(w, "\u{2714} {}", label)?;
            }
            continue;
        }

        if color.enabled() {
            writeln!(w, "{} {}", "\u{2757}".red(), label.bold())?;
        } else {
            writeln!(w, "\u{2757} {}", label)?;
        }

        let how = confidence_label(result);
        if result.is_ambiguous() && color.enabled() {
            writeln!(w, "    {}", how.yellow())?;
        } else {
            writeln!(w, "    {}", how)?;
        }

        for record in result.records() {
            let notice = notice_summary(record);
            if color.enabled() {
                writeln!(w, "    {} {}", "\u{2757}".red(), notice.red())?;
            } else {
                writeln!(w, "    \u{2757} {}", notice)?;
            }
            if result.is_ambiguous() {
                writeln!(
                    w,
                    "       {}{}",
                    record.title,
                    record
                        .doi
                        .as_deref()
                        .map(|d| format!(" ({})", d))
                        .unwrap_or_default()
                )?;
            }
        }
    }

    print_summary(w, report, color)
}

fn print_summary(w: &mut dyn Write, report: &Report<'_>, color: ColorMode) -> std::io::Result<()> {
    let s = report.summary();
    writeln!(w)?;
    let sep = "=".repeat(60);
    if color.enabled() {
        writeln!(w, "{}", sep.bold())?;
        writeln!(w, "{}", "SUMMARY".bold())?;
        writeln!(w, "{}", sep.bold())?;
    } else {
        writeln!(w, "{}", sep)?;
        writeln!(w, "SUMMARY")?;
        writeln!(w, "{}", sep)?;
    }
    writeln!(w, "  References checked: {}", s.total)?;
    if color.enabled() {
        writeln!(w, "  Clean:              {}", s.clean.to_string().green())?;
        writeln!(w, "  Retracted (DOI):    {}", s.exact_doi.to_string().red())?;
        writeln!(w, "  Retracted (title):  {}", s.title_match.to_string().red())?;
        if s.ambiguous > 0 {
            writeln!(w, "  Ambiguous titles:   {}", s.ambiguous.to_string().yellow())?;
        }
    } else {
        writeln!(w, "  Clean:              {}", s.clean)?;
        writeln!(w, "  Retracted (DOI):    {}", s.exact_doi)?;
        writeln!(w, "  Retracted (title):  {}", s.title_match)?;
        if s.ambiguous > 0 {
            writeln!(w, "  Ambiguous titles:   {}", s.ambiguous)?;
        }
    }
    writeln!(w)?;

    if s.zombies() == 0 {
        if color.enabled() {
            writeln!(w, "{}", "No citations to retracted work found.".green())?;
        } else {
            writeln!(w, "No citations to retracted work found.")?;
        }
    } else {
        let msg = format!(
            "{} of {} references cite retracted or flagged work.",
            s.zombies(),
            s.total
        );
        if color.enabled() {
            writeln!(w, "{}", msg.bold().red())?;
        } else {
            writeln!(w, "{}", msg)?;
        }
    }
    Ok(())
}

/// Print one database record in full.
pub fn print_record(
    w: &mut dyn Write,
    record: &RetractionRecord,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", record.title.cyan())?;
    } else {
        writeln!(w, "{}", record.title)?;
    }
    if let Some(url) = record.doi_url() {
        writeln!(w, "  DOI:      {}", url)?;
    }
    if !record.authors.is_empty() {
        writeln!(w, "  Authors:  {}", record.authors.join(", "))?;
    }
    if let Some(journal) = &record.journal {
        writeln!(w, "  Journal:  {}", journal)?;
    }
    if color.enabled() {
        writeln!(w, "  Notice:   {}", notice_summary(record).red())?;
    } else {
        writeln!(w, "  Notice:   {}", notice_summary(record))?;
    }
    if let Some(reason) = &record.reason {
        writeln!(w, "  Reason:   {}", reason)?;
    }
    if let Some(id) = &record.record_id {
        writeln!(w, "  Record:   {}", id)?;
    }
    Ok(())
}

/// Print database size and load diagnostics.
pub fn print_db_info(
    w: &mut dyn Write,
    db: &RetractionDatabase,
    color: ColorMode,
) -> std::io::Result<()> {
    if let Some(path) = db.path() {
        if color.enabled() {
            writeln!(w, "{} {}", "Database:".bold(), path.display())?;
        } else {
            writeln!(w, "Database: {}", path.display())?;
        }
    }
    writeln!(w, "  Records:        {}", db.len())?;
    writeln!(w, "  Distinct DOIs:  {}", db.doi_count())?;

    let LoadStats {
        rows,
        indexed: _,
        skipped_rows,
        duplicate_dois,
        missing_doi,
        missing_title,
        unparsed_dates,
        nonconforming_dois,
    } = db.stats().clone();

    writeln!(w, "  Rows read:      {}", rows)?;
    let diagnostics = [
        ("Skipped rows", skipped_rows),
        ("Duplicate DOIs", duplicate_dois),
        ("Title only", missing_doi),
        ("DOI only", missing_title),
        ("Unparsed dates", unparsed_dates),
        ("Odd DOIs", nonconforming_dois),
    ];
    for (label, count) in diagnostics {
        let line = format!("  {:<15} {}", format!("{}:", label), count);
        if count > 0 && color.enabled() {
            writeln!(w, "{}", line.yellow())?;
        } else {
            writeln!(w, "{}", line)?;
        }
    }
    Ok(())
}

/// Print the references extracted from a manuscript, without matching.
pub fn print_references(
    w: &mut dyn Write,
    paper: &Paper,
    color: ColorMode,
) -> std::io::Result<()> {
    for reference in paper.references() {
        if color.enabled() {
            writeln!(w, "{} {}", format!("[{}]", reference.number).bold(), reference.raw_text)?;
        } else {
            writeln!(w, "[{}] {}", reference.number, reference.raw_text)?;
        }
        let doi = reference.doi.as_deref().unwrap_or("-");
        let title = reference.title.as_deref().unwrap_or("-");
        if color.enabled() {
            writeln!(w, "    DOI:   {}", doi.cyan())?;
            writeln!(w, "    Title: {}", title.cyan())?;
        } else {
            writeln!(w, "    DOI:   {}", doi)?;
            writeln!(w, "    Title: {}", title)?;
        }
    }
    writeln!(w)?;
    writeln!(w, "{} references", paper.len())?;
    Ok(())
}
