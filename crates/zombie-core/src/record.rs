use chrono::{NaiveDate, NaiveDateTime};

/// One retracted (or otherwise flagged) publication from the retraction dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetractionRecord {
    /// Dataset row identifier (Retraction Watch "Record ID").
    pub record_id: Option<String>,
    /// Normalized DOI of the original paper.
    pub doi: Option<String>,
    pub title: String,
    pub authors: Vec<String>,
    pub journal: Option<String>,
    pub retraction_date: Option<NaiveDate>,
    /// Reasons, joined with `"; "`.
    pub reason: Option<String>,
    /// "Retraction", "Expression of concern", "Correction", ...
    pub nature: Option<String>,
    /// DOI of the retraction notice itself.
    pub notice_doi: Option<String>,
}

impl RetractionRecord {
    /// Resolver link to the retraction notice, if the dataset has one.
    pub fn notice_url(&self) -> Option<String> {
        self.notice_doi
            .as_ref()
            .map(|doi| format!("https://doi.org/{}", doi))
    }

    /// Resolver link to the retracted paper.
    pub fn doi_url(&self) -> Option<String> {
        self.doi.as_ref().map(|doi| format!("https://doi.org/{}", doi))
    }
}

/// Parse a retraction date as found in the dataset.
///
/// Accepts `M/D/YYYY H:MM` (the Retraction Watch export), `M/D/YYYY` and
/// ISO `YYYY-MM-DD` (optionally with a time part).
pub fn parse_retraction_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for fmt in ["%m/%d/%Y %H:%M", "%m/%d/%Y %H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in ["%m/%d/%Y", "%Y-%m-%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
    }
    None
}

/// Split a `;`-separated author list.
pub fn split_authors(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(String::from)
        .collect()
}

/// Normalize a `;+`-delimited reason list ("+Duplication of Article;+Error in Data;")
/// into `"Duplication of Article; Error in Data"`.
pub fn join_reasons(raw: &str) -> Option<String> {
    let reasons: Vec<&str> = raw
        .split(';')
        .map(|r| r.trim().trim_start_matches('+').trim())
        .filter(|r| !r.is_empty())
        .collect();
    if reasons.is_empty() {
        None
    } else {
        Some(reasons.join("; "))
    }
}
