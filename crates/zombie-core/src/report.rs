use crate::database::RetractionDatabase;
use crate::paper::Reference;
use crate::record::RetractionRecord;

/// How a reference was tied to a retraction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchConfidence {
    /// The reference's DOI equals a record's DOI after normalization.
    ExactDoi,
    /// The reference's normalized title equals a record's normalized title.
    TitleMatch,
    /// No record matched.
    None,
}

impl MatchConfidence {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchConfidence::ExactDoi => "exact_doi",
            MatchConfidence::TitleMatch => "title_match",
            MatchConfidence::None => "none",
        }
    }
}

/// Outcome of matching one reference.
///
/// `matched_record()` is `Some` exactly when `confidence()` is not
/// [`MatchConfidence::None`]. When records for different papers share the
/// reference's title, all of them are in `ambiguity()` and `matched_record()` is just the
/// first in load order; check [`is_ambiguous`](Self::is_ambiguous) before
/// trusting it.
#[derive(Debug, Clone)]
pub struct MatchResult<'a> {
    reference: &'a Reference,
    matched_record: Option<&'a RetractionRecord>,
    confidence: MatchConfidence,
    ambiguity: Vec<&'a RetractionRecord>,
    /// Every row filed under the matched DOI (e.g. a correction and a later
    /// retraction of the same paper).
    doi_records: Vec<&'a RetractionRecord>,
}

impl<'a> MatchResult<'a> {
    /// DOI match over every record filed under the DOI; `None` if there are
    /// no records.
    pub fn exact_doi(
        reference: &'a Reference,
        records: Vec<&'a RetractionRecord>,
    ) -> Option<Self> {
        let first = *records.first()?;
        Some(Self {
            reference,
            matched_record: Some(first),
            confidence: MatchConfidence::ExactDoi,
            ambiguity: Vec::new(),
            doi_records: records,
        })
    }

    /// Title match over `candidates`; `None` if there are no candidates.
    ///
    /// Candidates that all carry the same DOI are notices for one paper and
    /// are kept together like a DOI match; otherwise more than one candidate
    /// makes the match ambiguous.
    pub fn title_match(
        reference: &'a Reference,
        candidates: Vec<&'a RetractionRecord>,
    ) -> Option<Self> {
        let first = *candidates.first()?;
        let (ambiguity, doi_records) = if candidates.len() == 1 {
            (Vec::new(), Vec::new())
        } else if same_paper(&candidates) {
            (Vec::new(), candidates)
        } else {
            (candidates, Vec::new())
        };
        Some(Self {
            reference,
            matched_record: Some(first),
            confidence: MatchConfidence::TitleMatch,
            ambiguity,
            doi_records,
        })
    }

    pub fn no_match(reference: &'a Reference) -> Self {
        Self {
            reference,
            matched_record: None,
            confidence: MatchConfidence::None,
            ambiguity: Vec::new(),
            doi_records: Vec::new(),
        }
    }

    pub fn reference(&self) -> &'a Reference {
        self.reference
    }

    pub fn matched_record(&self) -> Option<&'a RetractionRecord> {
        self.matched_record
    }

    pub fn confidence(&self) -> MatchConfidence {
        self.confidence
    }

    /// All candidates of an ambiguous title match (two or more); empty otherwise.
    pub fn ambiguity(&self) -> &[&'a RetractionRecord] {
        &self.ambiguity
    }

    pub fn is_ambiguous(&self) -> bool {
        !self.ambiguity.is_empty()
    }

    /// Whether this reference cites retracted work.
    pub fn is_zombie(&self) -> bool {
        self.confidence != MatchConfidence::None
    }

    /// Records to show for this reference: all candidates when ambiguous,
    /// every row under the DOI for a DOI match, otherwise the single match
    /// (if any).
    pub fn records(&self) -> Vec<&'a RetractionRecord> {
        if self.is_ambiguous() {
            self.ambiguity.clone()
        } else if !self.doi_records.is_empty() {
            self.doi_records.clone()
        } else {
            self.matched_record.into_iter().collect()
        }
    }
}

fn same_paper(records: &[&RetractionRecord]) -> bool {
    match records.first().and_then(|r| r.doi.as_deref()) {
        Some(doi) => records.iter().all(|r| r.doi.as_deref() == Some(doi)),
        None => false,
    }
}

/// Match one reference against the database.
///
/// DOI first; if the reference has no DOI or its DOI is not in the
/// database, fall back to the title. Ambiguous title matches keep every
/// candidate.
pub fn match_reference<'a>(
    reference: &'a Reference,
    db: &'a RetractionDatabase,
) -> MatchResult<'a> {
    if let Some(doi) = reference.doi.as_deref()
        && let Some(result) = MatchResult::exact_doi(reference, db.records_for_doi(doi))
    {
        return result;
    }

    reference
        .title
        .as_deref()
        .and_then(|title| MatchResult::title_match(reference, db.lookup_by_title(title)))
        .unwrap_or_else(|| MatchResult::no_match(reference))
}

/// Summary counts for a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub total: usize,
    pub exact_doi: usize,
    pub title_match: usize,
    /// Title matches with more than one candidate (subset of `title_match`).
    pub ambiguous: usize,
    pub clean: usize,
}

impl ReportSummary {
    pub fn zombies(&self) -> usize {
        self.exact_doi + self.title_match
    }
}

/// Per-reference match results, in the paper's reference order.
#[derive(Debug, Clone)]
pub struct Report<'a> {
    results: Vec<MatchResult<'a>>,
}

impl<'a> Report<'a> {
    pub fn new(results: Vec<MatchResult<'a>>) -> Self {
        Self { results }
    }

    pub fn results(&self) -> &[MatchResult<'a>] {
        &self.results
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MatchResult<'a>> {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results that matched a retraction record.
    pub fn zombies(&self) -> impl Iterator<Item = &MatchResult<'a>> {
        self.results.iter().filter(|r| r.is_zombie())
    }

    pub fn has_zombies(&self) -> bool {
        self.results.iter().any(MatchResult::is_zombie)
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary {
            total: self.results.len(),
            ..Default::default()
        };
        for result in &self.results {
            match result.confidence() {
                MatchConfidence::ExactDoi => summary.exact_doi += 1,
                MatchConfidence::TitleMatch => {
                    summary.title_match += 1;
                    if result.is_ambiguous() {
                        summary.ambiguous += 1;
                    }
                }
                MatchConfidence::None => summary.clean += 1,
            }
        }
        summary
    }
}

impl<'r, 'a> IntoIterator for &'r Report<'a> {
    type Item = &'r MatchResult<'a>;
    type IntoIter = std::slice::Iter<'r, MatchResult<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
