//! In-memory retraction index built from a CSV export.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::Error;
use crate::normalize::{looks_like_crossref_doi, normalize_doi, normalize_title};
use crate::record::{RetractionRecord, join_reasons, parse_retraction_date, split_authors};

/// Logical columns of the retraction dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Doi,
    Title,
    Authors,
    RetractionDate,
    Reason,
    Nature,
    NoticeDoi,
    Journal,
    RecordId,
}

impl Column {
    pub const ALL: [Column; 9] = [
        Column::Doi,
        Column::Title,
        Column::Authors,
        Column::RetractionDate,
        Column::Reason,
        Column::Nature,
        Column::NoticeDoi,
        Column::Journal,
        Column::RecordId,
    ];

    /// Columns whose absence makes the source unusable.
    pub fn is_required(self) -> bool {
        matches!(self, Column::Doi | Column::Title)
    }

    pub fn label(self) -> &'static str {
        match self {
            Column::Doi => "DOI",
            Column::Title => "title",
            Column::Authors => "authors",
            Column::RetractionDate => "retraction date",
            Column::Reason => "reason",
            Column::Nature => "retraction nature",
            Column::NoticeDoi => "retraction notice DOI",
            Column::Journal => "journal",
            Column::RecordId => "record ID",
        }
    }
}

/// Header names accepted for each logical column, in order of preference.
///
/// Defaults cover the Retraction Watch export plus generic snake_case
/// names. Header comparison is case-insensitive and ignores surrounding
/// whitespace.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    names: HashMap<Column, Vec<String>>,
}

impl Default for ColumnMap {
    fn default() -> Self {
        let defaults: [(Column, &[&str]); 9] = [
            (Column::Doi, &["OriginalPaperDOI", "doi", "original_paper_doi"]),
            (Column::Title, &["Title", "original_title", "paper_title"]),
            (Column::Authors, &["Author", "Authors"]),
            (
                Column::RetractionDate,
                &["RetractionDate", "retraction_date", "date"],
            ),
            (Column::Reason, &["Reason", "Reasons"]),
            (Column::Nature, &["RetractionNature", "retraction_nature", "nature"]),
            (
                Column::NoticeDoi,
                &["RetractionDOI", "retraction_doi", "notice_doi"],
            ),
            (Column::Journal, &["Journal", "venue"]),
            (Column::RecordId, &["Record ID", "record_id", "id"]),
        ];
        Self {
            names: defaults
                .into_iter()
                .map(|(col, names)| (col, names.iter().map(|n| n.to_string()).collect()))
                .collect(),
        }
    }
}

impl ColumnMap {
    /// Put `name` first in the candidate list for `column`.
    pub fn prefer(&mut self, column: Column, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        let names = self.names.entry(column).or_default();
        names.retain(|n| !n.eq_ignore_ascii_case(&name));
        names.insert(0, name);
        self
    }

    pub fn candidates(&self, column: Column) -> &[String] {
        self.names.get(&column).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Map each logical column to a header index.
    fn resolve(&self, headers: &[String]) -> Result<ResolvedColumns, Error> {
        let mut resolved = ResolvedColumns::default();
        let mut missing = Vec::new();

        for column in Column::ALL {
            let index = self.candidates(column).iter().find_map(|name| {
                headers
                    .iter()
                    .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
            });
            match index {
                Some(i) => {
                    resolved.indices.insert(column, i);
                }
                None if column.is_required() => missing.push(format!(
                    "{} (tried: {})",
                    column.label(),
                    self.candidates(column).join(", ")
                )),
                None => {}
            }
        }

        if missing.is_empty() {
            Ok(resolved)
        } else {
            Err(Error::DataFormat(format!(
                "missing required column(s): {}; found header: [{}]",
                missing.join("; "),
                headers.join(", ")
            )))
        }
    }
}

#[derive(Debug, Default)]
struct ResolvedColumns {
    indices: HashMap<Column, usize>,
}

impl ResolvedColumns {
    /// Trimmed, lossily-decoded, non-empty field value.
    fn get(&self, row: &csv::ByteRecord, column: Column) -> Option<String> {
        let raw = row.get(*self.indices.get(&column)?)?;
        let value = String::from_utf8_lossy(raw).trim().to_string();
        (!value.is_empty()).then_some(value)
    }
}

/// Diagnostics collected while loading the database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Data rows read (excluding the header).
    pub rows: usize,
    /// Rows turned into records.
    pub indexed: usize,
    /// Rows with neither a usable DOI nor a title.
    pub skipped_rows: usize,
    /// Records whose DOI was already claimed by an earlier row.
    pub duplicate_dois: usize,
    /// Records without a usable DOI (title-only).
    pub missing_doi: usize,
    /// Records without a title (DOI-only).
    pub missing_title: usize,
    /// Non-empty date fields that could not be parsed.
    pub unparsed_dates: usize,
    /// DOIs that don't match the Crossref DOI patterns (still indexed).
    pub nonconforming_dois: usize,
}

/// Read failures stay I/O errors; anything else the CSV parser rejects is a
/// data format problem.
fn csv_error(e: csv::Error) -> Error {
    let message = format!("malformed CSV: {e}");
    match e.into_kind() {
        csv::ErrorKind::Io(io) => Error::Io(io),
        _ => Error::DataFormat(message),
    }
}

/// Immutable index of retraction records, keyed by normalized DOI and
/// normalized title.
///
/// Built once by [`RetractionDatabase::load`] / [`RetractionDatabase::open`];
/// all lookups take `&self`, so a database can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct RetractionDatabase {
    records: Vec<RetractionRecord>,
    by_doi: HashMap<String, Vec<usize>>,
    by_title: HashMap<String, Vec<usize>>,
    stats: LoadStats,
    path: Option<PathBuf>,
}

impl RetractionDatabase {
    /// Load records from CSV data using the default column names.
    pub fn load(source: impl Read) -> Result<Self, Error> {
        Self::load_with_columns(source, &ColumnMap::default())
    }

    /// Load records from CSV data with a custom column mapping.
    ///
    /// Fails with [`Error::DataFormat`] if the DOI or title column cannot be
    /// found in the header. Rows with neither a DOI nor a title are skipped
    /// and counted in [`LoadStats::skipped_rows`].
    pub fn load_with_columns(source: impl Read, columns: &ColumnMap) -> Result<Self, Error> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(source);

        let headers: Vec<String> = reader
            .byte_headers()
            .map_err(csv_error)?
            .iter()
            .map(|h| {
                String::from_utf8_lossy(h)
                    .trim_start_matches('\u{feff}')
                    .trim()
                    .to_string()
            })
            .collect();
        let resolved = columns.resolve(&headers)?;

        let mut db = Self::default();
        let mut row = csv::ByteRecord::new();
        while reader.read_byte_record(&mut row).map_err(csv_error)? {
            db.stats.rows += 1;
            match db.parse_row(&resolved, &row) {
                Some(record) => db.insert(record),
                None => db.stats.skipped_rows += 1,
            }
        }

        if db.stats.nonconforming_dois > 0 {
            tracing::warn!(
                count = db.stats.nonconforming_dois,
                "DOIs not matching Crossref patterns were indexed as-is"
            );
        }
        tracing::debug!(
            rows = db.stats.rows,
            records = db.stats.indexed,
            skipped = db.stats.skipped_rows,
            duplicate_dois = db.stats.duplicate_dois,
            "retraction database loaded"
        );

        Ok(db)
    }

    /// Open a CSV file using the default column names.
    pub fn open(path: &Path) -> Result<Self, Error> {
        Self::open_with_columns(path, &ColumnMap::default())
    }

    /// Open a CSV file with a custom column mapping.
    pub fn open_with_columns(path: &Path, columns: &ColumnMap) -> Result<Self, Error> {
        let file = File::open(path)?;
        let mut db = Self::load_with_columns(BufReader::new(file), columns)?;
        db.path = Some(path.to_path_buf());
        tracing::info!(
            path = %path.display(),
            records = db.records.len(),
            skipped = db.stats.skipped_rows,
            "opened retraction database"
        );
        Ok(db)
    }

    fn parse_row(
        &mut self,
        columns: &ResolvedColumns,
        row: &csv::ByteRecord,
    ) -> Option<RetractionRecord> {
        let doi = columns
            .get(row, Column::Doi)
            .and_then(|raw| normalize_doi(&raw));
        let title = columns
            .get(row, Column::Title)
            .filter(|t| !normalize_title(t).is_empty());

        if doi.is_none() && title.is_none() {
            return None;
        }

        if let Some(doi) = &doi
            && !looks_like_crossref_doi(doi)
        {
            tracing::debug!(doi = %doi, "DOI does not match Crossref patterns");
            self.stats.nonconforming_dois += 1;
        }

        let retraction_date = columns.get(row, Column::RetractionDate).and_then(|raw| {
            let date = parse_retraction_date(&raw);
            if date.is_none() {
                self.stats.unparsed_dates += 1;
            }
            date
        });

        Some(RetractionRecord {
            record_id: columns.get(row, Column::RecordId),
            doi,
            title: title.unwrap_or_default(),
            authors: columns
                .get(row, Column::Authors)
                .map(|a| split_authors(&a))
                .unwrap_or_default(),
            journal: columns.get(row, Column::Journal),
            retraction_date,
            reason: columns
                .get(row, Column::Reason)
                .and_then(|r| join_reasons(&r)),
            nature: columns.get(row, Column::Nature),
            notice_doi: columns
                .get(row, Column::NoticeDoi)
                .and_then(|raw| normalize_doi(&raw)),
        })
    }

    /// Add a record to both indexes. Every record with a title lands in the
    /// title index, including those reachable by DOI.
    fn insert(&mut self, record: RetractionRecord) {
        let index = self.records.len();

        match &record.doi {
            Some(doi) => {
                let slots = self.by_doi.entry(doi.clone()).or_default();
                if !slots.is_empty() {
                    self.stats.duplicate_dois += 1;
                }
                slots.push(index);
            }
            None => self.stats.missing_doi += 1,
        }

        let title_key = normalize_title(&record.title);
        if title_key.is_empty() {
            self.stats.missing_title += 1;
        } else {
            self.by_title.entry(title_key).or_default().push(index);
        }

        self.records.push(record);
        self.stats.indexed += 1;
    }

    /// Look up a record by DOI, in any of its usual spellings.
    ///
    /// When several rows share a DOI (e.g. an expression of concern followed
    /// by a retraction), the first in load order is returned; see
    /// [`records_for_doi`](Self::records_for_doi) for all of them.
    pub fn lookup_by_doi(&self, doi: &str) -> Option<&RetractionRecord> {
        let key = normalize_doi(doi)?;
        let &first = self.by_doi.get(&key)?.first()?;
        Some(&self.records[first])
    }

    /// Every record filed under a DOI, in load order.
    pub fn records_for_doi(&self, doi: &str) -> Vec<&RetractionRecord> {
        normalize_doi(doi)
            .and_then(|key| self.by_doi.get(&key))
            .map(|slots| self.resolve(slots))
            .unwrap_or_default()
    }

    /// Every record whose normalized title equals the normalized input, in
    /// load order. Empty when nothing matches.
    pub fn lookup_by_title(&self, title: &str) -> Vec<&RetractionRecord> {
        let key = normalize_title(title);
        if key.is_empty() {
            return Vec::new();
        }
        self.by_title
            .get(&key)
            .map(|slots| self.resolve(slots))
            .unwrap_or_default()
    }

    /// Whether the DOI belongs to a record in the database.
    pub fn contains_doi(&self, doi: &str) -> bool {
        normalize_doi(doi).is_some_and(|key| self.by_doi.contains_key(&key))
    }

    fn resolve(&self, slots: &[usize]) -> Vec<&RetractionRecord> {
        slots.iter().map(|&i| &self.records[i]).collect()
    }

    /// All records, in load order.
    pub fn records(&self) -> &[RetractionRecord] {
        &self.records
    }

    /// Number of indexed records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of distinct normalized DOIs.
    pub fn doi_count(&self) -> usize {
        self.by_doi.len()
    }

    pub fn stats(&self) -> &LoadStats {
        &self.stats
    }

    /// Path the database was opened from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
