//! Retraction database index and citation matching engine.
//!
//! Loads a tabular retraction dataset (e.g. Retraction Watch) into an
//! identifier index and matches a manuscript's references against it,
//! flagging citations to retracted work ("zombie citations").

use thiserror::Error;

pub mod backend;
pub mod config_file;
pub mod database;
pub mod identifiers;
pub mod normalize;
pub mod paper;
pub mod record;
pub mod report;
pub mod section;
pub mod title;

// Re-export for convenience
pub use backend::{BackendError, PlainTextBackend, TextBackend};
pub use database::{Column, ColumnMap, LoadStats, RetractionDatabase};
pub use identifiers::{extract_doi, extract_dois};
pub use normalize::{normalize_doi, normalize_title};
pub use paper::{Paper, Reference};
pub use record::RetractionRecord;
pub use report::{MatchConfidence, MatchResult, Report, ReportSummary, match_reference};

#[derive(Error, Debug)]
pub enum Error {
    /// The database source is missing required columns or is not parseable
    /// as CSV.
    #[error("data format error: {0}")]
    DataFormat(String),
    /// No references could be associated with a paper.
    #[error("no references found in {0}")]
    EmptyReferenceList(String),
    #[error("text extraction error: {0}")]
    Backend(#[from] BackendError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
