use std::path::Path;

use crate::Error;
use crate::backend::{PlainTextBackend, TextBackend};
use crate::database::RetractionDatabase;
use crate::identifiers::{extract_doi, extract_dois};
use crate::report::{Report, match_reference};
use crate::section::{find_references_section, flatten_reference, segment_references};
use crate::title::extract_title;

/// One citation from a manuscript's reference list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// The citation as it appears in the manuscript, flattened to one line.
    pub raw_text: String,
    pub doi: Option<String>,
    pub title: Option<String>,
    /// 1-based position in the reference list.
    pub number: usize,
}

impl Reference {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            doi: None,
            title: None,
            number: 0,
        }
    }

    pub fn with_doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = Some(doi.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Build a reference from raw citation text, extracting its DOI and title.
    pub fn parse(number: usize, raw: &str) -> Self {
        let raw_text = flatten_reference(raw);
        Self {
            doi: extract_doi(raw),
            title: extract_title(&raw_text),
            raw_text,
            number,
        }
    }

    /// Short label for display: the title if known, else the DOI, else the raw text.
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .or(self.doi.as_deref())
            .unwrap_or(&self.raw_text)
    }
}

/// A manuscript's reference list.
#[derive(Debug, Clone)]
pub struct Paper {
    references: Vec<Reference>,
    source: Option<String>,
}

impl Paper {
    /// Build a paper from already-extracted references.
    ///
    /// References keep their order; any with `number == 0` are numbered by
    /// position. Fails with [`Error::EmptyReferenceList`] if `references`
    /// is empty.
    pub fn from_references(references: Vec<Reference>) -> Result<Self, Error> {
        if references.is_empty() {
            return Err(Error::EmptyReferenceList("the supplied reference list".into()));
        }
        let references = references
            .into_iter()
            .enumerate()
            .map(|(i, mut r)| {
                if r.number == 0 {
                    r.number = i + 1;
                }
                r
            })
            .collect();
        Ok(Self {
            references,
            source: None,
        })
    }

    /// Build a paper from manuscript text.
    ///
    /// Locates the reference section (the whole text if there is no
    /// recognizable header), segments it into entries and extracts a DOI and
    /// title from each.
    pub fn from_text(text: &str) -> Result<Self, Error> {
        let section = find_references_section(text).unwrap_or(text);
        let references: Vec<Reference> = segment_references(section)
            .iter()
            .enumerate()
            .map(|(i, raw)| Reference::parse(i + 1, raw))
            .collect();

        if references.is_empty() {
            return Err(Error::EmptyReferenceList("the supplied text".into()));
        }
        tracing::debug!(references = references.len(), "extracted references from text");
        Ok(Self {
            references,
            source: None,
        })
    }

    /// Build a paper from every distinct DOI anywhere in the text, ignoring
    /// reference structure.
    pub fn from_dois_in_text(text: &str) -> Result<Self, Error> {
        let references: Vec<Reference> = extract_dois(text)
            .into_iter()
            .enumerate()
            .map(|(i, doi)| Reference {
                raw_text: doi.clone(),
                doi: Some(doi),
                title: None,
                number: i + 1,
            })
            .collect();

        if references.is_empty() {
            return Err(Error::EmptyReferenceList("the supplied text (no DOIs)".into()));
        }
        Ok(Self {
            references,
            source: None,
        })
    }

    /// Read a plain-text manuscript from disk.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        Self::from_path_with(path, &PlainTextBackend)
    }

    /// Read a manuscript from disk through a text extraction backend.
    pub fn from_path_with(path: &Path, backend: &dyn TextBackend) -> Result<Self, Error> {
        let text = backend.extract_text(path)?;
        let paper = Self::from_text(&text).map_err(|e| match e {
            Error::EmptyReferenceList(_) => Error::EmptyReferenceList(path.display().to_string()),
            other => other,
        })?;
        Ok(paper.with_source(path.display().to_string()))
    }

    /// Attach a display name (usually the file path).
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// Match every reference against the database, in order.
    ///
    /// Neither the paper nor the database is modified; concurrent calls
    /// against one shared database are fine.
    pub fn report<'a>(&'a self, db: &'a RetractionDatabase) -> Report<'a> {
        Report::new(
            self.references
                .iter()
                .map(|reference| match_reference(reference, db))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MANUSCRIPT: &str = "\
Introduction
We build on prior work [1, 2].

References
[1] J. Smith and A. Doe, \"On zombies in the literature,\" Nature, 2020, doi:10.1038/nature12373.
[2] B. Jones. Undead data sets. Journal of Things, 3:1-9,
    2019.
[3] C. Brown (2018). Retraction as a process. Science 12(3).
";

    #[test]
    fn test_from_text_extracts_references_in_order() {
        let paper = Paper::from_text(MANUSCRIPT).unwrap();
        assert_eq!(paper.len(), 3);

        let refs = paper.references();
        assert_eq!(refs[0].number, 1);
        assert_eq!(refs[0].doi.as_deref(), Some("10.1038/nature12373"));
        assert_eq!(refs[0].title.as_deref(), Some("On zombies in the literature"));
        assert_eq!(refs[1].title.as_deref(), Some("Undead data sets"));
        assert!(refs[1].raw_text.ends_with("2019."));
        assert_eq!(refs[2].title.as_deref(), Some("Retraction as a process"));
        assert_eq!(refs[2].doi, None);
    }

    #[test]
    fn test_from_text_empty_is_error() {
        assert!(matches!(
            Paper::from_text("   \n\n"),
            Err(Error::EmptyReferenceList(_))
        ));
    }

    #[test]
    fn test_from_references_numbers_and_rejects_empty() {
        let paper = Paper::from_references(vec![
            Reference::new("first"),
            Reference::new("second").with_doi("10.1/abc"),
        ])
        .unwrap();
        assert_eq!(paper.references()[1].number, 2);

        assert!(matches!(
            Paper::from_references(Vec::new()),
            Err(Error::EmptyReferenceList(_))
        ));
    }

    #[test]
    fn test_from_dois_in_text() {
        let paper =
            Paper::from_dois_in_text("soadifja 10.21105/joss.03440 soiadjf 10.21105/JOSS.03440")
                .unwrap();
        assert_eq!(paper.len(), 1);
        assert_eq!(paper.references()[0].doi.as_deref(), Some("10.21105/joss.03440"));

        assert!(Paper::from_dois_in_text("nothing to see").is_err());
    }

    #[test]
    fn test_from_path_sets_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MANUSCRIPT.as_bytes()).unwrap();

        let paper = Paper::from_path(file.path()).unwrap();
        assert_eq!(paper.len(), 3);
        assert_eq!(paper.source(), Some(file.path().display().to_string().as_str()));
    }

    #[test]
    fn test_from_path_empty_file_names_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        match Paper::from_path(file.path()) {
            Err(Error::EmptyReferenceList(src)) => {
                assert_eq!(src, file.path().display().to_string())
            }
            other => panic!("expected EmptyReferenceList, got {other:?}"),
        }
    }

    #[test]
    fn test_reference_label() {
        assert_eq!(Reference::new("raw").label(), "raw");
        assert_eq!(Reference::new("raw").with_doi("10.1/a").label(), "10.1/a");
        assert_eq!(
            Reference::new("raw").with_doi("10.1/a").with_title("T").label(),
            "T"
        );
    }
}
