//! End-to-end matching: a CSV database on disk, a manuscript on disk, and the
//! resulting report.

use std::io::Write;
use std::sync::Arc;

use zombie_core::{MatchConfidence, Paper, Reference, RetractionDatabase};

const DATABASE: &str = "\
Record ID,Title,Journal,Author,RetractionDate,RetractionDOI,OriginalPaperDOI,RetractionNature,Reason
1,Zombie Papers Walk Among Us,Journal of Undead Studies,Jane Smith;Alan Doe,3/14/2021 0:00,10.5555/notice.1,10.5555/zombie.1,Retraction,+Fabrication of Data;
2,Twin Title,Science,B. Jones,1/2/2020 0:00,10.5555/notice.2,10.5555/twin.a,Retraction,+Duplication of Article;
3,Twin title.,Nature,C. Brown,2/3/2020 0:00,10.5555/notice.3,10.5555/twin.b,Expression of concern,
4,Data Fabrication at Scale,Cell,D. White,,,unavailable,Retraction,+Error in Data;
5,,,,,,,,
";

const MANUSCRIPT: &str = "\
A Study of Citations

1 Introduction
Prior work [1-4] is discussed.

References

[1] J. Smith and A. Doe, \"Zombie papers walk among us,\" J. Undead Stud., 2020, https://doi.org/10.5555/ZOMBIE.1.
[2] E. Green. Perfectly fine research. Journal of Good Results, 1(1), 2019.
[3] C. Brown (2020). Twin title. Nature 7(2).
[4] D. White. 2018. Data fabrication at scale. In Proceedings of the Cell Symposium.
";

fn write_temp(contents: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn database_indexes_valid_rows_and_counts_skipped() {
    let csv = write_temp(DATABASE, ".csv");
    let db = RetractionDatabase::open(csv.path()).unwrap();

    assert_eq!(db.len(), 4);
    assert_eq!(db.stats().rows, 5);
    assert_eq!(db.stats().skipped_rows, 1);
    assert_eq!(db.stats().missing_doi, 1);
    assert_eq!(db.path(), Some(csv.path()));

    let record = db.lookup_by_doi("doi:10.5555/Zombie.1").unwrap();
    assert_eq!(record.authors, vec!["Jane Smith", "Alan Doe"]);
    assert_eq!(record.reason.as_deref(), Some("Fabrication of Data"));
    assert_eq!(
        record.notice_url().as_deref(),
        Some("https://doi.org/10.5555/notice.1")
    );
}

#[test]
fn report_follows_paper_order() {
    let csv = write_temp(DATABASE, ".csv");
    let manuscript = write_temp(MANUSCRIPT, ".txt");
    let db = RetractionDatabase::open(csv.path()).unwrap();
    let paper = Paper::from_path(manuscript.path()).unwrap();

    let report = paper.report(&db);
    assert_eq!(report.len(), paper.len());
    for (result, reference) in report.iter().zip(paper.references()) {
        assert_eq!(result.reference(), reference);
    }

    let confidences: Vec<MatchConfidence> = report.iter().map(|r| r.confidence()).collect();
    assert_eq!(
        confidences,
        vec![
            MatchConfidence::ExactDoi,
            MatchConfidence::None,
            MatchConfidence::TitleMatch,
            MatchConfidence::TitleMatch,
        ]
    );

    let twin = &report.results()[2];
    assert!(twin.is_ambiguous());
    assert_eq!(twin.ambiguity().len(), 2);

    // title-only record (placeholder DOI)
    let fabricated = &report.results()[3];
    assert!(!fabricated.is_ambiguous());
    assert_eq!(fabricated.matched_record().unwrap().doi, None);

    let summary = report.summary();
    assert_eq!(summary.total, 4);
    assert_eq!(summary.zombies(), 3);
    assert_eq!(summary.ambiguous, 1);
    assert_eq!(summary.clean, 1);
}

#[test]
fn worked_examples() {
    let db = RetractionDatabase::load(
        "doi,title\n10.1/abc,On Zombies\n".as_bytes(),
    )
    .unwrap();

    let paper = Paper::from_references(vec![
        Reference::new("by DOI").with_doi("https://doi.org/10.1/ABC"),
        Reference::new("by title").with_title("on   zombies"),
        Reference::new("neither")
            .with_doi("10.9/unknown")
            .with_title("Something Else"),
    ])
    .unwrap();
    let report = paper.report(&db);

    let by_doi = &report.results()[0];
    assert_eq!(by_doi.confidence(), MatchConfidence::ExactDoi);
    assert_eq!(
        by_doi.matched_record().unwrap().doi.as_deref(),
        Some("10.1/abc")
    );

    let by_title = &report.results()[1];
    assert_eq!(by_title.confidence(), MatchConfidence::TitleMatch);
    assert!(by_title.ambiguity().is_empty());

    let neither = &report.results()[2];
    assert_eq!(neither.confidence(), MatchConfidence::None);
    assert!(neither.matched_record().is_none());
}

#[test]
fn missing_required_column_is_data_format_error() {
    let err = RetractionDatabase::load("OriginalPaperDOI,Journal\n10.1/a,Nature\n".as_bytes())
        .unwrap_err();
    assert!(matches!(err, zombie_core::Error::DataFormat(_)));
}

#[test]
fn shared_database_reports_concurrently() {
    let db = Arc::new(RetractionDatabase::load(DATABASE.as_bytes()).unwrap());
    let paper = Paper::from_text(MANUSCRIPT).unwrap();
    let expected: Vec<MatchConfidence> = paper.report(&db).iter().map(|r| r.confidence()).collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let db = Arc::clone(&db);
                let paper = &paper;
                scope.spawn(move || {
                    paper
                        .report(&db)
                        .iter()
                        .map(|r| r.confidence())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
