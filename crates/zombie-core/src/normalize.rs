//! Pure string canonicalization for DOIs and titles.
//!
//! Both the database index and the query side run values through these
//! functions, so two spellings of the same identifier meet at one key.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Values the Retraction Watch export uses in place of a missing DOI.
const PLACEHOLDER_DOIS: &[&str] = &["unavailable", "n/a", "na", "none", "null", "-"];

/// Resolver URL or `doi:` label in front of the DOI proper.
static RESOLVER_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:(?:https?://)?(?:dx\.|www\.)?doi\.org/|doi:\s*)").unwrap()
});

/// Normalize a DOI for comparison.
///
/// Strips the resolver prefix (`https://doi.org/`, `http://dx.doi.org/`,
/// `doi:`), removes whitespace (PDF extraction often leaves a space after
/// the slash), trims trailing `.`/`/` and lower-cases. DOIs are
/// case-insensitive, so `"https://doi.org/10.1000/Abc"` and `"10.1000/abc"`
/// produce the same key.
///
/// Returns `None` for empty input and placeholder values such as
/// `"unavailable"`.
pub fn normalize_doi(raw: &str) -> Option<String> {
    let mut doi = raw.trim();
    // Some exports double up the prefix ("doi:https://doi.org/10...")
    while let Some(m) = RESOLVER_PREFIX_RE.find(doi) {
        doi = doi[m.end()..].trim_start();
    }

    let doi: String = doi
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .trim_matches(['.', '/'])
        .to_lowercase();

    if doi.is_empty() || PLACEHOLDER_DOIS.contains(&doi.as_str()) {
        return None;
    }
    Some(doi)
}

/// Patterns published by Crossref as covering the vast majority of DOIs.
/// See <https://www.crossref.org/blog/dois-and-matching-regular-expressions/>.
static CROSSREF_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)^10\.\d{4,9}/[-._;()/:a-z0-9]+$").unwrap(),
        Regex::new(r"(?i)^10\.1002/\S+$").unwrap(),
        Regex::new(r"(?i)^10\.\d{4}/\d+-\d+x?(\d+)\d+<[\d\w]+:[\d\w]*>\d+\.\d+\.\w+;\d$").unwrap(),
        Regex::new(r"(?i)^10\.1021/\w\w\d+$").unwrap(),
        Regex::new(r"(?i)^10\.1207/[\w\d]+&\d+_\d+$").unwrap(),
    ]
});

/// Whether a normalized DOI conforms to one of the Crossref DOI patterns.
///
/// Nonconforming DOIs are still indexed; this only feeds load diagnostics.
pub fn looks_like_crossref_doi(doi: &str) -> bool {
    CROSSREF_PATTERNS.iter().any(|re| re.is_match(doi))
}

/// Normalize a title for comparison.
///
/// Unescapes common HTML entities, decomposes Unicode (NFKD) and drops
/// combining marks, deletes apostrophes, turns all other punctuation into
/// spaces, lower-cases and collapses runs of whitespace. `"On  Zombies!"`
/// and `"on zombies"` produce the same key.
pub fn normalize_title(title: &str) -> String {
    let title = title
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'");

    let mut cleaned = String::with_capacity(title.len());
    for c in title.nfkd() {
        if is_combining_mark(c) || matches!(c, '\'' | '\u{2019}' | '\u{2018}' | '`') {
            continue;
        }
        if c.is_alphanumeric() {
            cleaned.extend(c.to_lowercase());
        } else {
            cleaned.push(' ');
        }
    }

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // DOI normalization
    // =========================================================================

    #[test]
    fn test_normalize_doi_resolver_prefixes() {
        let expected = Some("10.1000/abc".to_string());
        assert_eq!(normalize_doi("10.1000/abc"), expected);
        assert_eq!(normalize_doi("https://doi.org/10.1000/Abc"), expected);
        assert_eq!(normalize_doi("http://dx.doi.org/10.1000/ABC"), expected);
        assert_eq!(normalize_doi("https://www.doi.org/10.1000/abc"), expected);
        assert_eq!(normalize_doi("doi.org/10.1000/abc"), expected);
        assert_eq!(normalize_doi("doi:10.1000/abc"), expected);
        assert_eq!(normalize_doi("DOI: 10.1000/abc"), expected);
    }

    #[test]
    fn test_normalize_doi_whitespace_and_trailing_punctuation() {
        let expected = Some("10.1000/abc".to_string());
        assert_eq!(normalize_doi("  10.1000/abc\t"), expected);
        assert_eq!(normalize_doi("10.1000/abc."), expected);
        assert_eq!(normalize_doi("10.1000/abc/"), expected);
        assert_eq!(
            normalize_doi("10.1177/ 0020720920940575"),
            Some("10.1177/0020720920940575".into())
        );
    }

    #[test]
    fn test_normalize_doi_stacked_prefix() {
        assert_eq!(
            normalize_doi("doi:https://doi.org/10.1000/abc"),
            Some("10.1000/abc".into())
        );
    }

    #[test]
    fn test_normalize_doi_placeholders() {
        assert_eq!(normalize_doi(""), None);
        assert_eq!(normalize_doi("   "), None);
        assert_eq!(normalize_doi("unavailable"), None);
        assert_eq!(normalize_doi("Unavailable"), None);
        assert_eq!(normalize_doi("https://doi.org/"), None);
    }

    #[test]
    fn test_normalize_doi_keeps_parentheses() {
        assert_eq!(
            normalize_doi("10.1016/S0140-6736(20)32656-8"),
            Some("10.1016/s0140-6736(20)32656-8".into())
        );
    }

    #[test]
    fn test_crossref_patterns() {
        assert!(looks_like_crossref_doi("10.1016/s0140-6736(20)32656-8"));
        assert!(looks_like_crossref_doi("10.21105/joss.03440"));
        assert!(looks_like_crossref_doi("10.1002/(sici)1097-4636<1>3.0.co;2-x"));
        assert!(!looks_like_crossref_doi("10.1/abc"));
        assert!(!looks_like_crossref_doi("not a doi"));
    }

    // =========================================================================
    // Title normalization
    // =========================================================================

    #[test]
    fn test_normalize_title_basic() {
        assert_eq!(normalize_title("On Zombies"), "on zombies");
        assert_eq!(normalize_title("on   zombies"), "on zombies");
        assert_eq!(normalize_title("  On Zombies.  "), "on zombies");
    }

    #[test]
    fn test_normalize_title_punctuation() {
        assert_eq!(
            normalize_title("Zombies: A Survey, Part II!"),
            "zombies a survey part ii"
        );
        assert_eq!(normalize_title("State-of-the-art"), "state of the art");
        assert_eq!(normalize_title("Don't Panic"), "dont panic");
        assert_eq!(normalize_title("Don\u{2019}t Panic"), "dont panic");
    }

    #[test]
    fn test_normalize_title_html_entities() {
        assert_eq!(normalize_title("Cats &amp; Dogs"), "cats dogs");
    }

    #[test]
    fn test_normalize_title_unicode() {
        assert_eq!(normalize_title("Résumé of Zürich"), "resume of zurich");
        assert_eq!(normalize_title("ﬁnding"), "finding");
    }

    #[test]
    fn test_normalize_title_empty() {
        assert_eq!(normalize_title(""), "");
        assert_eq!(normalize_title("..."), "");
    }
}
