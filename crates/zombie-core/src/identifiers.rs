use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::normalize::normalize_doi;

/// Bare DOI: `10.` + registrant + `/` + suffix up to whitespace or a closing delimiter.
static DOI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"10\.\d{4,9}/[^\s\]>}"',]+"#).unwrap());

/// DOI written as a resolver URL.
static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)https?://(?:dx\.)?doi\.org/(10\.\d{4,9}/[^\s\]>}"',]+)"#).unwrap()
});

/// Strip trailing sentence punctuation and unbalanced closing brackets.
///
/// `10.1016/0021-9681(87)90171-8` keeps its parentheses; `(10.1000/abc).`
/// loses the trailing `).`.
fn clean_doi(doi: &str) -> &str {
    let mut doi = doi.trim_end_matches(['.', ',', ';', ':']);

    for (open, close) in [('(', ')'), ('[', ']'), ('{', '}')] {
        while doi.ends_with(close) && doi.matches(close).count() > doi.matches(open).count() {
            doi = doi[..doi.len() - 1].trim_end_matches(['.', ',', ';', ':']);
        }
    }

    doi
}

/// Rejoin DOIs that were broken across lines by text extraction.
fn rejoin_split_dois(text: &str) -> String {
    // DOI ending with period + newline + digits: "10.1145/3372297.\n3417880"
    static FIX_PERIOD: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(10\.\d{4,9}/[^\s\]>,]+\.)[ \t]*\n\s*(\d{3,})").unwrap());
    // DOI ending with dash + newline + continuation: "10.1000/abc-\ndef"
    static FIX_DASH: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(10\.\d{4,9}/[^\s\]>,]+-)[ \t]*\n\s*(\S+)").unwrap());
    // Resolver URL ending with period + newline + digits
    static FIX_URL: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)(https?://(?:dx\.)?doi\.org/10\.\d{4,9}/[^\s\]>,]+\.)[ \t]*\n\s*(\d+)")
            .unwrap()
    });

    let text = FIX_PERIOD.replace_all(text, "$1$2");
    let text = FIX_DASH.replace_all(&text, "$1$2");
    FIX_URL.replace_all(&text, "$1$2").into_owned()
}

/// Extract the first DOI from reference text.
///
/// Handles formats like:
/// - `10.1234/example`
/// - `doi:10.1234/example`
/// - `https://doi.org/10.1234/example`
/// - `http://dx.doi.org/10.1234/example`
///
/// A resolver URL wins over a bare DOI appearing earlier in the text. The
/// DOI is returned as written (minus trailing punctuation); use
/// [`normalize_doi`] for comparison.
pub fn extract_doi(text: &str) -> Option<String> {
    let text = rejoin_split_dois(text);

    if let Some(caps) = URL_RE.captures(&text) {
        return Some(clean_doi(&caps[1]).to_string());
    }

    DOI_RE.find(&text).map(|m| clean_doi(m.as_str()).to_string())
}

/// Extract every distinct DOI in a text, in order of first appearance.
///
/// Duplicates are detected on the normalized form, so `10.1000/ABC` and
/// `https://doi.org/10.1000/abc` count once.
pub fn extract_dois(text: &str) -> Vec<String> {
    let text = rejoin_split_dois(text);
    let mut seen = HashSet::new();

    DOI_RE
        .find_iter(&text)
        .map(|m| clean_doi(m.as_str()))
        .filter(|doi| normalize_doi(doi).is_some_and(|key| seen.insert(key)))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_doi_bare() {
        assert_eq!(
            extract_doi("Smith. Zombies. Nature, 2020. 10.1038/nature12373"),
            Some("10.1038/nature12373".into())
        );
    }

    #[test]
    fn test_extract_doi_url_preferred() {
        let text = "see 10.9999/other and https://doi.org/10.1038/nature12373.";
        assert_eq!(extract_doi(text), Some("10.1038/nature12373".into()));
    }

    #[test]
    fn test_extract_doi_prefix_label() {
        assert_eq!(
            extract_doi("J. Doe, Title, doi:10.1145/3133956.3134042, 2017"),
            Some("10.1145/3133956.3134042".into())
        );
    }

    #[test]
    fn test_extract_doi_trailing_punctuation() {
        assert_eq!(
            extract_doi("(doi: 10.1000/xyz123)."),
            Some("10.1000/xyz123".into())
        );
    }

    #[test]
    fn test_extract_doi_balanced_parentheses() {
        assert_eq!(
            extract_doi("J Chronic Dis. 10.1016/0021-9681(87)90171-8"),
            Some("10.1016/0021-9681(87)90171-8".into())
        );
    }

    #[test]
    fn test_extract_doi_split_across_lines() {
        assert_eq!(
            extract_doi("https://doi.org/10.1145/3372297.\n3417880"),
            Some("10.1145/3372297.3417880".into())
        );
        assert_eq!(
            extract_doi("doi: 10.1000/abc-\ndef"),
            Some("10.1000/abc-def".into())
        );
    }

    #[test]
    fn test_extract_doi_none() {
        assert_eq!(extract_doi("No identifier here, 2021."), None);
        // registrant code too short
        assert_eq!(extract_doi("version 10.1/abc"), None);
    }

    #[test]
    fn test_extract_dois_all_distinct() {
        let text = "soadifja 10.21105/joss.03440 soiadjf\n\
                    again https://doi.org/10.21105/JOSS.03440 and 10.1016/S0140-6736(20)32656-8.";
        assert_eq!(
            extract_dois(text),
            vec![
                "10.21105/joss.03440".to_string(),
                "10.1016/S0140-6736(20)32656-8".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_dois_empty() {
        assert!(extract_dois("").is_empty());
    }
}
