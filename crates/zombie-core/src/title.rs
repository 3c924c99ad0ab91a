//! Heuristic title extraction from a single flattened reference.
//!
//! Covers the common citation layouts only; anything unrecognized yields
//! `None` and the reference is matched by DOI alone.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

const MIN_TITLE_WORDS: usize = 2;

/// Abbreviations whose period never ends a sentence.
static ABBREVIATIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "vs", "eg", "ie", "cf", "fig", "eq", "sec", "ch", "no", "vol", "pp", "ed", "eds", "jr",
        "sr", "st", "dr",
    ]
    .into_iter()
    .collect()
});

/// Extract the title from a reference string.
///
/// Handles:
/// - IEEE/USENIX: Authors, "Title," in Venue, Year
/// - Harvard/APA: Authors (Year) Title. Journal
/// - ACM: Authors. Year. Title. In Venue
/// - Journal style: Authors. Title. Journal Name, Vol(Issue)
pub fn extract_title(ref_text: &str) -> Option<String> {
    let ref_text = ref_text.split_whitespace().collect::<Vec<_>>().join(" ");

    try_quoted_title(&ref_text)
        .or_else(|| try_after_year(&ref_text))
        .or_else(|| try_second_sentence(&ref_text))
        .map(|t| clean_title(&t))
        .filter(|t| t.split_whitespace().count() >= MIN_TITLE_WORDS)
}

fn clean_title(title: &str) -> String {
    static TRAILING_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s.,;:]+$").unwrap());
    TRAILING_PUNCT.replace(title.trim(), "").into_owned()
}

fn try_quoted_title(ref_text: &str) -> Option<String> {
    static QUOTE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
        vec![
            // Smart or straight double quotes
            Regex::new(r#"[\u{201c}"]([^\u{201c}\u{201d}"]+)[\u{201d}"]"#).unwrap(),
            // Smart single quotes (Harvard/APA style)
            Regex::new(r"\u{2018}([^\u{2018}\u{2019}]{10,})\u{2019}").unwrap(),
        ]
    });

    QUOTE_PATTERNS.iter().find_map(|re| {
        let quoted = re.captures(ref_text)?.get(1)?.as_str().trim();
        (quoted.split_whitespace().count() >= MIN_TITLE_WORDS).then(|| quoted.to_string())
    })
}

/// Title following a year: "Authors (2020). Title. Journal" or
/// "Authors. 2020. Title. In Venue".
fn try_after_year(ref_text: &str) -> Option<String> {
    static YEAR_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?:\((?:19|20)\d{2}[a-z]?\)|\.\s(?:19|20)\d{2}[a-z]?)[.,:]?\s+").unwrap()
    });
    static END_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"[.?!]\s+(?:[Ii]n:?\s|[A-Z]|https?://|doi:|10\.\d)|\.\s*$").unwrap()
    });

    let m = YEAR_RE.find(ref_text)?;
    // A year after the title belongs to the venue ("In Proc. of X. 2020.")
    if split_sentences(&ref_text[..m.start()]).len() > 1 {
        return None;
    }
    let after_year = &ref_text[m.end()..];
    let end = END_RE.find(after_year).map_or(after_year.len(), |e| {
        // keep a question/exclamation mark that ends the title
        match after_year.as_bytes()[e.start()] {
            b'?' | b'!' => e.start() + 1,
            _ => e.start(),
        }
    });
    let title = after_year[..end].trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// Fallback: the second sentence, skipping an author-looking or year-only one.
fn try_second_sentence(ref_text: &str) -> Option<String> {
    static YEAR_ONLY: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^\(?(?:19|20)\d{2}[a-z]?\)?$").unwrap());
    static VENUE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[Ii]n:?\s").unwrap());

    let sentences = split_sentences(ref_text);
    let mut candidates = sentences.iter().skip(1).map(|s| s.trim());
    let mut title = candidates.next()?;
    if YEAR_ONLY.is_match(title) || looks_like_authors(title) {
        title = candidates.next()?;
    }

    if VENUE_RE.is_match(title) {
        return None;
    }
    Some(title.to_string())
}

fn looks_like_authors(sentence: &str) -> bool {
    static CAP_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][a-z]+,?$").unwrap());
    let words: Vec<&str> = sentence.split_whitespace().collect();
    if words.is_empty() {
        return false;
    }
    let cap_words = words.iter().filter(|w| CAP_WORD.is_match(w)).count();
    let has_and = words.iter().any(|w| w.eq_ignore_ascii_case("and") || *w == "&");
    has_and && cap_words as f64 / words.len() as f64 > 0.6
}

/// Split on ". " but not after author initials ("J. Smith") or common
/// abbreviations ("vs. "). The initial closing a Vancouver author list
/// ("Smith J, Doe A. Title") does end a sentence.
fn split_sentences(text: &str) -> Vec<&str> {
    static PERIOD_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\s+").unwrap());

    let mut sentences = Vec::new();
    let mut start = 0;
    for m in PERIOD_SPACE.find_iter(text) {
        let before = &text[start..m.start()];
        let last_word = before.rsplit([' ', '-']).next().unwrap_or("");
        let is_initial = last_word.chars().count() == 1
            && last_word.chars().all(|c| c.is_uppercase());
        if (is_initial && !ends_vancouver_authors(before))
            || ABBREVIATIONS.contains(last_word.to_lowercase().as_str())
        {
            continue;
        }
        sentences.push(&text[start..m.start()]);
        start = m.end();
    }
    if start < text.len() {
        sentences.push(text[start..].trim_end_matches('.'));
    }
    sentences
}

/// "Smith J, Doe A": two or more comma-separated "Surname Initials" entries.
fn ends_vancouver_authors(text: &str) -> bool {
    static AUTHOR: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^\p{Lu}[\p{L}'-]+(?: \p{Lu}[\p{L}'-]+)* \p{Lu}{1,3}$").unwrap()
    });
    let entries: Vec<&str> = text.split(',').map(str::trim).collect();
    entries.len() >= 2 && entries.iter().all(|e| AUTHOR.is_match(e))
}
