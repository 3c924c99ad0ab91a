use once_cell::sync::Lazy;
use regex::Regex;

/// Segmentation strategy identifier, reported for debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentationStrategy {
    /// LaTeX `\bibitem{key}` entries.
    Bibitem,
    /// IEEE-style `[1]`, `[2]`, ... markers.
    Bracketed,
    /// `1.`, `2.`, ... at line starts.
    Numbered,
    /// Entries separated by blank lines.
    BlankLine,
    /// One entry per non-empty line.
    LinePerEntry,
}

/// Locate the references section in the document text.
///
/// Uses the LAST "References"/"Bibliography"/"Works Cited"/"Literature
/// Cited" header (or `\begin{thebibliography}`) so that a table of contents
/// entry doesn't win, and cuts at the first Appendix/Acknowledgments marker
/// after it. Returns `None` when no header is present.
pub fn find_references_section(text: &str) -> Option<&str> {
    static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r"(?im)^[ \t]*(?:#+[ \t]*|\\section\*?\{)?(?:references|bibliography|works[ \t]+cited|literature[ \t]+cited|reference[ \t]+list)\}?[ \t]*:?[ \t]*$|\\begin\{thebibliography\}(?:\{[^}]*\})?",
        )
        .unwrap()
    });
    static END_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r"(?im)^[ \t]*(?:#+[ \t]*|\\section\*?\{)?(?:appendix\b|appendices\b|acknowledge?ments?\b|supplementary\b)|\\end\{thebibliography\}",
        )
        .unwrap()
    });

    let header = HEADER_RE.find_iter(text).last()?;
    let rest = &text[header.end()..];
    let end = END_RE.find(rest).map_or(rest.len(), |m| m.start());
    let section = &rest[..end];

    if section.trim().is_empty() {
        None
    } else {
        Some(section)
    }
}

/// Split a reference section into individual raw references.
///
/// Tries explicit markers first (`\bibitem`, `[n]`, `n.`), then blank-line
/// separation, then one reference per line. Entries without any
/// alphanumeric content are dropped.
pub fn segment_references(ref_text: &str) -> Vec<String> {
    segment_references_with_strategy(ref_text).1
}

/// Like [`segment_references`], also reporting which strategy was used.
pub fn segment_references_with_strategy(ref_text: &str) -> (SegmentationStrategy, Vec<String>) {
    let (strategy, raw) = if let Some(refs) = try_bibitem(ref_text) {
        (SegmentationStrategy::Bibitem, refs)
    } else if let Some(refs) = try_sequential_markers(ref_text, &BRACKETED_RE) {
        (SegmentationStrategy::Bracketed, refs)
    } else if let Some(refs) = try_sequential_markers(ref_text, &NUMBERED_RE) {
        (SegmentationStrategy::Numbered, refs)
    } else if let Some(refs) = try_blank_lines(ref_text) {
        (SegmentationStrategy::BlankLine, refs)
    } else {
        (
            SegmentationStrategy::LinePerEntry,
            ref_text.lines().map(str::to_string).collect(),
        )
    };

    let refs = raw
        .into_iter()
        .map(|r| r.trim().to_string())
        .filter(|r| r.chars().any(char::is_alphanumeric))
        .collect();
    (strategy, refs)
}

static BRACKETED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*\[(\d{1,4})\][ \t]*").unwrap());

static NUMBERED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*(\d{1,3})\.[ \t]+").unwrap());

fn try_bibitem(ref_text: &str) -> Option<Vec<String>> {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\\bibitem(?:\[[^\]]*\])?\{[^}]*\}").unwrap());
    static NEWBLOCK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\newblock\s*").unwrap());

    if !RE.is_match(ref_text) {
        return None;
    }
    Some(
        RE.split(ref_text)
            .skip(1)
            .map(|r| NEWBLOCK_RE.replace_all(r, "").into_owned())
            .collect(),
    )
}

/// Split on numbered markers, keeping only the ones that continue the
/// sequence 1, 2, 3, ... so that a stray "[12]" inside an entry (or a year
/// list) doesn't start a new reference.
fn try_sequential_markers(ref_text: &str, marker: &Regex) -> Option<Vec<String>> {
    let mut starts: Vec<(usize, usize)> = Vec::new(); // (marker start, content start)
    let mut expected = 1;

    for caps in marker.captures_iter(ref_text) {
        let n: usize = match caps[1].parse() {
            Ok(n) => n,
            Err(_) => continue,
        };
        if n == expected {
            let m = caps.get(0)?;
            starts.push((m.start(), m.end()));
            expected += 1;
        }
    }

    if starts.is_empty() {
        return None;
    }

    let refs = starts
        .iter()
        .enumerate()
        .map(|(i, &(_, content_start))| {
            let end = starts.get(i + 1).map_or(ref_text.len(), |&(next, _)| next);
            ref_text[content_start..end].to_string()
        })
        .collect();
    Some(refs)
}

fn try_blank_lines(ref_text: &str) -> Option<Vec<String>> {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n").unwrap());

    let chunks: Vec<String> = RE
        .split(ref_text.trim())
        .filter(|c| !c.trim().is_empty())
        .map(str::to_string)
        .collect();
    if chunks.len() >= 2 {
        Some(chunks)
    } else {
        None
    }
}

/// Collapse a raw reference into a single line, rejoining words hyphenated
/// across line breaks ("retrac-\ntion" → "retraction").
pub fn flatten_reference(raw: &str) -> String {
    static HYPHEN_BREAK_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"([a-z])-[ \t]*\n[ \t]*([a-z])").unwrap());

    let joined = HYPHEN_BREAK_RE.replace_all(raw, "$1$2");
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_section_uses_last_header() {
        let text = "Contents\nReferences\n\nIntro text.\n\nReferences\n[1] A. Author. Real one.\n";
        let section = find_references_section(text).unwrap();
        assert!(section.contains("Real one"));
        assert!(!section.contains("Intro text"));
    }

    #[test]
    fn test_find_section_stops_at_appendix() {
        let text = "Body\nBibliography\n[1] A. Author. Title.\nAppendix A\nProofs here.";
        let section = find_references_section(text).unwrap();
        assert!(section.contains("Title."));
        assert!(!section.contains("Proofs"));
    }

    #[test]
    fn test_find_section_markdown_and_latex_headers() {
        let md = "# Paper\n\n## References\n\n1. Foo. Bar baz.\n";
        assert!(find_references_section(md).unwrap().contains("Bar baz"));

        let tex = "\\begin{thebibliography}{9}\n\\bibitem{a} Foo. Bar.\n\\end{thebibliography}\nafter";
        let section = find_references_section(tex).unwrap();
        assert!(section.contains("\\bibitem{a}"));
        assert!(!section.contains("after"));
    }

    #[test]
    fn test_find_section_absent() {
        assert!(find_references_section("Just a paragraph mentioning references inline.").is_none());
    }

    #[test]
    fn test_segment_bracketed() {
        let text = "[1] A. Smith. First paper [3] cites.\n[2] B. Jones. Second\npaper continues.\n";
        let (strategy, refs) = segment_references_with_strategy(text);
        assert_eq!(strategy, SegmentationStrategy::Bracketed);
        assert_eq!(refs.len(), 2);
        assert!(refs[0].starts_with("A. Smith"));
        assert!(refs[1].contains("paper continues"));
    }

    #[test]
    fn test_segment_numbered() {
        let text = "1. Smith J. On zombies. 2020.\n2. Doe A. Undead data.\n   Nature 2021.\n";
        let (strategy, refs) = segment_references_with_strategy(text);
        assert_eq!(strategy, SegmentationStrategy::Numbered);
        assert_eq!(refs.len(), 2);
        assert!(refs[1].contains("Nature 2021"));
    }

    #[test]
    fn test_segment_bibitem() {
        let text = "\\bibitem{smith} J. Smith.\n\\newblock On zombies.\n\\bibitem[Doe]{doe} A. Doe. Undead.";
        let (strategy, refs) = segment_references_with_strategy(text);
        assert_eq!(strategy, SegmentationStrategy::Bibitem);
        assert_eq!(refs.len(), 2);
        assert!(!refs[0].contains("newblock"));
    }

    #[test]
    fn test_segment_blank_lines_then_lines() {
        let text = "Smith J. On zombies.\nNature.\n\nDoe A. Undead data.\n";
        let (strategy, refs) = segment_references_with_strategy(text);
        assert_eq!(strategy, SegmentationStrategy::BlankLine);
        assert_eq!(refs.len(), 2);

        let text = "Smith J. On zombies.\nDoe A. Undead data.\n\n";
        let (strategy, refs) = segment_references_with_strategy(text);
        assert_eq!(strategy, SegmentationStrategy::LinePerEntry);
        assert_eq!(refs.len(), 2);
    }

    #[test]
    fn test_segment_drops_empty_entries() {
        assert!(segment_references("  \n---\n\n").is_empty());
    }

    #[test]
    fn test_flatten_reference() {
        assert_eq!(
            flatten_reference("A. Smith. On retrac-\n  tion   of\npapers."),
            "A. Smith. On retraction of papers."
        );
    }
}
