//! Minimal RTF to plain text conversion.
//!
//! Enough of RTF 1.x to recover the body text of a manuscript: control words
//! and symbols are dropped, paragraph and line breaks become newlines,
//! `\'hh` and `\uN` escapes are decoded, and non-text destinations (font and
//! color tables, stylesheets, document info, pictures, `{\*...}` groups) are
//! skipped entirely.

use std::iter::Peekable;
use std::str::Chars;

/// Destinations whose content is never document text.
const SKIPPED_DESTINATIONS: &[&str] = &[
    "fonttbl",
    "colortbl",
    "stylesheet",
    "listtable",
    "listoverridetable",
    "revtbl",
    "rsidtbl",
    "info",
    "pict",
    "object",
    "generator",
    "xmlnstbl",
    "themedata",
    "colorschememapping",
    "datastore",
    "latentstyles",
    "header",
    "footer",
];

#[derive(Debug, Clone, Copy)]
struct GroupState {
    skip: bool,
    /// Fallback characters following a `\uN` escape (`\ucN`).
    uc: usize,
}

struct Converter {
    out: String,
    state: GroupState,
    stack: Vec<GroupState>,
    /// Fallback characters still to drop after the last `\uN`.
    pending_fallback: usize,
}

impl Converter {
    fn emit(&mut self, c: char) {
        if self.state.skip {
            return;
        }
        if self.pending_fallback > 0 {
            self.pending_fallback -= 1;
            return;
        }
        self.out.push(c);
    }

    fn emit_break(&mut self, c: char) {
        self.pending_fallback = 0;
        if !self.state.skip {
            self.out.push(c);
        }
    }

    fn control_word(&mut self, word: &str, param: Option<i32>) {
        match word {
            "par" | "line" | "sect" | "page" => self.emit_break('\n'),
            "tab" | "cell" => self.emit_break('\t'),
            "row" => self.emit_break('\n'),
            "emdash" => self.emit('\u{2014}'),
            "endash" => self.emit('\u{2013}'),
            "lquote" => self.emit('\u{2018}'),
            "rquote" => self.emit('\u{2019}'),
            "ldblquote" => self.emit('\u{201c}'),
            "rdblquote" => self.emit('\u{201d}'),
            "bullet" => self.emit('\u{2022}'),
            "uc" => self.state.uc = param.unwrap_or(1).max(0) as usize,
            "u" => {
                if let Some(n) = param {
                    // Negative values encode code points above 0x7fff.
                    let code = (if n < 0 { n + 65536 } else { n }) as u32;
                    if let Some(c) = char::from_u32(code) {
                        self.emit(c);
                    }
                    self.pending_fallback = self.state.uc;
                }
            }
            w if SKIPPED_DESTINATIONS.contains(&w) => self.state.skip = true,
            _ => {}
        }
    }
}

/// Convert an RTF document to plain text.
pub fn rtf_to_text(rtf: &str) -> String {
    let mut conv = Converter {
        out: String::with_capacity(rtf.len() / 2),
        state: GroupState { skip: false, uc: 1 },
        stack: Vec::new(),
        pending_fallback: 0,
    };
    let mut chars = rtf.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                conv.stack.push(conv.state);
                conv.pending_fallback = 0;
            }
            '}' => {
                if let Some(state) = conv.stack.pop() {
                    conv.state = state;
                }
                conv.pending_fallback = 0;
            }
            '\\' => control(&mut conv, &mut chars),
            '\r' | '\n' => {}
            _ => conv.emit(c),
        }
    }

    conv.out
}

fn control(conv: &mut Converter, chars: &mut Peekable<Chars<'_>>) {
    let Some(&next) = chars.peek() else {
        return;
    };

    match next {
        '\\' | '{' | '}' => {
            chars.next();
            conv.emit(next);
        }
        '\'' => {
            chars.next();
            let hex: String = chars.by_ref().take(2).collect();
            if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                // Latin-1; the 0x80..0x9f window of cp1252 is not remapped.
                conv.emit(char::from(byte));
            }
        }
        '*' => {
            chars.next();
            conv.state.skip = true;
        }
        '~' => {
            chars.next();
            conv.emit(' ');
        }
        '_' => {
            chars.next();
            conv.emit('-');
        }
        '\r' | '\n' => {
            chars.next();
            conv.emit_break('\n');
        }
        c if c.is_ascii_alphabetic() => {
            let mut word = String::new();
            while let Some(&c) = chars.peek()
                && c.is_ascii_alphabetic()
            {
                word.push(c);
                chars.next();
            }

            let mut digits = String::new();
            if chars.peek() == Some(&'-') {
                digits.push('-');
                chars.next();
            }
            while let Some(&c) = chars.peek()
                && c.is_ascii_digit()
            {
                digits.push(c);
                chars.next();
            }
            // A single space delimits the control word and is not text.
            if chars.peek() == Some(&' ') {
                chars.next();
            }

            conv.control_word(&word, digits.parse().ok());
        }
        _ => {
            // Other control symbols (\-, \|, \:) carry no text.
            chars.next();
        }
    }
}
