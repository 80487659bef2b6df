//! Post-processing: light, deterministic cleanup of raw tesseract output.
//!
//! Tesseract ends every page with a form feed, may emit CRLF on Windows
//! builds, and pads lines with trailing spaces. None of that is content, so it
//! is removed here. Layout is not reconstructed: the text stays the single
//! plain string the engine produced.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules, in order:
/// 1. Normalise line endings (CRLF → LF)
/// 2. Drop form feeds
/// 3. Trim trailing whitespace per line
/// 4. Collapse 3+ consecutive blank lines down to 2
/// 5. Strip leading blank lines and end with exactly one newline
///
/// Empty recognition (a blank page) yields an empty string.
pub fn clean_ocr_text(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = s.replace('\u{000C}', "");
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    finish(&s)
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").to_string()
}

fn finish(input: &str) -> String {
    let trimmed = input.trim_start_matches('\n').trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}\n", trimmed)
    }
}
