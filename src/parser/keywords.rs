//! Keyword splitting
//!
//! Authors type keywords freely, so the raw field mixes separators. The raw
//! string is first split on `,` and `;` unless the separator sits inside a
//! bracketed group, then each piece is split again on the secondary
//! separators (` ·`, `-`, `–`, U+F0D7, `/ `).

use regex::Regex;
use std::sync::LazyLock;

static SECONDARY_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(" ·|-|–|\u{F0D7}|/ ").expect("secondary separator regex is valid")
});

const OPENERS: [char; 4] = ['{', '[', '(', '<'];
const CLOSERS: [char; 4] = [']', ')', '}', '>'];

/// A separator is nested when a closing bracket shows up before any opening one
fn is_nested(rest: &str) -> bool {
    for c in rest.chars() {
        if OPENERS.contains(&c) {
            return false;
        }
        if CLOSERS.contains(&c) {
            return true;
        }
    }
    false
}

/// Splits a raw keyword field into trimmed keywords
///
/// Empty input yields `[""]`, not `[]`. Callers that persist keywords skip
/// empty entries.
///
/// ```
/// use lingbuzz_sync::parser::split_keywords;
///
/// assert_eq!(split_keywords("a, (b, c), d"), vec!["a", "(b, c)", "d"]);
/// ```
pub fn split_keywords(input: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut start = 0;

    for (i, c) in input.char_indices() {
        if (c == ',' || c == ';') && !is_nested(&input[i + 1..]) {
            pieces.push(&input[start..i]);
            start = i + 1;
        }
    }
    pieces.push(&input[start..]);

    pieces
        .into_iter()
        .flat_map(|piece| SECONDARY_SEPARATORS.split(piece))
        .map(|keyword| keyword.trim().to_string())
        .collect()
}
