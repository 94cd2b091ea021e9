//! Splitting of an input line into the command name and its arguments.
//!
//! There is no quoting, escaping or substitution: a token is any maximal run of
//! characters outside the fixed delimiter set, and runs of delimiters collapse.

use regex::Regex;
use std::sync::OnceLock;

/// Characters that separate tokens: space, tab, newline, carriage return and bell.
pub const DELIMITERS: [char; 5] = [' ', '\t', '\n', '\r', '\x07'];

fn token_pattern() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| {
        // Must stay the complement of DELIMITERS.
        Regex::new(r"[^ \t\n\r\x07]+").expect("token pattern is a valid regex")
    })
}

/// Splits `line` into whitespace-delimited tokens.
///
/// The tokens borrow from `line`. A line made only of delimiters (or an empty
/// line) produces an empty vector, which the dispatcher treats as a no-op.
///
/// ```
/// use shh::lexer::split_into_tokens;
/// assert_eq!(split_into_tokens("  ls   -la  "), vec!["ls", "-la"]);
/// assert!(split_into_tokens(" \t\r\n").is_empty());
/// ```
pub fn split_into_tokens(line: &str) -> Vec<&str> {
    token_pattern()
        .find_iter(line)
        .map(|token| token.as_str())
        .collect()
}
