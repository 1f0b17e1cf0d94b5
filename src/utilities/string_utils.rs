//! String utility functions shared by the scorer, sampler and calibrator.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://[^\s]+").unwrap());
static MENTION_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\w+").unwrap());
static WORD_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z][A-Za-z']+").unwrap());

/// Estimated tokens per whitespace-separated word.
pub const TOKENS_PER_WORD: f64 = 1.3;

/// Collapse whitespace runs, trim and casefold.
///
/// Two units whose normalized content is equal are considered duplicates.
pub fn normalize_content(content: &str) -> String {
    WHITESPACE_RUN
        .replace_all(content.trim(), " ")
        .to_lowercase()
}

/// Rough token footprint of a piece of text.
pub fn estimate_tokens(content: &str) -> usize {
    let words = content.split_whitespace().count();
    (words as f64 * TOKENS_PER_WORD).ceil() as usize
}

/// Truncate to at most `max_chars` characters, appending an ellipsis when cut.
pub fn truncate_chars(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let mut out: String = content.chars().take(max_chars).collect();
    out.push('…');
    out
}

/// Fraction of characters covered by URLs.
pub fn url_fraction(content: &str) -> f64 {
    covered_fraction(content, &URL_PATTERN)
}

/// Fraction of characters covered by `@mentions`.
pub fn mention_fraction(content: &str) -> f64 {
    covered_fraction(content, &MENTION_PATTERN)
}

fn covered_fraction(content: &str, pattern: &Regex) -> f64 {
    let total = content.len();
    if total == 0 {
        return 0.0;
    }
    let covered: usize = pattern.find_iter(content).map(|m| m.len()).sum();
    covered as f64 / total as f64
}

/// Lowercased alphabetic words (length ≥ 2) in order of appearance.
pub fn words(content: &str) -> Vec<String> {
    WORD_PATTERN
        .find_iter(content)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_content() {
        assert_eq!(normalize_content("  Hello\t\nWORLD  "), "hello world");
        assert_eq!(normalize_content("a  b"), normalize_content("A B"));
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("one two three four five six seven eight nine ten"), 13);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc…");
    }

    #[test]
    fn test_url_and_mention_fraction() {
        assert!(url_fraction("https://example.com/a/very/long/path x") > 0.5);
        assert_eq!(url_fraction("no links here"), 0.0);
        assert!(mention_fraction("@alice @bob hi") > 0.4);
    }

    #[test]
    fn test_words() {
        assert_eq!(words("I'm SO happy, 42 times!"), vec!["i'm", "so", "happy", "times"]);
    }
}
