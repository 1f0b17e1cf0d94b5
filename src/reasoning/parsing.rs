//! Parsing of batched rating responses with per-item recovery.
//!
//! Parsing happens in two stages. A response is first split into one
//! segment per expected item. Every segmenter (JSON, numbered lines, letter
//! tokens, plain lines) is tried and the split that recovers the most answers
//! wins, earlier segmenters winning ties. Each segment is then resolved by an
//! ordered chain of pure recovery strategies. When every strategy fails, the
//! answer defaults to the neutral midpoint and is flagged low-confidence.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utilities::converter::parse_lenient;

/// Answer letters in descending agreement: `A` = very accurate (5) through
/// `E` = very inaccurate (1).
pub const LIKERT_LETTERS: [char; 5] = ['A', 'B', 'C', 'D', 'E'];
/// Ordinal value of the neutral answer `C`.
pub const NEUTRAL_VALUE: u8 = 3;

static LEADING_LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[\s"'*(\[]*([A-E])(?:\s*$|\s*[.)\]\-:=,])"#).unwrap());
static LEADING_DIGIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[\s"'*(\[]*([1-5])\b"#).unwrap());
static NUMBERED_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(?:Q|Item\s*)?(\d{1,3})\s*[.):\-]\s*(.*?)\s*$").unwrap());
static LETTER_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([A-E])\b").unwrap());
static KEYWORDS: Lazy<Vec<(Regex, u8)>> = Lazy::new(|| {
    [
        (r"\bneither\b|\bneutral\b|\bunsure\b", 3),
        (r"\bvery\s+inaccurate\b|\bstrongly\s+disagree\b", 1),
        (r"\bvery\s+accurate\b|\bstrongly\s+agree\b", 5),
        (r"\binaccurate\b|\bdisagree\b", 2),
        (r"\baccurate\b|\bagree\b", 4),
    ]
    .into_iter()
    .map(|(pattern, value)| (Regex::new(&format!("(?i){}", pattern)).unwrap(), value))
    .collect()
});

/// Which strategy produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    /// Primary pattern: an answer letter.
    Letter,
    /// An ordinal digit `1`-`5`.
    Digit,
    /// A rating keyword such as "very accurate".
    Keyword,
    /// Nothing recoverable; neutral midpoint substituted.
    NeutralDefault,
}

/// One resolved item answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredAnswer {
    /// Ordinal value in `1..=5`, before any reverse scoring.
    pub value: u8,
    pub source: AnswerSource,
    /// The response segment the value was read from.
    pub raw: Option<String>,
}

impl StructuredAnswer {
    pub fn neutral(raw: Option<String>) -> Self {
        Self {
            value: NEUTRAL_VALUE,
            source: AnswerSource::NeutralDefault,
            raw,
        }
    }

    pub fn low_confidence(&self) -> bool {
        self.source == AnswerSource::NeutralDefault
    }
}

/// Ordinal value of an answer letter.
pub fn letter_value(letter: char) -> Option<u8> {
    LIKERT_LETTERS
        .iter()
        .position(|l| *l == letter.to_ascii_uppercase())
        .map(|i| 5 - i as u8)
}

// ============================================================================
// Recovery strategies
// ============================================================================

pub type Strategy = fn(&str) -> Option<u8>;

/// Strategies tried in order on each segment.
pub const RECOVERY_CHAIN: [(AnswerSource, Strategy); 3] = [
    (AnswerSource::Letter, letter_answer),
    (AnswerSource::Digit, digit_answer),
    (AnswerSource::Keyword, keyword_answer),
];

/// An uppercase answer letter at the start of the segment followed by a
/// delimiter (`A.`, `B)`, `C - Neither`), or a segment that is a single
/// letter in either case. A word starting with a letter ("A lot") is not an
/// answer.
pub fn letter_answer(segment: &str) -> Option<u8> {
    let trimmed = segment.trim().trim_matches(|c: char| !c.is_alphanumeric());
    let mut chars = trimmed.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return letter_value(c);
    }
    LEADING_LETTER
        .captures(segment)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().chars().next())
        .and_then(letter_value)
}

/// A leading digit read directly as the ordinal value.
pub fn digit_answer(segment: &str) -> Option<u8> {
    LEADING_DIGIT
        .captures(segment)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// The first rating keyword in the fixed keyword map.
pub fn keyword_answer(segment: &str) -> Option<u8> {
    KEYWORDS
        .iter()
        .find(|(re, _)| re.is_match(segment))
        .map(|(_, value)| *value)
}

/// Run the recovery chain over one segment.
pub fn resolve(segment: Option<&str>) -> StructuredAnswer {
    let Some(segment) = segment else {
        return StructuredAnswer::neutral(None);
    };
    RECOVERY_CHAIN
        .iter()
        .find_map(|(source, strategy)| {
            strategy(segment).map(|value| StructuredAnswer {
                value,
                source: *source,
                raw: Some(segment.to_string()),
            })
        })
        .unwrap_or_else(|| StructuredAnswer::neutral(Some(segment.to_string())))
}

// ============================================================================
// Segmentation
// ============================================================================

type Segmenter = fn(&str, usize) -> Option<Vec<Option<String>>>;

const SEGMENTERS: [Segmenter; 4] = [json_segments, numbered_segments, letter_segments, line_segments];

/// Split `text` into exactly `expected` segments; positions without an answer
/// are `None`. Surplus answers are dropped.
pub fn segment_response(text: &str, expected: usize) -> Vec<Option<String>> {
    let mut best: Option<(usize, Vec<Option<String>>)> = None;
    for segmenter in SEGMENTERS {
        let Some(candidate) = segmenter(text, expected) else {
            continue;
        };
        let recovered = recovered_count(&candidate, expected);
        if best.as_ref().map_or(true, |(n, _)| recovered > *n) {
            best = Some((recovered, candidate));
        }
    }
    let mut segments = best.map(|(_, segments)| segments).unwrap_or_default();
    if segments.len() > expected {
        log::debug!(
            "response carried {} answers for {} items, ignoring the surplus",
            segments.len(),
            expected
        );
    }
    segments.resize(expected, None);
    segments
}

/// Segments among the first `expected` that some recovery strategy resolves.
fn recovered_count(segments: &[Option<String>], expected: usize) -> usize {
    segments
        .iter()
        .take(expected)
        .flatten()
        .filter(|s| RECOVERY_CHAIN.iter().any(|(_, strategy)| strategy(s.as_str()).is_some()))
        .count()
}

/// Segment and resolve a whole response.
pub fn parse_answers(text: &str, expected: usize) -> Vec<StructuredAnswer> {
    segment_response(text, expected)
        .iter()
        .map(|s| resolve(s.as_deref()))
        .collect()
}

fn json_segments(text: &str, expected: usize) -> Option<Vec<Option<String>>> {
    if !text.contains('[') && !text.contains('{') {
        return None;
    }
    let value = parse_lenient(text).ok()?;
    let segments = json_value_segments(&value, expected)?;
    segments.iter().any(Option::is_some).then_some(segments)
}

/// Keyed objects are placed by item number; keys outside `1..=expected`
/// are ignored.
fn json_value_segments(value: &Value, expected: usize) -> Option<Vec<Option<String>>> {
    match value {
        Value::Array(items) => Some(items.iter().map(json_scalar).collect()),
        Value::Object(map) => {
            for key in ["answers", "responses", "ratings"] {
                if let Some(inner) = map.get(key) {
                    return json_value_segments(inner, expected);
                }
            }
            let mut indexed: Vec<(usize, Option<String>)> = map
                .iter()
                .filter_map(|(k, v)| {
                    let digits: String = k.chars().filter(char::is_ascii_digit).collect();
                    let n: usize = digits.parse().ok()?;
                    (1..=expected).contains(&n).then(|| (n, json_scalar(v)))
                })
                .collect();
            if indexed.is_empty() {
                return None;
            }
            let mut out = vec![None; expected];
            for (n, seg) in indexed {
                if out[n - 1].is_none() {
                    out[n - 1] = seg;
                }
            }
            Some(out)
        }
        _ => None,
    }
}

fn json_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => ["answer", "rating", "response", "value"]
            .iter()
            .find_map(|k| map.get(*k))
            .and_then(json_scalar),
        _ => None,
    }
}

fn numbered_segments(text: &str, expected: usize) -> Option<Vec<Option<String>>> {
    let mut out = vec![None; expected];
    let mut found = false;
    for caps in NUMBERED_LINE.captures_iter(text) {
        let n: usize = match caps.get(1).and_then(|m| m.as_str().parse().ok()) {
            Some(n) if n >= 1 && n <= expected => n,
            _ => continue,
        };
        let body = caps.get(2).map_or("", |m| m.as_str());
        if out[n - 1].is_none() && !body.is_empty() {
            out[n - 1] = Some(body.to_string());
            found = true;
        }
    }
    found.then_some(out)
}

fn letter_segments(text: &str, _expected: usize) -> Option<Vec<Option<String>>> {
    let tokens: Vec<&str> = text
        .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .collect();
    let all_single = !tokens.is_empty()
        && tokens
            .iter()
            .all(|t| t.chars().count() == 1 && t.chars().all(|c| letter_value(c).is_some()));
    if all_single {
        return Some(tokens.iter().map(|t| Some(t.to_string())).collect());
    }
    let letters: Vec<Option<String>> = LETTER_TOKEN
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| Some(m.as_str().to_string())))
        .collect();
    (!letters.is_empty()).then_some(letters)
}

fn line_segments(text: &str, _expected: usize) -> Option<Vec<Option<String>>> {
    let lines: Vec<Option<String>> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| Some(l.to_string()))
        .collect();
    (!lines.is_empty()).then_some(lines)
}
