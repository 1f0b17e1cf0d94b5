//! Lenient conversion of model output into structured JSON.
//!
//! Responses from the reasoning capability frequently wrap their JSON in
//! prose or code fences, use typographic quotes, or leave trailing commas.
//! [`parse_lenient`] tries a strict parse first and then exactly one repaired
//! parse before giving up.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

static TRAILING_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*([}\]])").unwrap());

/// Error raised when the converter cannot recover structured data.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ConverterError {
    pub message: String,
}

impl ConverterError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Trim `text` to its outermost structural delimiters, normalize quote
/// characters and strip trailing separators.
///
/// Returns `None` when no object or array delimiters are present.
pub fn repair_json(text: &str) -> Option<String> {
    let start = text.find(['{', '['])?;
    let close = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(close)?;
    if end <= start {
        return None;
    }
    let mut fragment = text[start..=end]
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");
    if !fragment.contains('"') && fragment.contains('\'') {
        fragment = fragment.replace('\'', "\"");
    }
    Some(TRAILING_SEPARATOR.replace_all(&fragment, "$1").into_owned())
}

/// Parse `text` as JSON, attempting one repair pass on failure.
pub fn parse_lenient(text: &str) -> Result<Value, ConverterError> {
    if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
        return Ok(value);
    }
    let repaired =
        repair_json(text).ok_or_else(|| ConverterError::new("No JSON delimiters found in result"))?;
    serde_json::from_str::<Value>(&repaired)
        .map_err(|e| ConverterError::new(format!("JSON parse error after repair: {}", e)))
}
