//! Field extraction: unstructured document text to a structured [`Record`].
//!
//! Every extracted record has the same four columns, in this order:
//!
//! | Column | Rule | Sentinel |
//! |--------|------|----------|
//! | `name` | first two whitespace tokens, joined by one space | `Unknown` |
//! | `contact` | first `local@domain.tld` address | `Not found` |
//! | `keywords` | distinct alphabetic tokens of 4+ letters, sorted, `", "`-joined | empty |
//! | `summary` | first 500 characters, `...` appended when truncated | empty |
//!
//! Extraction is total. Empty input and undecodable bytes both produce the
//! sentinel record; nothing here returns an error or panics.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::Record;

pub const COLUMN_NAME: &str = "name";
pub const COLUMN_CONTACT: &str = "contact";
pub const COLUMN_KEYWORDS: &str = "keywords";
pub const COLUMN_SUMMARY: &str = "summary";

pub const UNKNOWN_NAME: &str = "Unknown";
pub const CONTACT_NOT_FOUND: &str = "Not found";

/// Characters kept in the summary before truncation.
pub const SUMMARY_CHARS: usize = 500;
const TRUNCATION_MARKER: &str = "...";

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}")
            .expect("email pattern is valid")
    })
}

fn word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Za-z]{4,}\b").expect("word pattern is valid"))
}

/// Columns of every record produced by [`extract`], in order.
pub fn extracted_columns() -> Vec<String> {
    [COLUMN_NAME, COLUMN_CONTACT, COLUMN_KEYWORDS, COLUMN_SUMMARY]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

/// The record returned when nothing can be extracted.
pub fn sentinel_record() -> Record {
    Record::new()
        .with(COLUMN_NAME, UNKNOWN_NAME)
        .with(COLUMN_CONTACT, CONTACT_NOT_FOUND)
        .with(COLUMN_KEYWORDS, "")
        .with(COLUMN_SUMMARY, "")
}

/// Extract the four standard fields from raw document text.
///
/// # Example
///
/// ```rust
/// use query_desk_core::extract::extract;
///
/// let r = extract("Jane Doe, reach me at jane.doe@example.com about Rust tooling");
/// assert_eq!(r.get("name"), Some("Jane Doe,"));
/// assert_eq!(r.get("contact"), Some("jane.doe@example.com"));
/// ```
pub fn extract(raw_text: &str) -> Record {
    if raw_text.is_empty() {
        return sentinel_record();
    }

    Record::new()
        .with(COLUMN_NAME, extract_name(raw_text))
        .with(COLUMN_CONTACT, extract_contact(raw_text))
        .with(COLUMN_KEYWORDS, extract_keywords(raw_text))
        .with(COLUMN_SUMMARY, summarize(raw_text))
}

/// Like [`extract`], but starting from bytes that should be UTF-8.
///
/// Malformed input yields the sentinel record.
pub fn extract_bytes(raw: &[u8]) -> Record {
    match std::str::from_utf8(raw) {
        Ok(text) => extract(text),
        Err(e) => {
            tracing::warn!(error = %e, "document text is not valid UTF-8; using sentinel record");
            sentinel_record()
        }
    }
}

fn extract_name(text: &str) -> String {
    let mut tokens = text.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(first), Some(second)) => format!("{} {}", first, second),
        _ => UNKNOWN_NAME.to_string(),
    }
}

fn extract_contact(text: &str) -> String {
    email_regex()
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| CONTACT_NOT_FOUND.to_string())
}

fn extract_keywords(text: &str) -> String {
    let words: BTreeSet<&str> = word_regex()
        .find_iter(text)
        .map(|m| m.as_str())
        .collect();
    words.into_iter().collect::<Vec<_>>().join(", ")
}

fn summarize(text: &str) -> String {
    match text.char_indices().nth(SUMMARY_CHARS) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}
