//! Redaction of direct identifiers.
//!
//! Every preview string leaving the engine passes through [`sanitize_text`]
//! before it reaches a caller. Four identifier classes are replaced with
//! fixed placeholder tokens: email addresses, NANP-style phone numbers,
//! SSN-like digit groups, and two-capitalized-word personal names.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:\+?1[-.\s]?)?(?:\(\d{3}\)|\d{3})[-.\s]?\d{3}[-.\s]?\d{4}\b").unwrap()
});

static SSN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap());

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][a-z]+\s[A-Z][a-z]+\b").unwrap());

/// Scrub direct identifiers from text before it is returned to a caller.
pub fn sanitize_text(text: &str) -> String {
    let sanitized = EMAIL_RE.replace_all(text, "<EMAIL>");
    let sanitized = PHONE_RE.replace_all(&sanitized, "<PHONE>");
    let sanitized = SSN_RE.replace_all(&sanitized, "<SSN>");
    NAME_RE.replace_all(&sanitized, "<NAME>").into_owned()
}

/// Truncate to at most `max_chars` characters, then redact.
///
/// Truncation happens first so the placeholder tokens themselves are never
/// cut in half.
pub fn sanitized_preview(text: &str, max_chars: usize) -> String {
    let prefix: String = text.chars().take(max_chars).collect();
    sanitize_text(&prefix)
}
