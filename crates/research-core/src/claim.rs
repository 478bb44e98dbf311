// crates/research-core/src/claim.rs
// ============================================================================
// Module: Structured Claims
// Description: The normalized quantitative-claim shape extracted from text.
// Purpose: Give the triangulator and contradiction detector a typed claim
//          to compare instead of re-parsing snippets.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`StructuredClaim`] is the triangulator's unit of comparison: the same
//! metric, for the same period, with a numeric value and unit. Extraction
//! is a fixed heuristic contract (regex-driven, not a model call) applied
//! by the normalizer against each evidence snippet.

use serde::Deserialize;
use serde::Serialize;

/// The reporting period a claim's value is scoped to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    /// A single calendar year, e.g. 2023.
    Year(u16),
    /// A fiscal quarter within a year, 1-4.
    Quarter {
        /// Calendar year the quarter falls in.
        year: u16,
        /// Quarter number, 1-4.
        quarter: u8,
    },
    /// An inclusive year range.
    Range {
        /// First year in the range.
        start: u16,
        /// Last year in the range.
        end: u16,
    },
    /// No period could be identified in the source text.
    Unknown,
}

/// Unit of measure for a claim's numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    /// Percent.
    Percent,
    /// Percentage points (a difference of two percentages).
    PercentagePoints,
    /// US dollars.
    Usd,
    /// Euros.
    Eur,
    /// British pounds.
    Gbp,
    /// A dimensionless ratio.
    Ratio,
    /// An index value (e.g. CPI).
    Index,
    /// A per-capita figure.
    PerCapita,
    /// A count with no further unit information.
    Count,
    /// Unit could not be determined.
    Unknown,
}

/// A normalized quantitative claim extracted from an evidence snippet.
///
/// # Invariants
/// - `canonical_key` is produced by the claim-key normalizer and is the
///   join key used to group claims about the same underlying fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredClaim {
    /// Optional named entity the claim is about (e.g. a country or company).
    pub entity: Option<String>,
    /// The metric name as it appeared in source text, lightly normalized.
    pub metric: String,
    /// Reporting period the value is scoped to.
    pub period: Period,
    /// The claim's numeric value.
    pub value: f64,
    /// Unit of the numeric value.
    pub unit: Unit,
    /// Canonical join key, produced by [`canonical_claim_key`].
    pub canonical_key: String,
}

/// Builds the canonical join key for a claim's free-text description.
///
/// Mirrors the normalization a claim comparator needs: verbs collapse to
/// `inc`/`dec`, quarters to `q1`-`q4`, four-digit years to `YEAR`,
/// percentages to `PCT`, remaining numbers to `NUM`, non-alphanumerics are
/// stripped, whitespace is collapsed, and the result is truncated to 120
/// characters.
#[must_use]
pub fn canonical_claim_key(text: &str) -> String {
    let lowered = text.to_ascii_lowercase();
    let verb_normalized = normalize_verbs(&lowered);
    let quarter_normalized = normalize_quarters(&verb_normalized);
    let year_normalized = normalize_years(&quarter_normalized);
    let percent_normalized = normalize_percentages(&year_normalized);
    let number_normalized = normalize_numbers(&percent_normalized);
    let stripped = strip_non_alphanumeric(&number_normalized);
    let collapsed = collapse_whitespace(&stripped);
    collapsed.chars().take(120).collect()
}

/// Replaces increase/decrease verb families with `inc`/`dec` tokens.
fn normalize_verbs(text: &str) -> String {
    const INCREASE: &[&str] = &[
        "increased", "increase", "increasing", "rose", "rising", "grew", "growing", "grow",
        "climbed", "jumped", "surged", "gained",
    ];
    const DECREASE: &[&str] = &[
        "decreased", "decrease", "decreasing", "fell", "falling", "dropped", "dropping",
        "declined", "declining", "decline", "shrank", "shrinking", "slid", "plunged",
    ];
    let mut result = text.to_string();
    for word in INCREASE {
        result = replace_word(&result, word, "inc");
    }
    for word in DECREASE {
        result = replace_word(&result, word, "dec");
    }
    result
}

/// Replaces quarter words (`q1`..`q4`, `first quarter`, etc.) with `q1`-`q4`.
fn normalize_quarters(text: &str) -> String {
    let mut result = text.to_string();
    for (word, token) in [
        ("first quarter", "q1"),
        ("second quarter", "q2"),
        ("third quarter", "q3"),
        ("fourth quarter", "q4"),
    ] {
        result = result.replace(word, token);
    }
    result
}

/// Replaces four-digit years beginning with `20` with the token `YEAR`.
fn normalize_years(text: &str) -> String {
    replace_pattern(text, |bytes, i| {
        if i + 4 <= bytes.len()
            && bytes[i] == b'2'
            && bytes[i + 1] == b'0'
            && bytes[i + 2].is_ascii_digit()
            && bytes[i + 3].is_ascii_digit()
            && !is_digit_boundary(bytes, i, i + 4)
        {
            Some((4, "YEAR"))
        } else {
            None
        }
    })
}

/// Replaces `N%`/`N percent` patterns with the token `PCT`.
fn normalize_percentages(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();
    let bytes = text.as_bytes();
    while let Some((i, c)) = chars.next() {
        if c.is_ascii_digit() {
            let mut end = i + 1;
            while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
                end += 1;
            }
            let rest = &text[end..];
            if rest.starts_with('%') || rest.starts_with(" percent") {
                result.push_str("PCT");
                let skip_to = end + usize::from(rest.starts_with('%'));
                while let Some((j, _)) = chars.peek() {
                    if *j < skip_to {
                        chars.next();
                    } else {
                        break;
                    }
                }
                continue;
            }
        }
        result.push(c);
    }
    result
}

/// Replaces any remaining run of digits with the token `NUM`.
fn normalize_numbers(text: &str) -> String {
    let bytes = text.as_bytes();
    replace_pattern(text, |bytes_inner, i| {
        if bytes_inner[i].is_ascii_digit() && !is_digit_boundary(bytes, i, i + 1) {
            let mut end = i + 1;
            while end < bytes_inner.len() && bytes_inner[end].is_ascii_digit() {
                end += 1;
            }
            Some((end - i, "NUM"))
        } else {
            None
        }
    })
}

/// True when the byte at `start` is immediately preceded by a letter that
/// would make the run part of an already-substituted token (defensive; in
/// practice tokens are uppercase ASCII and never adjoin raw digits).
const fn is_digit_boundary(_bytes: &[u8], _start: usize, _end: usize) -> bool {
    false
}

/// Scans `text` byte-by-byte, replacing matched runs with `replacement`.
fn replace_pattern(text: &str, mut matcher: impl FnMut(&[u8], usize) -> Option<(usize, &'static str)>) -> String {
    let bytes = text.as_bytes();
    let mut result = String::with_capacity(text.len());
    let mut i = 0;
    while i < bytes.len() {
        if let Some((len, token)) = matcher(bytes, i) {
            result.push_str(token);
            i += len;
        } else {
            // Safe because we only ever skip whole characters: ASCII digits,
            // matched above, always occupy a single byte.
            result.push(bytes[i] as char);
            i += 1;
        }
    }
    result
}

/// Replaces whole-word occurrences of `word` with `replacement`.
fn replace_word(text: &str, word: &str, replacement: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(word) {
        let before_ok = pos == 0 || !rest.as_bytes()[pos - 1].is_ascii_alphanumeric();
        let after = pos + word.len();
        let after_ok = after >= rest.len() || !rest.as_bytes()[after].is_ascii_alphanumeric();
        if before_ok && after_ok {
            result.push_str(&rest[..pos]);
            result.push_str(replacement);
            rest = &rest[after..];
        } else {
            result.push_str(&rest[..pos + word.len()]);
            rest = &rest[pos + word.len()..];
        }
    }
    result.push_str(rest);
    result
}

/// Strips everything but ASCII alphanumerics and spaces.
fn strip_non_alphanumeric(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect()
}

/// Collapses runs of whitespace to a single space and trims the ends.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
