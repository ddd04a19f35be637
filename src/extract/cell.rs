//! Spreadsheet cell normalization.
//!
//! A worksheet column holds one reference per cell, often typed by hand and
//! often converted by the spreadsheet: `10` comes back as the float `10.0`,
//! the column header reads "Exhibit", error values show up as `#N/A`. Cells
//! are cleaned up here before any pattern runs, and bare values ("155", "B",
//! "12A") are accepted as implicit exhibit identifiers.

use super::{ExhibitExtractor, Identifier, Span};
use crate::config::AnchorMode;
use serde::{Deserialize, Serialize};

/// Raw value of a spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// No value
    Empty,
    /// Numeric value as the spreadsheet reports it
    Number(f64),
    /// Text value
    Text(String),
}

impl CellValue {
    /// Text form used for matching, before normalization.
    pub fn raw_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
        }
    }
}

/// A cell value after clean-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedCell {
    /// Text patterns are matched against
    pub text: String,
    /// Text to show in the cell once linked (e.g. "10" rather than "10.0")
    pub display: String,
}

/// Placeholder and error values that never hold a reference.
const EMPTY_MARKERS: [&str; 6] = ["", "none", "null", "#n/a", "#value!", "#ref!"];

/// Header-like words rejected outright.
const HEADER_WORDS: [&str; 8] = [
    "exhibit",
    "exhibits",
    "ex",
    "number",
    "ref",
    "reference",
    "document",
    "file",
];

/// Longest alphanumeric bare value accepted as an identifier ("12A", "155B").
const MAX_BARE_ALNUM: usize = 5;

/// Clean up a cell value. Returns `None` for empty or error cells.
///
/// Integral floats are rendered as integers, both when the spreadsheet hands
/// back a number and when the text itself ends in `.0`.
pub fn normalize_cell(value: &CellValue) -> Option<NormalizedCell> {
    let text = match value {
        CellValue::Empty => return None,
        CellValue::Number(n) => integral_string(*n).unwrap_or_else(|| n.to_string()),
        CellValue::Text(s) => {
            let trimmed = s.trim();
            coerce_float_text(trimmed).unwrap_or_else(|| trimmed.to_string())
        },
    };

    if EMPTY_MARKERS.contains(&text.to_lowercase().as_str()) {
        return None;
    }

    Some(NormalizedCell {
        display: text.clone(),
        text,
    })
}

/// "10" for 10.0, None for 10.5 or non-finite values.
fn integral_string(n: f64) -> Option<String> {
    if n.is_finite() && n == n.trunc() && n.abs() < i64::MAX as f64 {
        Some(format!("{}", n as i64))
    } else {
        None
    }
}

/// "10" for "10.0" / "-3" for "-3.00"; None for anything else.
fn coerce_float_text(text: &str) -> Option<String> {
    let (whole, fraction) = text.split_once('.')?;
    let digits = whole.strip_prefix('-').unwrap_or(whole);
    if digits.is_empty()
        || !digits.chars().all(|c| c.is_ascii_digit())
        || fraction.is_empty()
        || !fraction.chars().all(|c| c == '0')
    {
        return None;
    }
    Some(whole.to_string())
}

/// Identify the exhibit a cell refers to.
///
/// Header words and over-long values are rejected first. Then the anchored
/// exhibit patterns run; failing those, a bare number, a single letter, or a
/// short alphanumeric value is taken as the identifier itself. The span always
/// covers the whole cell.
pub fn identify_exhibit_cell(cell: &NormalizedCell, max_len: usize) -> Option<Identifier> {
    let text = cell.text.as_str();
    if HEADER_WORDS.contains(&text.to_lowercase().as_str()) {
        log::debug!("Skipping header-like cell '{}'", text);
        return None;
    }
    if text.chars().count() > max_len {
        log::debug!("Skipping cell '{}': longer than {} characters", text, max_len);
        return None;
    }

    let whole = Span::new(0, text.chars().count());
    let extractor = ExhibitExtractor::new(AnchorMode::WordBoundary);
    if let Some(found) = extractor.identify(text) {
        return Some(Identifier::exhibit(&found.value, whole, text));
    }

    let bare = if text.chars().all(|c| c.is_ascii_digit()) {
        true
    } else if text.chars().count() == 1 {
        text.chars().all(|c| c.is_ascii_alphabetic())
    } else {
        text.chars().all(|c| c.is_ascii_alphanumeric()) && text.len() <= MAX_BARE_ALNUM
    };

    if bare && !text.is_empty() {
        Some(Identifier::exhibit(text, whole, text))
    } else {
        log::debug!("Cell '{}' does not look like an exhibit reference", text);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::IdentifierKind;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_float_number_coerced() {
        let cell = normalize_cell(&CellValue::Number(10.0)).unwrap();
        assert_eq!(cell.text, "10");
        assert_eq!(cell.display, "10");

        let cell = normalize_cell(&CellValue::Number(10.5)).unwrap();
        assert_eq!(cell.text, "10.5");
    }

    #[test]
    fn test_float_text_coerced() {
        assert_eq!(normalize_cell(&text(" 155.0 ")).unwrap().text, "155");
        assert_eq!(normalize_cell(&text("-3.00")).unwrap().text, "-3");
        assert_eq!(normalize_cell(&text("Ex. 5.0")).unwrap().text, "Ex. 5.0");
        assert_eq!(normalize_cell(&text("1.05")).unwrap().text, "1.05");
    }

    #[test]
    fn test_empty_and_error_values() {
        assert!(normalize_cell(&CellValue::Empty).is_none());
        assert!(normalize_cell(&text("   ")).is_none());
        assert!(normalize_cell(&text("#N/A")).is_none());
        assert!(normalize_cell(&text("None")).is_none());
        assert!(normalize_cell(&text("#REF!")).is_none());
    }

    #[test]
    fn test_header_words_rejected() {
        for word in ["Exhibit", "EXHIBITS", "Number", "ref"] {
            let cell = normalize_cell(&text(word)).unwrap();
            assert!(identify_exhibit_cell(&cell, 10).is_none(), "{}", word);
        }
    }

    #[test]
    fn test_length_cap() {
        let cell = normalize_cell(&text("Exhibit 100")).unwrap();
        assert!(identify_exhibit_cell(&cell, 10).is_none());
        assert!(identify_exhibit_cell(&cell, 20).is_some());
    }

    #[test]
    fn test_prefixed_reference() {
        let cell = normalize_cell(&text("Ex. 12")).unwrap();
        let id = identify_exhibit_cell(&cell, 10).unwrap();
        assert_eq!(id.value, "12");
        assert_eq!(id.span, Span::new(0, 6));
        assert_eq!(id.matched_text, "Ex. 12");
    }

    #[test]
    fn test_bare_values() {
        let number = identify_exhibit_cell(&normalize_cell(&CellValue::Number(155.0)).unwrap(), 10)
            .unwrap();
        assert_eq!(number.value, "155");
        assert_eq!(number.kind, IdentifierKind::ExhibitNumeric);

        let letter = identify_exhibit_cell(&normalize_cell(&text("b")).unwrap(), 10).unwrap();
        assert_eq!(letter.value, "B");
        assert_eq!(letter.kind, IdentifierKind::ExhibitAlpha);

        let alnum = identify_exhibit_cell(&normalize_cell(&text("12a")).unwrap(), 10).unwrap();
        assert_eq!(alnum.value, "12A");

        assert!(identify_exhibit_cell(&normalize_cell(&text("see memo")).unwrap(), 10).is_none());
        assert!(identify_exhibit_cell(&normalize_cell(&text("ABCDEF")).unwrap(), 10).is_none());
    }
}
