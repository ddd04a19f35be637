//! Static pattern tables for exhibit references.
//!
//! The table order is the priority order: when two patterns match overlapping
//! text, the one listed first wins.

use crate::config::AnchorMode;
use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

/// One entry of the exhibit pattern table.
#[derive(Debug)]
pub struct ExhibitPattern {
    /// Short stable name, used in logs
    pub name: &'static str,
    /// Compiled, case-insensitive regex with the identifier in group 1
    pub regex: Regex,
}

/// Sources in priority order: (name, pattern).
const EXHIBIT_SOURCES: [(&str, &str); 10] = [
    ("ex_period_numeric", r"Ex\.\s*(\d+[A-Z]?)"),
    ("ex_period_alpha", r"Ex\.\s*([A-Z])"),
    ("exhibit_numeric", r"Exhibit\s*(\d+[A-Z]?)"),
    ("exhibit_alpha", r"Exhibit\s*([A-Z])"),
    ("ex_period_tight_numeric", r"Ex\.(\d+[A-Z]?)"),
    ("ex_period_tight_alpha", r"Ex\.([A-Z])"),
    ("ex_space_numeric", r"Ex\s+(\d+[A-Z]?)"),
    ("ex_space_alpha", r"Ex\s+([A-Z])"),
    ("ex_underscore_numeric", r"Ex_(\d+[A-Z]?)"),
    ("ex_underscore_alpha", r"Ex_([A-Z])"),
];

fn build_table(anchored: bool) -> Vec<ExhibitPattern> {
    EXHIBIT_SOURCES
        .iter()
        .map(|(name, source)| {
            let source = if anchored {
                format!(r"\b{}\b", source)
            } else {
                (*source).to_string()
            };
            ExhibitPattern {
                name,
                regex: RegexBuilder::new(&source)
                    .case_insensitive(true)
                    .build()
                    .unwrap(),
            }
        })
        .collect()
}

lazy_static! {
    /// Legacy document patterns: matched as substrings, no boundary anchors
    static ref SUBSTRING_TABLE: Vec<ExhibitPattern> = build_table(false);

    /// Worksheet patterns: anchored on word boundaries
    static ref BOUNDARY_TABLE: Vec<ExhibitPattern> = build_table(true);

    /// Start of any exhibit reference ("Ex.", "Ex_", "Ex 5", "Exhibit")
    pub(crate) static ref EXHIBIT_START: Regex =
        Regex::new(r"(?i)\b(?:exhibit\b|ex[._]|ex\s+(?:\d|[a-z]\b))").unwrap();
}

/// The exhibit pattern table for an anchoring mode, in priority order.
pub fn exhibit_patterns(mode: AnchorMode) -> &'static [ExhibitPattern] {
    match mode {
        AnchorMode::Substring => &SUBSTRING_TABLE,
        AnchorMode::WordBoundary => &BOUNDARY_TABLE,
    }
}

/// Build the Bates pattern for a prefix: `{escaped_prefix}(\d+)`, case-insensitive.
pub fn bates_pattern(prefix: &str) -> Option<Regex> {
    if prefix.is_empty() {
        return None;
    }
    RegexBuilder::new(&format!(r"{}(\d+)", regex::escape(prefix)))
        .case_insensitive(true)
        .build()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_have_same_order() {
        let loose = exhibit_patterns(AnchorMode::Substring);
        let strict = exhibit_patterns(AnchorMode::WordBoundary);
        assert_eq!(loose.len(), 10);
        for (a, b) in loose.iter().zip(strict) {
            assert_eq!(a.name, b.name);
        }
    }

    #[test]
    fn test_substring_matches_inside_words() {
        let table = exhibit_patterns(AnchorMode::Substring);
        let space_numeric = &table[6];
        assert_eq!(space_numeric.name, "ex_space_numeric");
        assert!(space_numeric.regex.is_match("complex 5"));
    }

    #[test]
    fn test_boundary_rejects_inside_words() {
        let table = exhibit_patterns(AnchorMode::WordBoundary);
        assert!(!table[6].regex.is_match("complex 5"));
        assert!(table[6].regex.is_match("see Ex 5 here"));
    }

    #[test]
    fn test_exhibit_start() {
        assert!(EXHIBIT_START.is_match("and Ex. 7"));
        assert!(EXHIBIT_START.is_match("Exhibit B"));
        assert!(EXHIBIT_START.is_match("ex_4"));
        assert!(!EXHIBIT_START.is_match("Memo re next steps"));
        assert!(!EXHIBIT_START.is_match("an example"));
    }

    #[test]
    fn test_bates_pattern_escapes_prefix() {
        let regex = bates_pattern("A.B-").unwrap();
        assert!(regex.is_match("see a.b-0042"));
        assert!(!regex.is_match("see AxB-0042"));
        assert!(bates_pattern("").is_none());
    }
}
