//! Citation identifier extraction.
//!
//! Turns the text of one region into `(identifier, kind, span)` tuples by
//! running a fixed, ordered family of surface patterns over it:
//!
//! - Exhibit references: `Ex. 3A`, `Ex.3`, `Ex 3`, `Ex_3`, `Exhibit B`, ...
//! - Bates stamps: `{prefix}(\d+)`, e.g. `SMITH_0042`
//! - Page citations from a synthesized [`CitationPattern`] (`Ex. 5, Memo, at p. 25`)
//!
//! Patterns are tried in priority order over the whole text; a match whose span
//! overlaps an already accepted one is discarded (first accepted wins). Spans are
//! character offsets into the snapshot that produced them and are only valid
//! against that snapshot.
//!
//! [`CitationPattern`]: crate::synthesis::CitationPattern

pub mod cell;
pub mod patterns;

use crate::config::AnchorMode;
use crate::error::{Error, Result};
use crate::synthesis::CitationPattern;
use crate::utils::CharIndex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

pub use cell::{normalize_cell, CellValue, NormalizedCell};
pub use patterns::{bates_pattern, exhibit_patterns, ExhibitPattern};

/// Half-open character range `[start, end)` within a text snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    /// First character
    pub start: usize,
    /// One past the last character
    pub end: usize,
}

impl Span {
    /// Create a span. `end` is clamped to be at least `start`.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Number of characters covered.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True for an empty span.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True when the two spans share at least one character.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Span of the same length starting at `start`.
    pub fn moved_to(&self, start: usize) -> Span {
        Span::new(start, start + self.len())
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Identifier family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentifierKind {
    /// "Ex. 12", "Exhibit 3A"
    ExhibitNumeric,
    /// "Ex. B", "Exhibit C"
    ExhibitAlpha,
    /// "SMITH_0042"
    BatesNumber,
}

impl IdentifierKind {
    /// True for the two exhibit kinds.
    pub fn is_exhibit(self) -> bool {
        !matches!(self, IdentifierKind::BatesNumber)
    }
}

/// A normalized identifier found in a text snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    /// Normalized value: upper-cased exhibit id ("3A", "B") or Bates digits ("0042")
    pub value: String,
    /// Identifier family
    pub kind: IdentifierKind,
    /// Character span of the whole match
    pub span: Span,
    /// Text of the whole match as it appeared ("Ex. 3A")
    pub matched_text: String,
    /// Cited page, when found through a page-citation pattern
    pub page: Option<NonZeroU32>,
}

impl Identifier {
    /// Build an exhibit identifier; the kind follows from the first character.
    pub fn exhibit(raw: &str, span: Span, matched_text: impl Into<String>) -> Self {
        let value = raw.to_uppercase();
        let kind = if value.starts_with(|c: char| c.is_ascii_digit()) {
            IdentifierKind::ExhibitNumeric
        } else {
            IdentifierKind::ExhibitAlpha
        };
        Self {
            value,
            kind,
            span,
            matched_text: matched_text.into(),
            page: None,
        }
    }

    /// Build a Bates identifier from its digit string.
    pub fn bates(digits: &str, span: Span, matched_text: impl Into<String>) -> Self {
        Self {
            value: digits.to_string(),
            kind: IdentifierKind::BatesNumber,
            span,
            matched_text: matched_text.into(),
            page: None,
        }
    }

    /// Attach a cited page.
    pub fn with_page(mut self, page: NonZeroU32) -> Self {
        self.page = Some(page);
        self
    }

    /// Numeric value of a Bates identifier.
    pub fn bates_number(&self) -> Option<u64> {
        match self.kind {
            IdentifierKind::BatesNumber => self.value.parse().ok(),
            _ => None,
        }
    }
}

/// Collects identifiers, rejecting any whose span overlaps one already accepted.
#[derive(Debug, Default)]
struct Accepted {
    items: Vec<Identifier>,
}

impl Accepted {
    fn offer(&mut self, candidate: Identifier) -> bool {
        if self.items.iter().any(|a| a.span.overlaps(&candidate.span)) {
            log::trace!(
                "Discarding '{}' at {}: overlaps an accepted match",
                candidate.matched_text,
                candidate.span
            );
            return false;
        }
        self.items.push(candidate);
        true
    }

    fn into_sorted(mut self) -> Vec<Identifier> {
        self.items.sort_by_key(|i| i.span.start);
        self.items
    }
}

/// Extracts exhibit references ("Ex. 3A", "Exhibit B", ...).
#[derive(Debug, Clone, Copy)]
pub struct ExhibitExtractor {
    mode: AnchorMode,
}

impl ExhibitExtractor {
    /// Create an extractor using the given anchoring.
    pub fn new(mode: AnchorMode) -> Self {
        Self { mode }
    }

    /// Anchoring in use.
    pub fn anchor_mode(&self) -> AnchorMode {
        self.mode
    }

    /// Cheap test for text that cannot contain any exhibit reference.
    pub fn might_match(text: &str) -> bool {
        text.to_ascii_lowercase().contains("ex")
    }

    /// Extract all exhibit identifiers, sorted by position.
    pub fn extract(&self, text: &str) -> Vec<Identifier> {
        self.extract_with_citations(text, None)
    }

    /// Extract identifiers, giving matches of a page-citation pattern priority
    /// over the plain exhibit patterns.
    pub fn extract_with_citations(
        &self,
        text: &str,
        citations: Option<&CitationPattern>,
    ) -> Vec<Identifier> {
        if !Self::might_match(text) {
            return Vec::new();
        }

        let index = CharIndex::new(text);
        let mut accepted = Accepted::default();

        if let Some(pattern) = citations {
            for found in pattern.find_all(text) {
                let Some(page) = NonZeroU32::new(found.page) else {
                    log::debug!("Ignoring page citation '{}' with page 0", found.text);
                    continue;
                };
                let span = index.span_of(found.start, found.end);
                accepted.offer(Identifier::exhibit(&found.exhibit, span, found.text).with_page(page));
            }
        }

        for pattern in exhibit_patterns(self.mode) {
            for caps in pattern.regex.captures_iter(text) {
                let (Some(whole), Some(id)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                let span = index.span_of(whole.start(), whole.end());
                if accepted.offer(Identifier::exhibit(id.as_str(), span, whole.as_str())) {
                    log::trace!("{} matched '{}' at {}", pattern.name, whole.as_str(), span);
                }
            }
        }

        accepted.into_sorted()
    }

    /// Identify a single reference string: the first pattern (in priority order)
    /// that matches anywhere wins.
    pub fn identify(&self, reference: &str) -> Option<Identifier> {
        let index = CharIndex::new(reference);
        exhibit_patterns(self.mode).iter().find_map(|pattern| {
            let caps = pattern.regex.captures(reference)?;
            let whole = caps.get(0)?;
            let id = caps.get(1)?;
            Some(Identifier::exhibit(
                id.as_str(),
                index.span_of(whole.start(), whole.end()),
                whole.as_str(),
            ))
        })
    }
}

/// Extracts Bates stamps for one prefix.
#[derive(Debug, Clone)]
pub struct BatesExtractor {
    prefix: String,
    regex: Regex,
}

impl BatesExtractor {
    /// Create an extractor for `prefix` (e.g. "SMITH_").
    pub fn new(prefix: &str) -> Result<Self> {
        let prefix = prefix.trim();
        let regex = bates_pattern(prefix)
            .ok_or_else(|| Error::InvalidPattern(format!("Bates prefix '{}' is not usable", prefix)))?;
        Ok(Self {
            prefix: prefix.to_string(),
            regex,
        })
    }

    /// The configured prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Cheap test for text that cannot contain the prefix.
    pub fn might_match(&self, text: &str) -> bool {
        text.to_lowercase().contains(&self.prefix.to_lowercase())
    }

    /// Extract all Bates identifiers, sorted by position.
    pub fn extract(&self, text: &str) -> Vec<Identifier> {
        if !self.might_match(text) {
            return Vec::new();
        }

        let index = CharIndex::new(text);
        let mut accepted = Accepted::default();
        for caps in self.regex.captures_iter(text) {
            let (Some(whole), Some(digits)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let span = index.span_of(whole.start(), whole.end());
            accepted.offer(Identifier::bates(digits.as_str(), span, whole.as_str()));
        }
        accepted.into_sorted()
    }

    /// Identify a single reference string.
    pub fn identify(&self, reference: &str) -> Option<Identifier> {
        self.extract(reference).into_iter().next()
    }
}
