//! Anchoring hyperlinks in a live, mutable document.
//!
//! Spans are computed on a snapshot of a region's text, but the region keeps
//! changing as links are inserted. [`Applicator::apply`] reconciles the two
//! with a small state machine:
//!
//! ```text
//! Verify ──match──────────────────────────► Commit ──ok──► receipt
//!   │                                         ▲  │
//!   └─mismatch─► Re-localize ──found (±w)─────┘  └─offset rejected─► search by content ──ok──► receipt
//!                    │                                                  │
//!                    └─not found─► Abandon                              └─not found─► Abandon
//! ```
//!
//! Abandoning a citation is never fatal; the caller counts it as a skip.
//! Within one region, spans must be applied right to left: a commit only
//! shifts the text after it.

pub mod link;
pub mod retry;

use crate::config::LinkStyle;
use crate::error::{AnnotationError, MutationError, Result};
use crate::extract::{CellValue, Span};
use crate::resolve::TargetDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use link::{build_hyperlink, link_address, relative_path, screen_tip};
pub use retry::{retry_with_backoff, RetryPolicy};

/// Kind of text-bearing region, in scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegionKind {
    /// Main body paragraph
    Body,
    /// Footnote text
    Footnote,
    /// Endnote text
    Endnote,
    /// Worksheet cell (1-based row and column)
    Cell {
        /// Row number
        row: u32,
        /// Column number
        col: u32,
    },
}

impl RegionKind {
    /// Position in the scan order: body, footnotes, endnotes, cells.
    pub fn rank(self) -> u8 {
        match self {
            RegionKind::Body => 0,
            RegionKind::Footnote => 1,
            RegionKind::Endnote => 2,
            RegionKind::Cell { .. } => 3,
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionKind::Body => f.write_str("body"),
            RegionKind::Footnote => f.write_str("footnote"),
            RegionKind::Endnote => f.write_str("endnote"),
            RegionKind::Cell { row, col } => write!(f, "cell R{}C{}", row, col),
        }
    }
}

/// A hyperlink ready to be written into a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hyperlink {
    /// Resolved target
    pub target: TargetDescriptor,
    /// Address written into the link (relative path, `#page=N`)
    pub address: String,
    /// Text shown for the link
    pub display_text: String,
    /// Hover text
    pub screen_tip: String,
    /// Color and underline
    pub style: LinkStyle,
}

/// One region of a host document that can be read and annotated.
///
/// All offsets are character offsets into the region's current text.
pub trait MutableTextRegion {
    /// Human-readable name, e.g. "Paragraph 3" or "Footnote 2".
    fn label(&self) -> String;

    /// Region kind, used for scan ordering.
    fn kind(&self) -> RegionKind;

    /// Current text of the whole region.
    fn read_text(&self) -> Result<String>;

    /// Current text in `span`, or `None` when the span is out of bounds.
    fn read_span(&self, span: Span) -> Option<String>;

    /// Turn the text in `span` into `link`.
    fn mutate(&mut self, span: Span, link: &Hyperlink) -> std::result::Result<(), MutationError>;

    /// First case-insensitive occurrence of `needle` at or after `from`,
    /// searching this region only.
    fn find(&self, needle: &str, from: usize) -> Option<Span>;

    /// Typed value for spreadsheet cells; `None` for text regions.
    fn cell_value(&self) -> Option<CellValue> {
        None
    }
}

/// Working state of one citation being applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationSpan {
    /// Start recorded on the snapshot
    pub original_start: usize,
    /// End recorded on the snapshot
    pub original_end: usize,
    /// Text found at the span on the snapshot
    pub expected_text: String,
}

impl AnnotationSpan {
    /// Create a working span.
    pub fn new(span: Span, expected_text: impl Into<String>) -> Self {
        Self {
            original_start: span.start,
            original_end: span.end,
            expected_text: expected_text.into(),
        }
    }

    /// The recorded span.
    pub fn span(&self) -> Span {
        Span::new(self.original_start, self.original_end)
    }
}

/// Record of a committed link, handed to the export collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationReceipt {
    /// Label of the region the link was written in
    pub region: String,
    /// Linked text
    pub text: String,
    /// Resolved target
    pub target: TargetDescriptor,
    /// Address written into the link
    pub address: String,
    /// Span the link was finally written at
    pub span: Span,
}

/// States of [`Applicator::apply`].
#[derive(Debug)]
enum Stage {
    Verify(Span),
    Relocalize(Span),
    Commit(Span),
    Abandon(AnnotationError),
}

/// Applies one hyperlink at a time, tolerating offset drift.
///
/// Holds no state between calls.
#[derive(Debug, Clone)]
pub struct Applicator {
    window: usize,
    retry: RetryPolicy,
}

impl Default for Applicator {
    fn default() -> Self {
        Self::new(5, RetryPolicy::default())
    }
}

impl Applicator {
    /// Create an applicator searching `window` characters on each side of a
    /// drifted span.
    pub fn new(window: usize, retry: RetryPolicy) -> Self {
        Self { window, retry }
    }

    /// Re-localization window.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Write `link` over `span` in `region`.
    pub fn apply(
        &self,
        region: &mut dyn MutableTextRegion,
        span: &AnnotationSpan,
        link: &Hyperlink,
    ) -> std::result::Result<AnnotationReceipt, AnnotationError> {
        let expected = span.expected_text.as_str();
        let mut stage = Stage::Verify(span.span());

        loop {
            stage = match stage {
                Stage::Verify(at) => match region.read_span(at) {
                    Some(live) if live == expected => Stage::Commit(at),
                    live => {
                        log::debug!(
                            "{}: expected '{}' at {}, found {:?}",
                            region.label(),
                            expected,
                            at,
                            live
                        );
                        Stage::Relocalize(at)
                    },
                },

                Stage::Relocalize(at) => {
                    let found = retry_with_backoff(&self.retry, |_| {
                        let text = region.read_text().ok()?;
                        search_window(&text, expected, at, self.window)
                    });
                    match found {
                        Some(corrected) => {
                            log::debug!(
                                "{}: '{}' moved from {} to {}",
                                region.label(),
                                expected,
                                at,
                                corrected
                            );
                            Stage::Commit(corrected)
                        },
                        None => Stage::Abandon(AnnotationError::ReLocalizationFailed {
                            expected: expected.to_string(),
                            start: at.start,
                            end: at.end,
                        }),
                    }
                },

                Stage::Commit(at) => match region.mutate(at, link) {
                    Ok(()) => return Ok(self.receipt(region, link, at)),
                    Err(err) => {
                        log::debug!(
                            "{}: offset commit at {} rejected ({}), searching by content",
                            region.label(),
                            at,
                            err
                        );
                        match self.commit_by_search(region, expected, link, at, err) {
                            Ok(found) => return Ok(self.receipt(region, link, found)),
                            Err(abandon) => Stage::Abandon(abandon),
                        }
                    },
                },

                Stage::Abandon(err) => {
                    log::warn!("{}: skipping '{}': {}", region.label(), expected, err);
                    return Err(err);
                },
            };
        }
    }

    /// Locate `expected` by content, first near `at`, then from the start of
    /// the region, and write the link there.
    fn commit_by_search(
        &self,
        region: &mut dyn MutableTextRegion,
        expected: &str,
        link: &Hyperlink,
        at: Span,
        first_error: MutationError,
    ) -> std::result::Result<Span, AnnotationError> {
        let mut last_error = first_error.to_string();
        let window_start = at.start.saturating_sub(self.window);
        let key = expected.trim();

        for from in [window_start, 0] {
            let Some(found) = region.find(expected, from) else {
                continue;
            };
            let matches = region
                .read_span(found)
                .map(|live| chars_eq_ignore_case(live.trim(), key))
                .unwrap_or(false);
            if !matches {
                continue;
            }
            match region.mutate(found, link) {
                Ok(()) => {
                    log::debug!("{}: anchored '{}' at {} by search", region.label(), expected, found);
                    return Ok(found);
                },
                Err(err) => last_error = err.to_string(),
            }
        }

        Err(AnnotationError::MutationFailed {
            expected: expected.to_string(),
            reason: last_error,
        })
    }

    fn receipt(&self, region: &dyn MutableTextRegion, link: &Hyperlink, at: Span) -> AnnotationReceipt {
        AnnotationReceipt {
            region: region.label(),
            text: link.display_text.clone(),
            target: link.target.clone(),
            address: link.address.clone(),
            span: at,
        }
    }
}

/// Find `expected` (case-insensitive) within `window` characters of `at`,
/// preferring the occurrence closest to the recorded start.
pub fn search_window(text: &str, expected: &str, at: Span, window: usize) -> Option<Span> {
    let chars: Vec<char> = text.chars().collect();
    let needle: Vec<char> = expected.chars().collect();
    if needle.is_empty() || needle.len() > chars.len() {
        return None;
    }

    let lo = at.start.saturating_sub(window);
    let hi = (at.start + window).min(chars.len() - needle.len());
    if lo > hi {
        return None;
    }

    (lo..=hi)
        .filter(|&start| slice_eq_ignore_case(&chars[start..start + needle.len()], &needle))
        .min_by_key(|&start| start.abs_diff(at.start))
        .map(|start| Span::new(start, start + needle.len()))
}

fn slice_eq_ignore_case(a: &[char], b: &[char]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(x, y)| x == y || x.to_lowercase().eq(y.to_lowercase()))
}

/// Case-insensitive comparison character by character.
pub(crate) fn chars_eq_ignore_case(a: &str, b: &str) -> bool {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    slice_eq_ignore_case(&a, &b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// Plain-text region that wraps linked text in brackets.
    struct Plain {
        text: String,
        reject_offsets: bool,
    }

    impl Plain {
        fn new(text: &str) -> Self {
            Self {
                text: text.to_string(),
                reject_offsets: false,
            }
        }

        fn chars(&self) -> Vec<char> {
            self.text.chars().collect()
        }
    }

    impl MutableTextRegion for Plain {
        fn label(&self) -> String {
            "Paragraph 1".to_string()
        }

        fn kind(&self) -> RegionKind {
            RegionKind::Body
        }

        fn read_text(&self) -> Result<String> {
            Ok(self.text.clone())
        }

        fn read_span(&self, span: Span) -> Option<String> {
            let chars = self.chars();
            (span.end <= chars.len()).then(|| chars[span.start..span.end].iter().collect())
        }

        fn mutate(&mut self, span: Span, link: &Hyperlink) -> std::result::Result<(), MutationError> {
            if self.reject_offsets {
                self.reject_offsets = false;
                return Err(MutationError::OffsetUnreliable {
                    start: span.start,
                    end: span.end,
                });
            }
            let chars = self.chars();
            let before: String = chars[..span.start].iter().collect();
            let after: String = chars[span.end..].iter().collect();
            self.text = format!("{}[{}]{}", before, link.display_text, after);
            Ok(())
        }

        fn find(&self, needle: &str, from: usize) -> Option<Span> {
            let chars = self.chars();
            let n = needle.chars().count();
            (from..=chars.len().checked_sub(n)?).find_map(|start| {
                let window: String = chars[start..start + n].iter().collect();
                chars_eq_ignore_case(&window, needle).then(|| Span::new(start, start + n))
            })
        }
    }

    fn link(text: &str) -> Hyperlink {
        Hyperlink {
            target: TargetDescriptor::File {
                path: PathBuf::from("/ex/Ex. 3.pdf"),
            },
            address: "Ex. 3.pdf".to_string(),
            display_text: text.to_string(),
            screen_tip: "Link to Ex. 3.pdf".to_string(),
            style: LinkStyle::Standard,
        }
    }

    #[test]
    fn test_region_rank_order() {
        assert!(RegionKind::Body.rank() < RegionKind::Footnote.rank());
        assert!(RegionKind::Footnote.rank() < RegionKind::Endnote.rank());
        assert!(RegionKind::Endnote.rank() < RegionKind::Cell { row: 1, col: 1 }.rank());
    }

    #[test]
    fn test_verified_commit() {
        let mut region = Plain::new("See Ex. 3 here");
        let span = AnnotationSpan::new(Span::new(4, 9), "Ex. 3");
        let receipt = Applicator::default()
            .apply(&mut region, &span, &link("Ex. 3"))
            .unwrap();
        assert_eq!(region.text, "See [Ex. 3] here");
        assert_eq!(receipt.span, Span::new(4, 9));
        assert_eq!(receipt.region, "Paragraph 1");
    }

    #[test]
    fn test_relocalizes_small_drift() {
        let mut region = Plain::new("See also Ex. 3 here");
        let span = AnnotationSpan::new(Span::new(4, 9), "Ex. 3");
        let receipt = Applicator::default()
            .apply(&mut region, &span, &link("Ex. 3"))
            .unwrap();
        assert_eq!(receipt.span, Span::new(9, 14));
        assert_eq!(region.text, "See also [Ex. 3] here");
    }

    #[test]
    fn test_abandons_large_drift() {
        let mut region = Plain::new("A much longer preamble. See Ex. 3 here");
        let span = AnnotationSpan::new(Span::new(4, 9), "Ex. 3");
        let err = Applicator::default()
            .apply(&mut region, &span, &link("Ex. 3"))
            .unwrap_err();
        assert!(matches!(err, AnnotationError::ReLocalizationFailed { start: 4, end: 9, .. }));
        assert_eq!(region.text, "A much longer preamble. See Ex. 3 here");
    }

    #[test]
    fn test_falls_back_to_search() {
        let mut region = Plain::new("See Ex. 3 here");
        region.reject_offsets = true;
        let span = AnnotationSpan::new(Span::new(4, 9), "Ex. 3");
        let receipt = Applicator::default()
            .apply(&mut region, &span, &link("Ex. 3"))
            .unwrap();
        assert_eq!(receipt.span, Span::new(4, 9));
        assert_eq!(region.text, "See [Ex. 3] here");
    }

    #[test]
    fn test_search_window_prefers_nearest() {
        let text = "Ex. 3 Ex. 3";
        let found = search_window(text, "ex. 3", Span::new(5, 10), 5).unwrap();
        assert_eq!(found, Span::new(6, 11));
        assert!(search_window(text, "Ex. 4", Span::new(0, 5), 5).is_none());
        assert!(search_window("", "Ex. 3", Span::new(0, 5), 5).is_none());
    }
}
