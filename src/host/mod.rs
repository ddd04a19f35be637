//! In-memory host documents.
//!
//! The engine only talks to [`MutableTextRegion`]s and [`HostSettings`]. The
//! hosts here implement both without an office application behind them:
//!
//! - [`TextDocument`]: a Markdown file split into body paragraphs, footnotes
//!   and endnotes; links are written as Markdown (or inline HTML for the black
//!   style)
//! - [`Worksheet`]: a grid of typed cells, one column of which is linked
//!
//! [`HostSettings`]: crate::session::HostSettings

pub mod text_document;
pub mod worksheet;

use crate::annotate::MutableTextRegion;

pub use text_document::{render_link, TextDocument, TextRegion};
pub use worksheet::{column_letter, SheetCell, Worksheet};

/// A document whose regions can be handed to a scan.
pub trait RegionSource {
    /// Every region of the document, in document order.
    fn regions_mut(&mut self) -> Vec<&mut dyn MutableTextRegion>;
}

/// Characters of `text` in `[start, end)`, or `None` when out of bounds.
pub(crate) fn char_slice(text: &str, start: usize, end: usize) -> Option<String> {
    if start > end {
        return None;
    }
    let slice: String = text.chars().skip(start).take(end - start).collect();
    (slice.chars().count() == end - start).then_some(slice)
}
