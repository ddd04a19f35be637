// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::enum_variant_names)]
#![allow(clippy::doc_overindented_list_items)]
#![allow(clippy::regex_creation_in_loops)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]
#![cfg_attr(test, allow(unused_variables))]

//! # Exhibit Anchor
//!
//! Finds exhibit and Bates citations in legal documents, resolves them to the
//! files they name, and turns each citation into a hyperlink while the
//! document is being edited.
//!
//! ## Core Features
//!
//! - **Citation extraction**: layered exhibit patterns (`Ex. 3A`, `Ex.3`, `Ex 3`, `Ex_3`,
//!   `Exhibit B`) and Bates stamps (`SMITH_0042`), with first-accepted-wins overlap handling
//! - **Target resolution**: ordered filename prefixes for exhibits; a page index for Bates
//!   productions (`SMITH_0075` → `SMITH_0051.pdf`, page 25)
//! - **Page automation**: a page-citation pattern derived from one worked example
//!   (`Ex. 5, Memo, at p. 25`) and checked against it before use
//! - **Drift-tolerant anchoring**: links are applied right to left; a span that moved is
//!   looked for nearby, and a host that cannot honor offsets is searched by content
//! - **Hosts**: Markdown documents (paragraphs, footnotes, endnotes) and worksheets
//!
//! ## Architecture
//!
//! ```text
//! regions ──► extract ──► resolve ──► annotate (reverse span order) ──► ScanReport ──► export
//!                ▲            ▲
//!          synthesis     BatesIndex / FolderListing
//! ```
//!
//! Configuration-time values ([`BatesIndex`], [`CitationPattern`], the folder
//! snapshot) are immutable and replaced wholesale when their inputs change.
//!
//! ## Quick Start
//!
//! ```ignore
//! use exhibit_anchor::{ExhibitLinker, LinkerConfig, TextDocument};
//!
//! # fn main() -> exhibit_anchor::Result<()> {
//! let mut doc = TextDocument::from_file("brief.md")?;
//!
//! let mut linker = ExhibitLinker::new(LinkerConfig::default().with_link_base("."));
//! linker.set_target_folder("exhibits")?;
//! linker.configure_page_automation("Ex. 5, Memo, at p. 25", 25)?;
//!
//! let report = linker.scan_in_session(&mut doc)?;
//! println!("{} links", report.total_annotated);
//! doc.write_to("brief.linked.md")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Ordered candidate evaluation
pub mod strategy;

// Citation extraction and page-citation synthesis
pub mod extract;
pub mod synthesis;

// Target resolution
pub mod resolve;

// Hyperlink anchoring
pub mod annotate;

// Scan orchestration
pub mod scan;

// Host settings and in-memory hosts
pub mod host;
pub mod session;

// Export and file maintenance
pub mod export;
pub mod rename;

// Re-exports
pub use annotate::{
    AnnotationReceipt, AnnotationSpan, Applicator, Hyperlink, MutableTextRegion, RegionKind,
    RetryPolicy,
};
pub use config::{AnchorMode, LinkMode, LinkStyle, LinkerConfig, Surface};
pub use error::{AnnotationError, Error, MutationError, Result, SynthesisError};
pub use export::{ExportSink, ManifestSink};
pub use extract::{BatesExtractor, ExhibitExtractor, Identifier, IdentifierKind, Span};
pub use host::{RegionSource, TextDocument, Worksheet};
pub use rename::{normalize_filename, rename_files_in_folder, RenameSummary};
pub use resolve::{BatesIndex, FileLister, FolderListing, TargetDescriptor, TargetResolver};
pub use scan::{ExhibitLinker, ScanReport};
pub use session::{HostOptions, HostSession, HostSettings};
pub use synthesis::{synthesize, CitationPattern, PageForm};

// Internal utilities
pub(crate) mod utils {
    //! Internal utility functions for the library.

    use crate::extract::Span;

    /// Maps byte offsets (as reported by `regex`) to character offsets of one
    /// text snapshot, and back.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let index = CharIndex::new("“Ex. 1”");
    /// assert_eq!(index.span_of(3, 8), Span::new(1, 6));
    /// assert_eq!(index.byte_of(6), 8);
    /// ```
    #[derive(Debug, Clone)]
    pub struct CharIndex {
        /// Byte offset of each character, plus the text length at the end
        starts: Vec<usize>,
    }

    impl CharIndex {
        /// Index `text`.
        pub fn new(text: &str) -> Self {
            let mut starts: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
            starts.push(text.len());
            Self { starts }
        }

        /// Number of characters.
        pub fn char_len(&self) -> usize {
            self.starts.len() - 1
        }

        /// Character offset of the character starting at or after `byte`.
        #[inline]
        pub fn char_at_byte(&self, byte: usize) -> usize {
            self.starts.partition_point(|&start| start < byte)
        }

        /// Byte offset of character `pos`, clamped to the text length.
        #[inline]
        pub fn byte_of(&self, pos: usize) -> usize {
            self.starts
                .get(pos)
                .copied()
                .unwrap_or_else(|| self.starts[self.starts.len() - 1])
        }

        /// Character span of the byte range `[start, end)`.
        pub fn span_of(&self, start: usize, end: usize) -> Span {
            Span::new(self.char_at_byte(start), self.char_at_byte(end))
        }
    }

}

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
