//! Scan orchestration.
//!
//! [`ExhibitLinker`] owns the configuration-time state (folder snapshot,
//! Bates index, synthesized page-citation pattern) and walks the regions of a
//! document: extract, resolve, then apply right to left within each region.
//!
//! Configuration-time values are immutable and shared through `Arc`; changing
//! the folder, the prefix or the exemplar builds a new value and rebinds it.
//! Per-citation and per-region failures are logged and counted as skips.

use crate::annotate::{
    build_hyperlink, AnnotationReceipt, AnnotationSpan, Applicator, MutableTextRegion, RegionKind,
};
use crate::config::{LinkMode, LinkerConfig};
use crate::error::{Error, Result, SynthesisError};
use crate::extract::cell::identify_exhibit_cell;
use crate::extract::{normalize_cell, BatesExtractor, CellValue, ExhibitExtractor, Identifier, Span};
use crate::host::RegionSource;
use crate::resolve::{BatesIndex, FileLister, FolderListing, FsLister, TargetDescriptor, TargetResolver};
use crate::session::{HostSession, HostSettings};
use crate::synthesis::{synthesize, CitationPattern};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Outcome of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Links written across all regions
    pub total_annotated: usize,
    /// Links written per region label, in visit order
    pub per_region_counts: IndexMap<String, usize>,
    /// One receipt per written link
    pub receipts: Vec<AnnotationReceipt>,
}

impl ScanReport {
    fn record_region(&mut self, label: String, receipts: Vec<AnnotationReceipt>) {
        self.total_annotated += receipts.len();
        *self.per_region_counts.entry(label).or_insert(0) += receipts.len();
        self.receipts.extend(receipts);
    }
}

/// Extraction strategy for the configured mode.
enum Extraction<'a> {
    Exhibit {
        extractor: ExhibitExtractor,
        citations: Option<&'a CitationPattern>,
    },
    Bates(BatesExtractor),
}

impl Extraction<'_> {
    fn extract(&self, text: &str) -> Vec<Identifier> {
        match self {
            Extraction::Exhibit {
                extractor,
                citations,
            } => extractor.extract_with_citations(text, *citations),
            Extraction::Bates(extractor) => extractor.extract(text),
        }
    }
}

/// A resolved citation waiting to be applied.
struct Pending {
    identifier: Identifier,
    target: TargetDescriptor,
    display: String,
}

/// The citation linking engine.
pub struct ExhibitLinker {
    config: LinkerConfig,
    lister: Box<dyn FileLister>,
    listing: Option<Arc<FolderListing>>,
    bates: Option<Arc<BatesIndex>>,
    citations: Option<Arc<CitationPattern>>,
}

impl Default for ExhibitLinker {
    fn default() -> Self {
        Self::new(LinkerConfig::default())
    }
}

impl ExhibitLinker {
    /// Create a linker listing folders on the local filesystem.
    pub fn new(config: LinkerConfig) -> Self {
        Self {
            config,
            lister: Box::new(FsLister),
            listing: None,
            bates: None,
            citations: None,
        }
    }

    /// Use another directory-listing collaborator.
    pub fn with_lister(mut self, lister: Box<dyn FileLister>) -> Self {
        self.lister = lister;
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &LinkerConfig {
        &self.config
    }

    /// Folder snapshot in use, if a folder is set.
    pub fn listing(&self) -> Option<&FolderListing> {
        self.listing.as_deref()
    }

    /// Bates index in use, if in Bates mode.
    pub fn bates_index(&self) -> Option<&BatesIndex> {
        self.bates.as_deref()
    }

    /// Installed page-citation pattern, if page automation is on.
    pub fn page_automation(&self) -> Option<&CitationPattern> {
        self.citations.as_deref()
    }

    /// Make link addresses relative to `dir` (normally the document's folder).
    pub fn set_link_base(&mut self, dir: impl Into<PathBuf>) {
        self.config.link_base = Some(dir.into());
    }

    /// Point the linker at the folder holding the exhibits.
    ///
    /// Takes a new snapshot of the folder; in Bates mode the index is rebuilt.
    pub fn set_target_folder(&mut self, folder: impl AsRef<Path>) -> Result<()> {
        let listing = FolderListing::read(self.lister.as_ref(), folder.as_ref())?;
        log::info!(
            "Target folder {} holds {} files",
            listing.folder().display(),
            listing.len()
        );

        if let LinkMode::Bates { prefix } = &self.config.mode {
            self.bates = Some(Arc::new(BatesIndex::build(prefix, &listing)?));
        }
        self.listing = Some(Arc::new(listing));
        Ok(())
    }

    /// Switch to Bates mode and build the index for `prefix` over `folder`.
    pub fn configure_bates(&mut self, prefix: &str, folder: impl AsRef<Path>) -> Result<()> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(Error::Config("Bates prefix must not be empty".to_string()));
        }
        let listing = FolderListing::read(self.lister.as_ref(), folder.as_ref())?;
        let index = BatesIndex::build(prefix, &listing)?;
        if index.is_empty() {
            log::warn!(
                "No files named '{}<number>.pdf' in {}",
                prefix,
                listing.folder().display()
            );
        }

        self.config.mode = LinkMode::Bates {
            prefix: prefix.to_string(),
        };
        self.bates = Some(Arc::new(index));
        self.listing = Some(Arc::new(listing));
        Ok(())
    }

    /// Switch back to exhibit mode, dropping any Bates index.
    pub fn configure_exhibit_mode(&mut self) {
        self.config.mode = LinkMode::Exhibit;
        self.bates = None;
    }

    /// Derive and install a page-citation pattern from one exemplar.
    ///
    /// On failure page automation is left off; a pattern from an earlier
    /// exemplar is discarded either way.
    pub fn configure_page_automation(
        &mut self,
        exemplar: &str,
        exemplar_page: u32,
    ) -> std::result::Result<(), SynthesisError> {
        self.citations = None;
        let pattern = synthesize(exemplar, exemplar_page)?;
        self.citations = Some(Arc::new(pattern));
        Ok(())
    }

    /// Turn page automation off.
    pub fn clear_page_automation(&mut self) {
        self.citations = None;
    }

    /// Scan `regions` and link every citation that resolves.
    ///
    /// Regions are visited body first, then footnotes, endnotes and cells,
    /// keeping the given order within each kind.
    pub fn scan(&self, regions: &mut [&mut dyn MutableTextRegion]) -> ScanReport {
        let mut report = ScanReport::default();

        let Some(listing) = self.listing.as_deref() else {
            log::warn!("No target folder set, nothing to link");
            return report;
        };
        let Some(extraction) = self.extraction() else {
            return report;
        };
        let mut resolver = TargetResolver::new(listing);
        if let Some(index) = self.bates.as_deref() {
            resolver = resolver.with_bates(index);
        }
        let applicator = Applicator::new(self.config.relocalize_window, self.config.retry.clone());

        let mut order: Vec<usize> = (0..regions.len()).collect();
        order.sort_by_key(|&i| regions[i].kind().rank());

        for i in order {
            let region = &mut *regions[i];
            let label = region.label();
            let receipts = match self.process_region(region, &extraction, &resolver, &applicator) {
                Ok(receipts) => receipts,
                Err(err) => {
                    log::warn!("{}: {}", label, err);
                    Vec::new()
                },
            };
            if !receipts.is_empty() {
                log::debug!("{}: {} link(s)", label, receipts.len());
            }
            report.record_region(label, receipts);
        }

        log::info!(
            "Linked {} citation(s) across {} region(s)",
            report.total_annotated,
            report.per_region_counts.len()
        );
        report
    }

    /// Scan a host document inside a [`HostSession`], restoring the host's
    /// settings afterwards.
    pub fn scan_in_session<H>(&self, host: &mut H) -> Result<ScanReport>
    where
        H: HostSettings + RegionSource,
    {
        let mut session = HostSession::acquire(host, &self.config)?;
        let mut regions = session.host_mut().regions_mut();
        Ok(self.scan(&mut regions))
    }

    fn extraction(&self) -> Option<Extraction<'_>> {
        match &self.config.mode {
            LinkMode::Exhibit => Some(Extraction::Exhibit {
                extractor: ExhibitExtractor::new(self.config.effective_anchor_mode()),
                citations: self.citations.as_deref(),
            }),
            LinkMode::Bates { prefix } => {
                if self.citations.is_some() {
                    log::debug!("Page automation applies to exhibit mode only");
                }
                match BatesExtractor::new(prefix) {
                    Ok(extractor) => Some(Extraction::Bates(extractor)),
                    Err(err) => {
                        log::error!("Cannot scan in Bates mode: {}", err);
                        None
                    },
                }
            },
        }
    }

    fn process_region(
        &self,
        region: &mut dyn MutableTextRegion,
        extraction: &Extraction<'_>,
        resolver: &TargetResolver<'_>,
        applicator: &Applicator,
    ) -> Result<Vec<AnnotationReceipt>> {
        let text = region.read_text()?;

        let found: Vec<(Identifier, String)> = match region.cell_value() {
            Some(value) => self
                .cell_identifier(region.kind(), &value, &text, extraction)
                .into_iter()
                .collect(),
            None => extraction
                .extract(&text)
                .into_iter()
                .map(|id| {
                    let display = id.matched_text.clone();
                    (id, display)
                })
                .collect(),
        };

        let mut pending = Vec::with_capacity(found.len());
        for (identifier, display) in found {
            let mut targets = resolver.resolve(&identifier).into_iter();
            let Some(target) = targets.next() else {
                log::debug!(
                    "{}: no file for '{}' ({})",
                    region.label(),
                    identifier.matched_text,
                    identifier.value
                );
                continue;
            };
            let others = targets.count();
            if others > 0 {
                log::debug!(
                    "{}: '{}' matches {} more file(s), linking {}",
                    region.label(),
                    identifier.matched_text,
                    others,
                    target
                );
            }
            pending.push(Pending {
                identifier,
                target,
                display,
            });
        }

        // Rightmost first, so earlier spans stay valid.
        let mut receipts = Vec::with_capacity(pending.len());
        for item in pending.into_iter().rev() {
            let link = build_hyperlink(
                item.target,
                &item.identifier,
                item.display,
                self.config.link_base.as_deref(),
                self.config.link_style,
            );
            let span = AnnotationSpan::new(item.identifier.span, item.identifier.matched_text.clone());
            if let Ok(receipt) = applicator.apply(region, &span, &link) {
                receipts.push(receipt);
            }
        }
        receipts.reverse();
        Ok(receipts)
    }

    /// Identifier held by a worksheet cell, with the text to display once linked.
    fn cell_identifier(
        &self,
        kind: RegionKind,
        value: &CellValue,
        raw: &str,
        extraction: &Extraction<'_>,
    ) -> Option<(Identifier, String)> {
        if let RegionKind::Cell { row: 1, .. } = kind {
            if self.config.skip_header_row {
                return None;
            }
        }

        let cell = normalize_cell(value)?;
        let mut identifier = match extraction {
            Extraction::Exhibit { .. } => identify_exhibit_cell(&cell, self.config.max_cell_len)?,
            Extraction::Bates(extractor) => extractor.identify(&cell.text)?,
        };

        // A cell is always linked as a whole.
        identifier.span = Span::new(0, raw.chars().count());
        identifier.matched_text = raw.to_string();
        Some((identifier, cell.display))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MutationError;
    use crate::annotate::Hyperlink;

    struct StaticLister(Vec<&'static str>);

    impl FileLister for StaticLister {
        fn list_files(&self, _folder: &Path) -> Result<Vec<String>> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    struct Unreadable;

    impl MutableTextRegion for Unreadable {
        fn label(&self) -> String {
            "Footnote 1".to_string()
        }
        fn kind(&self) -> RegionKind {
            RegionKind::Footnote
        }
        fn read_text(&self) -> Result<String> {
            Err(Error::RegionRead {
                region: self.label(),
                reason: "locked".to_string(),
            })
        }
        fn read_span(&self, _span: Span) -> Option<String> {
            None
        }
        fn mutate(&mut self, span: Span, _link: &Hyperlink) -> std::result::Result<(), MutationError> {
            Err(MutationError::OffsetUnreliable {
                start: span.start,
                end: span.end,
            })
        }
        fn find(&self, _needle: &str, _from: usize) -> Option<Span> {
            None
        }
    }

    fn linker(files: Vec<&'static str>) -> ExhibitLinker {
        let mut linker =
            ExhibitLinker::new(LinkerConfig::default()).with_lister(Box::new(StaticLister(files)));
        linker.set_target_folder("/ex").unwrap();
        linker
    }

    #[test]
    fn test_scan_without_folder_is_empty() {
        let linker = ExhibitLinker::default();
        let mut region = Unreadable;
        let report = linker.scan(&mut [&mut region]);
        assert_eq!(report, ScanReport::default());
    }

    #[test]
    fn test_unreadable_region_counts_zero() {
        let linker = linker(vec!["Ex. 1.pdf"]);
        let mut region = Unreadable;
        let report = linker.scan(&mut [&mut region]);
        assert_eq!(report.total_annotated, 0);
        assert_eq!(report.per_region_counts.get("Footnote 1"), Some(&0));
    }

    #[test]
    fn test_configure_bates() {
        let mut linker = ExhibitLinker::new(LinkerConfig::default())
            .with_lister(Box::new(StaticLister(vec!["SMITH_0001.pdf", "SMITH_0051.pdf"])));
        linker.configure_bates(" SMITH_ ", "/prod").unwrap();
        assert_eq!(linker.bates_index().unwrap().len(), 2);
        assert_eq!(
            linker.config().mode,
            LinkMode::Bates {
                prefix: "SMITH_".to_string()
            }
        );

        linker.configure_exhibit_mode();
        assert!(linker.bates_index().is_none());
        assert!(linker.configure_bates("", "/prod").is_err());
    }

    #[test]
    fn test_failed_synthesis_leaves_automation_off() {
        let mut linker = linker(vec![]);
        linker.configure_page_automation("Ex. 5, Memo, at p. 25", 25).unwrap();
        assert!(linker.page_automation().is_some());

        let err = linker.configure_page_automation("Memo, at p. 25", 25).unwrap_err();
        assert_eq!(err, SynthesisError::NoExhibitFound);
        assert!(linker.page_automation().is_none());
    }
}
