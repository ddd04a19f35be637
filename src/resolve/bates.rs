//! Bates page index.
//!
//! A Bates-stamped production is a folder of PDFs named after the stamp of
//! their first page (`SMITH_0001.pdf`, `SMITH_0051.pdf`, ...). Each file covers
//! the pages from its own start up to the next file's start, so a stamp is
//! resolved by taking the file with the greatest start not above it.
//!
//! The index is built once per (folder, prefix) pair and never mutated; a new
//! folder or prefix produces a new index.

use super::listing::FolderListing;
use crate::error::{Error, Result};
use regex::RegexBuilder;
use serde::Serialize;
use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::path::PathBuf;

/// One file of a Bates production.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatesEntry {
    /// Stamp of the file's first page
    pub start: u64,
    /// File name
    pub filename: String,
    /// Full path
    pub path: PathBuf,
}

/// Immutable map from first-page stamp to file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatesIndex {
    prefix: String,
    entries: BTreeMap<u64, BatesEntry>,
}

impl BatesIndex {
    /// Build the index from the files named `{prefix}{digits}.pdf` (case-insensitive).
    ///
    /// When two files share a start number, the first in name order is kept.
    pub fn build(prefix: &str, listing: &FolderListing) -> Result<Self> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(Error::Config("Bates prefix must not be empty".to_string()));
        }

        let file_pattern = RegexBuilder::new(&format!(r"^{}(\d+)\.pdf$", regex::escape(prefix)))
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::InvalidPattern(e.to_string()))?;

        let mut entries: BTreeMap<u64, BatesEntry> = BTreeMap::new();
        for filename in listing.filenames() {
            let Some(caps) = file_pattern.captures(filename) else {
                continue;
            };
            let Some(start) = caps.get(1).and_then(|m| m.as_str().parse::<u64>().ok()) else {
                log::warn!("Bates number in '{}' is out of range, skipping", filename);
                continue;
            };
            if let Some(existing) = entries.get(&start) {
                log::warn!(
                    "'{}' and '{}' both start at Bates {}; keeping '{}'",
                    existing.filename,
                    filename,
                    start,
                    existing.filename
                );
                continue;
            }
            entries.insert(
                start,
                BatesEntry {
                    start,
                    filename: filename.clone(),
                    path: listing.path_of(filename),
                },
            );
        }

        log::info!("Built Bates index for prefix '{}': {} files", prefix, entries.len());
        for entry in entries.values() {
            log::debug!("  {} starts at page {}", entry.filename, entry.start);
        }

        Ok(Self {
            prefix: prefix.to_string(),
            entries,
        })
    }

    /// Prefix the index was built for.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no file matched the prefix.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending start order.
    pub fn entries(&self) -> impl Iterator<Item = &BatesEntry> {
        self.entries.values()
    }

    /// Find the file holding `bates_number` and the 1-based page within it.
    ///
    /// Returns `None` when no file starts at or below the number.
    pub fn lookup(&self, bates_number: u64) -> Option<(&BatesEntry, NonZeroU32)> {
        let (_, entry) = self.entries.range(..=bates_number).next_back()?;
        let page = bates_number
            .checked_sub(entry.start)
            .and_then(|d| d.checked_add(1))
            .and_then(|offset| u32::try_from(offset).ok())
            .and_then(NonZeroU32::new);
        match page {
            Some(page) => {
                log::debug!("Bates {} -> {} page {}", bates_number, entry.filename, page);
                Some((entry, page))
            },
            None => {
                log::warn!("Bates {} is too far past {}", bates_number, entry.filename);
                None
            },
        }
    }
}
