//! Target resolution.
//!
//! Maps an [`Identifier`] to the files it refers to:
//!
//! - exhibit identifiers go through an ordered list of filename prefixes
//!   ([`ExhibitResolver`]), and become paged targets when the citation named a page
//! - Bates identifiers are looked up in a [`BatesIndex`]
//!
//! An identifier with no target resolves to an empty vector; that is logged by
//! the caller and the citation is skipped, it is never an error.

pub mod bates;
pub mod exhibit;
pub mod listing;

use crate::extract::{Identifier, IdentifierKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

pub use bates::{BatesEntry, BatesIndex};
pub use exhibit::{candidate_prefixes, filename_matches, ExhibitResolver};
pub use listing::{FileLister, FolderListing, FsLister};

/// Where a citation points.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetDescriptor {
    /// A whole file
    File {
        /// Target path
        path: PathBuf,
    },
    /// A 1-based page of a file
    Paged {
        /// Target path
        path: PathBuf,
        /// Page within the file
        page: NonZeroU32,
    },
}

impl TargetDescriptor {
    /// Path of the target file.
    pub fn path(&self) -> &Path {
        match self {
            TargetDescriptor::File { path } | TargetDescriptor::Paged { path, .. } => path,
        }
    }

    /// Page within the file, if any.
    pub fn page(&self) -> Option<NonZeroU32> {
        match self {
            TargetDescriptor::File { .. } => None,
            TargetDescriptor::Paged { page, .. } => Some(*page),
        }
    }

    /// File name component of the path, falling back to the full path.
    pub fn file_name(&self) -> String {
        self.path()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path().to_string_lossy().to_string())
    }
}

impl fmt::Display for TargetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetDescriptor::File { path } => write!(f, "{}", path.display()),
            TargetDescriptor::Paged { path, page } => write!(f, "{} (page {})", path.display(), page),
        }
    }
}

/// Dispatches identifiers to the exhibit or Bates resolver.
#[derive(Debug, Clone, Copy)]
pub struct TargetResolver<'a> {
    listing: &'a FolderListing,
    bates: Option<&'a BatesIndex>,
}

impl<'a> TargetResolver<'a> {
    /// Resolver for exhibit identifiers only.
    pub fn new(listing: &'a FolderListing) -> Self {
        Self {
            listing,
            bates: None,
        }
    }

    /// Also resolve Bates identifiers through `index`.
    pub fn with_bates(mut self, index: &'a BatesIndex) -> Self {
        self.bates = Some(index);
        self
    }

    /// Candidate targets, best first. Empty when unresolved.
    pub fn resolve(&self, identifier: &Identifier) -> Vec<TargetDescriptor> {
        match identifier.kind {
            IdentifierKind::ExhibitNumeric | IdentifierKind::ExhibitAlpha => {
                let paths = ExhibitResolver::new(self.listing).resolve(&identifier.value);
                paths
                    .into_iter()
                    .map(|path| match identifier.page {
                        Some(page) => TargetDescriptor::Paged { path, page },
                        None => TargetDescriptor::File { path },
                    })
                    .collect()
            },
            IdentifierKind::BatesNumber => {
                let Some(index) = self.bates else {
                    log::warn!("Bates identifier '{}' found but no Bates index is configured", identifier.value);
                    return Vec::new();
                };
                let Some(number) = identifier.bates_number() else {
                    log::warn!("Bates identifier '{}' is not a valid number", identifier.value);
                    return Vec::new();
                };
                match index.lookup(number) {
                    Some((entry, page)) => vec![TargetDescriptor::Paged {
                        path: entry.path.clone(),
                        page,
                    }],
                    None => {
                        log::debug!("Bates {} precedes every file in the production", number);
                        Vec::new()
                    },
                }
            },
        }
    }
}
