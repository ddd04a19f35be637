//! Exhibit filename matching.
//!
//! An identifier such as `3A` is turned into a fixed, ordered list of filename
//! prefixes (`Ex. 3A`, `Ex.3A`, `Ex 3A`, `Ex_3A`, `Exhibit 3A`, `Exhibit_3A`).
//! The first prefix that matches at least one file wins; matches are never
//! merged across prefixes. A file matches a prefix when the prefix is the whole
//! name, or is followed by one of `_`, `-`, `.` or a space, so `Ex. 3` never
//! picks up `Ex. 3A.pdf`.

use super::listing::FolderListing;
use crate::strategy::first_match;
use std::path::PathBuf;

/// Characters allowed right after a matching prefix.
pub const SEPARATORS: [char; 4] = ['_', '-', '.', ' '];

/// Candidate filename prefixes for an identifier, in priority order.
pub fn candidate_prefixes(identifier: &str) -> [String; 6] {
    [
        format!("Ex. {}", identifier),
        format!("Ex.{}", identifier),
        format!("Ex {}", identifier),
        format!("Ex_{}", identifier),
        format!("Exhibit {}", identifier),
        format!("Exhibit_{}", identifier),
    ]
}

/// Whether `filename` belongs to the exhibit named by `prefix`.
pub fn filename_matches(filename: &str, prefix: &str) -> bool {
    match filename.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with(&SEPARATORS[..]),
        None => false,
    }
}

/// Resolves exhibit identifiers against a folder snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ExhibitResolver<'a> {
    listing: &'a FolderListing,
}

impl<'a> ExhibitResolver<'a> {
    /// Create a resolver over a listing.
    pub fn new(listing: &'a FolderListing) -> Self {
        Self { listing }
    }

    /// Find the winning prefix and its matching file names.
    pub fn matching_files(&self, identifier: &str) -> Option<(String, Vec<&'a str>)> {
        let listing = self.listing;
        first_match(candidate_prefixes(identifier), |prefix| {
            listing
                .filenames()
                .iter()
                .filter(|name| filename_matches(name, prefix))
                .map(|name| name.as_str())
                .collect()
        })
    }

    /// Paths of the files an identifier resolves to (empty when unresolved).
    pub fn resolve(&self, identifier: &str) -> Vec<PathBuf> {
        match self.matching_files(identifier) {
            Some((prefix, names)) => {
                log::debug!(
                    "Exhibit '{}' matched {} file(s) with prefix '{}'",
                    identifier,
                    names.len(),
                    prefix
                );
                names.into_iter().map(|n| self.listing.path_of(n)).collect()
            },
            None => {
                log::debug!("Exhibit '{}' matched no file", identifier);
                Vec::new()
            },
        }
    }
}
