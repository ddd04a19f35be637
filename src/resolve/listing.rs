//! Directory listing.
//!
//! The resolver never touches the filesystem itself: it works on an immutable
//! [`FolderListing`] snapshot taken through a [`FileLister`] when the target
//! folder is configured.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Lists the file names in a folder.
pub trait FileLister {
    /// Names (not paths) of the regular files directly inside `folder`.
    fn list_files(&self, folder: &Path) -> Result<Vec<String>>;
}

/// Lists a folder on the local filesystem, skipping sub-directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLister;

impl FileLister for FsLister {
    fn list_files(&self, folder: &Path) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(folder).map_err(|e| Error::FolderUnreadable {
            folder: folder.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut names = Vec::new();
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        Ok(names)
    }
}

/// Immutable snapshot of a folder's file names, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderListing {
    folder: PathBuf,
    filenames: Vec<String>,
}

impl FolderListing {
    /// Build a snapshot from known names.
    pub fn new(folder: impl Into<PathBuf>, filenames: impl IntoIterator<Item = String>) -> Self {
        let mut filenames: Vec<String> = filenames.into_iter().collect();
        filenames.sort();
        filenames.dedup();
        Self {
            folder: folder.into(),
            filenames,
        }
    }

    /// Take a snapshot through a lister.
    pub fn read(lister: &dyn FileLister, folder: &Path) -> Result<Self> {
        let names = lister.list_files(folder)?;
        log::debug!("Listed {} files in {}", names.len(), folder.display());
        Ok(Self::new(folder, names))
    }

    /// The listed folder.
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// File names in sorted order.
    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    /// Full path of a listed file.
    pub fn path_of(&self, filename: &str) -> PathBuf {
        self.folder.join(filename)
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.filenames.len()
    }

    /// True when the folder held no files.
    pub fn is_empty(&self) -> bool {
        self.filenames.is_empty()
    }
}
