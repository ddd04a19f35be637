//! Exhibit filename normalization.
//!
//! Some viewers mishandle links to files whose names contain spaces or a
//! period right after "Ex". This module rewrites exhibit file names into a
//! link-safe form:
//!
//! - `Ex. A Letter.pdf` → `Ex_A_Letter.pdf`
//! - `Ex. 55 Email.docx` → `Ex_55_Email.docx`
//! - `Exhibit 12 Memo.pdf` → `Exhibit_12_Memo.pdf`
//!
//! Files that do not look like exhibits are left alone.

use crate::error::{Error, Result};
use crate::resolve::{FileLister, FsLister};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

lazy_static! {
    static ref LOOKS_LIKE_EXHIBIT: Regex = Regex::new(r"(?i)^(?:ex[._\s]|exhibit)").unwrap();
    static ref EX_PERIOD: Regex = Regex::new(r"(?i)^(ex)\.\s*").unwrap();
    static ref EX_SPACE: Regex = Regex::new(r"(?i)^(ex)\s+").unwrap();
    static ref EXHIBIT_SPACE: Regex = Regex::new(r"(?i)^(exhibit)\s+").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref UNDERSCORES: Regex = Regex::new(r"_{2,}").unwrap();
}

/// Split `name` into stem and extension (with its dot). An extension is a
/// final dot followed by at least one character and no whitespace.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(dot)
            if dot > 0
                && dot + 1 < name.len()
                && !name[dot + 1..].chars().any(char::is_whitespace) =>
        {
            name.split_at(dot)
        },
        _ => (name, ""),
    }
}

/// Link-safe form of an exhibit file name; other names come back unchanged.
pub fn normalize_filename(filename: &str) -> String {
    let (stem, ext) = split_extension(filename);
    if !LOOKS_LIKE_EXHIBIT.is_match(stem) {
        return filename.to_string();
    }

    let name = EX_PERIOD.replace(stem, "${1}_");
    let name = EX_SPACE.replace(&name, "${1}_");
    let name = EXHIBIT_SPACE.replace(&name, "${1}_");
    let name = WHITESPACE.replace_all(&name, "_");
    let name = UNDERSCORES.replace_all(&name, "_");
    let name = name.trim_end_matches('_');

    format!("{}{}", name, ext)
}

/// A rename that could not be done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameFailure {
    /// Current name
    pub from: String,
    /// Intended name
    pub to: String,
    /// What went wrong
    pub reason: String,
}

/// Outcome of [`rename_files_in_folder`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenameSummary {
    /// Renamed (or, in a dry run, to be renamed): `(from, to)`
    pub renamed: Vec<(String, String)>,
    /// Renames that failed or would conflict
    pub failed: Vec<RenameFailure>,
    /// Names already in normal form
    pub unchanged: Vec<String>,
}

/// Normalize the exhibit file names in `folder`.
///
/// With `dry_run` nothing is touched on disk and the summary describes what
/// would happen. A rename onto an existing name is reported as a failure.
/// Sub-directories are skipped.
pub fn rename_files_in_folder(folder: &Path, dry_run: bool) -> Result<RenameSummary> {
    let mut names = FsLister.list_files(folder)?;
    names.sort();
    log::info!(
        "{}Normalizing {} file name(s) in {}",
        if dry_run { "[dry run] " } else { "" },
        names.len(),
        folder.display()
    );

    let existing: HashSet<String> = names.iter().cloned().collect();
    let mut claimed: HashSet<String> = HashSet::new();
    let mut summary = RenameSummary::default();

    for name in names {
        let target = normalize_filename(&name);
        if target == name {
            summary.unchanged.push(name);
            continue;
        }

        let from = folder.join(&name);
        let to = folder.join(&target);
        if existing.contains(&target) || claimed.contains(&target) || to.exists() {
            let reason = Error::RenameConflict {
                from: from.clone(),
                to: to.clone(),
            }
            .to_string();
            log::warn!("{}", reason);
            summary.failed.push(RenameFailure {
                from: name,
                to: target,
                reason,
            });
            continue;
        }

        if !dry_run {
            if let Err(err) = std::fs::rename(&from, &to) {
                log::warn!("Could not rename '{}' to '{}': {}", name, target, err);
                summary.failed.push(RenameFailure {
                    from: name,
                    to: target,
                    reason: err.to_string(),
                });
                continue;
            }
        }
        log::debug!("'{}' -> '{}'", name, target);
        claimed.insert(target.clone());
        summary.renamed.push((name, target));
    }

    log::info!(
        "{} renamed, {} failed, {} unchanged",
        summary.renamed.len(),
        summary.failed.len(),
        summary.unchanged.len()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_examples() {
        assert_eq!(normalize_filename("Ex. A Letter.pdf"), "Ex_A_Letter.pdf");
        assert_eq!(normalize_filename("Ex. 55 Email.docx"), "Ex_55_Email.docx");
        assert_eq!(normalize_filename("Exhibit 12 Memo.pdf"), "Exhibit_12_Memo.pdf");
        assert_eq!(normalize_filename("Ex.106.pdf"), "Ex_106.pdf");
        assert_eq!(normalize_filename("ex 3  -  Notes .pdf"), "ex_3_-_Notes.pdf");
    }

    #[test]
    fn test_non_exhibits_untouched() {
        assert_eq!(normalize_filename("Memo 1.pdf"), "Memo 1.pdf");
        assert_eq!(normalize_filename("Examples.pdf"), "Examples.pdf");
        assert_eq!(normalize_filename("Ex_3.pdf"), "Ex_3.pdf");
    }

    #[test]
    fn test_extension_split() {
        assert_eq!(split_extension("Ex. 3"), ("Ex. 3", ""));
        assert_eq!(split_extension("Ex. 3.pdf"), ("Ex. 3", ".pdf"));
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
    }
}
