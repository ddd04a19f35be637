//! Error types for the citation linker.
//!
//! This module defines the errors that can surface while configuring the linker,
//! resolving citations, and anchoring hyperlinks in a live document.
//!
//! Most per-citation and per-region failures are non-fatal: the scan catches them,
//! logs them, and moves on. Only configuration-time failures (for example an exemplar
//! citation that cannot be turned into a verified pattern) are meant to reach the caller.

use std::path::PathBuf;

/// Result type alias for linker operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while linking citations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The target folder could not be listed
    #[error("Cannot read folder {}: {reason}", folder.display())]
    FolderUnreadable {
        /// Folder that was being listed
        folder: PathBuf,
        /// Underlying reason
        reason: String,
    },

    /// A pattern built at configuration time did not compile
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// A region's text could not be read from the host document
    #[error("Cannot read region '{region}': {reason}")]
    RegionRead {
        /// Label of the region (e.g. "Footnote 3")
        region: String,
        /// Underlying reason
        reason: String,
    },

    /// Page-citation pattern synthesis failed
    #[error("Page citation synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    /// A single annotation could not be applied
    #[error("Annotation failed: {0}")]
    Annotation(#[from] AnnotationError),

    /// The host document rejected a mutation
    #[error("Mutation failed: {0}")]
    Mutation(#[from] MutationError),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A rename would overwrite an existing file
    #[error("Target file already exists: {} -> {}", from.display(), to.display())]
    RenameConflict {
        /// Original path
        from: PathBuf,
        /// Path that already exists
        to: PathBuf,
    },
}

/// Failure to derive a page-citation pattern from an exemplar citation.
///
/// These are surfaced to the caller and block page automation until the exemplar
/// is corrected; an unverified pattern is never installed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthesisError {
    /// The exemplar contains no recognizable exhibit reference
    #[error("No exhibit reference found in exemplar citation")]
    NoExhibitFound,

    /// The exemplar page number does not appear after the exhibit reference
    #[error("Page number not found in exemplar citation")]
    NoPageFound,

    /// The synthesized pattern did not reproduce the exemplar's exhibit and page
    #[error("Synthesized pattern failed validation: expected ({expected_exhibit}, {expected_page}), captured {captured:?}")]
    ValidationFailed {
        /// Exhibit identifier found in the exemplar
        expected_exhibit: String,
        /// Page digits supplied with the exemplar
        expected_page: String,
        /// What the synthesized pattern actually captured, if it matched at all
        captured: Option<(String, String)>,
    },
}

/// Failure to anchor one citation. Counted as a skip, never aborts a scan.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnnotationError {
    /// The expected text is no longer near its recorded span
    #[error("Could not re-localize '{expected}' near [{start}, {end})")]
    ReLocalizationFailed {
        /// Text that was expected at the span
        expected: String,
        /// Recorded start offset
        start: usize,
        /// Recorded end offset
        end: usize,
    },

    /// Both the offset-based and the search-based mutation failed
    #[error("Could not anchor '{expected}': {reason}")]
    MutationFailed {
        /// Text that was to be anchored
        expected: String,
        /// Reason reported by the last attempt
        reason: String,
    },
}

/// Errors reported by a host document when asked to mutate a region.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    /// The host cannot honor character offsets precisely (e.g. embedded objects)
    #[error("Offsets [{start}, {end}) cannot be honored by the host")]
    OffsetUnreliable {
        /// Requested start
        start: usize,
        /// Requested end
        end: usize,
    },

    /// The span lies outside the region
    #[error("Span [{start}, {end}) is out of bounds for region of length {len}")]
    OutOfBounds {
        /// Requested start
        start: usize,
        /// Requested end
        end: usize,
        /// Region length in characters
        len: usize,
    },

    /// Any other host-side failure
    #[error("Host error: {0}")]
    Host(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_unreadable_error() {
        let err = Error::FolderUnreadable {
            folder: PathBuf::from("/exhibits"),
            reason: "permission denied".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("/exhibits"));
        assert!(msg.contains("permission denied"));
    }

    #[test]
    fn test_region_read_error() {
        let err = Error::RegionRead {
            region: "Footnote 3".to_string(),
            reason: "range detached".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Footnote 3"));
        assert!(msg.contains("range detached"));
    }

    #[test]
    fn test_synthesis_error_converts() {
        let err: Error = SynthesisError::NoPageFound.into();
        assert!(matches!(err, Error::Synthesis(SynthesisError::NoPageFound)));
        assert!(format!("{}", err).contains("Page number not found"));
    }

    #[test]
    fn test_validation_failed_message() {
        let err = SynthesisError::ValidationFailed {
            expected_exhibit: "5".to_string(),
            expected_page: "25".to_string(),
            captured: Some(("5".to_string(), "2020".to_string())),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("(5, 25)"));
        assert!(msg.contains("2020"));
    }

    #[test]
    fn test_relocalization_error() {
        let err = AnnotationError::ReLocalizationFailed {
            expected: "Ex. 3".to_string(),
            start: 10,
            end: 15,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Ex. 3"));
        assert!(msg.contains("[10, 15)"));
    }

    #[test]
    fn test_mutation_out_of_bounds() {
        let err = MutationError::OutOfBounds {
            start: 4,
            end: 40,
            len: 12,
        };
        assert!(format!("{}", err).contains("length 12"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
        assert_send_sync::<AnnotationError>();
    }
}
