//! Configuration for citation linking.

use crate::annotate::RetryPolicy;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What kind of citation the linker looks for.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkMode {
    /// Exhibit references ("Ex. 3A", "Exhibit B") resolved by filename prefix
    #[default]
    Exhibit,
    /// Bates stamps ("SMITH_0042") resolved to a file and page through a [`BatesIndex`]
    ///
    /// [`BatesIndex`]: crate::resolve::BatesIndex
    Bates {
        /// Stamp prefix, e.g. "SMITH_"
        prefix: String,
    },
}

/// The kind of host surface being scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    /// Word-processor document: paragraphs, footnotes, endnotes
    #[default]
    Document,
    /// Spreadsheet column: one identifier per cell
    Worksheet,
}

impl Surface {
    /// Anchoring used by this surface unless overridden.
    ///
    /// Documents keep the historical substring matching; worksheets anchor on word
    /// boundaries. The two are kept apart so that neither surface changes its
    /// match results silently.
    pub fn default_anchor_mode(self) -> AnchorMode {
        match self {
            Surface::Document => AnchorMode::Substring,
            Surface::Worksheet => AnchorMode::WordBoundary,
        }
    }
}

/// How exhibit patterns are anchored in surrounding text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorMode {
    /// Match anywhere, including inside longer words
    Substring,
    /// Require word boundaries on both sides
    WordBoundary,
}

/// Visual style applied to created hyperlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStyle {
    /// Blue, underlined
    #[default]
    Standard,
    /// Black, no underline (for court filings that must not show colored links)
    Black,
}

impl LinkStyle {
    /// RGB color of the link text.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            LinkStyle::Standard => (0, 0, 255),
            LinkStyle::Black => (0, 0, 0),
        }
    }

    /// Whether the link text is underlined.
    pub fn underline(self) -> bool {
        matches!(self, LinkStyle::Standard)
    }
}

/// Linker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkerConfig {
    /// Citation family to look for.
    pub mode: LinkMode,

    /// Host surface being scanned.
    pub surface: Surface,

    /// Explicit anchoring override (None = surface default).
    pub anchor_mode: Option<AnchorMode>,

    /// Hyperlink appearance.
    pub link_style: LinkStyle,

    /// Characters searched on each side of a drifted span.
    pub relocalize_window: usize,

    /// Retry policy for re-localization.
    pub retry: RetryPolicy,

    /// Directory link addresses are made relative to.
    pub link_base: Option<PathBuf>,

    /// Skip the first row of a worksheet (column header).
    pub skip_header_row: bool,

    /// Longest cell value still considered an identifier.
    pub max_cell_len: usize,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkerConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            mode: LinkMode::Exhibit,
            surface: Surface::Document,
            anchor_mode: None,
            link_style: LinkStyle::Standard,
            relocalize_window: 5,
            retry: RetryPolicy::default(),
            link_base: None,
            skip_header_row: true,
            max_cell_len: 10,
        }
    }

    /// Load configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if let LinkMode::Bates { prefix } = &self.mode {
            if prefix.trim().is_empty() {
                return Err(Error::Config("Bates mode requires a non-empty prefix".to_string()));
            }
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::Config("retry.max_attempts must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Anchoring actually in effect.
    pub fn effective_anchor_mode(&self) -> AnchorMode {
        self.anchor_mode
            .unwrap_or_else(|| self.surface.default_anchor_mode())
    }

    /// Set the citation mode.
    pub fn with_mode(mut self, mode: LinkMode) -> Self {
        self.mode = mode;
        self
    }

    /// Switch to Bates mode with the given prefix (surrounding whitespace is trimmed).
    pub fn with_bates_prefix(mut self, prefix: &str) -> Self {
        self.mode = LinkMode::Bates {
            prefix: prefix.trim().to_string(),
        };
        self
    }

    /// Set the host surface.
    pub fn with_surface(mut self, surface: Surface) -> Self {
        self.surface = surface;
        self
    }

    /// Override anchoring.
    pub fn with_anchor_mode(mut self, mode: AnchorMode) -> Self {
        self.anchor_mode = Some(mode);
        self
    }

    /// Set the link style.
    pub fn with_link_style(mut self, style: LinkStyle) -> Self {
        self.link_style = style;
        self
    }

    /// Set the re-localization window.
    pub fn with_relocalize_window(mut self, chars: usize) -> Self {
        self.relocalize_window = chars;
        self
    }

    /// Set the re-localization retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Make link addresses relative to this directory.
    pub fn with_link_base(mut self, dir: impl Into<PathBuf>) -> Self {
        self.link_base = Some(dir.into());
        self
    }

    /// Keep or skip the worksheet header row.
    pub fn with_skip_header_row(mut self, skip: bool) -> Self {
        self.skip_header_row = skip;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LinkerConfig::default();
        assert_eq!(config.mode, LinkMode::Exhibit);
        assert_eq!(config.surface, Surface::Document);
        assert_eq!(config.relocalize_window, 5);
        assert!(config.skip_header_row);
        assert_eq!(config.max_cell_len, 10);
    }

    #[test]
    fn test_anchor_mode_follows_surface() {
        let doc = LinkerConfig::new();
        assert_eq!(doc.effective_anchor_mode(), AnchorMode::Substring);

        let sheet = LinkerConfig::new().with_surface(Surface::Worksheet);
        assert_eq!(sheet.effective_anchor_mode(), AnchorMode::WordBoundary);

        let forced = LinkerConfig::new()
            .with_surface(Surface::Worksheet)
            .with_anchor_mode(AnchorMode::Substring);
        assert_eq!(forced.effective_anchor_mode(), AnchorMode::Substring);
    }

    #[test]
    fn test_bates_prefix_trimmed() {
        let config = LinkerConfig::new().with_bates_prefix("  SMITH_ ");
        assert_eq!(
            config.mode,
            LinkMode::Bates {
                prefix: "SMITH_".to_string()
            }
        );
    }

    #[test]
    fn test_link_style() {
        assert_eq!(LinkStyle::Standard.rgb(), (0, 0, 255));
        assert!(LinkStyle::Standard.underline());
        assert_eq!(LinkStyle::Black.rgb(), (0, 0, 0));
        assert!(!LinkStyle::Black.underline());
    }

    #[test]
    fn test_from_json_partial() {
        let config = LinkerConfig::from_json_str(
            r#"{ "mode": { "kind": "bates", "prefix": "ACME" }, "link_style": "black" }"#,
        )
        .unwrap();
        assert_eq!(
            config.mode,
            LinkMode::Bates {
                prefix: "ACME".to_string()
            }
        );
        assert_eq!(config.link_style, LinkStyle::Black);
        assert_eq!(config.relocalize_window, 5);
    }

    #[test]
    fn test_from_json_rejects_empty_prefix() {
        let err = LinkerConfig::from_json_str(r#"{ "mode": { "kind": "bates", "prefix": " " } }"#)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
