//! Markdown text document host.
//!
//! A document is a list of blocks separated by blank lines. Blocks opening
//! with a footnote definition marker (`[^id]: `) become footnote regions,
//! everything else is a body paragraph. Endnotes have no Markdown syntax of
//! their own; they can be added through [`TextDocument::push_endnote`] and are
//! written out as definitions after all other blocks.
//!
//! Linking replaces the cited text with link markup, so every link shifts the
//! offsets of the text after it in the same region. Text that is already part
//! of a link, including links present when the file was loaded, is never
//! linked again.

use super::{char_slice, RegionSource};
use crate::annotate::{chars_eq_ignore_case, Hyperlink, MutableTextRegion, RegionKind};
use crate::config::LinkStyle;
use crate::error::{MutationError, Result};
use crate::extract::Span;
use crate::session::{HostOptions, HostSettings};
use crate::utils::CharIndex;
use lazy_static::lazy_static;
use regex::Regex;
use std::cell::Cell;
use std::path::Path;

lazy_static! {
    /// `[^id]: ` at the start of a block
    static ref NOTE_MARKER: Regex = Regex::new(r"^\[\^([^\]\s]+)\]:[ \t]?").unwrap();

    /// Markdown inline links and HTML anchors
    static ref EXISTING_LINK: Regex =
        Regex::new(r"(?is)\[[^\]\n]*\]\([^)\n]*\)|<a\s[^>]*>.*?</a>").unwrap();
}

/// Render a hyperlink as Markdown, or as an inline HTML anchor when the style
/// needs colors Markdown cannot express.
pub fn render_link(link: &Hyperlink) -> String {
    match link.style {
        LinkStyle::Standard => format!(
            "[{}](<{}> \"{}\")",
            escape_markdown_text(&link.display_text),
            link.address,
            link.screen_tip.replace('"', "\\\"")
        ),
        LinkStyle::Black => {
            let (r, g, b) = link.style.rgb();
            let decoration = if link.style.underline() { "underline" } else { "none" };
            format!(
                "<a href=\"{}\" title=\"{}\" style=\"color:#{:02X}{:02X}{:02X};text-decoration:{}\">{}</a>",
                escape_html(&link.address),
                escape_html(&link.screen_tip),
                r,
                g,
                b,
                decoration,
                escape_html(&link.display_text)
            )
        },
    }
}

fn escape_markdown_text(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// One paragraph, footnote or endnote of a [`TextDocument`].
#[derive(Debug, Clone)]
pub struct TextRegion {
    label: String,
    kind: RegionKind,
    note_id: Option<String>,
    text: String,
    links: Vec<Span>,
    objects: Vec<usize>,
    found: Cell<Option<Span>>,
}

impl TextRegion {
    /// Create a region; links already in `text` are recorded.
    pub fn new(label: impl Into<String>, kind: RegionKind, text: impl Into<String>) -> Self {
        let text = text.into();
        let index = CharIndex::new(&text);
        let links = EXISTING_LINK
            .find_iter(&text)
            .map(|m| index.span_of(m.start(), m.end()))
            .collect();
        Self {
            label: label.into(),
            kind,
            note_id: None,
            text,
            links,
            objects: Vec::new(),
            found: Cell::new(None),
        }
    }

    fn note(label: String, kind: RegionKind, id: &str, text: &str) -> Self {
        let mut region = Self::new(label, kind, text);
        region.note_id = Some(id.to_string());
        region
    }

    /// Mark an embedded object (image, chart) just before character `at`.
    ///
    /// Hosts with embedded objects cannot honor character offsets past them;
    /// only spans they returned from [`find`](MutableTextRegion::find) are
    /// accepted there.
    pub fn with_embedded_object(mut self, at: usize) -> Self {
        self.objects.push(at);
        self
    }

    /// Current text, including link markup.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Character spans of link markup.
    pub fn links(&self) -> &[Span] {
        &self.links
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    fn is_linked(&self, span: Span) -> bool {
        self.links.iter().any(|l| l.overlaps(&span))
    }

    fn to_markdown(&self) -> String {
        match &self.note_id {
            Some(id) => format!("[^{}]: {}", id, self.text),
            None => self.text.clone(),
        }
    }
}

impl MutableTextRegion for TextRegion {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn kind(&self) -> RegionKind {
        self.kind
    }

    fn read_text(&self) -> Result<String> {
        Ok(self.text.clone())
    }

    fn read_span(&self, span: Span) -> Option<String> {
        char_slice(&self.text, span.start, span.end)
    }

    fn mutate(&mut self, span: Span, link: &Hyperlink) -> std::result::Result<(), MutationError> {
        let len = self.char_len();
        if span.end > len {
            return Err(MutationError::OutOfBounds {
                start: span.start,
                end: span.end,
                len,
            });
        }
        if self.is_linked(span) {
            return Err(MutationError::Host(format!("{} is already linked", span)));
        }
        let located = self.found.take() == Some(span);
        if !located && self.objects.iter().any(|&o| o <= span.start) {
            return Err(MutationError::OffsetUnreliable {
                start: span.start,
                end: span.end,
            });
        }

        let markup = render_link(link);
        let markup_len = markup.chars().count();
        let before: String = self.text.chars().take(span.start).collect();
        let after: String = self.text.chars().skip(span.end).collect();
        self.text = format!("{}{}{}", before, markup, after);

        let shift = |pos: usize| pos + markup_len - span.len();
        for existing in &mut self.links {
            if existing.start >= span.end {
                *existing = existing.moved_to(shift(existing.start));
            }
        }
        for object in &mut self.objects {
            if *object >= span.end {
                *object = shift(*object);
            }
        }
        self.links.push(Span::new(span.start, span.start + markup_len));
        self.links.sort();
        Ok(())
    }

    fn find(&self, needle: &str, from: usize) -> Option<Span> {
        let chars: Vec<char> = self.text.chars().collect();
        let n = needle.chars().count();
        if n == 0 || n > chars.len() {
            return None;
        }
        let found = (from..=chars.len() - n)
            .map(|start| Span::new(start, start + n))
            .filter(|span| !self.is_linked(*span))
            .find(|span| {
                let window: String = chars[span.start..span.end].iter().collect();
                chars_eq_ignore_case(&window, needle)
            });
        self.found.set(found);
        found
    }
}

/// A Markdown document made of paragraphs, footnotes and endnotes.
#[derive(Debug, Clone, Default)]
pub struct TextDocument {
    regions: Vec<TextRegion>,
    options: HostOptions,
}

impl TextDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse Markdown source.
    pub fn from_markdown(source: &str) -> Self {
        let mut doc = Self::new();
        let mut block: Vec<&str> = Vec::new();
        for line in source.lines() {
            if line.trim().is_empty() {
                doc.push_block(&block);
                block.clear();
            } else {
                block.push(line);
            }
        }
        doc.push_block(&block);
        log::debug!(
            "Loaded document: {} paragraph(s), {} note(s)",
            doc.count(RegionKind::Body),
            doc.regions.len() - doc.count(RegionKind::Body)
        );
        doc
    }

    /// Read and parse a Markdown file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Ok(Self::from_markdown(&source))
    }

    fn push_block(&mut self, lines: &[&str]) {
        if lines.is_empty() {
            return;
        }
        let text = lines.join("\n");
        let note = NOTE_MARKER
            .captures(&text)
            .and_then(|caps| Some((caps.get(0)?.end(), caps.get(1)?.as_str().to_string())));
        match note {
            Some((body_start, id)) => {
                let body = text[body_start..].to_string();
                self.push_footnote(&id, &body);
            },
            None => {
                self.push_paragraph(&text);
            },
        }
    }

    fn count(&self, kind: RegionKind) -> usize {
        self.regions.iter().filter(|r| r.kind == kind).count()
    }

    /// Append a body paragraph.
    pub fn push_paragraph(&mut self, text: &str) -> &mut TextRegion {
        let label = format!("Paragraph {}", self.count(RegionKind::Body) + 1);
        self.push(TextRegion::new(label, RegionKind::Body, text))
    }

    /// Append a footnote.
    pub fn push_footnote(&mut self, id: &str, text: &str) -> &mut TextRegion {
        let label = format!("Footnote {}", id);
        self.push(TextRegion::note(label, RegionKind::Footnote, id, text))
    }

    /// Append an endnote.
    pub fn push_endnote(&mut self, id: &str, text: &str) -> &mut TextRegion {
        let label = format!("Endnote {}", id);
        self.push(TextRegion::note(label, RegionKind::Endnote, id, text))
    }

    /// Append a prepared region.
    pub fn push(&mut self, region: TextRegion) -> &mut TextRegion {
        self.regions.push(region);
        let last = self.regions.len() - 1;
        &mut self.regions[last]
    }

    /// Regions in document order.
    pub fn regions(&self) -> &[TextRegion] {
        &self.regions
    }

    /// Region by label ("Paragraph 2", "Footnote 1").
    pub fn region(&self, label: &str) -> Option<&TextRegion> {
        self.regions.iter().find(|r| r.label == label)
    }

    /// Serialize back to Markdown; endnotes go last.
    pub fn to_markdown(&self) -> String {
        let mut blocks: Vec<String> = self
            .regions
            .iter()
            .filter(|r| r.kind != RegionKind::Endnote)
            .map(TextRegion::to_markdown)
            .collect();
        blocks.extend(
            self.regions
                .iter()
                .filter(|r| r.kind == RegionKind::Endnote)
                .map(TextRegion::to_markdown),
        );
        let mut out = blocks.join("\n\n");
        out.push('\n');
        out
    }

    /// Write the Markdown to a file.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_markdown())?;
        Ok(())
    }
}

impl RegionSource for TextDocument {
    fn regions_mut(&mut self) -> Vec<&mut dyn MutableTextRegion> {
        self.regions
            .iter_mut()
            .map(|r| r as &mut dyn MutableTextRegion)
            .collect()
    }
}

impl HostSettings for TextDocument {
    fn options(&self) -> HostOptions {
        self.options.clone()
    }

    fn set_options(&mut self, options: &HostOptions) -> Result<()> {
        self.options = options.clone();
        Ok(())
    }
}
