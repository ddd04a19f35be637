//! Page-citation pattern synthesis.
//!
//! Builds a reusable "exhibit + page" extraction pattern from one worked
//! example supplied by the user, e.g. `Ex. 5, Memo, at p. 25` with page 25.
//!
//! The exemplar is taken apart in three steps:
//!
//! 1. the exhibit reference is located with the word-boundary exhibit patterns
//! 2. the page number is located after it, trying the page forms of
//!    [`PageForm::ALL`] in order and keeping the last occurrence of the first
//!    form that matches
//! 3. a combined pattern is built: exhibit reference, a bounded middle
//!    segment, then the chosen page form with the page digits captured
//!
//! The combined pattern is then run against the exemplar itself and must
//! reproduce both the exhibit identifier and the page digits; otherwise
//! synthesis fails and nothing is installed.
//!
//! The middle segment must not contain the start of another exhibit
//! reference. The regex engine has no look-around, so [`CitationPattern`]
//! enforces this while matching: a match whose middle holds another exhibit
//! start is dropped and the search resumes at that inner reference.

use crate::config::AnchorMode;
use crate::error::SynthesisError;
use crate::extract::patterns::EXHIBIT_START;
use crate::extract::ExhibitExtractor;
use crate::strategy::first_match;
use crate::utils::CharIndex;
use regex::{Regex, RegexBuilder};
use std::fmt;

/// Smallest bound on the middle segment, in characters.
const MIN_MIDDLE_CHARS: usize = 160;

/// Smallest bound on the middle segment of a bare-number citation.
const MIN_BARE_MIDDLE_CHARS: usize = 8;

/// Page-reference surface forms, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageForm {
    /// `at p. 25`, `at pp. 25`
    AtPageAbbrev,
    /// `at 25`
    At,
    /// `p. 25`, `pp. 25`
    PageAbbrev,
    /// `page 25`, `pages 25`
    PageWord,
    /// `25` on its own, with the punctuation that precedes it in the exemplar
    Bare,
}

impl PageForm {
    /// All forms in priority order.
    pub const ALL: [PageForm; 5] = [
        PageForm::AtPageAbbrev,
        PageForm::At,
        PageForm::PageAbbrev,
        PageForm::PageWord,
        PageForm::Bare,
    ];

    /// Pattern text for this form with `digits` in the page position.
    fn source(self, digits: &str) -> String {
        match self {
            PageForm::AtPageAbbrev => format!(r"\bat\s+pp?\.\s*{}\b", digits),
            PageForm::At => format!(r"\bat\s+{}\b", digits),
            PageForm::PageAbbrev => format!(r"\bpp?\.\s*{}\b", digits),
            PageForm::PageWord => format!(r"\bpages?\s+{}\b", digits),
            PageForm::Bare => format!(r"\b{}\b", digits),
        }
    }
}

impl fmt::Display for PageForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PageForm::AtPageAbbrev => "at p. N",
            PageForm::At => "at N",
            PageForm::PageAbbrev => "p. N",
            PageForm::PageWord => "page N",
            PageForm::Bare => "N",
        };
        f.write_str(name)
    }
}

/// One page citation found by a [`CitationPattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationMatch {
    /// Exhibit identifier as written
    pub exhibit: String,
    /// Cited page
    pub page: u32,
    /// Byte offset of the match start
    pub start: usize,
    /// Byte offset one past the match end
    pub end: usize,
    /// Matched text
    pub text: String,
}

/// A compiled, validated "exhibit + page" pattern.
///
/// Immutable once built. A new exemplar produces a new pattern.
#[derive(Debug, Clone)]
pub struct CitationPattern {
    regex: Regex,
    pattern_text: String,
    page_form: PageForm,
    exemplar: String,
    exemplar_page: u32,
}

impl CitationPattern {
    /// The raw pattern text.
    pub fn pattern_text(&self) -> &str {
        &self.pattern_text
    }

    /// Page form chosen from the exemplar.
    pub fn page_form(&self) -> PageForm {
        self.page_form
    }

    /// The exemplar the pattern was built from.
    pub fn exemplar(&self) -> &str {
        &self.exemplar
    }

    /// The exemplar's page number.
    pub fn exemplar_page(&self) -> u32 {
        self.exemplar_page
    }

    /// First citation in `text`, as `(exhibit, page digits)`.
    pub fn captures(&self, text: &str) -> Option<(String, String)> {
        self.next_match(text, 0)
            .map(|(m, digits)| (m.exhibit, digits))
    }

    /// All non-overlapping citations in `text`, left to right.
    pub fn find_all(&self, text: &str) -> Vec<CitationMatch> {
        let mut found = Vec::new();
        let mut from = 0;
        while let Some((m, _)) = self.next_match(text, from) {
            from = m.end.max(from + 1);
            if m.page == 0 {
                log::debug!("Skipping '{}': page number out of range", m.text);
                continue;
            }
            found.push(m);
            if from > text.len() {
                break;
            }
        }
        found
    }

    /// Next accepted match at or after byte `from`, with the raw page digits.
    fn next_match(&self, text: &str, mut from: usize) -> Option<(CitationMatch, String)> {
        'search: while from <= text.len() {
            let mut caps = self.regex.captures_at(text, from)?;
            loop {
                let (whole, exhibit, middle, page) = (
                    caps.get(0)?,
                    caps.name("exhibit")?,
                    caps.name("middle")?,
                    caps.name("page")?,
                );

                // The middle may not run into another exhibit reference. Try
                // the same start again with the text cut before the inner
                // reference, then give up on this start.
                if let Some(inner) = EXHIBIT_START.find(middle.as_str()) {
                    let restart = middle.start() + inner.start();
                    match self.regex.captures_at(&text[..restart], whole.start()) {
                        Some(shorter) if shorter.get(0)?.start() == whole.start() => {
                            caps = shorter;
                            continue;
                        },
                        _ => {
                            log::trace!(
                                "Citation candidate '{}' spans another exhibit; restarting at byte {}",
                                whole.as_str(),
                                restart
                            );
                            from = restart;
                            continue 'search;
                        },
                    }
                }

                let digits = page.as_str().to_string();
                return Some((
                    CitationMatch {
                        exhibit: exhibit.as_str().to_string(),
                        page: digits.parse().unwrap_or(0),
                        start: whole.start(),
                        end: whole.end(),
                        text: whole.as_str().to_string(),
                    },
                    digits,
                ));
            }
        }
        None
    }
}

/// Derive a page-citation pattern from one exemplar and its page number.
pub fn synthesize(exemplar: &str, exemplar_page: u32) -> Result<CitationPattern, SynthesisError> {
    let exemplar = exemplar.trim();

    // Step 1: exhibit reference.
    let extractor = ExhibitExtractor::new(AnchorMode::WordBoundary);
    let exhibit = extractor
        .extract(exemplar)
        .into_iter()
        .next()
        .ok_or(SynthesisError::NoExhibitFound)?;
    let index = CharIndex::new(exemplar);
    let exhibit_end = index.byte_of(exhibit.span.end);
    log::debug!(
        "Exemplar exhibit '{}' ({}) ends at byte {}",
        exhibit.value,
        exhibit.matched_text,
        exhibit_end
    );

    // Step 2: page reference, after the exhibit only.
    if exemplar_page == 0 {
        return Err(SynthesisError::NoPageFound);
    }
    let digits = exemplar_page.to_string();
    let after = &exemplar[exhibit_end..];
    let (page_form, occurrences) = first_match(PageForm::ALL, |form| {
        RegexBuilder::new(&form.source(&digits))
            .case_insensitive(true)
            .build()
            .map(|re| re.find_iter(after).map(|m| (m.start(), m.end())).collect())
            .unwrap_or_default()
    })
    .ok_or(SynthesisError::NoPageFound)?;
    let Some(&(page_start, page_end)) = occurrences.last() else {
        return Err(SynthesisError::NoPageFound);
    };
    log::debug!(
        "Exemplar page form '{}' found at '{}'",
        page_form,
        &after[page_start..page_end]
    );

    // Step 3: combined pattern.
    let middle_chars = after[..page_start].chars().count();
    let middle = match page_form {
        // A bare number has no keyword to stop at, so take the last one in a
        // tighter window instead of the first.
        PageForm::Bare => format!(".{{0,{}}}", (middle_chars * 2).max(MIN_BARE_MIDDLE_CHARS)),
        _ => format!(".{{0,{}}}?", MIN_MIDDLE_CHARS.max(middle_chars * 2)),
    };
    let tail = page_tail(page_form, &after[..page_start]);
    let pattern_text = format!(
        r"\b(?:Exhibit|Ex)(?:\.|_)?\s*(?P<exhibit>\d+[A-Z]?|[A-Z])\b(?P<middle>{}){}",
        middle, tail
    );
    log::debug!("Synthesized citation pattern: {}", pattern_text);

    let validation_failed = |captured| SynthesisError::ValidationFailed {
        expected_exhibit: exhibit.value.clone(),
        expected_page: digits.clone(),
        captured,
    };

    let regex = RegexBuilder::new(&pattern_text)
        .case_insensitive(true)
        .build()
        .map_err(|e| {
            log::warn!("Synthesized pattern does not compile: {}", e);
            validation_failed(None)
        })?;

    let pattern = CitationPattern {
        regex,
        pattern_text,
        page_form,
        exemplar: exemplar.to_string(),
        exemplar_page,
    };

    // Step 4: the pattern must reproduce the exemplar.
    match pattern.captures(exemplar) {
        Some((ex, page)) if ex.eq_ignore_ascii_case(&exhibit.value) && page == digits => {
            log::info!(
                "Page automation pattern validated against '{}' (form '{}')",
                exemplar,
                page_form
            );
            Ok(pattern)
        },
        captured => {
            log::warn!(
                "Synthesized pattern captured {:?}, expected ({}, {})",
                captured,
                exhibit.value,
                digits
            );
            Err(validation_failed(captured))
        },
    }
}

/// Page-capturing tail for a form. For the bare form the punctuation just
/// before the number in the exemplar is kept, so the number has to follow it.
fn page_tail(form: PageForm, before_page: &str) -> String {
    const PAGE: &str = r"(?P<page>\d+)\b";
    match form {
        PageForm::AtPageAbbrev => format!(r"\bat\s+pp?\.\s*{}", PAGE),
        PageForm::At => format!(r"\bat\s+{}", PAGE),
        PageForm::PageAbbrev => format!(r"\bpp?\.\s*{}", PAGE),
        PageForm::PageWord => format!(r"\bpages?\s+{}", PAGE),
        PageForm::Bare => {
            let lead = before_page
                .trim_end()
                .chars()
                .last()
                .filter(|c| c.is_ascii_punctuation());
            match lead {
                Some(c) => format!(r"{}\s*\b{}", regex::escape(&c.to_string()), PAGE),
                None => format!(r"\s\b{}", PAGE),
            }
        },
    }
}
