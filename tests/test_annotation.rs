//! Tests for drift-tolerant hyperlink anchoring.

use exhibit_anchor::annotate::search_window;
use exhibit_anchor::host::TextRegion;
use exhibit_anchor::{
    AnchorMode, AnnotationError, AnnotationSpan, Applicator, ExhibitExtractor, Hyperlink,
    LinkStyle, MutableTextRegion, MutationError, RegionKind, RetryPolicy, Span, TargetDescriptor,
};
use proptest::prelude::*;
use std::path::PathBuf;

fn link(display: &str) -> Hyperlink {
    Hyperlink {
        target: TargetDescriptor::File {
            path: PathBuf::from(format!("/ex/{}.pdf", display)),
        },
        address: format!("{}.pdf", display),
        display_text: display.to_string(),
        screen_tip: format!("Link to {}.pdf", display),
        style: LinkStyle::Standard,
    }
}

/// Region whose links are a run of `#` of fixed extra length, so a commit
/// changes the length of the text by a known amount.
struct Growing {
    text: Vec<char>,
    extra: usize,
}

impl Growing {
    fn new(text: &str, extra: usize) -> Self {
        Self {
            text: text.chars().collect(),
            extra,
        }
    }
}

impl MutableTextRegion for Growing {
    fn label(&self) -> String {
        "Paragraph 1".to_string()
    }

    fn kind(&self) -> RegionKind {
        RegionKind::Body
    }

    fn read_text(&self) -> exhibit_anchor::Result<String> {
        Ok(self.text.iter().collect())
    }

    fn read_span(&self, span: Span) -> Option<String> {
        (span.end <= self.text.len()).then(|| self.text[span.start..span.end].iter().collect())
    }

    fn mutate(&mut self, span: Span, _link: &Hyperlink) -> Result<(), MutationError> {
        if span.end > self.text.len() {
            return Err(MutationError::OutOfBounds {
                start: span.start,
                end: span.end,
                len: self.text.len(),
            });
        }
        let replacement = "#".repeat(span.len() + self.extra);
        self.text.splice(span.start..span.end, replacement.chars());
        Ok(())
    }

    fn find(&self, _needle: &str, _from: usize) -> Option<Span> {
        None
    }
}

/// Filler words and exhibit references. The references are distinct and of
/// equal length, so no reference can be mistaken for another one.
fn paragraph(ids: &[u32], gaps: &[usize]) -> String {
    let mut text = String::new();
    for (i, (id, gap)) in ids.iter().zip(gaps).enumerate() {
        text.push_str(&"w".repeat(*gap));
        text.push(' ');
        text.push_str(&format!("Ex. {:04}", id * 10 + i as u32));
        text.push(' ');
    }
    text
}

mod ordering {
    use super::*;

    proptest! {
        #[test]
        fn prop_reverse_order_keeps_earlier_spans(
            ids in proptest::collection::vec(1u32..200, 2..6),
            gaps in proptest::collection::vec(0usize..12, 6),
            extra in 1usize..20,
        ) {
            let text = paragraph(&ids, &gaps);
            let found = ExhibitExtractor::new(AnchorMode::WordBoundary).extract(&text);
            prop_assert_eq!(found.len(), ids.len());

            let applicator = Applicator::new(0, RetryPolicy::default());
            let mut region = Growing::new(&text, extra);
            for id in found.iter().rev() {
                let span = AnnotationSpan::new(id.span, id.matched_text.clone());
                let receipt = applicator.apply(&mut region, &span, &link(&id.matched_text));
                prop_assert_eq!(receipt.map(|r| r.span), Ok(id.span));
            }
            prop_assert!(!region.read_text().unwrap().contains("Ex."));
        }

        #[test]
        fn prop_forward_order_invalidates_later_spans(
            ids in proptest::collection::vec(1u32..200, 2..6),
            gaps in proptest::collection::vec(0usize..12, 6),
            extra in 1usize..20,
        ) {
            let text = paragraph(&ids, &gaps);
            let found = ExhibitExtractor::new(AnchorMode::WordBoundary).extract(&text);

            let mut region = Growing::new(&text, extra);
            region.mutate(found[0].span, &link(&found[0].matched_text)).unwrap();
            for later in &found[1..] {
                prop_assert_ne!(region.read_span(later.span), Some(later.matched_text.clone()));
            }
        }
    }
}

mod relocalization {
    use super::*;

    fn drifted(shift: usize) -> (Growing, AnnotationSpan) {
        let text = format!("{}See Ex. 7 here", "x".repeat(shift));
        let span = AnnotationSpan::new(Span::new(4, 9), "Ex. 7");
        (Growing::new(&text, 0), span)
    }

    #[test]
    fn test_drift_within_window() {
        let applicator = Applicator::default();
        for shift in 0..=5 {
            let (mut region, span) = drifted(shift);
            let receipt = applicator.apply(&mut region, &span, &link("Ex. 7")).unwrap();
            assert_eq!(receipt.span, Span::new(4 + shift, 9 + shift), "shift {}", shift);
        }
    }

    #[test]
    fn test_drift_beyond_window() {
        let applicator = Applicator::default();
        let (mut region, span) = drifted(6);
        let err = applicator.apply(&mut region, &span, &link("Ex. 7")).unwrap_err();
        assert_eq!(
            err,
            AnnotationError::ReLocalizationFailed {
                expected: "Ex. 7".to_string(),
                start: 4,
                end: 9,
            }
        );
        assert!(region.read_text().unwrap().contains("Ex. 7"));
    }

    #[test]
    fn test_wider_window_from_config() {
        let applicator = Applicator::new(8, RetryPolicy::attempts(2));
        let (mut region, span) = drifted(8);
        assert!(applicator.apply(&mut region, &span, &link("Ex. 7")).is_ok());
    }

    #[test]
    fn test_search_window_prefers_nearest() {
        let text = "Ex. 1 Ex. 1";
        assert_eq!(search_window(text, "ex. 1", Span::new(5, 10), 5), Some(Span::new(6, 11)));
        assert_eq!(search_window(text, "Ex. 1", Span::new(2, 7), 5), Some(Span::new(0, 5)));
        assert_eq!(search_window(text, "Ex. 2", Span::new(0, 5), 5), None);
    }
}

mod host_fallback {
    use super::*;

    #[test]
    fn test_embedded_object_commits_by_search() {
        let mut region = TextRegion::new("Paragraph 1", RegionKind::Body, "[chart] see Ex. 3.")
            .with_embedded_object(7);
        let span = AnnotationSpan::new(Span::new(12, 17), "Ex. 3");
        let receipt = Applicator::default()
            .apply(&mut region, &span, &link("Ex. 3"))
            .unwrap();
        assert_eq!(receipt.span, Span::new(12, 17));
        assert!(region.text().starts_with("[chart] see [Ex. 3]("));
    }

    #[test]
    fn test_already_linked_text_is_skipped() {
        let mut region =
            TextRegion::new("Paragraph 1", RegionKind::Body, "[Ex. 3](<Ex. 3.pdf>)");
        let span = AnnotationSpan::new(Span::new(1, 6), "Ex. 3");
        let err = Applicator::default()
            .apply(&mut region, &span, &link("Ex. 3"))
            .unwrap_err();
        assert!(matches!(err, AnnotationError::MutationFailed { .. }));
        assert_eq!(region.text(), "[Ex. 3](<Ex. 3.pdf>)");
    }
}
