//! Ordered candidate evaluation.
//!
//! Several parts of the linker try a fixed list of alternatives and keep the
//! results of the first one that produces anything: filename prefixes during
//! exhibit resolution, page-reference forms during pattern synthesis, exhibit
//! patterns for a single cell.

/// Evaluate `candidates` in order and return the first one whose probe yields
/// a non-empty result, together with that result.
///
/// Later candidates are never evaluated once one succeeds, and results are
/// never merged across candidates.
pub fn first_match<C, T, I, F>(candidates: I, mut probe: F) -> Option<(C, Vec<T>)>
where
    I: IntoIterator<Item = C>,
    F: FnMut(&C) -> Vec<T>,
{
    for candidate in candidates {
        let found = probe(&candidate);
        if !found.is_empty() {
            return Some((candidate, found));
        }
    }
    None
}
