//! Progress preview de-duplication.
//!
//! The service appends to its preview list rather than replacing it, so the
//! same line (or a reworded line about the same stage) shows up again on
//! every poll. Display layers collapse the stream to at most one line per
//! semantic stage and never repeat an exact string.

use std::collections::HashSet;

/// Semantic stages of the remote planning pipeline, matched on stable
/// substring markers in the preview text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreviewCategory {
    ProfileAnalysis,
    CulturalDiscovery,
    Compatibility,
    VenueSelection,
    FinalAssembly,
}

impl PreviewCategory {
    /// Classify a preview line by substring markers, case-insensitively.
    /// Unrecognized lines stay unclassified and are deduped by exact value
    /// only.
    pub fn classify(line: &str) -> Option<Self> {
        let lower = line.to_lowercase();
        let markers: [(&[&str], PreviewCategory); 5] = [
            (
                &["personality", "profile"],
                PreviewCategory::ProfileAnalysis,
            ),
            (
                &["cultural", "taste", "meme"],
                PreviewCategory::CulturalDiscovery,
            ),
            (
                &["compatibility", "spark", "match"],
                PreviewCategory::Compatibility,
            ),
            (
                &["venue", "hotspot", "location"],
                PreviewCategory::VenueSelection,
            ),
            (&["finaliz", "assembl"], PreviewCategory::FinalAssembly),
        ];
        for (subs, cat) in markers {
            if subs.iter().any(|m| lower.contains(m)) {
                return Some(cat);
            }
        }
        None
    }
}

/// Stateful filter carried across successive snapshots of one job.
///
/// A line is emitted only if neither its exact value nor (when classified)
/// its category has been emitted before. Pure with respect to its inputs and
/// order-preserving on first occurrences.
#[derive(Debug, Default)]
pub struct PreviewFilter {
    seen_exact: HashSet<String>,
    seen_categories: HashSet<PreviewCategory>,
}

impl PreviewFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether `line` should be displayed, recording it either way.
    pub fn push(&mut self, line: &str) -> bool {
        if self.seen_exact.contains(line) {
            return false;
        }
        if let Some(cat) = PreviewCategory::classify(line) {
            if !self.seen_categories.insert(cat) {
                // Same stage already shown under different wording.
                self.seen_exact.insert(line.to_string());
                return false;
            }
        }
        self.seen_exact.insert(line.to_string());
        true
    }

    /// Filter a full preview sequence, keeping first occurrences in order.
    pub fn filter<'a, I>(&mut self, lines: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        lines
            .into_iter()
            .filter(|l| self.push(l))
            .map(str::to_string)
            .collect()
    }
}

/// One-shot form of the filter for a single preview sequence.
pub fn dedupe(previews: &[String]) -> Vec<String> {
    PreviewFilter::new().filter(previews.iter().map(String::as_str))
}
