//! Outline compression: merge candidate sections that cover the same
//! subject, then audit figure coverage.
//!
//! Batched outline generation produces overlapping sections — the same
//! figure outlined in two batches, the introduction revisited with a new
//! title. Deduplication keeps the first occurrence of each subject and
//! only replaces it when a later candidate is strictly better.

use std::collections::BTreeSet;

use crate::similarity;
use crate::types::{DetectedElement, Section};

/// Outcome of one deduplication pass, for reporting only — the kept
/// sections are returned separately and never depend on this.
#[derive(Debug, Clone)]
pub struct DedupReport {
    pub input_count: usize,
    pub kept_count: usize,
    pub removed_count: usize,
    pub coverage: CoverageReport,
}

/// Advisory audit of detected visual elements against the sections that
/// analyze them. Never mutates the outline.
#[derive(Debug, Clone)]
pub struct CoverageReport {
    /// Captions the scanner found in the PDF.
    pub detected_elements: usize,
    /// Kept sections typed figure or equation.
    pub visual_sections: usize,
    /// Normalized tokens detected in the PDF but absent from every kept
    /// figure/equation section title, sorted.
    pub missing_tokens: Vec<String>,
}

impl DedupReport {
    pub fn print(&self) {
        if self.removed_count > 0 {
            println!(
                "🔧 Dedup: removed {} duplicate sections, kept {} unique",
                self.removed_count, self.kept_count
            );
        }
        println!(
            "📊 Coverage: {} captions detected, {} figure/equation sections planned",
            self.coverage.detected_elements, self.coverage.visual_sections
        );
        if self.coverage.missing_tokens.is_empty() {
            println!("   ✅ Every detected visual element has a matching section");
        } else {
            println!(
                "   ⚠️  Possibly unanalyzed: {}",
                self.coverage.missing_tokens.join(", ")
            );
        }
    }
}

/// Replacement rule for two similar sections: figure/equation outranks
/// text, and on equal rank the candidate with strictly more sub-questions
/// wins. The incumbent keeps ties.
fn should_replace(existing: &Section, incoming: &Section) -> bool {
    let existing_priority = existing.content_type.dedup_priority();
    let incoming_priority = incoming.content_type.dedup_priority();
    if incoming_priority != existing_priority {
        return incoming_priority > existing_priority;
    }
    incoming.sub_questions.len() > existing.sub_questions.len()
}

/// Compress an ordered candidate list into unique sections.
///
/// Strictly sequential over input order. Each incoming section is compared
/// against the kept sections' *first-kept* titles; the first similar title
/// decides the merge, and a replacement takes over the incumbent's position
/// (first-kept order is preserved).
pub fn deduplicate(
    sections: Vec<Section>,
    detected: &[DetectedElement],
) -> (Vec<Section>, DedupReport) {
    let input_count = sections.len();
    let mut kept: Vec<Section> = Vec::new();
    // (first-kept title, position in `kept`) in insertion order. The key
    // stays the original title even after a replacement so later
    // candidates match against the subject as it was first named.
    let mut keys: Vec<(String, usize)> = Vec::new();

    for section in sections {
        let hit = keys
            .iter()
            .find(|(key, _)| similarity::are_similar(&section.title, key))
            .map(|(_, position)| *position);

        match hit {
            Some(position) => {
                if should_replace(&kept[position], &section) {
                    kept[position] = section;
                }
            }
            None => {
                keys.push((section.title.clone(), kept.len()));
                kept.push(section);
            }
        }
    }

    let coverage = coverage_report(&kept, detected);
    let report = DedupReport {
        input_count,
        kept_count: kept.len(),
        removed_count: input_count - kept.len(),
        coverage,
    };
    (kept, report)
}

fn coverage_report(kept: &[Section], detected: &[DetectedElement]) -> CoverageReport {
    let detected_tokens: BTreeSet<String> = detected
        .iter()
        .filter_map(|element| similarity::extract_visual_token(&element.caption))
        .collect();

    let visual_sections: Vec<&Section> = kept
        .iter()
        .filter(|section| section.content_type.is_visual())
        .collect();

    let analyzed_tokens: BTreeSet<String> = visual_sections
        .iter()
        .filter_map(|section| similarity::extract_visual_token(&section.title))
        .collect();

    CoverageReport {
        detected_elements: detected.len(),
        visual_sections: visual_sections.len(),
        missing_tokens: detected_tokens
            .difference(&analyzed_tokens)
            .cloned()
            .collect(),
    }
}
