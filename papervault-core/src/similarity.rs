//! Title similarity for outline deduplication.
//!
//! Two section titles are "similar" when they reference the same figure,
//! table or equation, name the same structural part of the paper, or read
//! nearly the same. Rules are checked in that order; the first conclusive
//! rule decides.

use regex::Regex;
use std::sync::LazyLock;

/// Lexical-ratio threshold for the fallback rule. Titles scoring above
/// this are treated as duplicates.
const LEXICAL_THRESHOLD: f64 = 0.7;

static VISUAL_REF_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)Fig\.?\s*\d+[a-z]?",
        r"(?i)Figure\s*\d+[a-z]?",
        r"(?i)Table\s*\d+",
        r"(?i)Eq\.?\s*\d+",
        r"(?i)Equation\s*\d+",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Structural keywords checked by substring containment, first match wins.
const STRUCTURAL_KEYWORDS: [&str; 9] = [
    "introduction",
    "abstract",
    "method",
    "result",
    "discussion",
    "conclusion",
    "background",
    "experiment",
    "analysis",
];

/// Extract a normalized figure/table/equation token from a title,
/// e.g. "3.1.1 Fig. 1a 任务范式" -> "fig.1a".
pub fn extract_visual_token(title: &str) -> Option<String> {
    for pattern in VISUAL_REF_PATTERNS.iter() {
        if let Some(m) = pattern.find(title) {
            let token: String = m
                .as_str()
                .to_lowercase()
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            return Some(token);
        }
    }
    None
}

/// Extract a structural keyword ("introduction", "method", ...) if the
/// title names one.
pub fn extract_structural_keyword(title: &str) -> Option<&'static str> {
    let lower = title.to_lowercase();
    STRUCTURAL_KEYWORDS
        .iter()
        .find(|keyword| lower.contains(**keyword))
        .copied()
}

/// Normalized sequence-alignment ratio in [0, 1] over lower-cased titles.
fn lexical_ratio(a: &str, b: &str) -> f64 {
    let a_lower = a.to_lowercase();
    let b_lower = b.to_lowercase();
    rapidfuzz::fuzz::ratio(a_lower.chars(), b_lower.chars()) / 100.0
}

/// Decide whether two titles refer to the same logical subject.
pub fn are_similar(a: &str, b: &str) -> bool {
    // 1. Same figure/table/equation referenced
    if let (Some(token_a), Some(token_b)) = (extract_visual_token(a), extract_visual_token(b)) {
        if token_a == token_b {
            return true;
        }
    }

    // 2. Same structural part of the paper
    if let (Some(key_a), Some(key_b)) =
        (extract_structural_keyword(a), extract_structural_keyword(b))
    {
        if key_a == key_b {
            return true;
        }
    }

    // 3. Lexical fallback for titles with no extractable reference
    lexical_ratio(a, b) > LEXICAL_THRESHOLD
}
