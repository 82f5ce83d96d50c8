//! Caption detection over extracted page text.
//!
//! A cheap regex sweep finds figure/table caption lines before any model
//! is involved. The result feeds two consumers: the architect prompt (as a
//! must-cover checklist) and the post-dedup coverage audit.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::types::DetectedElement;

// Marker + separator + 5-100 chars of caption tail on the same line.
static CAPTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)Fig\.?\s*\d+[a-z]?[\.:：]?\s*[^\n]{5,100}",
        r"(?i)Figure\s*\d+[a-z]?[\.:：]?\s*[^\n]{5,100}",
        r"(?i)Table\s*\d+[a-z]?[\.:：]?\s*[^\n]{5,100}",
        r"图\s*\d+[a-z]?[\.:：]?\s*[^\n]{5,100}",
        r"表\s*\d+[a-z]?[\.:：]?\s*[^\n]{5,100}",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Scan every page's text for figure/table captions, in page order.
/// Repeated captions on the same page are reported once.
pub fn scan_pages(page_texts: &[String]) -> Vec<DetectedElement> {
    let mut elements = Vec::new();
    for (page, text) in page_texts.iter().enumerate() {
        let mut seen: HashSet<String> = HashSet::new();
        for pattern in CAPTION_PATTERNS.iter() {
            for m in pattern.find_iter(text) {
                let caption = m.as_str().trim().to_string();
                if seen.insert(caption.clone()) {
                    elements.push(DetectedElement { page, caption });
                }
            }
        }
    }
    elements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_english_and_chinese_captions() {
        let pages = vec![
            "Some intro text.\nFig. 1: Overview of the task paradigm\nmore text".to_string(),
            "结果部分\n图 2: 神经响应随时间变化的曲线\nTable 1. Ablation results summary".to_string(),
        ];
        let elements = scan_pages(&pages);
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].page, 0);
        assert!(elements[0].caption.starts_with("Fig. 1"));
        // Within a page, results follow pattern order (Table before 图)
        assert_eq!(elements[1].page, 1);
        assert!(elements[1].caption.starts_with("Table 1"));
        assert!(elements[2].caption.starts_with("图 2"));
    }

    #[test]
    fn test_short_caption_tails_ignored() {
        // Under 5 trailing chars is treated as an inline reference, not a caption
        let pages = vec!["as shown in Fig. 3\nnext line".to_string()];
        assert!(scan_pages(&pages).is_empty());
    }

    #[test]
    fn test_repeated_caption_on_page_reported_once() {
        let pages =
            vec!["Fig. 4: Encoder details\nsome text\nFig. 4: Encoder details".to_string()];
        let elements = scan_pages(&pages);
        assert_eq!(elements.len(), 1);
    }
}
