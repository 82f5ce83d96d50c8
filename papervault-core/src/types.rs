use serde::{Deserialize, Deserializer, Serialize};
use std::sync::LazyLock;

// ===== OUTLINE DATA MODEL =====
// These types mirror the JSON schema the architect model is instructed to
// emit. Deserialization is deliberately lenient where models drift
// (page numbers as strings, unknown content types).

/// Cognitive category of a probing sub-question. Drives both the prompt
/// framing and the word-count acceptance band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// "What is it": describe figures, trends, observations.
    Phenomenon,
    /// Derive the underlying mechanism, math included.
    Mechanism,
    /// "Why": question the design, find the limits.
    Critique,
}

/// Word-count goals for one question type. All four numbers derive solely
/// from the `QuestionType` variant and are never set independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordCountPolicy {
    /// Soft goal stated in the prompt.
    pub target_min: usize,
    pub target_max: usize,
    /// Hard acceptance band checked after generation.
    pub validate_min: usize,
    pub validate_max: usize,
}

impl QuestionType {
    pub fn word_count_policy(&self) -> WordCountPolicy {
        match self {
            QuestionType::Phenomenon | QuestionType::Mechanism => WordCountPolicy {
                target_min: 1000,
                target_max: 3000,
                validate_min: 600,
                validate_max: 4000,
            },
            QuestionType::Critique => WordCountPolicy {
                target_min: 500,
                target_max: 1500,
                validate_min: 400,
                validate_max: 2000,
            },
        }
    }

    /// Human-readable label used in prompts (the notes are Chinese).
    pub fn label(&self) -> &'static str {
        match self {
            QuestionType::Phenomenon => "现象描述/'是什么'",
            QuestionType::Mechanism => "机理推导",
            QuestionType::Critique => "目的和批判/'为什么'",
        }
    }
}

/// Content category of an outline section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Figure,
    Equation,
    Text,
    /// Catch-all for values the model invents; lowest dedup priority.
    Other,
}

// Hand-written so unknown category strings degrade to `Other` instead of
// failing the whole outline parse.
impl<'de> Deserialize<'de> for ContentType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "figure" => ContentType::Figure,
            "equation" => ContentType::Equation,
            "text" => ContentType::Text,
            _ => ContentType::Other,
        })
    }
}

impl ContentType {
    /// Figures and equations outrank plain text when duplicate sections
    /// are merged; unknown categories rank below everything.
    pub fn dedup_priority(&self) -> u8 {
        match self {
            ContentType::Figure | ContentType::Equation => 2,
            ContentType::Text => 1,
            ContentType::Other => 0,
        }
    }

    /// Tag written into the spoke note frontmatter.
    pub fn tag(&self) -> &'static str {
        match self {
            ContentType::Figure => "figure",
            ContentType::Equation => "equation",
            ContentType::Text => "text",
            ContentType::Other => "other",
        }
    }

    pub fn is_visual(&self) -> bool {
        matches!(self, ContentType::Figure | ContentType::Equation)
    }
}

/// One probing question bound to a cognitive category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubQuestion {
    pub question: String,
    pub question_type: QuestionType,
}

impl SubQuestion {
    pub fn policy(&self) -> WordCountPolicy {
        self.question_type.word_count_policy()
    }
}

/// One analyzable unit of a paper: a titled slice bound to page(s), a
/// content category and 2-4 sub-questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    #[serde(rename = "section_title")]
    pub title: String,
    /// 0-indexed pages this section draws on. May be empty — such sections
    /// survive dedup but are skipped by the analyst loop.
    #[serde(deserialize_with = "lenient_pages")]
    pub target_pages: Vec<usize>,
    pub filename_slug: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub sub_questions: Vec<SubQuestion>,
}

/// The reading plan for one paper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outline {
    pub paper_title: String,
    pub summary: String,
    pub sections: Vec<Section>,
}

/// A figure/table caption found by the page scanner. Read-only reference
/// for the coverage audit and the architect checklist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedElement {
    /// 0-indexed page the caption was found on.
    pub page: usize,
    pub caption: String,
}

/// One finished question/answer block, ready for the vault writer.
#[derive(Debug, Clone)]
pub struct SectionAnalysis {
    pub question: String,
    pub answer: String,
    /// Obsidian heading anchor, e.g. "sub-q1".
    pub anchor_id: String,
}

static PAGE_NUMBER: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\d+").unwrap());

/// Accept page lists where models emit strings like "page 3" or "3"
/// alongside plain integers; non-salvageable entries are dropped.
fn lenient_pages<'de, D>(deserializer: D) -> Result<Vec<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    let mut pages = Vec::with_capacity(raw.len());
    for value in raw {
        match value {
            serde_json::Value::Number(n) => {
                if let Some(p) = n.as_u64() {
                    pages.push(p as usize);
                }
            }
            serde_json::Value::String(s) => {
                if let Some(m) = PAGE_NUMBER.find(&s) {
                    if let Ok(p) = m.as_str().parse() {
                        pages.push(p);
                    }
                }
            }
            _ => {}
        }
    }
    Ok(pages)
}
