//! Post-generation content checks.
//!
//! The gate never talks to the model itself — it hands back a critique
//! message phrased so the caller can feed it straight into the
//! conversation, or surface it as a reviewer warning.

use crate::config::QualityGateConfig;
use crate::types::ContentType;

/// The four cognitive-dimension tags every analysis must carry.
/// Generated notes are Chinese, so the literal tags are too.
pub const REQUIRED_TAGS: [&str; 4] = ["[现象]", "[机理]", "[目的]", "[批判]"];

/// A failed check, phrased as actionable feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Critique {
    pub message: String,
}

pub struct QualityGate {
    min_length: usize,
    max_length: usize,
}

impl QualityGate {
    pub fn new(config: &QualityGateConfig) -> Self {
        Self {
            min_length: config.min_length,
            max_length: config.max_length,
        }
    }

    /// Content length ignoring all whitespace. CJK text has no word
    /// boundaries, so characters are the unit.
    pub fn content_length(content: &str) -> usize {
        content.chars().filter(|c| !c.is_whitespace()).count()
    }

    /// Validate generated content for one section category. Checks run in
    /// order and short-circuit on the first failure: length band, math
    /// notation (visual categories only), then the four dimension tags.
    pub fn validate(&self, content: &str, category: ContentType) -> Result<(), Critique> {
        let clean_len = Self::content_length(content);
        if clean_len < self.min_length {
            return Err(Critique {
                message: format!(
                    "回答字数严重不足（当前约 {clean_len} 字）。目标需 {}-{} 字。请大幅扩充原理推导和细节分析。",
                    self.min_length, self.max_length
                ),
            });
        }
        if clean_len > self.max_length {
            return Err(Critique {
                message: format!(
                    "回答字数过多（{clean_len} 字），请精简到 {} 字以内。",
                    self.max_length
                ),
            });
        }

        // Figure and equation analyses must show their math
        if category.is_visual() && !content.contains('$') {
            return Err(Critique {
                message: "未检测到数学公式（LaTeX格式）。作为理论分析，必须包含推导公式（使用 $$ 或 $）。"
                    .to_string(),
            });
        }

        let missing: Vec<&str> = REQUIRED_TAGS
            .iter()
            .filter(|tag| !content.contains(**tag))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(Critique {
                message: format!(
                    "缺失认知维度分析: {}。请确保回答包含以下四个维度的完整分析：\n\
                     1. ### [现象] ... (描述观察)\n\
                     2. ### [机理] ... (第一性原理/公式推导)\n\
                     3. ### [目的] ... (计算目标/演化意义)\n\
                     4. ### [批判] ... (局限性/替代解释)",
                    missing.join(", ")
                ),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> QualityGate {
        QualityGate::new(&QualityGateConfig::default())
    }

    fn compliant_content(len: usize) -> String {
        let mut content = String::from(
            "### [现象] 观察到的现象\n### [机理] 推导 $E = mc^2$ 说明\n### [目的] 计算目标\n### [批判] 局限性\n",
        );
        while QualityGate::content_length(&content) < len {
            content.push('析');
        }
        content
    }

    #[test]
    fn test_short_content_fails_with_count() {
        let err = gate()
            .validate(&"短".repeat(50), ContentType::Figure)
            .unwrap_err();
        assert!(err.message.contains("50"));
        assert!(err.message.contains("600"));
    }

    #[test]
    fn test_overlong_content_fails() {
        let err = gate()
            .validate(&"长".repeat(4000), ContentType::Text)
            .unwrap_err();
        assert!(err.message.contains("字数过多"));
        assert!(err.message.contains("3500"));
    }

    #[test]
    fn test_figure_without_math_fails() {
        let err = gate()
            .validate(&"述".repeat(1000), ContentType::Figure)
            .unwrap_err();
        assert!(err.message.contains("数学公式"));
    }

    #[test]
    fn test_text_without_math_passes_math_check() {
        // Text category skips the math check; the tag check fires instead
        let err = gate()
            .validate(&"述".repeat(1000), ContentType::Text)
            .unwrap_err();
        assert!(err.message.contains("缺失认知维度分析"));
    }

    #[test]
    fn test_missing_tags_are_all_listed() {
        let mut content = String::from("### [现象] 观察 $x$ ");
        content.push_str(&"述".repeat(1000));
        let err = gate().validate(&content, ContentType::Figure).unwrap_err();
        // Only the three absent tags appear in the missing list
        assert!(err.message.starts_with("缺失认知维度分析: [机理], [目的], [批判]"));
    }

    #[test]
    fn test_compliant_figure_content_passes() {
        let content = compliant_content(1200);
        assert!(gate().validate(&content, ContentType::Figure).is_ok());
        assert!(gate().validate(&content, ContentType::Equation).is_ok());
    }

    #[test]
    fn test_whitespace_does_not_count() {
        assert_eq!(QualityGate::content_length("a b\nc\t d"), 4);
        assert_eq!(QualityGate::content_length("  \n\t "), 0);
    }
}
