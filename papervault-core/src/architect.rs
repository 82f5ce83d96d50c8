//! Outline generation — the "architect" role.
//!
//! The architect reads a batch of extracted page text and plans the deep
//! dive: a numbered hierarchy of sections, each bound to pages, a content
//! category and 2-4 typed sub-questions. Coverage of detected figures is
//! the prompt's first priority, structure second, question depth third.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::AnalysisConfig;
use crate::error::ArchitectError;
use crate::llm::{ChatMessage, VisionClient};
use crate::types::{DetectedElement, Outline};

/// Cap on batch text forwarded to the model, in characters.
const BATCH_TEXT_CAP: usize = 8000;

// Outermost JSON object in a reply that wraps it in prose.
static JSON_BLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

pub struct ArchitectAgent<'a> {
    client: &'a VisionClient,
    model: String,
    include_appendix: bool,
}

impl<'a> ArchitectAgent<'a> {
    pub fn new(client: &'a VisionClient, config: &AnalysisConfig) -> Self {
        Self {
            client,
            model: config.architect_model.clone(),
            include_appendix: config.include_appendix,
        }
    }

    /// Generate the reading outline for one batch of page text.
    ///
    /// `detected` is the must-cover checklist; pass it on the first batch
    /// only so later batches don't re-outline every figure.
    pub fn generate_outline(
        &self,
        batch_text: &str,
        detected: Option<&[DetectedElement]>,
    ) -> Result<Outline, ArchitectError> {
        let system_prompt = self.build_system_prompt(detected);
        let capped: String = batch_text.chars().take(BATCH_TEXT_CAP).collect();
        let user_prompt = format!(
            "分析这篇论文文本 (Abstract/Intro) 并生成研读大纲。\n\
             **重要：请务必使用中文输出 JSON 内容，并严格遵守层级标号要求。**\n\n{capped}"
        );

        let messages = [
            ChatMessage::system(&system_prompt),
            ChatMessage::user(&user_prompt),
        ];
        let raw = self.client.complete(&self.model, &messages, true)?;
        parse_outline(&raw)
    }

    fn build_system_prompt(&self, detected: Option<&[DetectedElement]>) -> String {
        let appendix_instruction = if self.include_appendix {
            "请分析附录 (Appendix) 部分。"
        } else {
            "请忽略附录 (Appendix)，专注于正文。"
        };

        let mut figures_text = String::new();
        if let Some(elements) = detected {
            if !elements.is_empty() {
                figures_text.push_str("\n\n## 已检测到的图表清单（必须全部分析）\n");
                for element in elements {
                    figures_text.push_str(&format!(
                        "- 第{}页: {}\n",
                        element.page + 1,
                        element.caption
                    ));
                }
                figures_text.push_str("\n**重要**: 以上所有图表都必须在你的分析大纲中体现。\n");
            }
        }

        format!(
            r#"你是一位学术架构师。你的目标是模拟一位"好奇且严谨的研究生"，通读论文摘要和目录后，构建一个**有层级、有标号**的深度研读提纲。

## 核心指令

### ⚠️ 第一优先级：完整覆盖所有视觉元素
**强制要求**：在设计任何问题之前，你必须：
1. **图表清单核查**：检查下方提供的图表清单，每一个图、表、公式都必须在你的大纲中有对应的section
2. **逐一对应**：为每个图表创建专门的分析section（如"3.1.1 Fig 1 任务范式"）
3. **公式追踪**：如果论文中出现编号公式（Equation 1, 2...），必须为每个公式创建分析section
{figures_text}
### 第二优先级：IMRAD结构完整性
1. {appendix_instruction}
2. **结构自检**: 你的大纲必须完整覆盖学术论文的核心结构 (IMRAD: Introduction, Methods, Results, Discussion)。
3. **环节细化**: 每个一级环节（如Methods）必须包含至少2个二级子环节。

### 第三优先级：多维度深度提问
在确保覆盖完整性后，对每个section生成2-4个不同维度的子问题。

请输出符合以下 JSON Schema 的对象：
{{
    "paper_title": "str",
    "summary": "str (用中文)",
    "sections": [
        {{
            "section_title": "str (必须包含层级标号，如 '1. 摘要', '2.1 图表分析')",
            "target_pages": [int (0-indexed)],
            "filename_slug": "str",
            "type": "figure|equation|text",
            "sub_questions": [
                {{
                    "question": "str (具体的探究性问题)",
                    "question_type": "phenomenon|mechanism|critique"
                }}
            ]
        }}
    ]
}}

## 详细策略

### 1. 标号规范 (Hierarchy)
请在 `section_title` 中严格使用标号，例如：
- `1. 核心贡献与摘要`
- `2. 背景 (Introduction)`
- `2.1 核心假设与理论分歧`
- `3. 实验设计 (Methods)`
- `3.1.1 Fig 1 任务范式图解` ← **每个图表必须有这样的section！**
- `3.1.2 Equation 1: logLR计算公式` ← **每个编号公式必须有section！**

### 2. 图表分析section的强制要求
对于每个检测到的图表，你必须创建一个独立的section，包含：
- **type**: 设置为 "figure" (图表) 或 "equation" (公式)
- **target_pages**: 该图表所在的页码
- **section_title**: 明确包含图表编号（如"Fig 1", "Table 2", "Eq. 3"）

### 3. 多维子问题生成 (针对每个section)
**三种问题类型**：
- **phenomenon** (现象描述/"是什么"): 描述图表内容、数据趋势、观察结果
- **mechanism** (机理推导): 探究背后的数学推导、计算原理、神经机制
- **critique** (批判与改进/"为什么"): 质疑设计、识别局限、提出改进

### 4. 覆盖完整性自检清单
在输出最终JSON之前，请自问：
- [ ] 图表清单中的每个图/表是否都有对应的section？
- [ ] 每个编号公式（如果有）是否都被分析？
- [ ] IMRAD四大部分是否都有覆盖？
- [ ] 每个section的sub_questions是否包含2-4个不同类型的问题？

**禁止泛泛而谈**：
*   **❌ 差**：["分析图2", "讲讲实验结果", "说说这个公式"]
*   **✅ 优**：具体、原理向、有上下文的深度提问

请确保生成的"学习地图"逻辑严密，像一份高质量的**研读笔记目录**，且不遗漏任何关键视觉元素。"#
        )
    }
}

/// Parse the model's outline JSON, salvaging the outermost JSON object when
/// the reply wraps it in stray prose or a code fence.
pub fn parse_outline(raw: &str) -> Result<Outline, ArchitectError> {
    match serde_json::from_str::<Outline>(raw) {
        Ok(outline) => Ok(outline),
        Err(first_error) => {
            if let Some(block) = JSON_BLOCK.find(raw) {
                if let Ok(outline) = serde_json::from_str::<Outline>(block.as_str()) {
                    return Ok(outline);
                }
            }
            Err(ArchitectError::SchemaParse(first_error))
        }
    }
}
