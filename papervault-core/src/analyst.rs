//! Section deep-dive — the "analyst" role.
//!
//! One call per sub-question: the rendered page image plus a prompt keyed
//! to the question's cognitive category, driven through the retrying
//! generator. Whatever survives the loop gets a structural audit; failures
//! are marked inline, never dropped.

use crate::config::AnalysisConfig;
use crate::generator::RetryingGenerator;
use crate::llm::{ChatMessage, VisionClient};
use crate::quality::QualityGate;
use crate::types::{ContentType, SubQuestion};

pub struct AnalystAgent<'a> {
    client: &'a VisionClient,
    model: String,
    gate: QualityGate,
    generator: RetryingGenerator,
}

impl<'a> AnalystAgent<'a> {
    pub fn new(client: &'a VisionClient, config: &AnalysisConfig) -> Self {
        Self {
            client,
            model: config.analyst_model.clone(),
            gate: QualityGate::new(&config.quality),
            generator: RetryingGenerator::new(config.retry.max_attempts),
        }
    }

    /// Deep-dive one sub-question against one rendered page.
    pub fn analyze(
        &self,
        page_png: &[u8],
        sub_question: &SubQuestion,
        content_type: ContentType,
    ) -> String {
        let system_prompt = build_system_prompt(sub_question);
        let user_prompt = build_user_prompt(sub_question);
        let messages = vec![
            ChatMessage::system(&system_prompt),
            ChatMessage::user_with_image(&user_prompt, page_png),
        ];

        let client = self.client;
        let model = self.model.clone();
        let answer = self
            .generator
            .generate(messages, sub_question, |conversation| {
                client
                    .complete(&model, conversation, false)
                    .map_err(anyhow::Error::from)
            });

        // Structural audit on the final text. Reviewers can find every
        // soft failure by searching the vault for the callout marker.
        match self.gate.validate(&answer, content_type) {
            Ok(()) => answer,
            Err(critique) => {
                let note = critique.message.replace('\n', "\n> ");
                format!(
                    "{answer}\n\n> [!WARNING] 此内容未完全通过质量验证: {note}\n> 建议人工复核。"
                )
            }
        }
    }
}

fn build_system_prompt(sub_question: &SubQuestion) -> String {
    let policy = sub_question.policy();
    let type_label = sub_question.question_type.label();

    format!(
        r#"你是一位世界顶尖的**理论神经科学家和物理学家**（如 Feynman 或 Hopfield 风格）。
你的任务是对学术论文的特定部分进行深度解析。

## 当前问题类型: {type_label}

根据问题类型，你需要采用不同的分析策略：

### 如果是"phenomenon"（现象描述/"是什么"）:
- **重点**: 客观描述图表趋势、解剖结构或数据特征
- **包含**: 观察到的现象、数据模式、视觉特征

### 如果是"mechanism"（机理推导）:
- **重点**: 解释背后的生成机制
- **必须包含**: 第一性原理推导、每个变量的物理/神经意义、数学公式（使用LaTeX格式）

### 如果是"critique"（目的和批判/"为什么"）:
- **重点**: 质疑设计动机、识别局限性
- **包含**: 为什么要这样设计？这个结论在什么条件下不成立？是否存在替代解释模型？

## 格式规范
1. **全中文输出**
2. **使用Markdown格式**，数学公式使用LaTeX (`$$ ... $$` 或 `$ ... $`)
3. **四维结构**: 回答必须包含 ### [现象]、### [机理]、### [目的]、### [批判] 四个小节
4. **段落控制**: 任何段落不超过5行
5. **关键词加粗**: 核心概念用**粗体**标记
6. **列表化**: 涉及列举使用Bullet Points

**字数要求**: 目标{target_min}-{target_max}字，验证范围{validate_min}-{validate_max}字。
**重要**: 输出后我会进行字数验证。如果不在{validate_min}-{validate_max}字范围内，你需要重写。"#,
        target_min = policy.target_min,
        target_max = policy.target_max,
        validate_min = policy.validate_min,
        validate_max = policy.validate_max,
    )
}

fn build_user_prompt(sub_question: &SubQuestion) -> String {
    let policy = sub_question.policy();
    format!(
        "## 任务\n问题: {question}\n问题类型: {type_label}\n参考资料: 见附图\n\n\
         请针对这个问题进行深度分析，字数控制在{target_min}-{target_max}字之间。",
        question = sub_question.question,
        type_label = sub_question.question_type.label(),
        target_min = policy.target_min,
        target_max = policy.target_max,
    )
}
