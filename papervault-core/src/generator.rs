//! Word-count-validated generation with bounded re-prompting.
//!
//! The generator owns the conversation for one sub-question: every failed
//! attempt appends the rejected answer and a feedback turn, so the model
//! sees exactly what it produced and why it was rejected. Nothing is ever
//! discarded — exhaustion degrades to the last answer plus an inline
//! warning, and an upstream failure degrades to a skip placeholder.

use crate::llm::ChatMessage;
use crate::types::SubQuestion;

/// Measured length of a generated answer: non-whitespace characters.
pub fn answer_length(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// Placeholder written in place of an answer when the upstream API gave up.
pub fn skip_placeholder(question: &str) -> String {
    format!(
        "# {question}\n\n**[分析跳过：API调用失败]**\n\n该问题因API错误被跳过，请稍后手动补充分析。"
    )
}

pub struct RetryingGenerator {
    max_attempts: usize,
}

impl RetryingGenerator {
    pub fn new(max_attempts: usize) -> Self {
        Self { max_attempts }
    }

    /// Drive `generate_fn` until the answer lands inside the sub-question's
    /// acceptance band or attempts run out.
    ///
    /// `generate_fn` is the external completion call; transport retries are
    /// its own concern. By the time it returns an error here, it has given
    /// up for good, and the result is a skip placeholder rather than a
    /// crashed batch.
    pub fn generate<F>(
        &self,
        initial_messages: Vec<ChatMessage>,
        sub_question: &SubQuestion,
        mut generate_fn: F,
    ) -> String
    where
        F: FnMut(&[ChatMessage]) -> anyhow::Result<String>,
    {
        let policy = sub_question.policy();
        let mut messages = initial_messages;
        let mut last_answer = String::new();

        for attempt in 1..=self.max_attempts {
            println!("💭 Generating... (attempt {}/{})", attempt, self.max_attempts);

            let answer = match generate_fn(&messages) {
                Ok(text) => text,
                Err(e) => {
                    println!("⚠️  Generation call failed, skipping this question: {e}");
                    return skip_placeholder(&sub_question.question);
                }
            };

            let count = answer_length(&answer);
            if (policy.validate_min..=policy.validate_max).contains(&count) {
                println!(
                    "✅ Length check passed: {count} chars (target {}-{})",
                    policy.target_min, policy.target_max
                );
                return answer;
            }

            println!(
                "⚠️  Length check failed: {count} chars, need {}-{}",
                policy.validate_min, policy.validate_max
            );
            let feedback = if count < policy.validate_min {
                format!(
                    "回答字数不足（{count}字）。需要至少{}字，目标{}-{}字。请大幅扩充分析深度和细节。",
                    policy.validate_min, policy.target_min, policy.target_max
                )
            } else {
                format!(
                    "回答字数过多（{count}字）。需要控制在{}字以内，目标{}-{}字。请精简表述。",
                    policy.validate_max, policy.target_min, policy.target_max
                )
            };

            messages.push(ChatMessage::assistant(&answer));
            messages.push(ChatMessage::user(&format!(
                "字数验证未通过: {feedback}\n请重写，严格遵守字数要求。"
            )));
            last_answer = answer;
        }

        // Soft failure: flag the answer inline instead of dropping it
        let count = answer_length(&last_answer);
        format!(
            "{last_answer}\n\n---\n⚠️ **字数警告**: 当前{count}字，未达到{}-{}字要求（已重试{}次）\n",
            policy.validate_min, policy.validate_max, self.max_attempts
        )
    }
}
