//! # Answer Synthesizer
//!
//! Builds the final model call from the context, the plan and the execution log, and turns
//! the reply into the user-facing answer. Also builds the single call of the non-agentic
//! fallback mode.

use std::sync::Arc;

use crate::domain::agent::{AgentActionResult, AgentPlan};
use crate::domain::error::OrchestratorError;
use crate::domain::traits::LlmProvider;
use crate::infrastructure::llm::{Context, ResponseStream};
use crate::strings::{messages, prompts};

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub model: String,
}

/// One line per result: `- name: STATUS - summary (error: detail)`.
pub fn render_log(log: &[AgentActionResult]) -> String {
    if log.is_empty() {
        return messages::NO_ACTIONS.to_string();
    }
    log.iter()
        .map(|result| {
            let mut line = format!(
                "- {}: {} - {}",
                result.name,
                result.status.as_str().to_uppercase(),
                result.summary
            );
            if let Some(error) = &result.error {
                line.push_str(&format!(" (error: {})", error));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_plan(plan: Option<&AgentPlan>) -> String {
    plan.and_then(|p| serde_json::to_string_pretty(p).ok())
        .unwrap_or_else(|| messages::NO_PLAN.to_string())
}

pub struct AnswerSynthesizer {
    llm: Arc<dyn LlmProvider>,
}

impl AnswerSynthesizer {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    pub fn synthesis_request(
        &self,
        context_summary: &str,
        plan: Option<&AgentPlan>,
        log: &[AgentActionResult],
        question: &str,
    ) -> Context {
        let context = if context_summary.trim().is_empty() {
            messages::NO_CONTEXT
        } else {
            context_summary
        };
        Context::new()
            .add_system_message(prompts::synthesizer_system())
            .add_user_message(prompts::synthesizer_input(
                context,
                &render_plan(plan),
                &render_log(log),
                question,
            ))
    }

    /// Direct question answering for callers without any allowed action.
    pub fn fallback_request(&self, context_summary: &str, question: &str) -> Context {
        let context = if context_summary.trim().is_empty() {
            messages::NO_ACCESSIBLE_ORDERS
        } else {
            context_summary
        };
        Context::new()
            .add_system_message(prompts::assistant_system())
            .add_system_message(prompts::operational_context(context))
            .add_user_message(question)
    }

    pub async fn complete(&self, request: Context) -> Result<Answer, OrchestratorError> {
        let response = self
            .llm
            .chat(request)
            .await
            .map_err(|e| OrchestratorError::ModelUnreachable(e.to_string()))?;
        Ok(self.finish(&response.content, Some(response.model)))
    }

    pub async fn stream(&self, request: Context) -> Result<ResponseStream, OrchestratorError> {
        self.llm
            .chat_stream(request)
            .await
            .map_err(|e| OrchestratorError::ModelUnreachable(e.to_string()))
    }

    pub fn finish(&self, text: &str, model: Option<String>) -> Answer {
        let text = text.trim();
        Answer {
            text: if text.is_empty() {
                messages::EMPTY_ANSWER.to_string()
            } else {
                text.to_string()
            },
            model: model
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| self.llm.default_model().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::AgentActionResult;
    use crate::testing::ScriptedLlm;

    #[test]
    fn test_render_log_lines() {
        let log = vec![
            AgentActionResult::success("update_order_priority", "Order ORD-42 priority changed from 3 to 10.", None),
            AgentActionResult::error(
                "create_order",
                "Action `create_order` is not supported for this user.",
                "Action `create_order` is not supported for this user.",
            ),
            AgentActionResult::skipped("update_order_priority", "Order ORD-42 already has priority 10."),
        ];
        assert_eq!(
            render_log(&log),
            "- update_order_priority: SUCCESS - Order ORD-42 priority changed from 3 to 10.\n\
             - create_order: ERROR - Action `create_order` is not supported for this user. (error: Action `create_order` is not supported for this user.)\n\
             - update_order_priority: SKIPPED - Order ORD-42 already has priority 10."
        );
        assert_eq!(render_log(&[]), messages::NO_ACTIONS);
    }

    #[test]
    fn test_render_plan_fallback() {
        assert_eq!(render_plan(None), messages::NO_PLAN);
    }

    #[tokio::test]
    async fn test_empty_reply_and_missing_model_fall_back() {
        let llm = Arc::new(ScriptedLlm::new(["   "]).without_reported_model());
        let synthesizer = AnswerSynthesizer::new(llm);
        let answer = synthesizer
            .complete(synthesizer.synthesis_request("ctx", None, &[], "q"))
            .await
            .unwrap();
        assert_eq!(answer.text, messages::EMPTY_ANSWER);
        assert_eq!(answer.model, "default-model");
    }

    #[tokio::test]
    async fn test_synthesis_request_carries_log_and_plan() {
        let llm = Arc::new(ScriptedLlm::new(["Done."]));
        let synthesizer = AnswerSynthesizer::new(llm.clone());
        let log = vec![AgentActionResult::success("get_wip_summary", "3 orders in total.", None)];
        let answer = synthesizer
            .complete(synthesizer.synthesis_request("", None, &log, "status?"))
            .await
            .unwrap();
        assert_eq!(answer, Answer { text: "Done.".into(), model: "scripted-model".into() });

        let input = &llm.requests()[0].messages[1].content;
        assert!(input.contains(messages::NO_CONTEXT));
        assert!(input.contains(messages::NO_PLAN));
        assert!(input.contains("- get_wip_summary: SUCCESS - 3 orders in total."));
    }

    #[test]
    fn test_fallback_request_shape() {
        let synthesizer = AnswerSynthesizer::new(Arc::new(ScriptedLlm::new(Vec::<String>::new())));
        let request = synthesizer.fallback_request("", "where is ORD-1?");
        assert_eq!(request.messages.len(), 3);
        assert!(request.messages[1].content.contains(messages::NO_ACCESSIBLE_ORDERS));
        assert_eq!(request.messages[2].content, "where is ORD-1?");
    }
}
