//! # Prompts
//!
//! Renders the prompt templates under `prompts/` for the planning call, the answer call and
//! the non-agentic fallback call.

/// A builder for rendering prompts with context.
pub struct PromptRenderer<'a> {
    template: &'a str,
    replacements: Vec<(&'a str, String)>,
}

impl<'a> PromptRenderer<'a> {
    pub fn new(template: &'a str) -> Self {
        Self {
            template,
            replacements: Vec::new(),
        }
    }

    pub fn set(mut self, key: &'a str, value: impl Into<String>) -> Self {
        self.replacements.push((key, value.into()));
        self
    }

    /// Substitutes placeholders in a single left-to-right pass, so values that happen to
    /// contain `{{...}}` (order notes, user questions) are never expanded themselves.
    pub fn render(self) -> String {
        let mut result = String::with_capacity(self.template.len());
        let mut rest = self.template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let candidate = &rest[start..];
            match self
                .replacements
                .iter()
                .find(|(key, _)| candidate.starts_with(key))
            {
                Some((key, value)) => {
                    result.push_str(value);
                    rest = &candidate[key.len()..];
                }
                None => {
                    let end = candidate.find("}}").map(|e| e + 2).unwrap_or(2);
                    tracing::error!(
                        "[PROMPT RENDER ERROR] Unreplaced placeholder found in template: {}",
                        &candidate[..end.min(candidate.len())]
                    );
                    result.push_str("{{");
                    rest = &candidate[2..];
                }
            }
        }
        result.push_str(rest);
        result
    }
}

pub const PLANNER_TEMPLATE: &str = include_str!("../../prompts/planner.md");
pub const PLANNER_INPUT_TEMPLATE: &str = include_str!("../../prompts/planner_input.md");
pub const SYNTHESIZER_TEMPLATE: &str = include_str!("../../prompts/synthesizer.md");
pub const SYNTHESIZER_INPUT_TEMPLATE: &str = include_str!("../../prompts/synthesizer_input.md");
pub const ASSISTANT_TEMPLATE: &str = include_str!("../../prompts/assistant.md");

/// System prompt for the planning call; `actions` is one catalog line per allowed action.
pub fn planner_system(actions: &str) -> String {
    PromptRenderer::new(PLANNER_TEMPLATE)
        .set("{{ACTIONS}}", actions)
        .render()
}

pub fn planner_input(context: &str, question: &str) -> String {
    PromptRenderer::new(PLANNER_INPUT_TEMPLATE)
        .set("{{CONTEXT}}", context)
        .set("{{QUESTION}}", question)
        .render()
}

pub fn synthesizer_system() -> String {
    SYNTHESIZER_TEMPLATE.to_string()
}

pub fn synthesizer_input(context: &str, plan: &str, log: &str, question: &str) -> String {
    PromptRenderer::new(SYNTHESIZER_INPUT_TEMPLATE)
        .set("{{CONTEXT}}", context)
        .set("{{PLAN}}", plan)
        .set("{{LOG}}", log)
        .set("{{QUESTION}}", question)
        .render()
}

pub fn assistant_system() -> String {
    ASSISTANT_TEMPLATE.to_string()
}

pub fn operational_context(summary: &str) -> String {
    format!("Operational context:\n{}", summary)
}
