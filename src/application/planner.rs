//! # Plan Generator
//!
//! One model round trip that proposes which allowed actions to run for a request.

use std::sync::Arc;

use crate::application::parsing::parse_plan;
use crate::application::registry::AllowedActions;
use crate::domain::agent::AgentPlan;
use crate::domain::error::OrchestratorError;
use crate::domain::traits::LlmProvider;
use crate::infrastructure::llm::Context;
use crate::strings::{messages, prompts};

pub struct PlanGenerator {
    llm: Arc<dyn LlmProvider>,
}

impl PlanGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    pub async fn generate(
        &self,
        question: &str,
        context_summary: &str,
        allowed: &AllowedActions<'_>,
    ) -> Result<AgentPlan, OrchestratorError> {
        let context = if context_summary.trim().is_empty() {
            messages::NO_CONTEXT
        } else {
            context_summary
        };

        let request = Context::new()
            .add_system_message(prompts::planner_system(&allowed.catalog()))
            .add_user_message(prompts::planner_input(context, question));

        let response = self
            .llm
            .chat(request)
            .await
            .map_err(|e| OrchestratorError::ModelUnreachable(e.to_string()))?;

        let plan = parse_plan(&response.content).inspect_err(|e| {
            tracing::warn!("Planner reply rejected: {}", e);
            tracing::debug!("Rejected planner reply: {}", response.content);
        })?;

        tracing::info!(
            "Plan: intent={:?}, {} actions proposed",
            plan.intent,
            plan.actions.len()
        );
        Ok(plan)
    }
}
