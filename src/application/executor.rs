//! # Plan Executor
//!
//! Runs a plan's actions one at a time, in the proposed order. Every action yields exactly
//! one log entry; a failing action never stops the ones after it, and nothing is rolled back.

use crate::application::registry::{ActionFailure, ActionOutcome, AllowedActions};
use crate::domain::agent::{AgentActionResult, AgentPlan, ExecutionContext, PlannedAction};
use crate::domain::traits::WorkflowBackend;
use crate::strings::messages;

pub struct PlanExecutor<'a> {
    backend: &'a dyn WorkflowBackend,
    allowed: &'a AllowedActions<'a>,
}

impl<'a> PlanExecutor<'a> {
    pub fn new(backend: &'a dyn WorkflowBackend, allowed: &'a AllowedActions<'a>) -> Self {
        Self { backend, allowed }
    }

    pub async fn execute(
        &self,
        plan: &AgentPlan,
        context: &ExecutionContext,
    ) -> Vec<AgentActionResult> {
        let mut log = Vec::with_capacity(plan.actions.len());
        for action in &plan.actions {
            let result = self.run_one(action, context).await;
            tracing::info!(
                "Action {} -> {}: {}",
                result.name,
                result.status.as_str(),
                result.summary
            );
            log.push(result);
        }
        log
    }

    async fn run_one(&self, action: &PlannedAction, context: &ExecutionContext) -> AgentActionResult {
        let name = action.name.trim();
        let Some(definition) = self.allowed.get(name) else {
            let summary = messages::action_not_supported(name);
            return AgentActionResult::error(name, summary.clone(), summary);
        };

        match definition
            .handler
            .run(self.backend, context, &action.arguments)
            .await
        {
            Ok(ActionOutcome::Completed { summary, data }) => {
                AgentActionResult::success(name, summary, data)
            }
            Ok(ActionOutcome::Skipped { summary }) => AgentActionResult::skipped(name, summary),
            Err(ActionFailure::Validation(detail)) => {
                AgentActionResult::error(name, messages::invalid_arguments(name), detail)
            }
            Err(ActionFailure::Backend(e)) => {
                AgentActionResult::error(name, messages::action_failed(name), e.message)
            }
        }
    }
}
