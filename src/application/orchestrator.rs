//! # Orchestrator
//!
//! Drives one assistant request end to end: input checks, role resolution, context, then
//! either plan → execute → synthesize or the single-call fallback when the caller may not run
//! any action. The streaming variant shares every step except the last model call.

use async_stream::stream;
use futures::{Stream, StreamExt};
use std::sync::Arc;

use crate::application::context::{WorkflowContext, build_context};
use crate::application::executor::PlanExecutor;
use crate::application::planner::PlanGenerator;
use crate::application::registry::ActionRegistry;
use crate::application::roles::{RoleSet, resolve_roles};
use crate::application::synthesizer::{Answer, AnswerSynthesizer};
use crate::domain::agent::{
    AgentActionResult, AgentEvent, AgentPlan, AgentRequest, AgentResult, ExecutionContext,
};
use crate::domain::config::AgentLimits;
use crate::domain::error::OrchestratorError;
use crate::domain::traits::{LlmProvider, WorkflowBackend};
use crate::infrastructure::llm::Context;
use crate::strings::messages;

/// Request input after validation.
#[derive(Debug, Clone)]
struct Prepared {
    question: String,
    credential: String,
}

/// Everything produced before the final model call.
struct Turn {
    context: WorkflowContext,
    plan: Option<AgentPlan>,
    actions: Vec<AgentActionResult>,
    final_request: Context,
}

impl Turn {
    fn into_result(self, answer: Answer) -> AgentResult {
        AgentResult {
            answer: answer.text,
            model: answer.model,
            context_summary: self.context.summary,
            context_warning: self.context.warning,
            plan: self.plan,
            actions: self.actions,
        }
    }
}

pub struct Orchestrator {
    backend: Arc<dyn WorkflowBackend>,
    registry: Arc<ActionRegistry>,
    planner: PlanGenerator,
    synthesizer: AnswerSynthesizer,
    limits: AgentLimits,
}

impl Orchestrator {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        backend: Arc<dyn WorkflowBackend>,
        registry: Arc<ActionRegistry>,
        limits: AgentLimits,
    ) -> Self {
        Self {
            backend,
            registry,
            planner: PlanGenerator::new(llm.clone()),
            synthesizer: AnswerSynthesizer::new(llm),
            limits,
        }
    }

    pub async fn ask(&self, request: AgentRequest) -> Result<AgentResult, OrchestratorError> {
        let prepared = self.prepare(&request)?;
        let turn = self.run_turn(&prepared).await?;
        let answer = self.synthesizer.complete(turn.final_request.clone()).await?;
        tracing::info!("Answer ready ({} chars, model {})", answer.text.len(), answer.model);
        Ok(turn.into_result(answer))
    }

    /// Input errors are returned before the stream starts; every later failure is delivered
    /// as the stream's final `Error` event.
    pub fn ask_stream(
        self: Arc<Self>,
        request: AgentRequest,
    ) -> Result<impl Stream<Item = AgentEvent> + Send + 'static, OrchestratorError> {
        let prepared = self.prepare(&request)?;
        let orchestrator = self;

        Ok(stream! {
            let turn = match orchestrator.run_turn(&prepared).await {
                Ok(turn) => turn,
                Err(e) => {
                    yield AgentEvent::Error { message: e.to_string() };
                    return;
                }
            };

            let mut chunks = match orchestrator.synthesizer.stream(turn.final_request.clone()).await {
                Ok(chunks) => chunks,
                Err(e) => {
                    yield AgentEvent::Error { message: e.to_string() };
                    return;
                }
            };

            let mut text = String::new();
            let mut model = None;
            while let Some(chunk) = chunks.next().await {
                match chunk {
                    Ok(chunk) => {
                        if chunk.model.is_some() {
                            model = chunk.model;
                        }
                        if !chunk.delta.is_empty() {
                            text.push_str(&chunk.delta);
                            yield AgentEvent::Token { delta: chunk.delta };
                        }
                    }
                    Err(e) => {
                        let error = OrchestratorError::ModelUnreachable(e.to_string());
                        yield AgentEvent::Error { message: error.to_string() };
                        return;
                    }
                }
            }

            let answer = orchestrator.synthesizer.finish(&text, model);
            yield AgentEvent::Conversation { final_state: turn.into_result(answer) };
        })
    }

    fn prepare(&self, request: &AgentRequest) -> Result<Prepared, OrchestratorError> {
        let question = request.question.as_deref().map(str::trim).unwrap_or_default();
        if question.is_empty() {
            return Err(OrchestratorError::EmptyQuestion);
        }
        let credential = request
            .credential
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(OrchestratorError::MissingCredential)?;

        Ok(Prepared {
            question: question.chars().take(self.limits.max_question_chars).collect(),
            credential: credential.to_string(),
        })
    }

    async fn run_turn(&self, prepared: &Prepared) -> Result<Turn, OrchestratorError> {
        let (roles, username, profile_warning) = self.resolve_caller(&prepared.credential).await;
        let mut context = build_context(
            self.backend.as_ref(),
            &prepared.credential,
            self.limits.max_context_orders,
        )
        .await;
        if let Some(warning) = profile_warning {
            context.warning = Some(match context.warning.take() {
                Some(existing) => format!("{} {}", existing, warning),
                None => warning,
            });
        }

        let allowed = self.registry.allowed_for(&roles);
        if allowed.is_empty() {
            tracing::info!("No allowed actions for caller, answering without a plan");
            let final_request = self
                .synthesizer
                .fallback_request(&context.summary, &prepared.question);
            return Ok(Turn {
                context,
                plan: None,
                actions: Vec::new(),
                final_request,
            });
        }

        tracing::info!(
            "Planning for {} with {} allowed actions",
            username,
            allowed.names().len()
        );
        let plan = self
            .planner
            .generate(&prepared.question, &context.summary, &allowed)
            .await?;

        let execution = ExecutionContext {
            credential: prepared.credential.clone(),
            username,
        };
        let actions = PlanExecutor::new(self.backend.as_ref(), &allowed)
            .execute(&plan, &execution)
            .await;

        let final_request = self.synthesizer.synthesis_request(
            &context.summary,
            Some(&plan),
            &actions,
            &prepared.question,
        );
        Ok(Turn {
            context,
            plan: Some(plan),
            actions,
            final_request,
        })
    }

    /// A profile failure leaves the caller without roles, which selects the fallback mode.
    async fn resolve_caller(&self, credential: &str) -> (RoleSet, String, Option<String>) {
        match self.backend.me(credential).await {
            Ok(user) => (resolve_roles(&user.roles), user.username, None),
            Err(e) => {
                tracing::warn!("Profile lookup failed: {}", e);
                (
                    RoleSet::new(),
                    String::new(),
                    Some(messages::profile_fetch_failed(&e.message)),
                )
            }
        }
    }
}
