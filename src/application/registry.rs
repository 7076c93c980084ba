//! # Action Registry
//!
//! The fixed catalog of operations the model may propose. Each entry pairs a name, a
//! description for the planning prompt, the roles allowed to run it, and a handler that
//! validates its own arguments before making any backend call.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashSet;
use thiserror::Error;
use validator::Validate;

use crate::application::actions;
use crate::application::roles::{Role, RoleSet};
use crate::domain::agent::ExecutionContext;
use crate::domain::error::BackendError;
use crate::domain::traits::WorkflowBackend;

/// Why a handler did not produce an outcome.
#[derive(Debug, Error)]
pub enum ActionFailure {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Backend(#[from] BackendError),
}

/// What a handler reports back; the executor attaches the action name.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Completed {
        summary: String,
        data: Option<Value>,
    },
    Skipped {
        summary: String,
    },
}

impl ActionOutcome {
    pub fn completed(summary: impl Into<String>, data: &impl Serialize) -> Self {
        ActionOutcome::Completed {
            summary: summary.into(),
            data: serde_json::to_value(data).ok(),
        }
    }

    pub fn completed_without_data(summary: impl Into<String>) -> Self {
        ActionOutcome::Completed {
            summary: summary.into(),
            data: None,
        }
    }

    pub fn skipped(summary: impl Into<String>) -> Self {
        ActionOutcome::Skipped {
            summary: summary.into(),
        }
    }
}

/// A typed operation. `Args` is the action's input schema: serde decides shape and types,
/// `validator` rules decide ranges and lengths.
#[async_trait]
pub trait WorkflowAction: Send + Sync {
    type Args: DeserializeOwned + Validate + Send;

    async fn execute(
        &self,
        backend: &dyn WorkflowBackend,
        context: &ExecutionContext,
        args: Self::Args,
    ) -> Result<ActionOutcome, ActionFailure>;
}

/// Object-safe face of `WorkflowAction`, taking the raw argument map from the plan.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn run(
        &self,
        backend: &dyn WorkflowBackend,
        context: &ExecutionContext,
        arguments: &Map<String, Value>,
    ) -> Result<ActionOutcome, ActionFailure>;
}

#[async_trait]
impl<A: WorkflowAction> ActionHandler for A {
    async fn run(
        &self,
        backend: &dyn WorkflowBackend,
        context: &ExecutionContext,
        arguments: &Map<String, Value>,
    ) -> Result<ActionOutcome, ActionFailure> {
        let args = parse_arguments::<A::Args>(arguments)?;
        self.execute(backend, context, args).await
    }
}

/// Decode and validate plan arguments. Unknown keys are dropped by the decode.
pub fn parse_arguments<T: DeserializeOwned + Validate>(
    arguments: &Map<String, Value>,
) -> Result<T, ActionFailure> {
    let args: T = serde_json::from_value(Value::Object(arguments.clone()))
        .map_err(|e| ActionFailure::Validation(e.to_string()))?;
    args.validate()
        .map_err(|e| ActionFailure::Validation(e.to_string().replace('\n', "; ")))?;
    Ok(args)
}

pub struct ActionDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub parameter_summary: &'static str,
    pub roles: &'static [Role],
    pub handler: Box<dyn ActionHandler>,
}

impl ActionDefinition {
    pub fn new<A: WorkflowAction + 'static>(
        name: &'static str,
        description: &'static str,
        parameter_summary: &'static str,
        roles: &'static [Role],
        action: A,
    ) -> Self {
        Self {
            name,
            description,
            parameter_summary,
            roles,
            handler: Box::new(action),
        }
    }

    pub fn allows(&self, roles: &RoleSet) -> bool {
        self.roles.iter().any(|r| roles.contains(r))
    }

    /// One line of the planning prompt's action list.
    pub fn catalog_line(&self) -> String {
        format!(
            "{}: {}. Params: {}",
            self.name, self.description, self.parameter_summary
        )
    }
}

impl std::fmt::Debug for ActionDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDefinition")
            .field("name", &self.name)
            .field("roles", &self.roles)
            .finish()
    }
}

/// Immutable, process-wide catalog. Shared read-only between requests.
#[derive(Debug)]
pub struct ActionRegistry {
    actions: Vec<ActionDefinition>,
}

impl ActionRegistry {
    pub fn new(actions: Vec<ActionDefinition>) -> anyhow::Result<Self> {
        let mut seen = HashSet::with_capacity(actions.len());
        for action in &actions {
            if !seen.insert(action.name) {
                anyhow::bail!("Duplicate action name in registry: {}", action.name);
            }
        }
        Ok(Self { actions })
    }

    pub fn standard() -> anyhow::Result<Self> {
        Self::new(actions::standard_actions())
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// The subset of the catalog a caller with `roles` may see and run.
    pub fn allowed_for(&self, roles: &RoleSet) -> AllowedActions<'_> {
        AllowedActions {
            actions: self.actions.iter().filter(|a| a.allows(roles)).collect(),
        }
    }
}

/// A caller's view of the registry. Only these actions are ever described to the model or
/// executed for it.
#[derive(Debug)]
pub struct AllowedActions<'a> {
    actions: Vec<&'a ActionDefinition>,
}

impl<'a> AllowedActions<'a> {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&'a ActionDefinition> {
        self.actions.iter().copied().find(|a| a.name == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.actions.iter().map(|a| a.name).collect()
    }

    pub fn catalog(&self) -> String {
        self.actions
            .iter()
            .map(|a| a.catalog_line())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
