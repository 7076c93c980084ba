//! # Agent Types
//!
//! Plans proposed by the model, the execution log produced by running them, and the
//! request/response/event shapes of the assistant endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One step the model proposes to take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedAction {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

/// The model's proposal for a request. Zero actions means "nothing to do".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPlan {
    pub intent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub actions: Vec<PlannedAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Success,
    Error,
    Skipped,
}

impl ActionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionStatus::Success => "success",
            ActionStatus::Error => "error",
            ActionStatus::Skipped => "skipped",
        }
    }
}

/// Outcome of one planned action. Entries of the execution log are never edited after
/// they are created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentActionResult {
    pub name: String,
    pub status: ActionStatus,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentActionResult {
    pub fn success(name: impl Into<String>, summary: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            name: name.into(),
            status: ActionStatus::Success,
            summary: summary.into(),
            data,
            error: None,
        }
    }

    pub fn skipped(name: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ActionStatus::Skipped,
            summary: summary.into(),
            data: None,
            error: None,
        }
    }

    pub fn error(name: impl Into<String>, summary: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ActionStatus::Error,
            summary: summary.into(),
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Per-request caller identity handed to action handlers.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub credential: String,
    pub username: String,
}

/// Body of the assistant endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentRequest {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default, alias = "token")]
    pub credential: Option<String>,
}

/// Response of the assistant endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResult {
    pub answer: String,
    pub model: String,
    pub context_summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_warning: Option<String>,
    #[serde(default)]
    pub plan: Option<AgentPlan>,
    #[serde(default)]
    pub actions: Vec<AgentActionResult>,
}

/// Events of the streaming variant. A stream carries any number of `Token` events followed
/// by exactly one `Conversation` or `Error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AgentEvent {
    Token {
        delta: String,
    },
    Conversation {
        #[serde(rename = "finalState")]
        final_state: AgentResult,
    },
    Error {
        message: String,
    },
}

impl AgentEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AgentEvent::Token { .. } => "token",
            AgentEvent::Conversation { .. } => "conversation",
            AgentEvent::Error { .. } => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AgentEvent::Token { .. })
    }
}
