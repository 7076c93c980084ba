//! # Domain Types
//!
//! Snapshots of the workflow backend's data (orders, stages, work queue, WIP counts) and the
//! request payloads sent back to it. These are read and rendered, never mutated in place.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Production stage of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageType {
    #[serde(alias = "preparation")]
    Preparation,
    #[serde(alias = "assembly")]
    Assembly,
    #[serde(alias = "delivery")]
    Delivery,
}

impl StageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageType::Preparation => "PREPARATION",
            StageType::Assembly => "ASSEMBLY",
            StageType::Delivery => "DELIVERY",
        }
    }

    /// Position in the fixed production sequence.
    pub fn rank(&self) -> usize {
        match self {
            StageType::Preparation => 0,
            StageType::Assembly => 1,
            StageType::Delivery => 2,
        }
    }
}

impl fmt::Display for StageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageState {
    #[serde(alias = "blocked")]
    Blocked,
    #[serde(alias = "pending")]
    Pending,
    #[serde(alias = "in_progress")]
    InProgress,
    #[serde(alias = "completed")]
    Completed,
    #[serde(alias = "exception")]
    Exception,
    #[serde(alias = "skipped")]
    Skipped,
    #[serde(alias = "rework")]
    Rework,
}

impl StageState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageState::Blocked => "BLOCKED",
            StageState::Pending => "PENDING",
            StageState::InProgress => "IN_PROGRESS",
            StageState::Completed => "COMPLETED",
            StageState::Exception => "EXCEPTION",
            StageState::Skipped => "SKIPPED",
            StageState::Rework => "REWORK",
        }
    }
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub completed: bool,
}

/// Stage and state are kept as raw strings so that a stage the backend adds later still
/// renders (it simply sorts last).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStageStatus {
    #[serde(default)]
    pub id: Option<i64>,
    pub stage: String,
    pub state: String,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub claimed_at: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub service_time_minutes: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub exception_reason: Option<String>,
    #[serde(default)]
    pub supervisor_notes: Option<String>,
    #[serde(default)]
    pub approved_by: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: i64,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    pub current_stage: String,
    pub overall_state: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub stages: Vec<OrderStageStatus>,
}

impl OrderResponse {
    pub fn display_number(&self) -> &str {
        self.order_number.as_deref().unwrap_or("unknown")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkQueueItem {
    pub order_id: i64,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    pub stage: String,
    pub stage_state: String,
    #[serde(default)]
    pub current_stage: Option<String>,
    #[serde(default)]
    pub overall_state: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub claimed_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub exception_reason: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSummary {
    pub stage: String,
    pub pending: u64,
    pub in_progress: u64,
    pub exceptions: u64,
    pub completed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WipSummary {
    pub total_orders: u64,
    pub completed_orders: u64,
    pub exception_orders: u64,
    #[serde(default)]
    pub stages: Vec<StageSummary>,
}

/// Caller profile as reported by `/auth/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub username: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

// Request payloads

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub order_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteStageRequest {
    pub assignee: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_time_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagExceptionRequest {
    pub assignee: String,
    pub exception_reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistUpdateRequest {
    pub task_id: String,
    pub completed: bool,
}

/// Body for supervisor decisions (approve skip, request rework).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorDecisionRequest {
    pub approver: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_type_accepts_either_case() {
        let upper: StageType = serde_json::from_str("\"ASSEMBLY\"").unwrap();
        let lower: StageType = serde_json::from_str("\"assembly\"").unwrap();
        assert_eq!(upper, StageType::Assembly);
        assert_eq!(lower, StageType::Assembly);
        assert!(serde_json::from_str::<StageType>("\"PAINTING\"").is_err());
    }

    #[test]
    fn test_order_deserializes_backend_payload() {
        let json = r#"{
            "id": 42,
            "orderNumber": "ORD-42",
            "priority": null,
            "currentStage": "ASSEMBLY",
            "overallState": "IN_PROGRESS",
            "createdAt": "2024-03-01T08:00:00Z",
            "updatedAt": "2024-03-01T09:00:00Z",
            "notes": null,
            "stages": [
                {"id": 1, "stage": "PREPARATION", "state": "COMPLETED", "assignee": "ana",
                 "checklist": [{"id": "t1", "label": "Pick parts", "required": true, "completed": true}]}
            ]
        }"#;
        let order: OrderResponse = serde_json::from_str(json).unwrap();
        assert_eq!(order.id, 42);
        assert_eq!(order.priority, None);
        assert_eq!(order.stages[0].assignee.as_deref(), Some("ana"));
        assert_eq!(order.stages[0].checklist.len(), 1);
    }

    #[test]
    fn test_request_payloads_skip_absent_fields() {
        let body = serde_json::to_value(CompleteStageRequest {
            assignee: "ana".into(),
            service_time_minutes: None,
            notes: Some("done".into()),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"assignee": "ana", "notes": "done"}));
    }
}
