//! Scripted collaborators shared by the unit tests.

use async_trait::async_trait;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::domain::error::BackendError;
use crate::domain::traits::{LlmProvider, WorkflowBackend};
use crate::domain::types::{
    AuthUser, ChecklistUpdateRequest, CompleteStageRequest, CreateOrderRequest,
    FlagExceptionRequest, OrderResponse, OrderStageStatus, StageState, StageSummary, StageType,
    SupervisorDecisionRequest, WipSummary, WorkQueueItem,
};
use crate::infrastructure::llm::{Context, Error, Response, ResponseStream, StreamChunk, TokenUsage};

pub fn order(id: i64, number: &str, priority: Option<i64>, created_at: Option<&str>) -> OrderResponse {
    OrderResponse {
        id,
        order_number: Some(number.to_string()),
        priority,
        current_stage: "PREPARATION".to_string(),
        overall_state: "PENDING".to_string(),
        created_at: created_at.map(str::to_string),
        updated_at: None,
        notes: None,
        stages: Vec::new(),
    }
}

pub fn stage(stage: &str, state: &str) -> OrderStageStatus {
    OrderStageStatus {
        id: None,
        stage: stage.to_string(),
        state: state.to_string(),
        assignee: None,
        claimed_at: None,
        started_at: None,
        completed_at: None,
        service_time_minutes: None,
        notes: None,
        exception_reason: None,
        supervisor_notes: None,
        approved_by: None,
        updated_at: None,
        checklist: Vec::new(),
    }
}

/// In-memory workflow backend that records every call as `name:arg:arg`.
pub struct MockBackend {
    user: Result<AuthUser, String>,
    orders: Mutex<Vec<OrderResponse>>,
    list_error: Option<String>,
    write_error: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            user: Ok(AuthUser {
                username: "ana".to_string(),
                roles: vec!["ROLE_OPERATOR".to_string()],
            }),
            orders: Mutex::new(Vec::new()),
            list_error: None,
            write_error: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_user(mut self, username: &str, roles: &[&str]) -> Self {
        self.user = Ok(AuthUser {
            username: username.to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        });
        self
    }

    pub fn failing_profile(mut self, message: &str) -> Self {
        self.user = Err(message.to_string());
        self
    }

    pub fn with_orders(self, orders: Vec<OrderResponse>) -> Self {
        *self.orders.lock().unwrap() = orders;
        self
    }

    pub fn failing_list(mut self, message: &str) -> Self {
        self.list_error = Some(message.to_string());
        self
    }

    pub fn failing_writes(mut self, message: &str) -> Self {
        self.write_error = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that change backend state.
    pub fn writes(&self) -> Vec<String> {
        const READS: [&str; 5] = ["me", "list_orders", "get_order", "operator_queue", "wip_summary"];
        self.calls()
            .into_iter()
            .filter(|c| !READS.contains(&c.split(':').next().unwrap_or_default()))
            .collect()
    }

    pub fn order(&self, id: i64) -> Option<OrderResponse> {
        self.orders.lock().unwrap().iter().find(|o| o.id == id).cloned()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_write(&self) -> Result<(), BackendError> {
        match &self.write_error {
            Some(message) => Err(BackendError::with_status(409, message.clone())),
            None => Ok(()),
        }
    }

    fn stage_result(&self, order_id: i64, stage_type: StageType, state: &str) -> Result<OrderStageStatus, BackendError> {
        self.check_write()?;
        if self.order(order_id).is_none() {
            return Err(not_found(order_id));
        }
        Ok(stage(stage_type.as_str(), state))
    }
}

fn not_found(order_id: i64) -> BackendError {
    BackendError::with_status(404, format!("Order {} not found", order_id))
}

#[async_trait]
impl WorkflowBackend for MockBackend {
    async fn me(&self, _credential: &str) -> Result<AuthUser, BackendError> {
        self.record("me".to_string());
        self.user.clone().map_err(|m| BackendError::with_status(401, m))
    }

    async fn list_orders(&self, _credential: &str) -> Result<Vec<OrderResponse>, BackendError> {
        self.record("list_orders".to_string());
        if let Some(message) = &self.list_error {
            return Err(BackendError::new(message.clone()));
        }
        Ok(self.orders.lock().unwrap().clone())
    }

    async fn get_order(&self, _credential: &str, order_id: i64) -> Result<OrderResponse, BackendError> {
        self.record(format!("get_order:{}", order_id));
        self.order(order_id).ok_or_else(|| not_found(order_id))
    }

    async fn create_order(
        &self,
        _credential: &str,
        request: &CreateOrderRequest,
    ) -> Result<OrderResponse, BackendError> {
        self.record(format!("create_order:{}", request.order_number));
        self.check_write()?;
        let mut orders = self.orders.lock().unwrap();
        let id = orders.iter().map(|o| o.id).max().unwrap_or(0) + 1;
        let mut created = order(id, &request.order_number, request.priority, None);
        created.notes = request.notes.clone();
        orders.push(created.clone());
        Ok(created)
    }

    async fn update_priority(
        &self,
        _credential: &str,
        order_id: i64,
        priority: i64,
    ) -> Result<OrderResponse, BackendError> {
        self.record(format!("update_priority:{}:{}", order_id, priority));
        self.check_write()?;
        let mut orders = self.orders.lock().unwrap();
        let target = orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| not_found(order_id))?;
        target.priority = Some(priority);
        Ok(target.clone())
    }

    async fn operator_queue(
        &self,
        _credential: &str,
        stage_type: StageType,
        states: &[StageState],
    ) -> Result<Vec<WorkQueueItem>, BackendError> {
        let states: Vec<&str> = states.iter().map(StageState::as_str).collect();
        self.record(format!("operator_queue:{}:{}", stage_type, states.join(",")));
        let orders = self.orders.lock().unwrap();
        Ok(orders
            .iter()
            .filter(|o| o.current_stage == stage_type.as_str())
            .map(|o| WorkQueueItem {
                order_id: o.id,
                order_number: o.order_number.clone(),
                priority: o.priority,
                stage: stage_type.as_str().to_string(),
                stage_state: o.overall_state.clone(),
                current_stage: Some(o.current_stage.clone()),
                overall_state: Some(o.overall_state.clone()),
                assignee: None,
                claimed_at: None,
                updated_at: None,
                exception_reason: None,
                notes: None,
                checklist: Vec::new(),
            })
            .collect())
    }

    async fn claim_stage(
        &self,
        _credential: &str,
        order_id: i64,
        stage_type: StageType,
        assignee: &str,
    ) -> Result<OrderStageStatus, BackendError> {
        self.record(format!("claim_stage:{}:{}:{}", order_id, stage_type, assignee));
        let mut claimed = self.stage_result(order_id, stage_type, "IN_PROGRESS")?;
        claimed.assignee = Some(assignee.to_string());
        Ok(claimed)
    }

    async fn complete_stage(
        &self,
        _credential: &str,
        order_id: i64,
        stage_type: StageType,
        request: &CompleteStageRequest,
    ) -> Result<OrderStageStatus, BackendError> {
        self.record(format!("complete_stage:{}:{}:{}", order_id, stage_type, request.assignee));
        self.stage_result(order_id, stage_type, "COMPLETED")
    }

    async fn flag_exception(
        &self,
        _credential: &str,
        order_id: i64,
        stage_type: StageType,
        request: &FlagExceptionRequest,
    ) -> Result<OrderStageStatus, BackendError> {
        self.record(format!("flag_exception:{}:{}", order_id, stage_type));
        let mut flagged = self.stage_result(order_id, stage_type, "EXCEPTION")?;
        flagged.exception_reason = Some(request.exception_reason.clone());
        Ok(flagged)
    }

    async fn update_checklist_item(
        &self,
        _credential: &str,
        order_id: i64,
        stage_type: StageType,
        request: &ChecklistUpdateRequest,
    ) -> Result<OrderStageStatus, BackendError> {
        self.record(format!(
            "update_checklist_item:{}:{}:{}:{}",
            order_id, stage_type, request.task_id, request.completed
        ));
        self.stage_result(order_id, stage_type, "IN_PROGRESS")
    }

    async fn wip_summary(&self, _credential: &str) -> Result<WipSummary, BackendError> {
        self.record("wip_summary".to_string());
        let orders = self.orders.lock().unwrap();
        let count = |state: &str| orders.iter().filter(|o| o.overall_state == state).count() as u64;
        Ok(WipSummary {
            total_orders: orders.len() as u64,
            completed_orders: count("COMPLETED"),
            exception_orders: count("EXCEPTION"),
            stages: vec![StageSummary {
                stage: "PREPARATION".to_string(),
                pending: count("PENDING"),
                in_progress: count("IN_PROGRESS"),
                exceptions: count("EXCEPTION"),
                completed: count("COMPLETED"),
            }],
        })
    }

    async fn approve_skip(
        &self,
        _credential: &str,
        order_id: i64,
        stage_type: StageType,
        request: &SupervisorDecisionRequest,
    ) -> Result<Option<OrderStageStatus>, BackendError> {
        self.record(format!("approve_skip:{}:{}:{}", order_id, stage_type, request.approver));
        self.stage_result(order_id, stage_type, "SKIPPED")?;
        Ok(None)
    }

    async fn request_rework(
        &self,
        _credential: &str,
        order_id: i64,
        stage_type: StageType,
        request: &SupervisorDecisionRequest,
    ) -> Result<Option<OrderStageStatus>, BackendError> {
        self.record(format!(
            "request_rework:{}:{}:{}:{}",
            order_id,
            stage_type,
            request.approver,
            request.notes.as_deref().unwrap_or("-")
        ));
        self.stage_result(order_id, stage_type, "REWORK").map(Some)
    }
}

/// Completion service double that replays scripted replies in order and keeps every
/// request it received.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, Error>>>,
    requests: Mutex<Vec<Context>>,
    reported_model: String,
    stream_cut: Option<String>,
}

impl ScriptedLlm {
    pub fn new<S: Into<String>>(replies: impl IntoIterator<Item = S>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            requests: Mutex::new(Vec::new()),
            reported_model: "scripted-model".to_string(),
            stream_cut: None,
        }
    }

    pub fn unreachable() -> Self {
        let llm = Self::new(Vec::<String>::new());
        llm.replies
            .lock()
            .unwrap()
            .push_back(Err(Error::new("mock", "connection refused")));
        llm
    }

    pub fn then_fail(self, message: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(Error::new("mock", message)));
        self
    }

    /// The service reports no model name, so callers fall back to the default.
    pub fn without_reported_model(mut self) -> Self {
        self.reported_model = String::new();
        self
    }

    /// Streamed replies break with `message` after their last fragment, followed by one
    /// more fragment the consumer must never see.
    pub fn cutting_stream(mut self, message: &str) -> Self {
        self.stream_cut = Some(message.to_string());
        self
    }

    pub fn requests(&self) -> Vec<Context> {
        self.requests.lock().unwrap().clone()
    }

    fn next_reply(&self, context: Context) -> Result<String, Error> {
        self.requests.lock().unwrap().push(context);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::new("mock", "no scripted reply left")))
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn chat(&self, context: Context) -> Result<Response, Error> {
        let content = self.next_reply(context)?;
        Ok(Response {
            content,
            model: self.reported_model.clone(),
            usage: TokenUsage::default(),
        })
    }

    async fn chat_stream(&self, context: Context) -> Result<ResponseStream, Error> {
        let content = self.next_reply(context)?;
        let model = Some(self.reported_model.clone()).filter(|m| !m.is_empty());
        let chunk = |delta: &str| -> Result<StreamChunk, Error> {
            Ok(StreamChunk {
                delta: delta.to_string(),
                model: model.clone(),
            })
        };
        let mut chunks: Vec<Result<StreamChunk, Error>> =
            content.split_inclusive(' ').map(chunk).collect();
        if let Some(message) = &self.stream_cut {
            chunks.push(Err(Error::new("mock", message.as_str())));
            chunks.push(chunk(" after the cut"));
        }
        Ok(futures::stream::iter(chunks).boxed())
    }

    fn default_model(&self) -> &str {
        "default-model"
    }
}
