//! # Domain Traits
//!
//! Abstract interfaces for the two external collaborators (completion service, workflow
//! backend). Allows for pluggable implementations in the Infrastructure layer and scripted
//! doubles in tests.

use async_trait::async_trait;

use crate::domain::error::BackendError;
use crate::domain::types::{
    AuthUser, ChecklistUpdateRequest, CompleteStageRequest, CreateOrderRequest,
    FlagExceptionRequest, OrderResponse, OrderStageStatus, StageState, StageType,
    SupervisorDecisionRequest, WipSummary, WorkQueueItem,
};
use crate::infrastructure::llm::{Context, Error, Response, ResponseStream};

/// Abstract interface for an LLM Provider
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a full completion
    async fn chat(&self, context: Context) -> Result<Response, Error>;

    /// Generate a completion delivered as incremental fragments
    async fn chat_stream(&self, context: Context) -> Result<ResponseStream, Error>;

    /// Model reported when the provider does not name one
    fn default_model(&self) -> &str;
}

/// Abstract interface for the workflow REST backend.
/// Every call carries the caller's credential; nothing is cached between calls.
#[async_trait]
pub trait WorkflowBackend: Send + Sync {
    async fn me(&self, credential: &str) -> Result<AuthUser, BackendError>;

    async fn list_orders(&self, credential: &str) -> Result<Vec<OrderResponse>, BackendError>;

    async fn get_order(&self, credential: &str, order_id: i64)
    -> Result<OrderResponse, BackendError>;

    async fn create_order(
        &self,
        credential: &str,
        request: &CreateOrderRequest,
    ) -> Result<OrderResponse, BackendError>;

    async fn update_priority(
        &self,
        credential: &str,
        order_id: i64,
        priority: i64,
    ) -> Result<OrderResponse, BackendError>;

    async fn operator_queue(
        &self,
        credential: &str,
        stage: StageType,
        states: &[StageState],
    ) -> Result<Vec<WorkQueueItem>, BackendError>;

    async fn claim_stage(
        &self,
        credential: &str,
        order_id: i64,
        stage: StageType,
        assignee: &str,
    ) -> Result<OrderStageStatus, BackendError>;

    async fn complete_stage(
        &self,
        credential: &str,
        order_id: i64,
        stage: StageType,
        request: &CompleteStageRequest,
    ) -> Result<OrderStageStatus, BackendError>;

    async fn flag_exception(
        &self,
        credential: &str,
        order_id: i64,
        stage: StageType,
        request: &FlagExceptionRequest,
    ) -> Result<OrderStageStatus, BackendError>;

    async fn update_checklist_item(
        &self,
        credential: &str,
        order_id: i64,
        stage: StageType,
        request: &ChecklistUpdateRequest,
    ) -> Result<OrderStageStatus, BackendError>;

    async fn wip_summary(&self, credential: &str) -> Result<WipSummary, BackendError>;

    async fn approve_skip(
        &self,
        credential: &str,
        order_id: i64,
        stage: StageType,
        request: &SupervisorDecisionRequest,
    ) -> Result<Option<OrderStageStatus>, BackendError>;

    async fn request_rework(
        &self,
        credential: &str,
        order_id: i64,
        stage: StageType,
        request: &SupervisorDecisionRequest,
    ) -> Result<Option<OrderStageStatus>, BackendError>;
}
