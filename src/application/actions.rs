//! # Workflow Actions
//!
//! One handler per catalog entry. Each handler makes one backend call (or a small fixed
//! sequence) with already-validated arguments and turns the response into an outcome.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::application::context::compare_orders;
use crate::application::registry::{ActionDefinition, ActionFailure, ActionOutcome, WorkflowAction};
use crate::application::roles::Role;
use crate::domain::agent::ExecutionContext;
use crate::domain::traits::WorkflowBackend;
use crate::domain::types::{
    ChecklistUpdateRequest, CompleteStageRequest, CreateOrderRequest, FlagExceptionRequest,
    OrderResponse, StageState, StageType, SupervisorDecisionRequest,
};

const ANY_ROLE: &[Role] = &[Role::Operator, Role::Supervisor];
const SUPERVISOR: &[Role] = &[Role::Supervisor];

const DEFAULT_LIST_LIMIT: u32 = 10;

/// The full catalog, in the order it is shown to the model.
pub fn standard_actions() -> Vec<ActionDefinition> {
    vec![
        ActionDefinition::new(
            "list_orders",
            "List orders visible to the caller, highest priority first",
            "limit (number 1-25, optional, default 10), stage (PREPARATION|ASSEMBLY|DELIVERY, optional), states (array of stage states, optional)",
            ANY_ROLE,
            ListOrders,
        ),
        ActionDefinition::new(
            "get_order_details",
            "Fetch one order with all of its stages",
            "orderId (number)",
            ANY_ROLE,
            GetOrderDetails,
        ),
        ActionDefinition::new(
            "create_order",
            "Create a new production order",
            "orderNumber (string), priority (number, optional), notes (string, optional)",
            SUPERVISOR,
            CreateOrder,
        ),
        ActionDefinition::new(
            "update_order_priority",
            "Change the priority of an order",
            "orderId (number), priority (number)",
            SUPERVISOR,
            UpdateOrderPriority,
        ),
        ActionDefinition::new(
            "claim_stage",
            "Claim a stage of an order so work can start on it",
            "orderId (number), stage (PREPARATION|ASSEMBLY|DELIVERY), assignee (string, optional, defaults to the caller)",
            ANY_ROLE,
            ClaimStage,
        ),
        ActionDefinition::new(
            "complete_stage",
            "Mark a claimed stage as completed",
            "orderId (number), stage (PREPARATION|ASSEMBLY|DELIVERY), serviceTimeMinutes (number, optional), notes (string, optional), assignee (string, optional)",
            ANY_ROLE,
            CompleteStage,
        ),
        ActionDefinition::new(
            "flag_stage_exception",
            "Flag a problem on a stage and stop its progress",
            "orderId (number), stage (PREPARATION|ASSEMBLY|DELIVERY), reason (string), notes (string, optional)",
            ANY_ROLE,
            FlagStageException,
        ),
        ActionDefinition::new(
            "approve_stage_skip",
            "Approve skipping a stage of an order",
            "orderId (number), stage (PREPARATION|ASSEMBLY|DELIVERY), notes (string, optional)",
            SUPERVISOR,
            ApproveStageSkip,
        ),
        ActionDefinition::new(
            "request_stage_rework",
            "Send a stage back for rework",
            "orderId (number), stage (PREPARATION|ASSEMBLY|DELIVERY), notes (string, optional)",
            SUPERVISOR,
            RequestStageRework,
        ),
        ActionDefinition::new(
            "list_work_queue",
            "List the work queue of one stage",
            "stage (PREPARATION|ASSEMBLY|DELIVERY), states (array of stage states, optional)",
            ANY_ROLE,
            ListWorkQueue,
        ),
        ActionDefinition::new(
            "update_checklist_item",
            "Tick or untick a checklist task of a stage",
            "orderId (number), stage (PREPARATION|ASSEMBLY|DELIVERY), taskId (string), completed (boolean)",
            ANY_ROLE,
            UpdateChecklistItem,
        ),
        ActionDefinition::new(
            "get_wip_summary",
            "Summarize work in progress across all stages",
            "none",
            SUPERVISOR,
            GetWipSummary,
        ),
    ]
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("must not be blank".into());
        return Err(error);
    }
    Ok(())
}

fn stage_label(stage: StageType) -> String {
    stage.as_str().to_lowercase()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn assignee_or_caller(assignee: Option<String>, context: &ExecutionContext) -> String {
    non_empty(assignee).unwrap_or_else(|| context.username.clone())
}

/// Compact row returned by `list_orders`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderRow<'a> {
    id: i64,
    order_number: Option<&'a str>,
    priority: Option<i64>,
    current_stage: &'a str,
    overall_state: &'a str,
}

impl<'a> From<&'a OrderResponse> for OrderRow<'a> {
    fn from(order: &'a OrderResponse) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number.as_deref(),
            priority: order.priority,
            current_stage: &order.current_stage,
            overall_state: &order.overall_state,
        }
    }
}

// list_orders

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListOrdersArgs {
    #[validate(range(min = 1, max = 25, message = "limit must be between 1 and 25"))]
    pub limit: Option<u32>,
    pub stage: Option<StageType>,
    pub states: Option<Vec<StageState>>,
}

pub struct ListOrders;

#[async_trait]
impl WorkflowAction for ListOrders {
    type Args = ListOrdersArgs;

    async fn execute(
        &self,
        backend: &dyn WorkflowBackend,
        context: &ExecutionContext,
        args: ListOrdersArgs,
    ) -> Result<ActionOutcome, ActionFailure> {
        let orders = backend.list_orders(&context.credential).await?;
        let states = args.states.unwrap_or_default();

        let mut matching: Vec<&OrderResponse> = orders
            .iter()
            .filter(|o| {
                args.stage
                    .is_none_or(|stage| o.current_stage.eq_ignore_ascii_case(stage.as_str()))
            })
            .filter(|o| {
                states.is_empty()
                    || states
                        .iter()
                        .any(|s| o.overall_state.eq_ignore_ascii_case(s.as_str()))
            })
            .collect();
        matching.sort_by(|a, b| compare_orders(a, b));

        let total = matching.len();
        matching.truncate(args.limit.unwrap_or(DEFAULT_LIST_LIMIT) as usize);
        let rows: Vec<OrderRow> = matching.into_iter().map(OrderRow::from).collect();

        Ok(ActionOutcome::completed(
            format!("Found {} matching orders, returning {}.", total, rows.len()),
            &rows,
        ))
    }
}

// get_order_details

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderIdArgs {
    #[validate(range(min = 1, message = "orderId must be positive"))]
    pub order_id: i64,
}

pub struct GetOrderDetails;

#[async_trait]
impl WorkflowAction for GetOrderDetails {
    type Args = OrderIdArgs;

    async fn execute(
        &self,
        backend: &dyn WorkflowBackend,
        context: &ExecutionContext,
        args: OrderIdArgs,
    ) -> Result<ActionOutcome, ActionFailure> {
        let order = backend.get_order(&context.credential, args.order_id).await?;
        Ok(ActionOutcome::completed(
            format!(
                "Order {} is at {} ({}).",
                order.display_number(),
                order.current_stage.to_lowercase(),
                order.overall_state.to_lowercase()
            ),
            &order,
        ))
    }
}

// create_order

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderArgs {
    #[validate(custom(function = "not_blank"))]
    pub order_number: String,
    pub priority: Option<i64>,
    pub notes: Option<String>,
}

pub struct CreateOrder;

#[async_trait]
impl WorkflowAction for CreateOrder {
    type Args = CreateOrderArgs;

    async fn execute(
        &self,
        backend: &dyn WorkflowBackend,
        context: &ExecutionContext,
        args: CreateOrderArgs,
    ) -> Result<ActionOutcome, ActionFailure> {
        let request = CreateOrderRequest {
            order_number: args.order_number.trim().to_string(),
            priority: args.priority,
            notes: non_empty(args.notes),
        };
        let order = backend.create_order(&context.credential, &request).await?;
        Ok(ActionOutcome::completed(
            format!("Created order {} (id={}).", order.display_number(), order.id),
            &order,
        ))
    }
}

// update_order_priority

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePriorityArgs {
    #[validate(range(min = 1, message = "orderId must be positive"))]
    pub order_id: i64,
    pub priority: i64,
}

pub struct UpdateOrderPriority;

#[async_trait]
impl WorkflowAction for UpdateOrderPriority {
    type Args = UpdatePriorityArgs;

    async fn execute(
        &self,
        backend: &dyn WorkflowBackend,
        context: &ExecutionContext,
        args: UpdatePriorityArgs,
    ) -> Result<ActionOutcome, ActionFailure> {
        let current = backend.get_order(&context.credential, args.order_id).await?;
        if current.priority == Some(args.priority) {
            return Ok(ActionOutcome::skipped(format!(
                "Order {} already has priority {}.",
                current.display_number(),
                args.priority
            )));
        }

        let updated = backend
            .update_priority(&context.credential, args.order_id, args.priority)
            .await?;
        let previous = current
            .priority
            .map(|p| p.to_string())
            .unwrap_or_else(|| "n/a".to_string());
        Ok(ActionOutcome::completed(
            format!(
                "Order {} priority changed from {} to {}.",
                updated.display_number(),
                previous,
                args.priority
            ),
            &updated,
        ))
    }
}

// claim_stage

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClaimStageArgs {
    #[validate(range(min = 1, message = "orderId must be positive"))]
    pub order_id: i64,
    pub stage: StageType,
    pub assignee: Option<String>,
}

pub struct ClaimStage;

#[async_trait]
impl WorkflowAction for ClaimStage {
    type Args = ClaimStageArgs;

    async fn execute(
        &self,
        backend: &dyn WorkflowBackend,
        context: &ExecutionContext,
        args: ClaimStageArgs,
    ) -> Result<ActionOutcome, ActionFailure> {
        let assignee = assignee_or_caller(args.assignee, context);
        let status = backend
            .claim_stage(&context.credential, args.order_id, args.stage, &assignee)
            .await?;
        Ok(ActionOutcome::completed(
            format!(
                "Claimed {} of order {} for {}.",
                stage_label(args.stage),
                args.order_id,
                assignee
            ),
            &status,
        ))
    }
}

// complete_stage

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompleteStageArgs {
    #[validate(range(min = 1, message = "orderId must be positive"))]
    pub order_id: i64,
    pub stage: StageType,
    pub service_time_minutes: Option<u32>,
    pub notes: Option<String>,
    pub assignee: Option<String>,
}

pub struct CompleteStage;

#[async_trait]
impl WorkflowAction for CompleteStage {
    type Args = CompleteStageArgs;

    async fn execute(
        &self,
        backend: &dyn WorkflowBackend,
        context: &ExecutionContext,
        args: CompleteStageArgs,
    ) -> Result<ActionOutcome, ActionFailure> {
        let request = CompleteStageRequest {
            assignee: assignee_or_caller(args.assignee, context),
            service_time_minutes: args.service_time_minutes,
            notes: non_empty(args.notes),
        };
        let status = backend
            .complete_stage(&context.credential, args.order_id, args.stage, &request)
            .await?;
        Ok(ActionOutcome::completed(
            format!("Completed {} of order {}.", stage_label(args.stage), args.order_id),
            &status,
        ))
    }
}

// flag_stage_exception

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FlagExceptionArgs {
    #[validate(range(min = 1, message = "orderId must be positive"))]
    pub order_id: i64,
    pub stage: StageType,
    #[serde(alias = "exceptionReason")]
    #[validate(custom(function = "not_blank"))]
    pub reason: String,
    pub notes: Option<String>,
}

pub struct FlagStageException;

#[async_trait]
impl WorkflowAction for FlagStageException {
    type Args = FlagExceptionArgs;

    async fn execute(
        &self,
        backend: &dyn WorkflowBackend,
        context: &ExecutionContext,
        args: FlagExceptionArgs,
    ) -> Result<ActionOutcome, ActionFailure> {
        let reason = args.reason.trim().to_string();
        let request = FlagExceptionRequest {
            assignee: context.username.clone(),
            exception_reason: reason.clone(),
            notes: non_empty(args.notes),
        };
        let status = backend
            .flag_exception(&context.credential, args.order_id, args.stage, &request)
            .await?;
        Ok(ActionOutcome::completed(
            format!(
                "Flagged an exception on {} of order {}: {}.",
                stage_label(args.stage),
                args.order_id,
                reason
            ),
            &status,
        ))
    }
}

// approve_stage_skip, request_stage_rework

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StageDecisionArgs {
    #[validate(range(min = 1, message = "orderId must be positive"))]
    pub order_id: i64,
    pub stage: StageType,
    pub notes: Option<String>,
}

impl StageDecisionArgs {
    fn request(&self, context: &ExecutionContext) -> SupervisorDecisionRequest {
        SupervisorDecisionRequest {
            approver: context.username.clone(),
            notes: non_empty(self.notes.clone()),
        }
    }
}

pub struct ApproveStageSkip;

#[async_trait]
impl WorkflowAction for ApproveStageSkip {
    type Args = StageDecisionArgs;

    async fn execute(
        &self,
        backend: &dyn WorkflowBackend,
        context: &ExecutionContext,
        args: StageDecisionArgs,
    ) -> Result<ActionOutcome, ActionFailure> {
        let status = backend
            .approve_skip(
                &context.credential,
                args.order_id,
                args.stage,
                &args.request(context),
            )
            .await?;
        let summary = format!(
            "Approved skipping {} of order {}.",
            stage_label(args.stage),
            args.order_id
        );
        Ok(match status {
            Some(status) => ActionOutcome::completed(summary, &status),
            None => ActionOutcome::completed_without_data(summary),
        })
    }
}

pub struct RequestStageRework;

#[async_trait]
impl WorkflowAction for RequestStageRework {
    type Args = StageDecisionArgs;

    async fn execute(
        &self,
        backend: &dyn WorkflowBackend,
        context: &ExecutionContext,
        args: StageDecisionArgs,
    ) -> Result<ActionOutcome, ActionFailure> {
        let status = backend
            .request_rework(
                &context.credential,
                args.order_id,
                args.stage,
                &args.request(context),
            )
            .await?;
        let summary = format!(
            "Requested rework of {} on order {}.",
            stage_label(args.stage),
            args.order_id
        );
        Ok(match status {
            Some(status) => ActionOutcome::completed(summary, &status),
            None => ActionOutcome::completed_without_data(summary),
        })
    }
}

// list_work_queue

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WorkQueueArgs {
    pub stage: StageType,
    pub states: Option<Vec<StageState>>,
}

pub struct ListWorkQueue;

#[async_trait]
impl WorkflowAction for ListWorkQueue {
    type Args = WorkQueueArgs;

    async fn execute(
        &self,
        backend: &dyn WorkflowBackend,
        context: &ExecutionContext,
        args: WorkQueueArgs,
    ) -> Result<ActionOutcome, ActionFailure> {
        let states = args.states.unwrap_or_default();
        let items = backend
            .operator_queue(&context.credential, args.stage, &states)
            .await?;
        Ok(ActionOutcome::completed(
            format!(
                "{} items in the {} queue.",
                items.len(),
                stage_label(args.stage)
            ),
            &items,
        ))
    }
}

// update_checklist_item

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistArgs {
    #[validate(range(min = 1, message = "orderId must be positive"))]
    pub order_id: i64,
    pub stage: StageType,
    #[validate(custom(function = "not_blank"))]
    pub task_id: String,
    pub completed: bool,
}

pub struct UpdateChecklistItem;

#[async_trait]
impl WorkflowAction for UpdateChecklistItem {
    type Args = ChecklistArgs;

    async fn execute(
        &self,
        backend: &dyn WorkflowBackend,
        context: &ExecutionContext,
        args: ChecklistArgs,
    ) -> Result<ActionOutcome, ActionFailure> {
        let request = ChecklistUpdateRequest {
            task_id: args.task_id.trim().to_string(),
            completed: args.completed,
        };
        let status = backend
            .update_checklist_item(&context.credential, args.order_id, args.stage, &request)
            .await?;
        let mark = if args.completed { "done" } else { "not done" };
        Ok(ActionOutcome::completed(
            format!(
                "Marked task {} as {} on {} of order {}.",
                request.task_id,
                mark,
                stage_label(args.stage),
                args.order_id
            ),
            &status,
        ))
    }
}

// get_wip_summary

#[derive(Debug, Deserialize)]
pub struct NoArgs {}

impl Validate for NoArgs {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

pub struct GetWipSummary;

#[async_trait]
impl WorkflowAction for GetWipSummary {
    type Args = NoArgs;

    async fn execute(
        &self,
        backend: &dyn WorkflowBackend,
        context: &ExecutionContext,
        _args: NoArgs,
    ) -> Result<ActionOutcome, ActionFailure> {
        let summary = backend.wip_summary(&context.credential).await?;
        Ok(ActionOutcome::completed(
            format!(
                "{} orders in total, {} completed, {} with exceptions.",
                summary.total_orders, summary.completed_orders, summary.exception_orders
            ),
            &summary,
        ))
    }
}
