//! # Context Summarizer
//!
//! Fetches the caller's orders and renders the compact, deterministic text block that
//! grounds both model calls. A backend failure never aborts the request: the summary is left
//! empty and a warning travels back to the caller instead.

use chrono::{DateTime, NaiveDateTime};
use std::cmp::Ordering;

use crate::domain::traits::WorkflowBackend;
use crate::domain::types::{OrderResponse, OrderStageStatus, StageType};
use crate::strings::messages;

/// Result of summarizing the caller's workflow state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowContext {
    pub summary: String,
    pub warning: Option<String>,
}

pub async fn build_context(
    backend: &dyn WorkflowBackend,
    credential: &str,
    max_orders: usize,
) -> WorkflowContext {
    match backend.list_orders(credential).await {
        Ok(orders) => {
            tracing::debug!("Context: {} orders visible to caller", orders.len());
            WorkflowContext {
                summary: summarize_orders(&orders, max_orders),
                warning: None,
            }
        }
        Err(e) => {
            tracing::warn!("Context fetch failed, continuing without context: {}", e);
            WorkflowContext {
                summary: String::new(),
                warning: Some(messages::context_fetch_failed(&e.message)),
            }
        }
    }
}

pub fn summarize_orders(orders: &[OrderResponse], max_orders: usize) -> String {
    if orders.is_empty() {
        return messages::NO_ORDERS.to_string();
    }

    let mut sorted: Vec<&OrderResponse> = orders.iter().collect();
    sorted.sort_by(|a, b| compare_orders(a, b));
    sorted.truncate(max_orders);

    let mut lines = Vec::with_capacity(sorted.len() + 1);
    lines.push(format!(
        "Total orders available: {}. Showing top {} by priority and creation.",
        orders.len(),
        sorted.len()
    ));
    lines.extend(sorted.into_iter().map(format_order));
    lines.join("\n")
}

/// Priority descending (missing = 0), then creation time descending.
pub(crate) fn compare_orders(a: &OrderResponse, b: &OrderResponse) -> Ordering {
    b.priority
        .unwrap_or(0)
        .cmp(&a.priority.unwrap_or(0))
        .then_with(|| created_millis(b).cmp(&created_millis(a)))
}

/// Missing or unparsable timestamps sort as the earliest possible instant.
fn created_millis(order: &OrderResponse) -> i64 {
    order
        .created_at
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(i64::MIN)
}

/// Accepts RFC 3339 and offset-less ISO local date-times (treated as UTC).
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}

fn stage_rank(stage: &str) -> usize {
    match stage.trim().to_uppercase().as_str() {
        "PREPARATION" => StageType::Preparation.rank(),
        "ASSEMBLY" => StageType::Assembly.rank(),
        "DELIVERY" => StageType::Delivery.rank(),
        _ => usize::MAX,
    }
}

fn format_order(order: &OrderResponse) -> String {
    let priority = order
        .priority
        .map(|p| p.to_string())
        .unwrap_or_else(|| "n/a".to_string());
    let header = format!(
        "Order {} (id={}) priority {} - current stage {} / overall {}",
        order.display_number(),
        order.id,
        priority,
        order.current_stage.to_lowercase(),
        order.overall_state.to_lowercase()
    );

    let mut stages: Vec<&OrderStageStatus> = order.stages.iter().collect();
    stages.sort_by_key(|s| stage_rank(&s.stage));
    let details = stages
        .into_iter()
        .map(format_stage)
        .collect::<Vec<_>>()
        .join("; ");

    if details.is_empty() {
        format!("{}. Stage details: {}", header, messages::NO_STAGES)
    } else {
        format!("{}. Stage details: {}", header, details)
    }
}

fn format_stage(stage: &OrderStageStatus) -> String {
    let present = |value: &Option<String>| value.as_deref().filter(|v| !v.is_empty()).map(str::to_string);

    let mut parts = vec![format!(
        "{}: {}",
        stage.stage.to_lowercase(),
        stage.state.to_lowercase()
    )];
    if let Some(assignee) = present(&stage.assignee) {
        parts.push(format!("assignee {}", assignee));
    }
    if let Some(reason) = present(&stage.exception_reason) {
        parts.push(format!("exception {}", reason));
    }
    if let Some(notes) = present(&stage.notes) {
        parts.push(format!("notes {}", notes));
    }
    parts.join(" | ")
}
