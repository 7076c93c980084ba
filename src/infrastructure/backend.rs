//! # Workflow Backend Client
//!
//! Implements the `WorkflowBackend` trait over the workflow service's REST API.
//! Every request carries the caller's credential as a `Basic` authorization header.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::domain::config::BackendConfig;
use crate::domain::error::BackendError;
use crate::domain::traits::WorkflowBackend;
use crate::domain::types::{
    AuthUser, ChecklistUpdateRequest, CompleteStageRequest, CreateOrderRequest,
    FlagExceptionRequest, OrderResponse, OrderStageStatus, StageState, StageType,
    SupervisorDecisionRequest, WipSummary, WorkQueueItem,
};

#[derive(Clone)]
pub struct HttpWorkflowBackend {
    client: Client,
    base_url: String,
}

impl HttpWorkflowBackend {
    pub fn new(config: &BackendConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, method: Method, path: &str, credential: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("Accept", "application/json")
            .header("Authorization", format!("Basic {}", credential))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, BackendError> {
        let response = builder
            .send()
            .await
            .map_err(|e| BackendError::new(format!("Workflow backend unreachable: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = backend_error_message(status, &body);
        tracing::debug!("Workflow backend responded {}: {}", status, message);
        Err(BackendError::with_status(status.as_u16(), message))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        credential: &str,
    ) -> Result<T, BackendError> {
        let response = self.send(self.request(Method::GET, path, credential)).await?;
        decode(response).await
    }

    async fn send_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        credential: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        let builder = self.request(method, path, credential).json(body);
        let response = self.send(builder).await?;
        decode(response).await
    }

    /// Like `send_json` but tolerates an empty (204) body.
    async fn send_json_optional<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        credential: &str,
        body: &B,
    ) -> Result<Option<T>, BackendError> {
        let builder = self.request(method, path, credential).json(body);
        let response = self.send(builder).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::new(format!("Failed to read backend response: {}", e)))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| BackendError::new(format!("Unexpected backend response: {}", e)))
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
    response
        .json::<T>()
        .await
        .map_err(|e| BackendError::new(format!("Unexpected backend response: {}", e)))
}

/// Prefer the backend's own `message` field, fall back to the status text.
fn backend_error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            let reason = status.canonical_reason().unwrap_or("Request failed");
            format!("Backend responded with {} {}", status.as_u16(), reason)
        })
}

fn stage_path(prefix: &str, order_id: i64, stage: StageType, action: &str) -> String {
    format!("/api/{}/orders/{}/stages/{}/{}", prefix, order_id, stage.as_str(), action)
}

#[async_trait]
impl WorkflowBackend for HttpWorkflowBackend {
    async fn me(&self, credential: &str) -> Result<AuthUser, BackendError> {
        self.get_json("/auth/me", credential).await
    }

    async fn list_orders(&self, credential: &str) -> Result<Vec<OrderResponse>, BackendError> {
        self.get_json("/api/orders", credential).await
    }

    async fn get_order(
        &self,
        credential: &str,
        order_id: i64,
    ) -> Result<OrderResponse, BackendError> {
        self.get_json(&format!("/api/orders/{}", order_id), credential)
            .await
    }

    async fn create_order(
        &self,
        credential: &str,
        request: &CreateOrderRequest,
    ) -> Result<OrderResponse, BackendError> {
        self.send_json(Method::POST, "/api/orders", credential, request)
            .await
    }

    async fn update_priority(
        &self,
        credential: &str,
        order_id: i64,
        priority: i64,
    ) -> Result<OrderResponse, BackendError> {
        self.send_json(
            Method::PATCH,
            &format!("/api/orders/{}/priority", order_id),
            credential,
            &serde_json::json!({ "priority": priority }),
        )
        .await
    }

    async fn operator_queue(
        &self,
        credential: &str,
        stage: StageType,
        states: &[StageState],
    ) -> Result<Vec<WorkQueueItem>, BackendError> {
        let mut query: Vec<(&str, &str)> = vec![("stage", stage.as_str())];
        query.extend(states.iter().map(|s| ("states", s.as_str())));
        let builder = self
            .request(Method::GET, "/api/operator/queue", credential)
            .query(&query);
        let response = self.send(builder).await?;
        decode(response).await
    }

    async fn claim_stage(
        &self,
        credential: &str,
        order_id: i64,
        stage: StageType,
        assignee: &str,
    ) -> Result<OrderStageStatus, BackendError> {
        self.send_json(
            Method::POST,
            &stage_path("operator", order_id, stage, "claim"),
            credential,
            &serde_json::json!({ "assignee": assignee }),
        )
        .await
    }

    async fn complete_stage(
        &self,
        credential: &str,
        order_id: i64,
        stage: StageType,
        request: &CompleteStageRequest,
    ) -> Result<OrderStageStatus, BackendError> {
        self.send_json(
            Method::POST,
            &stage_path("operator", order_id, stage, "complete"),
            credential,
            request,
        )
        .await
    }

    async fn flag_exception(
        &self,
        credential: &str,
        order_id: i64,
        stage: StageType,
        request: &FlagExceptionRequest,
    ) -> Result<OrderStageStatus, BackendError> {
        self.send_json(
            Method::POST,
            &stage_path("operator", order_id, stage, "flag-exception"),
            credential,
            request,
        )
        .await
    }

    async fn update_checklist_item(
        &self,
        credential: &str,
        order_id: i64,
        stage: StageType,
        request: &ChecklistUpdateRequest,
    ) -> Result<OrderStageStatus, BackendError> {
        self.send_json(
            Method::PATCH,
            &stage_path("operator", order_id, stage, "checklist"),
            credential,
            request,
        )
        .await
    }

    async fn wip_summary(&self, credential: &str) -> Result<WipSummary, BackendError> {
        self.get_json("/api/supervisor/wip", credential).await
    }

    async fn approve_skip(
        &self,
        credential: &str,
        order_id: i64,
        stage: StageType,
        request: &SupervisorDecisionRequest,
    ) -> Result<Option<OrderStageStatus>, BackendError> {
        self.send_json_optional(
            Method::POST,
            &stage_path("supervisor", order_id, stage, "approve-skip"),
            credential,
            request,
        )
        .await
    }

    async fn request_rework(
        &self,
        credential: &str,
        order_id: i64,
        stage: StageType,
        request: &SupervisorDecisionRequest,
    ) -> Result<Option<OrderStageStatus>, BackendError> {
        self.send_json_optional(
            Method::POST,
            &stage_path("supervisor", order_id, stage, "request-rework"),
            credential,
            request,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_stage_paths() {
        assert_eq!(
            stage_path("operator", 42, StageType::Assembly, "flag-exception"),
            "/api/operator/orders/42/stages/ASSEMBLY/flag-exception"
        );
        assert_eq!(
            stage_path("supervisor", 7, StageType::Delivery, "approve-skip"),
            "/api/supervisor/orders/7/stages/DELIVERY/approve-skip"
        );
    }

    #[test]
    fn test_error_message_prefers_backend_message() {
        assert_eq!(
            backend_error_message(StatusCode::CONFLICT, r#"{"message":"Stage already claimed"}"#),
            "Stage already claimed"
        );
        assert_eq!(
            backend_error_message(StatusCode::FORBIDDEN, ""),
            "Backend responded with 403 Forbidden"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let backend = HttpWorkflowBackend::new(&BackendConfig {
            base_url: "http://localhost:8080/".into(),
            timeout: 5,
        })
        .unwrap();
        assert_eq!(backend.base_url, "http://localhost:8080");
    }
}
