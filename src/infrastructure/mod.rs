//! # Infrastructure Layer
//!
//! Handles interactions with external systems and services.
//! Implements the traits defined in the Domain layer (`LlmProvider`, `WorkflowBackend`).

pub mod backend;
pub mod llm;
