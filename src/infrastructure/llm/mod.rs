//! Simple LLM API wrapper for the completion services the copilot can talk to
//!
//! This module provides a unified interface over OpenAI-compatible endpoints and Ollama's
//! native chat API, both as a single response and as a stream of text fragments.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use crate::infrastructure::llm::{Client, Context};
//!
//! let client = Client::new(&app_config.llm)?;
//! let context = Context::new()
//!     .add_system_message("You are a helpful assistant.")
//!     .add_user_message("Which orders are blocked?");
//! let response = client.chat(context).await?;
//! println!("{} (model {})", response.content, response.model);
//! ```

mod client;
pub mod providers;
mod types;

pub use client::Client;

pub use types::{
    Context, Error, MessageRole, Provider, Response, ResponseStream, StreamChunk,
    TokenUsage,
};
