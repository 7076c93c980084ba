//! # Strings Module
//!
//! Centralizes fixed user-facing sentences and the prompt templates.

pub mod messages;
pub mod prompts;
