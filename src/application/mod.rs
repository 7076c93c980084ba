//! # Application Layer
//!
//! Contains the core logic of the copilot: role resolution, context summarization, the action
//! registry, planning, execution, answer synthesis, and the orchestrator tying them together.

pub mod actions;
pub mod context;
pub mod executor;
pub mod orchestrator;
pub mod parsing;
pub mod planner;
pub mod registry;
pub mod roles;
pub mod synthesizer;
