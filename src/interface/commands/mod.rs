//! # Command Handlers
//!
//! One handler per CLI subcommand. `main` builds the orchestrator and dispatches here.

pub mod ask;
pub mod serve;
