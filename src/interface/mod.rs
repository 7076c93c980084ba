//! # Interface Layer
//!
//! Entry points into the application: the HTTP/SSE routes and the CLI commands.

pub mod cli;
pub mod commands;
pub mod http;
