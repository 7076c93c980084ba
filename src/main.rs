//! # Main Entry Point
//!
//! Initializes the application using the layered architecture:
//! - Domain: Configuration, Types and Traits
//! - Infrastructure: LLM client, workflow backend client
//! - Application: Roles, Context, Registry, Planner, Executor, Synthesizer, Orchestrator
//! - Interface: HTTP routes and CLI commands

mod application;
mod domain;
mod infrastructure;
mod interface;
mod strings;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::application::orchestrator::Orchestrator;
use crate::application::registry::ActionRegistry;
use crate::domain::config::{AppConfig, LoggingConfig};
use crate::infrastructure::backend::HttpWorkflowBackend;
use crate::infrastructure::llm::Client as LlmClient;
use crate::interface::cli::{Cli, Command};
use crate::interface::commands;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load Configuration
    let config = AppConfig::load(&cli.config)?;

    // 2. Logging Setup
    let _guard = init_logging(&config.logging, cli.logs_to_stdout())?;
    tracing::info!("Starting workflow-copilot...");

    // 3. Initialize Infrastructure
    let llm = LlmClient::new(&config.llm).context("Failed to build LLM client")?;
    tracing::info!(
        "LLM provider: {} (default model {})",
        llm.provider().as_str(),
        config.llm.model
    );
    let backend = HttpWorkflowBackend::new(&config.backend)
        .context("Failed to build workflow backend client")?;

    // 4. Initialize Application Components
    let registry = Arc::new(ActionRegistry::standard()?);
    tracing::info!("Action registry loaded ({} actions)", registry.len());
    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(llm),
        Arc::new(backend),
        registry,
        config.agent.clone(),
    ));

    // 5. Dispatch
    match cli.command {
        Command::Serve(args) => {
            let listen = args.listen.unwrap_or_else(|| config.server.listen.clone());
            commands::serve::handle_serve(orchestrator, &listen).await
        }
        Command::Ask(args) => commands::ask::handle_ask(orchestrator, args).await,
    }
}

fn init_logging(
    logging: &LoggingConfig,
    to_stdout: bool,
) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    // Ensure log directory exists
    let directory = Path::new(&logging.directory);
    if !directory.exists() {
        fs::create_dir_all(directory)
            .with_context(|| format!("Failed to create {}", directory.display()))?;
    }

    // Clear previous session log
    let log_path = directory.join(&logging.file);
    if log_path.exists() {
        let _ = fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(directory, &logging.file);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.filter));

    // Layer for file (Always active)
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);

    let console_layer = if to_stdout {
        Some(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    Ok(guard)
}
