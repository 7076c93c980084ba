//! # Configuration
//!
//! Manages the loading and parsing of the application's configuration file (`config.yaml`).
//! Defines the structs for the HTTP server, the workflow backend, the completion service,
//! agent limits and logging.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration structure.
/// Matches the layout of `data/config.yaml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub agent: AgentLimits,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Read and parse a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: AppConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> String {
    "127.0.0.1:8088".to_string()
}

/// Where the workflow REST backend lives.
#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub base_url: String,
    /// Timeout in seconds
    #[serde(default = "default_backend_timeout")]
    pub timeout: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            timeout: default_backend_timeout(),
        }
    }
}

fn default_backend_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_backend_timeout() -> u64 {
    30
}

/// Completion service settings.
#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>, // e.g. "OLLAMA_API_KEY"
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Completion length cap; unset leaves it to the service
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,
}

fn default_provider() -> String {
    "ollama".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentLimits {
    #[serde(default = "default_max_context_orders")]
    pub max_context_orders: usize,
    #[serde(default = "default_max_question_chars")]
    pub max_question_chars: usize,
}

impl Default for AgentLimits {
    fn default() -> Self {
        Self {
            max_context_orders: default_max_context_orders(),
            max_question_chars: default_max_question_chars(),
        }
    }
}

fn default_max_context_orders() -> usize {
    10
}

fn default_max_question_chars() -> usize {
    4000
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub directory: String,
    #[serde(default = "default_log_file")]
    pub file: String,
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_log_dir(),
            file: default_log_file(),
            filter: default_log_filter(),
        }
    }
}

fn default_log_dir() -> String {
    "data".to_string()
}

fn default_log_file() -> String {
    "session.log".to_string()
}

fn default_log_filter() -> String {
    "info,hyper=warn,reqwest=warn".to_string()
}
