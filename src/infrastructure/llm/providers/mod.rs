//! # LLM Providers
//!
//! Contains implementations for specific completion services:
//! - OpenAI-compatible API (`/chat/completions`, SSE streaming)
//! - Ollama native chat API (`/api/chat`, NDJSON streaming)

mod ollama;
mod openai;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::Client;

use crate::domain::config::LlmConfig;
use crate::infrastructure::llm::{Context, Error, Provider, Response, ResponseStream};

/// HTTP client reused across requests
pub(crate) fn http_client() -> &'static Client {
    use std::sync::OnceLock;
    static CLIENT: OnceLock<Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| Client::new())
    })
}

/// Configuration for a provider
#[derive(Clone)]
pub struct ProviderConfig {
    /// API key (optional for Ollama)
    pub api_key: Option<String>,
    /// Base URL (for non-default endpoints)
    pub base_url: Option<String>,
    /// Default model
    pub default_model: String,
    /// Timeout in seconds
    pub timeout: Option<u64>,
}

impl ProviderConfig {
    pub fn from_llm_config(provider: Provider, config: &LlmConfig) -> Result<Self, Error> {
        let api_key = if let Some(key) = &config.api_key {
            Some(key.clone())
        } else if let Some(env_var) = &config.api_key_env {
            match std::env::var(env_var) {
                Ok(value) => Some(value),
                Err(e) if provider == Provider::OpenAI => {
                    return Err(Error::new(
                        provider.as_str(),
                        format!("API key env var {} not set: {}", env_var, e),
                    ));
                }
                Err(_) => None,
            }
        } else {
            None
        };

        if provider == Provider::OpenAI && api_key.is_none() {
            return Err(Error::new(
                provider.as_str(),
                "No API key provided - set api_key or api_key_env",
            ));
        }

        Ok(Self {
            api_key,
            base_url: config.endpoint.clone(),
            default_model: config.model.clone(),
            timeout: config.timeout,
        })
    }
}

/// Execute a chat request with the specified provider
pub async fn chat(
    provider: Provider,
    config: ProviderConfig,
    context: Context,
) -> Result<Response, Error> {
    match provider {
        Provider::OpenAI => openai::chat(config, context).await,
        Provider::Ollama => ollama::chat(config, context).await,
    }
}

/// Execute a streaming chat request with the specified provider
pub async fn chat_stream(
    provider: Provider,
    config: ProviderConfig,
    context: Context,
) -> Result<ResponseStream, Error> {
    match provider {
        Provider::OpenAI => openai::chat_stream(config, context).await,
        Provider::Ollama => ollama::chat_stream(config, context).await,
    }
}

/// Turn a non-success body into a readable message.
/// Understands `{"error": {"message": ..}}` (OpenAI) and `{"error": ".."}` (Ollama).
pub(crate) fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(error_json) = serde_json::from_str::<serde_json::Value>(body) {
        let error = error_json.get("error");
        if let Some(msg) = error
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .or_else(|| error.and_then(|e| e.as_str()))
        {
            return msg.to_string();
        }
    }
    format!("HTTP {}: {}", status, body)
}

/// Drain complete lines from `buffer`, leaving any trailing partial line in place.
pub(crate) fn drain_lines(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
        let line: Vec<u8> = buffer.drain(..=pos).collect();
        let text = String::from_utf8_lossy(&line).trim().to_string();
        if !text.is_empty() {
            lines.push(text);
        }
    }
    lines
}

/// Re-frame a byte stream into non-empty text lines.
pub(crate) fn line_stream<S>(
    provider: &'static str,
    bytes: S,
) -> impl Stream<Item = Result<String, Error>> + Send + 'static
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
{
    async_stream::try_stream! {
        let mut bytes = Box::pin(bytes);
        let mut buffer: Vec<u8> = Vec::new();
        while let Some(chunk) = bytes.next().await {
            let chunk = chunk
                .map_err(|e| Error::new(provider, format!("Stream interrupted: {}", e)))?;
            buffer.extend_from_slice(&chunk);
            for line in drain_lines(&mut buffer) {
                yield line;
            }
        }
        let rest = String::from_utf8_lossy(&buffer).trim().to_string();
        if !rest.is_empty() {
            yield rest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn llm_config(provider: &str) -> LlmConfig {
        LlmConfig {
            provider: provider.to_string(),
            endpoint: None,
            api_key: None,
            api_key_env: None,
            model: "m".to_string(),
            temperature: 0.2,
            max_tokens: None,
            timeout: None,
        }
    }

    #[test]
    fn test_openai_requires_key() {
        let config = llm_config("openai");
        assert!(ProviderConfig::from_llm_config(Provider::OpenAI, &config).is_err());
    }

    #[test]
    fn test_ollama_key_is_optional() {
        let mut config = llm_config("ollama");
        config.api_key_env = Some("WORKFLOW_COPILOT_TEST_UNSET_KEY".to_string());
        let provider = ProviderConfig::from_llm_config(Provider::Ollama, &config).unwrap();
        assert!(provider.api_key.is_none());
        assert_eq!(provider.default_model, "m");
    }

    #[test]
    fn test_drain_lines_keeps_partial_tail() {
        let mut buffer = b"data: a\n\ndata: b\r\ndata: par".to_vec();
        let lines = drain_lines(&mut buffer);
        assert_eq!(lines, vec!["data: a".to_string(), "data: b".to_string()]);
        assert_eq!(buffer, b"data: par".to_vec());
    }

    #[test]
    fn test_error_message_shapes() {
        let status = reqwest::StatusCode::BAD_REQUEST;
        assert_eq!(
            error_message(status, r#"{"error":{"message":"bad model"}}"#),
            "bad model"
        );
        assert_eq!(error_message(status, r#"{"error":"model not found"}"#), "model not found");
        assert_eq!(error_message(status, "oops"), "HTTP 400 Bad Request: oops");
    }

    #[tokio::test]
    async fn test_line_stream_reassembles_split_chunks() {
        let chunks: Vec<reqwest::Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"{\"a\":")),
            Ok(Bytes::from_static(b"1}\n{\"b\"")),
            Ok(Bytes::from_static(b":2}")),
        ];
        let lines: Vec<String> = line_stream("test", futures::stream::iter(chunks))
            .map(|line| line.unwrap())
            .collect()
            .await;
        assert_eq!(lines, vec!["{\"a\":1}".to_string(), "{\"b\":2}".to_string()]);
    }
}
