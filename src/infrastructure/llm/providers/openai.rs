//! OpenAI-compatible API provider
//!
//! Supports OpenAI and any service exposing `/chat/completions` (Groq, xAI, vLLM, ...)

use futures::StreamExt;
use serde::{Deserialize, Serialize};

use super::{ProviderConfig, error_message, http_client, line_stream};
use crate::infrastructure::llm::{Context, Error, Response, ResponseStream, StreamChunk, TokenUsage};

const PROVIDER: &str = "openai";

/// OpenAI API request format
#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

/// OpenAI API response format
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    model: String,
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// One `data:` payload of a streamed completion
#[derive(Debug, Deserialize)]
struct OpenAIStreamChunk {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<OpenAIStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIStreamChoice {
    #[serde(default)]
    delta: OpenAIDelta,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAIDelta {
    #[serde(default)]
    content: Option<String>,
}

fn build_request(config: &ProviderConfig, context: Context, stream: bool) -> (String, OpenAIRequest) {
    let base_url = config
        .base_url
        .clone()
        .unwrap_or_else(|| "https://api.openai.com/v1".to_string());
    let model = if config.default_model.is_empty() {
        "gpt-4o".to_string()
    } else {
        config.default_model.clone()
    };

    let request = OpenAIRequest {
        model,
        messages: context
            .messages
            .into_iter()
            .map(|msg| OpenAIMessage {
                role: msg.role.as_str().to_string(),
                content: msg.content,
            })
            .collect(),
        temperature: context.temperature,
        max_tokens: context.max_tokens,
        stream,
    };

    (format!("{}/chat/completions", base_url.trim_end_matches('/')), request)
}

async fn send(config: &ProviderConfig, url: &str, request: &OpenAIRequest) -> Result<reqwest::Response, Error> {
    let mut request_builder = http_client()
        .post(url)
        .header("Content-Type", "application/json")
        .json(request);

    if let Some(key) = &config.api_key {
        request_builder = request_builder.header("Authorization", format!("Bearer {}", key));
    }
    if let Some(timeout_secs) = config.timeout {
        request_builder = request_builder.timeout(std::time::Duration::from_secs(timeout_secs));
    }

    let response = request_builder
        .send()
        .await
        .map_err(|e| Error::new(PROVIDER, format!("HTTP request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        return Err(Error::new(PROVIDER, error_message(status, &error_text)));
    }

    Ok(response)
}

/// Execute a chat request using OpenAI-compatible API
pub async fn chat(config: ProviderConfig, context: Context) -> Result<Response, Error> {
    let (url, request) = build_request(&config, context, false);
    let response = send(&config, &url, &request).await?;

    let openai_response: OpenAIResponse = response
        .json()
        .await
        .map_err(|e| Error::new(PROVIDER, format!("Failed to parse response: {}", e)))?;

    let Some(choice) = openai_response.choices.into_iter().next() else {
        return Err(Error::new(PROVIDER, "No choices in response"));
    };

    let usage = openai_response
        .usage
        .map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        })
        .unwrap_or_default();

    Ok(Response {
        content: choice.message.content.unwrap_or_default(),
        model: openai_response.model,
        usage,
    })
}

/// Execute a streaming chat request; fragments arrive as server-sent `data:` lines
pub async fn chat_stream(config: ProviderConfig, context: Context) -> Result<ResponseStream, Error> {
    let (url, request) = build_request(&config, context, true);
    let response = send(&config, &url, &request).await?;

    let lines = line_stream(PROVIDER, response.bytes_stream());
    let chunks = async_stream::try_stream! {
        let mut lines = Box::pin(lines);
        while let Some(line) = lines.next().await {
            let line = line?;
            match parse_sse_line(&line)? {
                SseLine::Chunk(chunk) => {
                    yield chunk;
                }
                SseLine::Done => break,
                SseLine::Ignored => {}
            }
        }
    };
    Ok(chunks.boxed())
}

#[derive(Debug, PartialEq)]
enum SseLine {
    Chunk(StreamChunk),
    Done,
    Ignored,
}

fn parse_sse_line(line: &str) -> Result<SseLine, Error> {
    let Some(payload) = line.strip_prefix("data:") else {
        return Ok(SseLine::Ignored);
    };
    let payload = payload.trim();
    if payload == "[DONE]" {
        return Ok(SseLine::Done);
    }
    let chunk: OpenAIStreamChunk = serde_json::from_str(payload)
        .map_err(|e| Error::new(PROVIDER, format!("Malformed stream chunk: {}", e)))?;
    let delta = chunk
        .choices
        .into_iter()
        .filter_map(|c| c.delta.content)
        .collect::<String>();
    if delta.is_empty() && chunk.model.is_none() {
        return Ok(SseLine::Ignored);
    }
    Ok(SseLine::Chunk(StreamChunk {
        delta,
        model: chunk.model,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm::Context;

    fn config() -> ProviderConfig {
        ProviderConfig {
            api_key: Some("k".into()),
            base_url: Some("http://llm.local/v1/".into()),
            default_model: "gpt-4o-mini".into(),
            timeout: None,
        }
    }

    #[test]
    fn test_build_request_uses_default_model_and_trims_url() {
        let context = Context {
            temperature: Some(0.2),
            ..Context::new().add_system_message("sys").add_user_message("hi")
        };
        let (url, request) = build_request(&config(), context, false);
        assert_eq!(url, "http://llm.local/v1/chat/completions");
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert!(body.get("stream").is_none());
    }

    #[test]
    fn test_parse_sse_lines() {
        let line = r#"data: {"model":"gpt-4o-mini","choices":[{"delta":{"content":"Hel"}}]}"#;
        assert_eq!(
            parse_sse_line(line).unwrap(),
            SseLine::Chunk(StreamChunk {
                delta: "Hel".into(),
                model: Some("gpt-4o-mini".into())
            })
        );
        assert_eq!(parse_sse_line("data: [DONE]").unwrap(), SseLine::Done);
        assert_eq!(parse_sse_line(": keep-alive").unwrap(), SseLine::Ignored);
        assert!(parse_sse_line("data: {broken").is_err());
    }
}
