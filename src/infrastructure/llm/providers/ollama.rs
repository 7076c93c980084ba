//! Ollama native chat provider
//!
//! Talks to `/api/chat` on a local daemon or ollama.com. The bearer key is only sent when
//! one is configured. Streaming responses are newline-delimited JSON objects.

use futures::StreamExt;
use serde::{Deserialize, Serialize};

use super::{ProviderConfig, error_message, http_client, line_stream};
use crate::infrastructure::llm::{Context, Error, Response, ResponseStream, StreamChunk, TokenUsage};

const PROVIDER: &str = "ollama";

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    role: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    message: Option<OllamaMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
    #[serde(default)]
    error: Option<String>,
}

fn build_request(config: &ProviderConfig, context: Context, stream: bool) -> (String, OllamaRequest) {
    let base_url = config
        .base_url
        .clone()
        .unwrap_or_else(|| "http://localhost:11434".to_string());
    let model = config.default_model.clone();

    let options = if context.temperature.is_some() || context.max_tokens.is_some() {
        Some(OllamaOptions {
            temperature: context.temperature,
            num_predict: context.max_tokens,
        })
    } else {
        None
    };

    let request = OllamaRequest {
        model,
        messages: context
            .messages
            .into_iter()
            .map(|msg| OllamaMessage {
                role: msg.role.as_str().to_string(),
                content: msg.content,
            })
            .collect(),
        stream,
        options,
    };

    (format!("{}/api/chat", base_url.trim_end_matches('/')), request)
}

async fn send(config: &ProviderConfig, url: &str, request: &OllamaRequest) -> Result<reqwest::Response, Error> {
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
        .map_err(|e| Error::new(PROVIDER, format!("Failed to call Ollama API: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        return Err(Error::new(
            PROVIDER,
            format!("Ollama API error: {}", error_message(status, &error_text)),
        ));
    }

    Ok(response)
}

pub async fn chat(config: ProviderConfig, context: Context) -> Result<Response, Error> {
    let (url, request) = build_request(&config, context, false);
    let response = send(&config, &url, &request).await?;

    let body: OllamaResponse = response
        .json()
        .await
        .map_err(|e| Error::new(PROVIDER, format!("Failed to parse response: {}", e)))?;

    if let Some(error) = body.error {
        return Err(Error::new(PROVIDER, error));
    }

    let prompt_tokens = body.prompt_eval_count.unwrap_or(0);
    let completion_tokens = body.eval_count.unwrap_or(0);

    Ok(Response {
        content: body.message.map(|m| m.content).unwrap_or_default(),
        model: body.model.unwrap_or_default(),
        usage: TokenUsage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        },
    })
}

pub async fn chat_stream(config: ProviderConfig, context: Context) -> Result<ResponseStream, Error> {
    let (url, request) = build_request(&config, context, true);
    let response = send(&config, &url, &request).await?;

    let lines = line_stream(PROVIDER, response.bytes_stream());
    let chunks = async_stream::try_stream! {
        let mut lines = Box::pin(lines);
        while let Some(line) = lines.next().await {
            let line = line?;
            let (chunk, done) = parse_ndjson_line(&line)?;
            if !chunk.delta.is_empty() || chunk.model.is_some() {
                yield chunk;
            }
            if done {
                break;
            }
        }
    };
    Ok(chunks.boxed())
}

fn parse_ndjson_line(line: &str) -> Result<(StreamChunk, bool), Error> {
    let body: OllamaResponse = serde_json::from_str(line)
        .map_err(|e| Error::new(PROVIDER, format!("Malformed stream chunk: {}", e)))?;
    if let Some(error) = body.error {
        return Err(Error::new(PROVIDER, error));
    }
    let chunk = StreamChunk {
        delta: body.message.map(|m| m.content).unwrap_or_default(),
        model: body.model,
    };
    Ok((chunk, body.done))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_shape() {
        let config = ProviderConfig {
            api_key: None,
            base_url: Some("https://ollama.com".into()),
            default_model: "gpt-oss:20b-cloud".into(),
            timeout: None,
        };
        let context = Context {
            temperature: Some(0.2),
            ..Context::new().add_user_message("hello")
        };
        let (url, request) = build_request(&config, context, true);
        assert_eq!(url, "https://ollama.com/api/chat");
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["model"], "gpt-oss:20b-cloud");
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][0]["role"], "user");
        assert!((body["options"]["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_parse_ndjson_lines() {
        let (chunk, done) =
            parse_ndjson_line(r#"{"model":"llama3","message":{"role":"assistant","content":"Hi"},"done":false}"#)
                .unwrap();
        assert_eq!(chunk.delta, "Hi");
        assert_eq!(chunk.model.as_deref(), Some("llama3"));
        assert!(!done);

        let (_, done) = parse_ndjson_line(r#"{"model":"llama3","done":true}"#).unwrap();
        assert!(done);

        assert!(parse_ndjson_line(r#"{"error":"model not found"}"#).is_err());
    }
}
