//! # Ask Command
//!
//! Runs one assistant request from the command line and prints the result as JSON.
//! With `--stream`, answer fragments are written as they arrive and the final JSON follows.

use anyhow::Result;
use futures::StreamExt;
use std::io::Write;
use std::sync::Arc;

use crate::application::orchestrator::Orchestrator;
use crate::domain::agent::{AgentEvent, AgentRequest, AgentResult};
use crate::interface::cli::AskArgs;

pub async fn handle_ask(orchestrator: Arc<Orchestrator>, args: AskArgs) -> Result<()> {
    let request = AgentRequest {
        question: Some(args.question),
        credential: Some(args.credential),
    };

    let result = if args.stream {
        stream_answer(orchestrator, request, &mut std::io::stdout()).await?
    } else {
        orchestrator.ask(request).await?
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn stream_answer(
    orchestrator: Arc<Orchestrator>,
    request: AgentRequest,
    out: &mut impl Write,
) -> Result<AgentResult> {
    let mut events = Box::pin(orchestrator.ask_stream(request)?);

    while let Some(event) = events.next().await {
        match event {
            AgentEvent::Token { delta } => {
                write!(out, "{}", delta)?;
                out.flush()?;
            }
            AgentEvent::Conversation { final_state } => {
                writeln!(out)?;
                return Ok(final_state);
            }
            AgentEvent::Error { message } => {
                writeln!(out)?;
                anyhow::bail!(message);
            }
        }
    }

    anyhow::bail!("Answer stream ended without a final event")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::registry::ActionRegistry;
    use crate::domain::config::AgentLimits;
    use crate::testing::{MockBackend, ScriptedLlm};

    fn orchestrator(llm: ScriptedLlm) -> Arc<Orchestrator> {
        Arc::new(Orchestrator::new(
            Arc::new(llm),
            Arc::new(MockBackend::new()),
            Arc::new(ActionRegistry::standard().unwrap()),
            AgentLimits::default(),
        ))
    }

    fn request() -> AgentRequest {
        AgentRequest {
            question: Some("anything new?".into()),
            credential: Some("c".into()),
        }
    }

    #[tokio::test]
    async fn test_stream_writes_fragments_and_returns_final_state() {
        let llm = ScriptedLlm::new([r#"{"intent":"x","actions":[]}"#, "Nothing new."]);
        let mut out = Vec::new();

        let result = stream_answer(orchestrator(llm), request(), &mut out).await.unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "Nothing new.\n");
        assert_eq!(result.answer, "Nothing new.");
    }

    #[tokio::test]
    async fn test_stream_error_becomes_command_error() {
        let llm = ScriptedLlm::unreachable();
        let mut out = Vec::new();

        let err = stream_answer(orchestrator(llm), request(), &mut out).await.unwrap_err();

        assert!(err.to_string().contains("unreachable"));
    }
}
