//! Deterministic mock chat client for tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_stream::try_stream;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{Duration, sleep};

use crate::client::{
    ChatClient, ChatStream, CompletionRequest, CompletionResponse, FinishReason, Role, StreamChunk,
    TokenUsage,
};
use crate::error::{RelayError, Result};

/// Deterministic step for scripted mock completions.
#[derive(Debug, Clone)]
pub enum MockStepKind {
    /// Return a plain assistant message.
    Text(String),
    /// Return a relay error.
    Error(String),
    /// Stream each delta as its own chunk, then finish cleanly or fail.
    Stream {
        deltas: Vec<String>,
        error: Option<String>,
    },
}

/// Scripted completion step with optional delay.
#[derive(Debug, Clone)]
pub struct MockStep {
    pub delay_ms: u64,
    pub kind: MockStepKind,
}

impl MockStep {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            delay_ms: 0,
            kind: MockStepKind::Text(content.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            delay_ms: 0,
            kind: MockStepKind::Error(message.into()),
        }
    }

    pub fn stream(deltas: &[&str]) -> Self {
        Self {
            delay_ms: 0,
            kind: MockStepKind::Stream {
                deltas: deltas.iter().map(|d| d.to_string()).collect(),
                error: None,
            },
        }
    }

    /// Stream the deltas, then fail mid-stream.
    pub fn stream_then_error(deltas: &[&str], message: impl Into<String>) -> Self {
        Self {
            delay_ms: 0,
            kind: MockStepKind::Stream {
                deltas: deltas.iter().map(|d| d.to_string()).collect(),
                error: Some(message.into()),
            },
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

/// A deterministic mock chat client driven by scripted steps.
///
/// When the script runs out it echoes the last user message, so tests that
/// only care about plumbing need no setup.
#[derive(Debug, Clone, Default)]
pub struct MockChatClient {
    model: String,
    script: Arc<Mutex<VecDeque<MockStep>>>,
}

impl MockChatClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            script: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn from_steps(model: impl Into<String>, steps: Vec<MockStep>) -> Self {
        Self {
            model: model.into(),
            script: Arc::new(Mutex::new(VecDeque::from(steps))),
        }
    }

    pub async fn push_step(&self, step: MockStep) {
        self.script.lock().await.push_back(step);
    }

    async fn next_step(&self) -> Option<MockStep> {
        self.script.lock().await.pop_front()
    }

    fn usage_for(content_len: usize) -> TokenUsage {
        let completion_tokens = content_len as u32;
        TokenUsage {
            prompt_tokens: 1,
            completion_tokens,
            total_tokens: 1 + completion_tokens,
        }
    }

    fn fallback_response(request: &CompletionRequest) -> CompletionResponse {
        let text = request
            .messages
            .iter()
            .rev()
            .find(|msg| matches!(msg.role, Role::User))
            .map(|msg| format!("mock-echo: {}", msg.content))
            .unwrap_or_else(|| "mock-ok".to_string());

        CompletionResponse {
            usage: Some(Self::usage_for(text.len())),
            content: Some(text),
            finish_reason: FinishReason::Stop,
        }
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let step = self.next_step().await;
        let Some(step) = step else {
            return Ok(Self::fallback_response(&request));
        };

        if step.delay_ms > 0 {
            sleep(Duration::from_millis(step.delay_ms)).await;
        }

        match step.kind {
            MockStepKind::Text(content) => Ok(CompletionResponse {
                usage: Some(Self::usage_for(content.len())),
                content: Some(content),
                finish_reason: FinishReason::Stop,
            }),
            MockStepKind::Error(message) => Err(RelayError::Relay(message)),
            MockStepKind::Stream { deltas, error } => match error {
                Some(message) => Err(RelayError::Relay(message)),
                None => {
                    let content = deltas.concat();
                    Ok(CompletionResponse {
                        usage: Some(Self::usage_for(content.len())),
                        content: Some(content),
                        finish_reason: FinishReason::Stop,
                    })
                }
            },
        }
    }

    fn complete_stream(&self, request: CompletionRequest) -> ChatStream {
        let client = self.clone();
        Box::pin(try_stream! {
            match client.next_step().await {
                None => {
                    let response = Self::fallback_response(&request);
                    if let Some(content) = response.content
                        && !content.is_empty()
                    {
                        yield StreamChunk::text(content);
                    }
                    yield StreamChunk::final_chunk(response.finish_reason, response.usage);
                }
                Some(step) => {
                    if step.delay_ms > 0 {
                        sleep(Duration::from_millis(step.delay_ms)).await;
                    }

                    match step.kind {
                        MockStepKind::Text(content) => {
                            let usage = Self::usage_for(content.len());
                            if !content.is_empty() {
                                yield StreamChunk::text(content);
                            }
                            yield StreamChunk::final_chunk(FinishReason::Stop, Some(usage));
                        }
                        MockStepKind::Error(message) => {
                            Err(RelayError::Relay(message))?;
                        }
                        MockStepKind::Stream { deltas, error } => {
                            for delta in deltas {
                                yield StreamChunk::text(delta);
                            }
                            match error {
                                Some(message) => Err(RelayError::Relay(message))?,
                                None => yield StreamChunk::final_chunk(FinishReason::Stop, None),
                            }
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::{StreamExt, TryStreamExt};

    use super::*;
    use crate::client::Message;

    #[tokio::test]
    async fn mock_client_returns_scripted_text() {
        let client = MockChatClient::from_steps("mock-model", vec![MockStep::text("hello")]);

        let response = client
            .complete(CompletionRequest::new(vec![Message::user("ping")]))
            .await
            .expect("mock response should succeed");

        assert_eq!(response.content.as_deref(), Some("hello"));
        assert_eq!(response.finish_reason, FinishReason::Stop);
    }

    #[tokio::test]
    async fn mock_client_echoes_without_script() {
        let client = MockChatClient::new("mock-model");

        let response = client
            .complete(CompletionRequest::new(vec![Message::user("ping")]))
            .await
            .expect("fallback response should succeed");

        assert_eq!(response.content.as_deref(), Some("mock-echo: ping"));
    }

    #[tokio::test]
    async fn mock_client_supports_streaming() {
        let client = MockChatClient::from_steps("mock-model", vec![MockStep::text("stream")]);

        let chunks = client
            .complete_stream(CompletionRequest::new(vec![Message::user("hi")]))
            .try_collect::<Vec<_>>()
            .await
            .expect("stream should succeed");

        assert!(!chunks.is_empty());
        assert_eq!(chunks[0].text, "stream");
        assert!(chunks.last().is_some_and(|chunk| chunk.is_final()));
    }

    #[tokio::test]
    async fn mock_client_streams_deltas_individually() {
        let client =
            MockChatClient::from_steps("mock-model", vec![MockStep::stream(&["Hel", "lo"])]);

        let chunks = client
            .complete_stream(CompletionRequest::new(vec![Message::user("hi")]))
            .try_collect::<Vec<_>>()
            .await
            .expect("stream should succeed");

        // Two deltas plus the final bookkeeping chunk.
        assert_eq!(chunks.len(), 3);
        let text: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(text, "Hello");
        assert!(chunks.last().is_some_and(|chunk| chunk.is_final()));
    }

    #[tokio::test]
    async fn mock_client_fails_after_partial_stream() {
        let client = MockChatClient::from_steps(
            "mock-model",
            vec![MockStep::stream_then_error(&["par", "tial"], "connection reset")],
        );

        let mut stream =
            client.complete_stream(CompletionRequest::new(vec![Message::user("hi")]));
        let mut text = String::new();
        let mut error = None;
        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => text.push_str(&chunk.text),
                Err(e) => {
                    error = Some(e);
                    break;
                }
            }
        }

        assert_eq!(text, "partial");
        assert!(error.is_some());
    }

    #[tokio::test]
    async fn mock_client_streams_scripted_error() {
        let client = MockChatClient::from_steps("mock-model", vec![MockStep::error("boom")]);

        let result = client
            .complete_stream(CompletionRequest::new(vec![Message::user("hi")]))
            .try_collect::<Vec<_>>()
            .await;

        assert!(result.is_err());
    }
}
