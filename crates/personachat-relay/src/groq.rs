//! Groq provider (OpenAI-compatible wire format).

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::client::{
    ChatClient, ChatStream, CompletionRequest, CompletionResponse, FinishReason, Message, Role,
    StreamChunk, TokenUsage,
};
use crate::error::{RelayError, Result};
use crate::http_client::build_http_client;
use crate::retry::{RetryConfig, response_to_error};

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_MODEL: &str = "openai/gpt-oss-20b";

/// Groq client.
pub struct GroqClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    retry_config: RetryConfig,
}

impl GroqClient {
    /// Create a new Groq client.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: build_http_client(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            retry_config: RetryConfig::default(),
        }
    }

    /// Set the default model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set custom base URL (for API-compatible services).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    fn model_for(&self, request: &CompletionRequest) -> String {
        request
            .model
            .clone()
            .unwrap_or_else(|| self.model.clone())
    }
}

#[derive(Serialize)]
struct GroqRequest {
    model: String,
    messages: Vec<GroqMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Serialize)]
struct GroqMessage {
    role: &'static str,
    content: String,
}

fn to_wire_messages(messages: &[Message]) -> Vec<GroqMessage> {
    messages
        .iter()
        .map(|m| GroqMessage {
            role: match m.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: m.content.clone(),
        })
        .collect()
}

fn to_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "stop" => FinishReason::Stop,
        "length" => FinishReason::MaxTokens,
        _ => FinishReason::Error,
    }
}

#[derive(Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
    usage: Option<GroqUsage>,
}

#[derive(Deserialize)]
struct GroqChoice {
    message: GroqResponseMessage,
    finish_reason: String,
}

#[derive(Deserialize)]
struct GroqResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct GroqUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl From<GroqUsage> for TokenUsage {
    fn from(usage: GroqUsage) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

// Streaming types

#[derive(Deserialize, Debug)]
struct GroqStreamResponse {
    #[serde(default)]
    choices: Vec<GroqStreamChoice>,
    usage: Option<GroqUsage>,
}

#[derive(Deserialize, Debug)]
struct GroqStreamChoice {
    delta: GroqStreamDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct GroqStreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl ChatClient for GroqClient {
    fn provider(&self) -> &str {
        "groq"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = GroqRequest {
            model: self.model_for(&request),
            messages: to_wire_messages(&request.messages),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        };

        let mut last_error = None;

        for attempt in 0..=self.retry_config.max_retries {
            let response = match self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    let error = RelayError::Http(e);
                    if !error.is_retryable() || attempt == self.retry_config.max_retries {
                        return Err(error);
                    }
                    let delay = self.retry_config.delay_for(attempt + 1, None);
                    tracing::warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis(),
                        "Retrying Groq request after connection error"
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(error);
                    continue;
                }
            };

            if response.status().is_success() {
                let data: GroqResponse = response.json().await?;
                let choice = data
                    .choices
                    .into_iter()
                    .next()
                    .ok_or_else(|| RelayError::Relay("No response from Groq".to_string()))?;

                return Ok(CompletionResponse {
                    content: choice.message.content,
                    finish_reason: to_finish_reason(&choice.finish_reason),
                    usage: data.usage.map(TokenUsage::from),
                });
            }

            let error = response_to_error(response, "Groq").await;
            if !error.is_retryable() || attempt == self.retry_config.max_retries {
                return Err(error);
            }

            let delay = self
                .retry_config
                .delay_for(attempt + 1, error.retry_after());
            tracing::warn!(
                attempt = attempt + 1,
                delay_ms = delay.as_millis(),
                "Retrying Groq request"
            );
            tokio::time::sleep(delay).await;
            last_error = Some(error);
        }

        Err(last_error
            .unwrap_or_else(|| RelayError::Relay("Groq request failed after retries".to_string())))
    }

    fn complete_stream(&self, request: CompletionRequest) -> ChatStream {
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let base_url = self.base_url.clone();
        let model = self.model_for(&request);

        Box::pin(async_stream::stream! {
            let body = GroqRequest {
                model,
                messages: to_wire_messages(&request.messages),
                temperature: request.temperature,
                max_tokens: request.max_tokens,
                stream: true,
            };

            let response = match client
                .post(format!("{}/chat/completions", base_url))
                .header("Authorization", format!("Bearer {}", api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    yield Err(RelayError::Relay(format!("Request failed: {}", e)));
                    return;
                }
            };

            if !response.status().is_success() {
                yield Err(response_to_error(response, "Groq").await);
                return;
            }

            let mut byte_stream = response.bytes_stream();
            let mut buffer = SseEventBuffer::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        yield Err(RelayError::Relay(format!("Stream error: {}", e)));
                        return;
                    }
                };

                for chunk in buffer.push(&String::from_utf8_lossy(&bytes)) {
                    yield Ok(chunk);
                }
            }

            for chunk in buffer.finish() {
                yield Ok(chunk);
            }
        })
    }
}

/// Accumulates raw network bytes and hands out complete SSE events.
///
/// Upstream TCP chunks do not align with event boundaries, so an event may
/// arrive split across several reads. Events are only decoded once their
/// `\n\n` terminator has been buffered.
struct SseEventBuffer {
    buffer: String,
}

impl SseEventBuffer {
    fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    /// Feed incoming data; returns chunks for every event now complete.
    fn push(&mut self, data: &str) -> Vec<StreamChunk> {
        self.buffer.push_str(data);

        let mut chunks = Vec::new();
        while let Some(pos) = self.buffer.find("\n\n") {
            let event: String = self.buffer.drain(..pos + 2).collect();
            chunks.extend(decode_sse_event(event.trim_end()));
        }
        chunks
    }

    /// Decode whatever remains after upstream EOF. Handles a final event
    /// whose `\n\n` terminator never arrived (e.g. a network interruption).
    fn finish(self) -> Vec<StreamChunk> {
        let remaining = self.buffer.trim();
        if remaining.is_empty() {
            Vec::new()
        } else {
            decode_sse_event(remaining)
        }
    }
}

/// Decode one SSE event into stream chunks.
///
/// `[DONE]` markers and undecodable payloads produce nothing; a `stop` finish
/// reason is deferred to the usage event that follows it so only one final
/// chunk is emitted.
fn decode_sse_event(event_str: &str) -> Vec<StreamChunk> {
    let mut chunks = Vec::new();

    for line in event_str.lines() {
        let Some(data) = line.strip_prefix("data: ") else {
            continue;
        };
        if data.trim() == "[DONE]" || data.trim().is_empty() {
            continue;
        }

        let parsed: GroqStreamResponse = match serde_json::from_str(data) {
            Ok(p) => p,
            Err(_) => continue,
        };

        // Usage arrives in a dedicated event at the end of the stream.
        if let Some(usage) = parsed.usage {
            chunks.push(StreamChunk::final_chunk(
                FinishReason::Stop,
                Some(usage.into()),
            ));
            continue;
        }

        for choice in parsed.choices {
            if let Some(finish_reason) = choice.finish_reason {
                let reason = to_finish_reason(&finish_reason);
                if reason != FinishReason::Stop {
                    chunks.push(StreamChunk::final_chunk(reason, None));
                }
                continue;
            }

            if let Some(content) = choice.delta.content
                && !content.is_empty()
            {
                chunks.push(StreamChunk::text(content));
            }
        }
    }

    chunks
}
