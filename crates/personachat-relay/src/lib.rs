//! Streaming relay client for OpenAI-compatible completion providers.
//!
//! The chat backend forwards role-tagged message lists to a hosted model and
//! relays the token stream back to the browser. This crate holds the provider
//! abstraction (`ChatClient`), the Groq implementation, and a scripted mock
//! for tests.

mod client;
mod error;
mod groq;
mod http_client;
mod mock;
mod retry;

pub use client::{
    ChatClient, ChatStream, CompletionRequest, CompletionResponse, FinishReason, Message, Role,
    StreamChunk, TokenUsage,
};
pub use error::{RelayError, Result};
pub use groq::GroqClient;
pub use mock::{MockChatClient, MockStep, MockStepKind};
pub use retry::RetryConfig;
