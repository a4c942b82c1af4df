//! Streaming chat relay.
//!
//! Forwards the client's role-tagged messages to the completion provider and
//! relays the decoded token stream back as a plain-text chunked body. Text
//! arrives incrementally, in upstream order, with no envelope around it.

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use bytes::Bytes;
use futures::StreamExt;
use serde::Deserialize;

use personachat_relay::{CompletionRequest, Message};

use crate::api::response::ApiResponse;
use crate::core::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRelayRequest {
    pub messages: Vec<Message>,
    pub model: Option<String>,
}

pub async fn relay_chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRelayRequest>,
) -> impl IntoResponse {
    if payload.messages.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error("At least one message is required")),
        )
            .into_response();
    }

    let mut request = CompletionRequest::new(payload.messages);
    if let Some(model) = payload.model {
        request = request.with_model(model);
    }

    let mut upstream = state.relay.complete_stream(request);

    // Peek the first item so provider rejections surface as a clean 500
    // instead of an already-started body.
    let first = upstream.next().await;
    if let Some(Err(e)) = &first {
        tracing::error!("Chat relay failed before streaming: {}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, "An error occurred").into_response();
    }

    let chunks = futures::stream::iter(first).chain(upstream);
    let body = chunks.filter_map(|item| async move {
        match item {
            Ok(chunk) if chunk.text.is_empty() => None,
            Ok(chunk) => Some(Ok(Bytes::from(chunk.text))),
            Err(e) => {
                tracing::error!("Chat relay stream failed: {}", e);
                Some(Err(std::io::Error::other(e.to_string())))
            }
        }
    });

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(body),
    )
        .into_response()
}
