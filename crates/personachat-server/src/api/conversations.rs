//! Conversation and message handlers.
//!
//! Conversations are scoped to their owner: requests for another user's
//! conversation answer not-found rather than forbidden, so ids leak nothing.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use personachat_models::{ChatRole, Conversation, StoredMessage, default_greeting};

use crate::api::characters::{LocaleQuery, resolve_character};
use crate::api::response::ApiResponse;
use crate::core::AppState;
use crate::middleware::auth::AuthUser;

#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    pub title: String,
    pub character_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AppendMessageRequest {
    pub role: ChatRole,
    pub content: String,
}

/// Load a conversation if it exists and belongs to `user_id`.
fn owned_conversation(
    state: &AppState,
    user_id: &str,
    id: &str,
) -> anyhow::Result<Option<Conversation>> {
    Ok(state
        .storage
        .conversations
        .get(id)?
        .filter(|conversation| conversation.user_id == user_id))
}

pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> impl IntoResponse {
    match state.storage.conversations.list_for_user(&user_id) {
        Ok(conversations) => Json(ApiResponse::ok(conversations)).into_response(),
        Err(e) => {
            tracing::error!("Failed to list conversations: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(format!(
                    "Failed to list conversations: {}",
                    e
                ))),
            )
                .into_response()
        }
    }
}

pub async fn create_conversation(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(payload): Json<CreateConversationRequest>,
) -> impl IntoResponse {
    if payload.title.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error("Conversation title is required")),
        )
            .into_response();
    }

    let mut conversation = Conversation::new(&user_id, payload.title);
    if let Some(character_id) = payload.character_id {
        conversation = conversation.with_character(character_id);
    }

    match state.storage.conversations.create(&conversation) {
        Ok(()) => (StatusCode::CREATED, Json(ApiResponse::ok(conversation))).into_response(),
        Err(e) => {
            tracing::error!("Failed to create conversation: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(format!(
                    "Failed to create conversation: {}",
                    e
                ))),
            )
                .into_response()
        }
    }
}

pub async fn get_conversation(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match owned_conversation(&state, &user_id, &id) {
        Ok(Some(conversation)) => Json(ApiResponse::ok(conversation)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::error(format!(
                "Conversation not found: {}",
                id
            ))),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to get conversation {}: {}", id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(format!(
                    "Failed to get conversation: {}",
                    e
                ))),
            )
                .into_response()
        }
    }
}

pub async fn delete_conversation(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match owned_conversation(&state, &user_id, &id) {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<()>::error(format!(
                    "Conversation not found: {}",
                    id
                ))),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!("Failed to get conversation {}: {}", id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(format!(
                    "Failed to delete conversation: {}",
                    e
                ))),
            )
                .into_response();
        }
    }

    match state.storage.delete_conversation_cascade(&id) {
        Ok(true) => {
            Json(ApiResponse::message(format!("Conversation {} deleted", id))).into_response()
        }
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::error(format!(
                "Conversation not found: {}",
                id
            ))),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to delete conversation {}: {}", id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(format!(
                    "Failed to delete conversation: {}",
                    e
                ))),
            )
                .into_response()
        }
    }
}

/// List a conversation's turns ordered by creation time.
///
/// An empty conversation answers a single synthetic greeting message from the
/// attached character (or the generic fallback). The greeting is never
/// persisted; it exists only in the response.
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<String>,
    Query(query): Query<LocaleQuery>,
) -> impl IntoResponse {
    let conversation = match owned_conversation(&state, &user_id, &id) {
        Ok(Some(conversation)) => conversation,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<()>::error(format!(
                    "Conversation not found: {}",
                    id
                ))),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!("Failed to get conversation {}: {}", id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(format!(
                    "Failed to list messages: {}",
                    e
                ))),
            )
                .into_response();
        }
    };

    let messages = match state.storage.messages.list(&id) {
        Ok(messages) => messages,
        Err(e) => {
            tracing::error!("Failed to list messages for {}: {}", id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(format!(
                    "Failed to list messages: {}",
                    e
                ))),
            )
                .into_response();
        }
    };

    if !messages.is_empty() {
        return Json(ApiResponse::ok(messages)).into_response();
    }

    let locale = query.locale();
    let greeting = match conversation
        .character_id
        .as_deref()
        .map(|character_id| resolve_character(&state, &user_id, character_id, locale))
        .transpose()
    {
        Ok(character) => character
            .flatten()
            .map(|character| character.greeting)
            .unwrap_or_else(|| default_greeting(locale).to_string()),
        Err(e) => {
            tracing::error!("Failed to resolve character for {}: {}", id, e);
            default_greeting(locale).to_string()
        }
    };

    Json(ApiResponse::ok(vec![StoredMessage::assistant(
        &id, greeting,
    )]))
    .into_response()
}

pub async fn append_message(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<AppendMessageRequest>,
) -> impl IntoResponse {
    if payload.role == ChatRole::System {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error(
                "Only user and assistant turns can be persisted",
            )),
        )
            .into_response();
    }
    if payload.content.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error("Message content is required")),
        )
            .into_response();
    }

    match owned_conversation(&state, &user_id, &id) {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<()>::error(format!(
                    "Conversation not found: {}",
                    id
                ))),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!("Failed to get conversation {}: {}", id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(format!(
                    "Failed to append message: {}",
                    e
                ))),
            )
                .into_response();
        }
    }

    let message = StoredMessage::new(&id, payload.role, payload.content);
    let appended = state
        .storage
        .messages
        .append(&message)
        .and_then(|()| state.storage.conversations.touch(&id));

    match appended {
        Ok(()) => (StatusCode::CREATED, Json(ApiResponse::ok(message))).into_response(),
        Err(e) => {
            tracing::error!("Failed to append message to {}: {}", id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(format!(
                    "Failed to append message: {}",
                    e
                ))),
            )
                .into_response()
        }
    }
}
