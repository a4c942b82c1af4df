//! PersonaChat backend server.
//!
//! Exposes the REST surface the browser client talks to: character and
//! conversation CRUD, message persistence, and the streaming chat relay.

pub mod api;
pub mod config;
pub mod core;
pub mod middleware;

use std::sync::Arc;

use axum::{
    Extension, Router,
    http::{Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use api::characters::{
    create_character, delete_character, get_character, list_characters, list_default_characters,
    update_character,
};
use api::chat::relay_chat;
use api::conversations::{
    append_message, create_conversation, delete_conversation, get_conversation,
    list_conversations, list_messages,
};
use middleware::auth::{SessionTokens, auth_middleware};

pub use crate::core::{AppCore, AppState};

#[derive(serde::Serialize)]
struct Health {
    status: String,
}

async fn health() -> axum::Json<Health> {
    axum::Json(Health {
        status: "personachat is working!".to_string(),
    })
}

/// Build the application router with session tokens from the environment.
pub fn build_router(state: AppState) -> Router {
    build_router_with_tokens(state, SessionTokens::from_env())
}

/// Build the application router with an explicit token table (used by tests).
pub fn build_router_with_tokens(state: AppState, tokens: Arc<SessionTokens>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/health", get(health))
        // Chat streaming relay
        .route("/api/chat", post(relay_chat))
        // Character management (RESTful)
        .route("/api/characters", get(list_characters).post(create_character))
        .route("/api/characters/defaults", get(list_default_characters))
        .route(
            "/api/characters/{id}",
            get(get_character)
                .put(update_character)
                .delete(delete_character),
        )
        // Conversation management (RESTful)
        .route(
            "/api/conversations",
            get(list_conversations).post(create_conversation),
        )
        .route(
            "/api/conversations/{id}",
            get(get_conversation).delete(delete_conversation),
        )
        .route(
            "/api/conversations/{id}/messages",
            get(list_messages).post(append_message),
        )
        .layer(axum_middleware::from_fn(auth_middleware))
        .layer(Extension(tokens))
        .layer(cors)
        .with_state(state)
}
