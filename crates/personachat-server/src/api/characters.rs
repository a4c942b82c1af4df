//! Character CRUD handlers.
//!
//! Every user sees the built-in default characters alongside their own.
//! Defaults are resolved from the static table per locale and are read-only;
//! only user-created characters can be updated or deleted.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use personachat_models::{Character, Locale, default_character, default_characters};

use crate::api::response::ApiResponse;
use crate::core::AppState;
use crate::middleware::auth::AuthUser;

#[derive(Debug, Deserialize)]
pub struct LocaleQuery {
    locale: Option<String>,
}

impl LocaleQuery {
    pub fn locale(&self) -> Locale {
        Locale::parse(self.locale.as_deref().unwrap_or(""))
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCharacterRequest {
    pub name: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub greeting: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCharacterRequest {
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub description: Option<String>,
    pub greeting: Option<String>,
}

/// Resolve a character visible to `user_id`: their own characters plus the
/// built-in defaults. Other users' characters resolve to `None`.
pub(crate) fn resolve_character(
    state: &AppState,
    user_id: &str,
    id: &str,
    locale: Locale,
) -> anyhow::Result<Option<Character>> {
    if let Some(character) = state.storage.characters.get(id)? {
        if character.user_id.as_deref() == Some(user_id) {
            return Ok(Some(character));
        }
        return Ok(None);
    }
    Ok(default_character(id, locale))
}

pub async fn list_characters(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Query(query): Query<LocaleQuery>,
) -> impl IntoResponse {
    match state.storage.characters.list_for_user(&user_id) {
        Ok(own) => {
            let mut characters = default_characters(query.locale());
            characters.extend(own);
            Json(ApiResponse::ok(characters)).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to list characters: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(format!(
                    "Failed to list characters: {}",
                    e
                ))),
            )
                .into_response()
        }
    }
}

pub async fn list_default_characters(Query(query): Query<LocaleQuery>) -> impl IntoResponse {
    Json(ApiResponse::ok(default_characters(query.locale())))
}

pub async fn create_character(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(payload): Json<CreateCharacterRequest>,
) -> impl IntoResponse {
    if payload.name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error("Character name is required")),
        )
            .into_response();
    }

    let character = Character::new(
        &user_id,
        payload.name,
        payload.avatar_url,
        payload.description,
        payload.greeting,
    );

    match state.storage.characters.insert(&character) {
        Ok(()) => (StatusCode::CREATED, Json(ApiResponse::ok(character))).into_response(),
        Err(e) => {
            tracing::error!("Failed to create character: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(format!(
                    "Failed to create character: {}",
                    e
                ))),
            )
                .into_response()
        }
    }
}

pub async fn get_character(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<String>,
    Query(query): Query<LocaleQuery>,
) -> impl IntoResponse {
    match resolve_character(&state, &user_id, &id, query.locale()) {
        Ok(Some(character)) => Json(ApiResponse::ok(character)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::error(format!(
                "Character not found: {}",
                id
            ))),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to get character {}: {}", id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(format!(
                    "Failed to get character: {}",
                    e
                ))),
            )
                .into_response()
        }
    }
}

pub async fn update_character(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateCharacterRequest>,
) -> impl IntoResponse {
    if Character::is_default_id(&id) {
        return (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::<()>::error(
                "Default characters cannot be modified",
            )),
        )
            .into_response();
    }

    let mut character = match state.storage.characters.get(&id) {
        Ok(Some(character)) if character.user_id.as_deref() == Some(user_id.as_str()) => character,
        Ok(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<()>::error(format!(
                    "Character not found: {}",
                    id
                ))),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!("Failed to get character {}: {}", id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(format!(
                    "Failed to update character: {}",
                    e
                ))),
            )
                .into_response();
        }
    };

    if let Some(name) = payload.name {
        character.name = name;
    }
    if let Some(avatar_url) = payload.avatar_url {
        character.avatar_url = avatar_url;
    }
    if let Some(description) = payload.description {
        character.description = description;
    }
    if let Some(greeting) = payload.greeting {
        character.greeting = greeting;
    }

    match state.storage.characters.update(&character) {
        Ok(()) => Json(ApiResponse::ok(character)).into_response(),
        Err(e) => {
            tracing::error!("Failed to update character {}: {}", id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(format!(
                    "Failed to update character: {}",
                    e
                ))),
            )
                .into_response()
        }
    }
}

pub async fn delete_character(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if Character::is_default_id(&id) {
        return (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::<()>::error(
                "Default characters cannot be deleted",
            )),
        )
            .into_response();
    }

    // Ownership check before touching the row.
    match state.storage.characters.get(&id) {
        Ok(Some(character)) if character.user_id.as_deref() == Some(user_id.as_str()) => {}
        Ok(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<()>::error(format!(
                    "Character not found: {}",
                    id
                ))),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!("Failed to get character {}: {}", id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(format!(
                    "Failed to delete character: {}",
                    e
                ))),
            )
                .into_response();
        }
    }

    match state.storage.characters.delete(&id) {
        Ok(true) => Json(ApiResponse::message(format!("Character {} deleted", id))).into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::error(format!(
                "Character not found: {}",
                id
            ))),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to delete character {}: {}", id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(format!(
                    "Failed to delete character: {}",
                    e
                ))),
            )
                .into_response()
        }
    }
}
