//! Bearer-token request scoping.
//!
//! Tokens are configured through `PERSONACHAT_SESSION_TOKENS` as
//! comma-separated `user_id:token` pairs and matched by SHA-256 hash. When no
//! tokens are configured the server runs in single-user mode and every
//! request is attributed to the local user.

use axum::{
    Json,
    extract::Request,
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::env;
use std::sync::Arc;

/// User identity the request was authenticated as.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

pub const LOCAL_USER: &str = "local";

/// Token table mapping hashed bearer tokens to user ids.
#[derive(Debug, Default)]
pub struct SessionTokens {
    users_by_hash: HashMap<String, String>,
}

impl SessionTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Arc<Self> {
        let mut tokens = Self::new();
        if let Ok(raw) = env::var("PERSONACHAT_SESSION_TOKENS") {
            for entry in raw.split(',').map(str::trim).filter(|v| !v.is_empty()) {
                match entry.split_once(':') {
                    Some((user_id, token)) if !user_id.is_empty() && !token.is_empty() => {
                        tokens.insert(user_id, token);
                    }
                    _ => {
                        tracing::warn!("Ignoring malformed session token entry");
                    }
                }
            }
        }
        Arc::new(tokens)
    }

    pub fn insert(&mut self, user_id: impl Into<String>, token: &str) {
        self.users_by_hash.insert(hash_token(token), user_id.into());
    }

    pub fn is_empty(&self) -> bool {
        self.users_by_hash.is_empty()
    }

    /// Resolve a bearer token to the user id it belongs to.
    pub fn resolve(&self, token: &str) -> Option<String> {
        self.users_by_hash.get(&hash_token(token)).cloned()
    }
}

fn hash_token(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

pub async fn auth_middleware(mut req: Request, next: Next) -> Response {
    let path = req.uri().path();
    if !path.starts_with("/api") {
        return next.run(req).await;
    }

    let tokens = req.extensions().get::<Arc<SessionTokens>>().cloned();
    let Some(tokens) = tokens.filter(|tokens| !tokens.is_empty()) else {
        req.extensions_mut().insert(AuthUser(LOCAL_USER.to_string()));
        return next.run(req).await;
    };

    let token = match extract_bearer(req.headers().get(axum::http::header::AUTHORIZATION)) {
        Some(token) => token,
        None => return unauthorized(),
    };

    match tokens.resolve(&token) {
        Some(user_id) => {
            req.extensions_mut().insert(AuthUser(user_id));
            next.run(req).await
        }
        None => unauthorized(),
    }
}

fn extract_bearer(header: Option<&HeaderValue>) -> Option<String> {
    let value = header?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(|token| token.trim().to_string())
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "Unauthorized"})),
    )
        .into_response()
}
