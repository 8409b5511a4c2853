//! User key authentication extractor

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;

pub const USER_KEY_HEADER: &str = "x-user-key";

/// Extractor that requires a valid user key when keys are configured
///
/// Reads `X-User-Key: <key>` or `Authorization: Bearer <key>`. Holds the
/// presented key, or `None` when no keys are configured.
#[derive(Debug, Clone)]
pub struct RequireUserKey(pub Option<String>);

impl FromRequestParts<AppState> for RequireUserKey {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !state.requires_user_key() {
            return Ok(RequireUserKey(None));
        }

        let key = extract_user_key(&parts.headers)?;

        if !state.is_valid_user_key(&key) {
            debug!(key_prefix = %key.chars().take(4).collect::<String>(), "Rejected user key");
            return Err(ApiError::unauthorized("Invalid user key"));
        }

        Ok(RequireUserKey(Some(key)))
    }
}

fn extract_user_key(headers: &HeaderMap) -> Result<String, ApiError> {
    if let Some(value) = headers.get(USER_KEY_HEADER) {
        let key = value
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid X-User-Key header encoding"))?
            .trim();

        if !key.is_empty() {
            return Ok(key.to_string());
        }
    }

    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let auth = value
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid Authorization header encoding"))?;

        if let Some(token) = auth.strip_prefix("Bearer ") {
            return Ok(token.trim().to_string());
        }
    }

    Err(ApiError::unauthorized(
        "User key required. Provide via 'X-User-Key: <key>' or 'Authorization: Bearer <key>' header",
    ))
}
