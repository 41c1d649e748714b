//! Authentication middleware
//!
//! Resolves the session token from the session cookie or an
//! `Authorization: Bearer` header and stores the caller as an
//! `AuthenticatedUser` request extension.

use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
        HeaderMap,
    },
    middleware::Next,
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

use crate::{error::AppError, services::AuthService, state::AppState};

/// Caller identity for the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub username: String,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();

    let Some(token) = session_token(request.headers(), &state.config().jwt.cookie_name) else {
        debug!(path = %path, "Auth failed: no session cookie or bearer token");
        return Err(AppError::Unauthorized);
    };

    let user = AuthService::authenticate(&token, &state.config().jwt.secret).map_err(|e| {
        debug!(path = %path, error = %e, "Auth failed: token rejected");
        e
    })?;

    debug!(path = %path, user_id = %user.id, "User authenticated");

    request.extensions_mut().insert(AuthenticatedUser {
        id: user.id,
        username: user.username,
    });
    Ok(next.run(request).await)
}

/// Session token from the cookie, falling back to a bearer header
fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let from_cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty());

    from_cookie.or_else(|| {
        headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    })
}
