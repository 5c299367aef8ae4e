//! Authentication middleware
//!
//! `require_auth` is layered onto the protected route group and runs before
//! any handler: it validates the bearer access token and stores the resolved
//! [`AuthUser`] in the request extensions, or short-circuits with 401.
//! Handlers then take `AuthUser` as an extractor.
//!
//! The store is never consulted here, so an access token stays usable until
//! it expires even after its owner signs out.

use super::jwt::{Identity, TokenIssuer};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::debug;

/// Authenticated caller, resolved from the access token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub identity: Identity,
}

/// Resolve an `Authorization` header value to the caller's identity
pub fn authenticate(tokens: &TokenIssuer, header: Option<&str>) -> Result<AuthUser, ApiError> {
    let header =
        header.ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Invalid authorization format".to_string()))?;

    let claims = tokens.verify_access(token).map_err(|e| {
        debug!(error = %e, "Rejected access token");
        ApiError::Unauthorized(format!("Invalid token: {}", e))
    })?;

    Ok(AuthUser {
        identity: claims.identity(),
    })
}

/// Middleware gating a route group behind a valid access token
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let user = authenticate(state.tokens(), header)?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        // Route mounted without the layer: authenticate here instead
        let app_state = AppState::from_ref(state);
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        authenticate(app_state.tokens(), header)
    }
}
