//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::web::state::AppState;

/// The identity attached to a request that passed the auth gate.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

/// Middleware that validates the bearer token and extracts the caller's
/// identity.
///
/// A missing or malformed Authorization header is 401; a token that fails
/// verification is 403. On success the identity lands in request extensions
/// for handlers to use.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract the bearer token
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Verify signature and expiry
    let claims = state.token_keys.verify(token).map_err(|e| {
        warn!("Rejected bearer token: {e}");
        StatusCode::FORBIDDEN
    })?;

    // 3. Attach the identity for downstream handlers
    req.extensions_mut().insert(AuthUser {
        user_id: claims.sub,
        email: claims.email,
    });

    // 4. Continue to the handler
    Ok(next.run(req).await)
}
