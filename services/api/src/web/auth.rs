//! services/api/src/web/auth.rs
//!
//! Authentication: signed bearer-token issuance/verification and the
//! Google sign-in endpoint.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use muse_core::domain::UserProfile;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::rest::{reject, ApiJson, ErrorBody, UserDto};
use crate::web::state::AppState;

/// How long an issued token stays valid.
pub const TOKEN_TTL_DAYS: i64 = 30;

//=========================================================================================
// Token Issuance and Verification
//=========================================================================================

/// Claims carried by an issued bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
}

/// The signing/verification keys, derived once from the configured secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Issues a token for the user, expiring after `TOKEN_TTL_DAYS`.
    pub fn issue(&self, user: &UserProfile) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            exp: (Utc::now() + Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
        };
        encode(&Header::default(), &claims, &self.encoding)
    }

    /// Verifies a token's signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &Validation::default()).map(|data| data.claims)
    }
}

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct GoogleLoginRequest {
    pub credential: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserDto,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/auth/google - Sign in with a Google credential
#[utoipa::path(
    post,
    path = "/api/auth/google",
    request_body = GoogleLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Credential rejected", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn google_login_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<GoogleLoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    // 1. Verify the credential with the identity provider
    let identity = state
        .identity
        .verify_credential(&req.credential)
        .await
        .map_err(|_| reject(StatusCode::UNAUTHORIZED, "Invalid credential"))?;

    // 2. Create or refresh the user row
    let user = state.db.upsert_user(&identity).await.map_err(|e| {
        error!("Failed to upsert user: {:?}", e);
        reject(StatusCode::INTERNAL_SERVER_ERROR, "Login failed")
    })?;

    // 3. Issue the bearer token
    let token = state.token_keys.issue(&user).map_err(|e| {
        error!("Failed to issue token: {:?}", e);
        reject(StatusCode::INTERNAL_SERVER_ERROR, "Login failed")
    })?;

    Ok((
        StatusCode::OK,
        Json(AuthResponse {
            token,
            user: UserDto::from_domain(user),
        }),
    ))
}
