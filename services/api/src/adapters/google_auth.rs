//! services/api/src/adapters/google_auth.rs
//!
//! This module contains the adapter for verifying Google sign-in
//! credentials. It implements the `IdentityVerifier` port from the `core`
//! crate against Google's tokeninfo endpoint.

use async_trait::async_trait;
use muse_core::{
    domain::GoogleIdentity,
    ports::{IdentityVerifier, PortError, PortResult},
};
use serde::Deserialize;
use tracing::warn;

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// The subset of tokeninfo claims this service reads.
#[derive(Deserialize)]
struct TokenInfo {
    aud: String,
    sub: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `IdentityVerifier` against Google's tokeninfo
/// endpoint.
#[derive(Clone)]
pub struct GoogleVerifier {
    http: reqwest::Client,
    client_id: String,
}

impl GoogleVerifier {
    /// Creates a new `GoogleVerifier` for the given OAuth client id.
    pub fn new(http: reqwest::Client, client_id: String) -> Self {
        Self { http, client_id }
    }
}

//=========================================================================================
// `IdentityVerifier` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityVerifier for GoogleVerifier {
    /// Verifies a sign-in credential. Any failure along the way - transport
    /// error, non-2xx status, malformed claims, audience mismatch - maps to
    /// `Unauthorized`; the caller never learns which check failed.
    async fn verify_credential(&self, credential: &str) -> PortResult<GoogleIdentity> {
        let response = self
            .http
            .get(TOKENINFO_URL)
            .query(&[("id_token", credential)])
            .send()
            .await
            .map_err(|e| {
                warn!("tokeninfo request failed: {e}");
                PortError::Unauthorized
            })?;

        if !response.status().is_success() {
            return Err(PortError::Unauthorized);
        }

        let info: TokenInfo = response.json().await.map_err(|e| {
            warn!("tokeninfo response was malformed: {e}");
            PortError::Unauthorized
        })?;

        // The credential must have been issued to this application.
        if info.aud != self.client_id {
            return Err(PortError::Unauthorized);
        }

        Ok(GoogleIdentity {
            subject: info.sub,
            email: info.email.clone(),
            display_name: info.name.unwrap_or(info.email),
            avatar_url: info.picture,
        })
    }
}
