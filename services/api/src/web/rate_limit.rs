//! services/api/src/web/rate_limit.rs
//!
//! Per-user rate limiting over the counter store. Generation handlers call
//! `enforce` after validation and before their outbound call.

use axum::{http::StatusCode, Json};
use tracing::error;
use uuid::Uuid;

use crate::web::rest::{reject, ErrorBody};
use crate::web::state::AppState;

/// Counts this request against the user's window and rejects with 429 once
/// the post-increment count exceeds the configured threshold. Rejected
/// attempts keep counting; the counter resets when the window expires.
pub async fn enforce(
    state: &AppState,
    user_id: Uuid,
) -> Result<(), (StatusCode, Json<ErrorBody>)> {
    let key = format!("rate:{user_id}");
    let count = state
        .cache
        .increment_with_expiry(&key, state.config.rate_limit_window_secs)
        .await
        .map_err(|e| {
            error!("Rate limiter unavailable: {:?}", e);
            reject(StatusCode::INTERNAL_SERVER_ERROR, "Request failed")
        })?;

    if count > state.config.rate_limit_max {
        return Err(reject(
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded. Try again later.",
        ));
    }
    Ok(())
}
