pub mod auth;
pub mod middleware;
pub mod rate_limit;
pub mod rest;
pub mod state;

pub use middleware::require_auth;
pub use rest::ApiDoc;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use state::AppState;
use std::sync::Arc;

/// Builds the application router: public routes, protected routes behind the
/// auth gate, and the shared body limit.
pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(rest::health_handler))
        .route("/api/auth/google", post(auth::google_login_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/api/prompts", post(rest::generate_prompt_handler))
        .route("/api/prompts/history", get(rest::prompt_history_handler))
        .route("/api/prompts/feedback", post(rest::rate_prompt_handler))
        .route("/api/writing/feedback", post(rest::writing_feedback_handler))
        .route("/api/drawing/prompts", post(rest::drawing_prompt_handler))
        .route("/api/drawing/feedback", post(rest::drawing_feedback_handler))
        .route("/api/sound-design/prompts", post(rest::sound_design_handler))
        .route("/api/chord-progression", post(rest::chord_progression_handler))
        .route("/api/user/profile", get(rest::profile_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        // 20 MiB images arrive base64-inflated inside a JSON envelope, so the
        // body cap sits well above the image cap; oversized images still get
        // their 413 from validation.
        .layer(DefaultBodyLimit::max(64 * 1024 * 1024))
        .with_state(state)
}
