//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        GoogleVerifier, OpenAiChordAdapter, OpenAiDrawingAdapter, OpenAiSoundDesignAdapter,
        OpenAiWritingAdapter, PgStore, RedisCache, WebhookNotifier,
    },
    config::Config,
    error::ApiError,
    web::{auth::TokenKeys, router, rest::ApiDoc, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db = Arc::new(PgStore::new(db_pool));
    info!("Running database migrations...");
    db.run_migrations()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    info!("Database migrations complete.");

    // --- 3. Connect to the Cache Store ---
    info!("Connecting to cache store...");
    let cache = Arc::new(RedisCache::connect(&config.redis_url).await?);

    // --- 4. Initialize Service Adapters ---
    // Without an API key the writing generator serves template output and
    // the other generators report upstream failure.
    let openai_client = config.openai_api_key.as_deref().map(|key| {
        Client::with_config(OpenAIConfig::new().with_api_key(key))
    });
    if openai_client.is_none() {
        info!("OPENAI_API_KEY not set, writing prompts will use template generation");
    }
    let timeout = Duration::from_secs(config.generation_timeout_secs);

    let writing_adapter = Arc::new(OpenAiWritingAdapter::new(
        openai_client.clone(),
        config.generation_model.clone(),
        timeout,
    ));
    let drawing_adapter = Arc::new(OpenAiDrawingAdapter::new(
        openai_client.clone(),
        config.vision_model.clone(),
        timeout,
    ));
    let sound_adapter = Arc::new(OpenAiSoundDesignAdapter::new(
        openai_client.clone(),
        config.generation_model.clone(),
        timeout,
        cache.clone(),
    ));
    let chord_adapter = Arc::new(OpenAiChordAdapter::new(
        openai_client,
        config.generation_model.clone(),
        timeout,
    ));

    let http = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let identity = Arc::new(GoogleVerifier::new(
        http.clone(),
        config.google_client_id.clone(),
    ));
    let notifier = Arc::new(WebhookNotifier::new(http, config.webhook_url.clone()));

    // --- 5. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        db,
        cache: cache.clone(),
        writing_prompts: writing_adapter.clone(),
        writing_feedback: writing_adapter,
        drawing: drawing_adapter,
        sound_design: sound_adapter,
        chords: chord_adapter,
        identity,
        notifier,
        token_keys: TokenKeys::new(config.token_secret.as_bytes()),
        config: config.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .map_err(|e| ApiError::Internal(e.to_string()))?,
        )
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 6. Create the Web Router ---
    let api_router = router(app_state).layer(cors);

    // Merge the API router with the Swagger UI router for a complete
    // application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 7. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
