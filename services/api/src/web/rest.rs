//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification. Every handler follows the same
//! shape: validate in a fixed order, short-circuit on the first failure,
//! check the rate limit, make one outbound generation call, and map the
//! result 1:1 into the response body.

use axum::{
    extract::{FromRequest, Request, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use muse_core::{
    domain::{
        DrawingSubmission, GeneratedPrompt, PromptEvent, SoundDesignBrief, SoundExerciseKind,
        StoredPrompt, UserProfile, WritingSubmission,
    },
    ports::PortError,
    validate::{self, ValidationError},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::web::middleware::AuthUser;
use crate::web::rate_limit;
use crate::web::state::AppState;

/// Ratings are kept for 30 days.
const RATING_TTL_SECS: u64 = 30 * 24 * 60 * 60;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::google_login_handler,
        generate_prompt_handler,
        prompt_history_handler,
        rate_prompt_handler,
        writing_feedback_handler,
        drawing_prompt_handler,
        drawing_feedback_handler,
        sound_design_handler,
        chord_progression_handler,
        profile_handler,
        health_handler,
    ),
    components(
        schemas(
            crate::web::auth::GoogleLoginRequest,
            crate::web::auth::AuthResponse,
            ErrorBody,
            GeneratePromptRequest,
            PromptResponse,
            HistoryResponse,
            StoredPromptDto,
            RatePromptRequest,
            StatusResponse,
            WritingFeedbackRequest,
            FeedbackResponse,
            DrawingPromptRequest,
            DrawingExerciseResponse,
            DrawingFeedbackRequest,
            SoundDesignRequest,
            SoundDesignResponse,
            ChordProgressionRequest,
            ChordProgressionResponse,
            UserDto,
            ProfileResponse,
            HealthResponse,
        )
    ),
    tags(
        (name = "Muse API", description = "Creative-practice prompt generation and feedback.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Error Plumbing
//=========================================================================================

/// The uniform error body: `{"error": "..."}`.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

pub(crate) fn reject(
    status: StatusCode,
    message: impl Into<String>,
) -> (StatusCode, Json<ErrorBody>) {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

fn validation_reject(e: ValidationError) -> (StatusCode, Json<ErrorBody>) {
    match e {
        ValidationError::Invalid(message) => reject(StatusCode::BAD_REQUEST, message),
        ValidationError::PayloadTooLarge(message) => {
            reject(StatusCode::PAYLOAD_TOO_LARGE, message)
        }
    }
}

/// Maps a collaborator failure onto the response: an explicitly signalled
/// 413 passes through, everything else becomes a generic 500. Internal
/// detail never reaches the caller.
fn port_reject(e: PortError, generic: &str) -> (StatusCode, Json<ErrorBody>) {
    match e {
        PortError::PayloadTooLarge(message) => reject(StatusCode::PAYLOAD_TOO_LARGE, message),
        _ => reject(StatusCode::INTERNAL_SERVER_ERROR, generic),
    }
}

/// A `Json` extractor whose rejection is the uniform 400 error body, so a
/// malformed request body never surfaces as anything but a validation error.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorBody>);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(reject(StatusCode::BAD_REQUEST, rejection.to_string())),
        }
    }
}

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl UserDto {
    pub fn from_domain(user: UserProfile) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ProfileResponse {
    pub user: UserDto,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePromptRequest {
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub exercise_type: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromptResponse {
    pub title: String,
    pub content: String,
    pub genres: Vec<String>,
    pub difficulty: String,
    pub word_count: u32,
    pub tips: Vec<String>,
}

impl PromptResponse {
    fn from_domain(prompt: GeneratedPrompt) -> Self {
        Self {
            title: prompt.title,
            content: prompt.content,
            genres: prompt.genres,
            difficulty: prompt.difficulty,
            word_count: prompt.word_count,
            tips: prompt.tips,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredPromptDto {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub difficulty: String,
    pub word_count: u32,
    pub genres: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl StoredPromptDto {
    fn from_domain(prompt: StoredPrompt) -> Self {
        Self {
            id: prompt.id,
            title: prompt.title,
            content: prompt.content,
            difficulty: prompt.difficulty,
            word_count: prompt.word_count,
            genres: prompt.genres,
            created_at: prompt.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct HistoryResponse {
    pub prompts: Vec<StoredPromptDto>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatePromptRequest {
    pub prompt_id: String,
    #[serde(default)]
    pub rating: i32,
}

#[derive(Serialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WritingFeedbackRequest {
    #[serde(default)]
    pub exercise: String,
    #[serde(default)]
    pub exercise_type: String,
    #[serde(default)]
    pub user_writing: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub word_count: u32,
}

#[derive(Serialize, ToSchema)]
pub struct FeedbackResponse {
    pub feedback: String,
}

#[derive(Deserialize, ToSchema)]
pub struct DrawingPromptRequest {
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DrawingExerciseResponse {
    pub title: String,
    pub content: String,
    pub skills: Vec<String>,
    pub difficulty: String,
    pub estimated_time: String,
    pub tips: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct DrawingFeedbackRequest {
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub exercise: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub difficulty: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SoundDesignRequest {
    #[serde(default)]
    pub synthesizer: String,
    #[serde(default)]
    pub exercise_type: String,
    #[serde(default)]
    pub genre: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SoundDesignResponse {
    pub title: String,
    pub content: String,
    pub difficulty: String,
    pub estimated_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_artist: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ChordProgressionRequest {
    #[serde(default)]
    pub emotions: Vec<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChordProgressionResponse {
    pub progression: String,
    pub explanation: String,
    pub difficulty: String,
    /// Base64-encoded Standard MIDI File.
    pub midi_file: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

//=========================================================================================
// Prompt Handlers
//=========================================================================================

/// Generate a writing prompt for 1-2 genres.
#[utoipa::path(
    post,
    path = "/api/prompts",
    request_body = GeneratePromptRequest,
    responses(
        (status = 200, description = "Prompt generated", body = PromptResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 429, description = "Rate limit exceeded", body = ErrorBody),
        (status = 500, description = "Generation or persistence failed", body = ErrorBody)
    )
)]
pub async fn generate_prompt_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<GeneratePromptRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    // 1. Validate
    validate::validate_selection("genres", &req.genres).map_err(validation_reject)?;

    // 2. Rate limit
    rate_limit::enforce(&state, auth.user_id).await?;

    // 3. One outbound generation call
    let prompt = state
        .writing_prompts
        .generate_prompt(&req.genres, req.exercise_type.as_deref())
        .await
        .map_err(|e| {
            error!("Prompt generation failed: {:?}", e);
            port_reject(e, "Failed to generate prompt")
        })?;

    // 4. Persist atomically. A failed insert surfaces as a generic failure
    //    even though generation succeeded; nothing partial is left behind.
    state
        .db
        .save_prompt(auth.user_id, &prompt)
        .await
        .map_err(|e| {
            error!("Failed to persist prompt: {:?}", e);
            reject(StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate prompt")
        })?;

    // 5. Notify the webhook, detached from the response path.
    let notifier = state.notifier.clone();
    let event = PromptEvent {
        user_id: auth.user_id,
        title: prompt.title.clone(),
        difficulty: prompt.difficulty.clone(),
        word_count: prompt.word_count,
        genres: prompt.genres.clone(),
    };
    tokio::spawn(async move {
        if let Err(e) = notifier.prompt_generated(&event).await {
            warn!("Prompt webhook failed: {e}");
        }
    });

    Ok((StatusCode::OK, Json(PromptResponse::from_domain(prompt))))
}

/// List the caller's saved prompts, newest first.
#[utoipa::path(
    get,
    path = "/api/prompts/history",
    responses(
        (status = 200, description = "Saved prompts", body = HistoryResponse),
        (status = 401, description = "Missing credentials"),
        (status = 403, description = "Invalid credentials")
    )
)]
pub async fn prompt_history_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    let prompts = state
        .db
        .list_prompts_for_user(auth.user_id)
        .await
        .map_err(|e| {
            error!("Failed to load prompt history: {:?}", e);
            reject(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load history")
        })?;

    Ok(Json(HistoryResponse {
        prompts: prompts.into_iter().map(StoredPromptDto::from_domain).collect(),
    }))
}

/// Rate a generated prompt. Ratings are kept in the cache store for 30 days.
#[utoipa::path(
    post,
    path = "/api/prompts/feedback",
    request_body = RatePromptRequest,
    responses(
        (status = 200, description = "Rating stored", body = StatusResponse),
        (status = 400, description = "Invalid rating", body = ErrorBody),
        (status = 500, description = "Storage failed", body = ErrorBody)
    )
)]
pub async fn rate_prompt_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<RatePromptRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    validate::validate_rating(req.rating).map_err(validation_reject)?;

    let key = format!("feedback:{}:{}", req.prompt_id, auth.user_id);
    let value = serde_json::json!({
        "rating": req.rating,
        "ratedAt": Utc::now().to_rfc3339(),
    })
    .to_string();

    state
        .cache
        .put_with_expiry(&key, &value, RATING_TTL_SECS)
        .await
        .map_err(|e| {
            error!("Failed to store rating: {:?}", e);
            reject(StatusCode::INTERNAL_SERVER_ERROR, "Failed to submit feedback")
        })?;

    Ok(Json(StatusResponse {
        status: "success".to_string(),
    }))
}

//=========================================================================================
// Writing Feedback Handler
//=========================================================================================

/// Review a writing submission against its exercise.
#[utoipa::path(
    post,
    path = "/api/writing/feedback",
    request_body = WritingFeedbackRequest,
    responses(
        (status = 200, description = "Feedback generated", body = FeedbackResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 429, description = "Rate limit exceeded", body = ErrorBody),
        (status = 500, description = "Generation failed", body = ErrorBody)
    )
)]
pub async fn writing_feedback_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<WritingFeedbackRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    // 1. Validate: presence first, then the word-count floor.
    validate::validate_required_text("userWriting", &req.user_writing)
        .map_err(validation_reject)?;
    validate::validate_word_minimum(&req.user_writing, req.word_count)
        .map_err(validation_reject)?;

    // 2. Rate limit
    rate_limit::enforce(&state, auth.user_id).await?;

    // 3. One outbound feedback call
    let submission = WritingSubmission {
        exercise: req.exercise,
        exercise_type: req.exercise_type,
        user_writing: req.user_writing,
        genres: req.genres,
        difficulty: req.difficulty,
        word_count_target: req.word_count,
    };
    let feedback = state
        .writing_feedback
        .review_writing(&submission)
        .await
        .map_err(|e| {
            error!("Writing feedback failed: {:?}", e);
            port_reject(e, "Failed to generate feedback")
        })?;

    Ok(Json(FeedbackResponse {
        feedback: feedback.markdown,
    }))
}

//=========================================================================================
// Drawing Handlers
//=========================================================================================

/// Generate a drawing exercise for 1-2 skills.
#[utoipa::path(
    post,
    path = "/api/drawing/prompts",
    request_body = DrawingPromptRequest,
    responses(
        (status = 200, description = "Exercise generated", body = DrawingExerciseResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 429, description = "Rate limit exceeded", body = ErrorBody),
        (status = 500, description = "Generation failed", body = ErrorBody)
    )
)]
pub async fn drawing_prompt_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<DrawingPromptRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    validate::validate_selection("skills", &req.skills).map_err(validation_reject)?;
    rate_limit::enforce(&state, auth.user_id).await?;

    let exercise = state
        .drawing
        .generate_exercise(&req.skills)
        .await
        .map_err(|e| {
            error!("Drawing exercise generation failed: {:?}", e);
            port_reject(e, "Failed to generate exercise")
        })?;

    Ok(Json(DrawingExerciseResponse {
        title: exercise.title,
        content: exercise.content,
        skills: exercise.skills,
        difficulty: exercise.difficulty,
        estimated_time: exercise.estimated_time,
        tips: exercise.tips,
    }))
}

/// Review an uploaded drawing against its exercise.
#[utoipa::path(
    post,
    path = "/api/drawing/feedback",
    request_body = DrawingFeedbackRequest,
    responses(
        (status = 200, description = "Feedback generated", body = FeedbackResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 413, description = "Image too large", body = ErrorBody),
        (status = 429, description = "Rate limit exceeded", body = ErrorBody),
        (status = 500, description = "Generation failed", body = ErrorBody)
    )
)]
pub async fn drawing_feedback_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<DrawingFeedbackRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    // 1. Validate: format before size, both before any outbound work.
    validate::validate_image_format(&req.image).map_err(validation_reject)?;
    validate::validate_image_size(&req.image).map_err(validation_reject)?;

    // 2. Rate limit
    rate_limit::enforce(&state, auth.user_id).await?;

    // 3. One outbound vision call
    let submission = DrawingSubmission {
        image_data_uri: req.image,
        exercise: req.exercise,
        skills: req.skills,
        difficulty: req.difficulty,
    };
    let feedback = state
        .drawing
        .review_drawing(&submission)
        .await
        .map_err(|e| {
            error!("Drawing feedback failed: {:?}", e);
            port_reject(e, "Failed to generate feedback")
        })?;

    Ok(Json(FeedbackResponse {
        feedback: feedback.markdown,
    }))
}

//=========================================================================================
// Sound Design and Chord Progression Handlers
//=========================================================================================

/// Generate a sound-design exercise.
#[utoipa::path(
    post,
    path = "/api/sound-design/prompts",
    request_body = SoundDesignRequest,
    responses(
        (status = 200, description = "Exercise generated", body = SoundDesignResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 429, description = "Rate limit exceeded", body = ErrorBody),
        (status = 500, description = "Generation failed", body = ErrorBody)
    )
)]
pub async fn sound_design_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<SoundDesignRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    // 1. Validate
    validate::validate_required_text("synthesizer", &req.synthesizer)
        .map_err(validation_reject)?;
    let kind = SoundExerciseKind::parse(&req.exercise_type).ok_or_else(|| {
        reject(
            StatusCode::BAD_REQUEST,
            "exerciseType must be 'technical' or 'creative'",
        )
    })?;

    // 2. Rate limit
    rate_limit::enforce(&state, auth.user_id).await?;

    // 3. One outbound generation call
    let brief = SoundDesignBrief {
        synthesizer: req.synthesizer,
        kind,
        genre: req.genre,
    };
    let exercise = state
        .sound_design
        .generate_exercise(&brief)
        .await
        .map_err(|e| {
            error!("Sound-design generation failed: {:?}", e);
            port_reject(e, "Failed to generate exercise")
        })?;

    Ok(Json(SoundDesignResponse {
        title: exercise.title,
        content: exercise.content,
        difficulty: exercise.difficulty,
        estimated_time: exercise.estimated_time,
        reference_artist: exercise.reference_artist,
    }))
}

/// Generate a chord progression with its MIDI rendering.
#[utoipa::path(
    post,
    path = "/api/chord-progression",
    request_body = ChordProgressionRequest,
    responses(
        (status = 200, description = "Progression generated", body = ChordProgressionResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 429, description = "Rate limit exceeded", body = ErrorBody),
        (status = 500, description = "Generation failed", body = ErrorBody)
    )
)]
pub async fn chord_progression_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(req): ApiJson<ChordProgressionRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    validate::validate_selection("emotions", &req.emotions).map_err(validation_reject)?;
    rate_limit::enforce(&state, auth.user_id).await?;

    let progression = state
        .chords
        .generate_progression(&req.emotions)
        .await
        .map_err(|e| {
            error!("Chord progression generation failed: {:?}", e);
            port_reject(e, "Failed to generate progression")
        })?;

    Ok(Json(ChordProgressionResponse {
        progression: progression.progression,
        explanation: progression.explanation,
        difficulty: progression.difficulty,
        midi_file: BASE64.encode(&progression.midi),
    }))
}

//=========================================================================================
// Profile and Health Handlers
//=========================================================================================

/// The authenticated caller's profile.
#[utoipa::path(
    get,
    path = "/api/user/profile",
    responses(
        (status = 200, description = "The caller's profile", body = ProfileResponse),
        (status = 401, description = "Missing credentials"),
        (status = 403, description = "Invalid credentials"),
        (status = 404, description = "Unknown user", body = ErrorBody)
    )
)]
pub async fn profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorBody>)> {
    let user = state.db.get_user(auth.user_id).await.map_err(|e| match e {
        PortError::NotFound(_) => reject(StatusCode::NOT_FOUND, "User not found"),
        other => {
            error!("Failed to load profile: {:?}", other);
            reject(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load profile")
        }
    })?;

    Ok(Json(ProfileResponse {
        user: UserDto::from_domain(user),
    }))
}

/// Health check: verifies the cache store is reachable.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 503, description = "A collaborator is unreachable", body = HealthResponse)
    )
)]
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.cache.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                service: "muse-api".to_string(),
            }),
        ),
        Err(e) => {
            error!("Health check failed: {:?}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy".to_string(),
                    service: "muse-api".to_string(),
                }),
            )
        }
    }
}
