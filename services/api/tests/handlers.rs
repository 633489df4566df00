//! services/api/tests/handlers.rs
//!
//! End-to-end handler tests: the real router and middleware, with the
//! outbound ports replaced by in-memory test doubles.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use api_lib::config::Config;
use api_lib::web::{auth::TokenKeys, router, state::AppState};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Request, StatusCode,
    },
    Router,
};
use http_body_util::BodyExt;
use muse_core::domain::*;
use muse_core::ports::*;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

//=========================================================================================
// Test Doubles
//=========================================================================================

struct MockStore {
    saves: AtomicUsize,
}

impl MockStore {
    fn new() -> Self {
        Self {
            saves: AtomicUsize::new(0),
        }
    }
}

fn test_user(id: Uuid) -> UserProfile {
    UserProfile {
        id,
        email: "writer@example.com".to_string(),
        display_name: "Test Writer".to_string(),
        avatar_url: None,
    }
}

#[async_trait]
impl PromptStore for MockStore {
    async fn upsert_user(&self, identity: &GoogleIdentity) -> PortResult<UserProfile> {
        Ok(UserProfile {
            id: Uuid::new_v4(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            avatar_url: identity.avatar_url.clone(),
        })
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<UserProfile> {
        Ok(test_user(user_id))
    }

    async fn save_prompt(
        &self,
        user_id: Uuid,
        prompt: &GeneratedPrompt,
    ) -> PortResult<StoredPrompt> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(StoredPrompt {
            id: Uuid::new_v4(),
            user_id,
            title: prompt.title.clone(),
            content: prompt.content.clone(),
            difficulty: prompt.difficulty.clone(),
            word_count: prompt.word_count,
            genres: prompt.genres.clone(),
            created_at: chrono::Utc::now(),
        })
    }

    async fn list_prompts_for_user(&self, _user_id: Uuid) -> PortResult<Vec<StoredPrompt>> {
        Ok(Vec::new())
    }
}

/// Counter store whose counter can be pre-loaded to simulate a window in
/// progress.
struct MockCache {
    count: AtomicU64,
}

impl MockCache {
    fn starting_at(count: u64) -> Self {
        Self {
            count: AtomicU64::new(count),
        }
    }
}

#[async_trait]
impl CounterStore for MockCache {
    async fn increment_with_expiry(&self, _key: &str, _window_secs: u64) -> PortResult<u64> {
        Ok(self.count.fetch_add(1, Ordering::SeqCst) + 1)
    }
    async fn put_with_expiry(&self, _key: &str, _value: &str, _ttl_secs: u64) -> PortResult<()> {
        Ok(())
    }
    async fn set_members(&self, _key: &str) -> PortResult<Vec<String>> {
        Ok(Vec::new())
    }
    async fn set_add(&self, _key: &str, _member: &str) -> PortResult<()> {
        Ok(())
    }
    async fn delete(&self, _key: &str) -> PortResult<()> {
        Ok(())
    }
    async fn ping(&self) -> PortResult<()> {
        Ok(())
    }
}

struct MockWriting;

#[async_trait]
impl WritingPromptService for MockWriting {
    async fn generate_prompt(
        &self,
        genres: &[String],
        _exercise_type: Option<&str>,
    ) -> PortResult<GeneratedPrompt> {
        Ok(GeneratedPrompt {
            title: "T".to_string(),
            content: "### The Hook\n\nWrite the **first** page.".to_string(),
            genres: genres.to_vec(),
            difficulty: "Easy".to_string(),
            word_count: 500,
            tips: vec!["Start strong.".to_string()],
        })
    }
}

#[async_trait]
impl WritingFeedbackService for MockWriting {
    async fn review_writing(&self, _submission: &WritingSubmission) -> PortResult<FeedbackResult> {
        Ok(FeedbackResult {
            markdown: "### Strengths\n\n- Good pacing".to_string(),
        })
    }
}

struct MockDrawing;

#[async_trait]
impl DrawingService for MockDrawing {
    async fn generate_exercise(&self, skills: &[String]) -> PortResult<DrawingExercise> {
        Ok(DrawingExercise {
            title: "Gesture sprints".to_string(),
            content: "- 10 poses, 60 seconds each".to_string(),
            skills: skills.to_vec(),
            difficulty: "Beginner".to_string(),
            estimated_time: "20 minutes".to_string(),
            tips: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        })
    }

    async fn review_drawing(&self, _submission: &DrawingSubmission) -> PortResult<FeedbackResult> {
        Ok(FeedbackResult {
            markdown: "### Strengths\n\n- Confident lines".to_string(),
        })
    }
}

struct MockSound;

#[async_trait]
impl SoundDesignService for MockSound {
    async fn generate_exercise(
        &self,
        brief: &SoundDesignBrief,
    ) -> PortResult<SoundDesignExercise> {
        Ok(SoundDesignExercise {
            title: format!("Growl bass in {}", brief.synthesizer),
            content: "### Patch\n\n- Start from a saw".to_string(),
            difficulty: "Intermediate".to_string(),
            estimated_time: "45 minutes".to_string(),
            reference_artist: Some("Noisia".to_string()),
        })
    }
}

struct MockChords;

#[async_trait]
impl ChordProgressionService for MockChords {
    async fn generate_progression(&self, _emotions: &[String]) -> PortResult<ChordProgression> {
        Ok(ChordProgression {
            progression: "Cmaj7 - Am7".to_string(),
            explanation: "Falls from the major seventh into its relative minor.".to_string(),
            difficulty: "Beginner".to_string(),
            midi: b"MThd\x00\x00\x00\x06".to_vec(),
        })
    }
}

struct MockIdentity;

#[async_trait]
impl IdentityVerifier for MockIdentity {
    async fn verify_credential(&self, credential: &str) -> PortResult<GoogleIdentity> {
        if credential == "good-credential" {
            Ok(GoogleIdentity {
                subject: "google-sub-1".to_string(),
                email: "writer@example.com".to_string(),
                display_name: "Test Writer".to_string(),
                avatar_url: None,
            })
        } else {
            Err(PortError::Unauthorized)
        }
    }
}

struct MockNotifier {
    calls: AtomicUsize,
}

#[async_trait]
impl EventNotifier for MockNotifier {
    async fn prompt_generated(&self, _event: &PromptEvent) -> PortResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

//=========================================================================================
// Harness
//=========================================================================================

fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: String::new(),
        redis_url: String::new(),
        log_level: tracing::Level::INFO,
        cors_origin: "http://localhost:3000".to_string(),
        openai_api_key: None,
        generation_model: "test-model".to_string(),
        vision_model: "test-vision".to_string(),
        google_client_id: "client-id".to_string(),
        token_secret: "test-secret".to_string(),
        webhook_url: None,
        generation_timeout_secs: 1,
        rate_limit_max: 100,
        rate_limit_window_secs: 3600,
    }
}

struct Harness {
    app: Router,
    token: String,
    store: Arc<MockStore>,
    notifier: Arc<MockNotifier>,
}

fn harness_with_counter(initial_count: u64) -> Harness {
    let store = Arc::new(MockStore::new());
    let notifier = Arc::new(MockNotifier {
        calls: AtomicUsize::new(0),
    });
    let writing = Arc::new(MockWriting);
    let token_keys = TokenKeys::new(b"test-secret");
    let user = test_user(Uuid::new_v4());
    let token = token_keys.issue(&user).unwrap();

    let state = Arc::new(AppState {
        db: store.clone(),
        cache: Arc::new(MockCache::starting_at(initial_count)),
        writing_prompts: writing.clone(),
        writing_feedback: writing,
        drawing: Arc::new(MockDrawing),
        sound_design: Arc::new(MockSound),
        chords: Arc::new(MockChords),
        identity: Arc::new(MockIdentity),
        notifier: notifier.clone(),
        token_keys,
        config: Arc::new(test_config()),
    });

    Harness {
        app: router(state),
        token,
        store,
        notifier,
    }
}

fn harness() -> Harness {
    harness_with_counter(0)
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

//=========================================================================================
// Prompt Generation
//=========================================================================================

#[tokio::test]
async fn generate_prompt_returns_the_collaborator_body() {
    let h = harness();
    let req = post_json(
        "/api/prompts",
        Some(&h.token),
        json!({"genres": ["Fantasy", "Science Fiction"]}),
    );
    let (status, body) = send(h.app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "T");
    assert_eq!(body["difficulty"], "Easy");
    assert_eq!(body["wordCount"], 500);
    assert_eq!(body["genres"], json!(["Fantasy", "Science Fiction"]));
}

#[tokio::test]
async fn generate_prompt_persists_and_notifies() {
    let h = harness();
    let store = h.store.clone();
    let notifier = h.notifier.clone();
    let req = post_json("/api/prompts", Some(&h.token), json!({"genres": ["Fantasy"]}));
    let (status, _) = send(h.app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.saves.load(Ordering::SeqCst), 1);
    // The webhook runs detached; give the spawned task a beat to land.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn generate_prompt_rejects_bad_genre_counts() {
    for genres in [json!([]), json!(["A", "B", "C"]), json!(["A", "A"])] {
        let h = harness();
        let req = post_json("/api/prompts", Some(&h.token), json!({"genres": genres}));
        let (status, body) = send(h.app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "genres = {genres}");
        assert!(body["error"].as_str().unwrap().contains("1-2 genres"));
    }
}

#[tokio::test]
async fn generate_prompt_rejects_missing_genres() {
    let h = harness();
    let req = post_json("/api/prompts", Some(&h.token), json!({}));
    let (status, _) = send(h.app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_genre_shape_is_a_400_not_a_500() {
    let h = harness();
    let req = post_json("/api/prompts", Some(&h.token), json!({"genres": "Fantasy"}));
    let (status, body) = send(h.app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

//=========================================================================================
// Auth Gate
//=========================================================================================

#[tokio::test]
async fn missing_token_is_401() {
    let h = harness();
    let req = post_json("/api/prompts", None, json!({"genres": ["Fantasy"]}));
    let (status, _) = send(h.app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_token_is_403() {
    let h = harness();
    let req = post_json(
        "/api/prompts",
        Some("not-a-real-token"),
        json!({"genres": ["Fantasy"]}),
    );
    let (status, _) = send(h.app, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn profile_returns_the_callers_user() {
    let h = harness();
    let req = get("/api/user/profile", Some(&h.token));
    let (status, body) = send(h.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "writer@example.com");
}

#[tokio::test]
async fn google_login_issues_a_working_token() {
    let h = harness();
    let req = post_json(
        "/api/auth/google",
        None,
        json!({"credential": "good-credential"}),
    );
    let (status, body) = send(h.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["email"], "writer@example.com");
}

#[tokio::test]
async fn google_login_rejects_bad_credentials_with_401() {
    let h = harness();
    let req = post_json(
        "/api/auth/google",
        None,
        json!({"credential": "forged"}),
    );
    let (status, body) = send(h.app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

//=========================================================================================
// Rate Limiting
//=========================================================================================

#[tokio::test]
async fn the_hundredth_request_passes() {
    // 99 requests already counted; this one is number 100.
    let h = harness_with_counter(99);
    let req = post_json("/api/prompts", Some(&h.token), json!({"genres": ["Fantasy"]}));
    let (status, _) = send(h.app, req).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn the_hundred_first_request_is_429() {
    let h = harness_with_counter(100);
    let req = post_json("/api/prompts", Some(&h.token), json!({"genres": ["Fantasy"]}));
    let (status, body) = send(h.app, req).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["error"].as_str().unwrap().contains("Rate limit"));
}

//=========================================================================================
// Writing Feedback
//=========================================================================================

#[tokio::test]
async fn short_submission_is_rejected_with_both_counts() {
    let h = harness();
    let req = post_json(
        "/api/writing/feedback",
        Some(&h.token),
        json!({
            "exercise": "Write an opening line",
            "userWriting": "just five words right here",
            "genres": ["Fantasy"],
            "wordCount": 500
        }),
    );
    let (status, body) = send(h.app, req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("Minimum 500 words required"));
    assert!(error.contains("You have 5 words"));
}

#[tokio::test]
async fn whitespace_only_submission_is_rejected() {
    let h = harness();
    let req = post_json(
        "/api/writing/feedback",
        Some(&h.token),
        json!({"userWriting": "   \n\n   ", "genres": ["Fantasy"]}),
    );
    let (status, _) = send(h.app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sufficient_submission_gets_feedback() {
    let h = harness();
    let words = vec!["word"; 500].join(" ");
    let req = post_json(
        "/api/writing/feedback",
        Some(&h.token),
        json!({
            "exercise": "Write a scene",
            "userWriting": words,
            "genres": ["Mystery"],
            "wordCount": 500
        }),
    );
    let (status, body) = send(h.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["feedback"].as_str().unwrap().contains("### Strengths"));
}

//=========================================================================================
// Drawing
//=========================================================================================

#[tokio::test]
async fn oversized_image_is_413_with_too_large_message() {
    let h = harness();
    // ~28 MiB decoded.
    let payload = "A".repeat(28 * 1024 * 1024 * 4 / 3);
    let req = post_json(
        "/api/drawing/feedback",
        Some(&h.token),
        json!({
            "image": format!("data:image/jpeg;base64,{payload}"),
            "exercise": "Gesture drawing",
            "skills": ["Gesture"]
        }),
    );
    let (status, body) = send(h.app, req).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["error"].as_str().unwrap().contains("too large"));
}

#[tokio::test]
async fn non_image_payload_is_400() {
    let h = harness();
    let req = post_json(
        "/api/drawing/feedback",
        Some(&h.token),
        json!({
            "image": "not-a-base64-image",
            "exercise": "Gesture drawing",
            "skills": ["Gesture"]
        }),
    );
    let (status, _) = send(h.app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn svg_disguised_as_image_is_400() {
    let h = harness();
    let req = post_json(
        "/api/drawing/feedback",
        Some(&h.token),
        json!({
            "image": "data:image/svg+xml;base64,PHN2Zz48L3N2Zz4=",
            "exercise": "Test",
            "skills": ["Gesture"]
        }),
    );
    let (status, _) = send(h.app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn small_valid_image_gets_feedback() {
    let h = harness();
    let req = post_json(
        "/api/drawing/feedback",
        Some(&h.token),
        json!({
            "image": "data:image/jpeg;base64,/9j/4AAQSkZJRg==",
            "exercise": "Gesture drawing",
            "skills": ["Gesture", "Form"],
            "difficulty": "Intermediate"
        }),
    );
    let (status, body) = send(h.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["feedback"].is_string());
}

#[tokio::test]
async fn drawing_exercise_carries_three_tips() {
    let h = harness();
    let req = post_json(
        "/api/drawing/prompts",
        Some(&h.token),
        json!({"skills": ["Gesture", "Form (3D Thinking)"]}),
    );
    let (status, body) = send(h.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["skills"], json!(["Gesture", "Form (3D Thinking)"]));
    assert_eq!(body["tips"].as_array().unwrap().len(), 3);
    assert!(body["estimatedTime"].as_str().unwrap().contains("minutes"));
}

//=========================================================================================
// Sound Design and Chords
//=========================================================================================

#[tokio::test]
async fn sound_design_requires_a_known_exercise_type() {
    let h = harness();
    let req = post_json(
        "/api/sound-design/prompts",
        Some(&h.token),
        json!({"synthesizer": "Serum 2", "exerciseType": "freestyle"}),
    );
    let (status, body) = send(h.app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("technical"));
}

#[tokio::test]
async fn sound_design_returns_the_exercise() {
    let h = harness();
    let req = post_json(
        "/api/sound-design/prompts",
        Some(&h.token),
        json!({
            "synthesizer": "Serum 2",
            "exerciseType": "technical",
            "genre": "Dubstep"
        }),
    );
    let (status, body) = send(h.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["title"].as_str().unwrap().contains("Serum 2"));
    assert_eq!(body["referenceArtist"], "Noisia");
}

#[tokio::test]
async fn chord_progression_rejects_three_emotions() {
    let h = harness();
    let req = post_json(
        "/api/chord-progression",
        Some(&h.token),
        json!({"emotions": ["Happy", "Sad", "Angry"]}),
    );
    let (status, _) = send(h.app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chord_progression_ships_base64_midi() {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

    let h = harness();
    let req = post_json(
        "/api/chord-progression",
        Some(&h.token),
        json!({"emotions": ["Melancholy", "Longing"]}),
    );
    let (status, body) = send(h.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["progression"], "Cmaj7 - Am7");
    let midi = BASE64.decode(body["midiFile"].as_str().unwrap()).unwrap();
    assert_eq!(&midi[..4], b"MThd");
}

//=========================================================================================
// Ratings and Health
//=========================================================================================

#[tokio::test]
async fn rating_outside_range_is_400() {
    let h = harness();
    let req = post_json(
        "/api/prompts/feedback",
        Some(&h.token),
        json!({"promptId": "p-1", "rating": 6}),
    );
    let (status, _) = send(h.app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn valid_rating_is_acknowledged() {
    let h = harness();
    let req = post_json(
        "/api/prompts/feedback",
        Some(&h.token),
        json!({"promptId": "p-1", "rating": 4}),
    );
    let (status, body) = send(h.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
}

#[tokio::test]
async fn health_reports_healthy() {
    let h = harness();
    let req = get("/health", None);
    let (status, body) = send(h.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}
