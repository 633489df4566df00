//! crates/muse_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like databases,
//! cache stores, or the generation backend.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    ChordProgression, DrawingExercise, DrawingSubmission, FeedbackResult, GeneratedPrompt,
    GoogleIdentity, PromptEvent, SoundDesignBrief, SoundDesignExercise, StoredPrompt, UserProfile,
    WritingSubmission,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services
/// (e.g., database, cache, generation backend).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
    /// The collaborator explicitly signalled an oversized payload.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait WritingPromptService: Send + Sync {
    /// Generates a writing prompt for 1-2 genres, optionally steered toward
    /// a specific exercise type.
    async fn generate_prompt(
        &self,
        genres: &[String],
        exercise_type: Option<&str>,
    ) -> PortResult<GeneratedPrompt>;
}

#[async_trait]
pub trait WritingFeedbackService: Send + Sync {
    /// Reviews a writing submission against its exercise.
    async fn review_writing(&self, submission: &WritingSubmission) -> PortResult<FeedbackResult>;
}

#[async_trait]
pub trait DrawingService: Send + Sync {
    /// Generates a drawing exercise targeting 1-2 skills.
    async fn generate_exercise(&self, skills: &[String]) -> PortResult<DrawingExercise>;

    /// Reviews an uploaded drawing against its exercise.
    async fn review_drawing(&self, submission: &DrawingSubmission) -> PortResult<FeedbackResult>;
}

#[async_trait]
pub trait SoundDesignService: Send + Sync {
    /// Generates a sound-design exercise for the given brief.
    async fn generate_exercise(&self, brief: &SoundDesignBrief)
        -> PortResult<SoundDesignExercise>;
}

#[async_trait]
pub trait ChordProgressionService: Send + Sync {
    /// Generates a chord progression evoking 1-2 emotions, including the
    /// rendered MIDI bytes.
    async fn generate_progression(&self, emotions: &[String]) -> PortResult<ChordProgression>;
}

#[async_trait]
pub trait PromptStore: Send + Sync {
    // --- User Management ---
    async fn upsert_user(&self, identity: &GoogleIdentity) -> PortResult<UserProfile>;

    async fn get_user(&self, user_id: Uuid) -> PortResult<UserProfile>;

    // --- Prompt Persistence ---

    /// Persists a generated prompt and its genre associations as a single
    /// all-or-nothing transaction.
    async fn save_prompt(&self, user_id: Uuid, prompt: &GeneratedPrompt)
        -> PortResult<StoredPrompt>;

    async fn list_prompts_for_user(&self, user_id: Uuid) -> PortResult<Vec<StoredPrompt>>;
}

/// A counter/cache store with expiring keys (e.g., Redis).
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically increments `key`, setting it to expire `window_secs` after
    /// the first increment of the window. Returns the post-increment count.
    async fn increment_with_expiry(&self, key: &str, window_secs: u64) -> PortResult<u64>;

    /// Stores `value` under `key` with a TTL.
    async fn put_with_expiry(&self, key: &str, value: &str, ttl_secs: u64) -> PortResult<()>;

    // --- Set operations (artist rotation) ---
    async fn set_members(&self, key: &str) -> PortResult<Vec<String>>;

    async fn set_add(&self, key: &str, member: &str) -> PortResult<()>;

    async fn delete(&self, key: &str) -> PortResult<()>;

    /// Liveness probe for the health endpoint.
    async fn ping(&self) -> PortResult<()>;
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verifies an OAuth credential and returns the identity it asserts.
    async fn verify_credential(&self, credential: &str) -> PortResult<GoogleIdentity>;
}

#[async_trait]
pub trait EventNotifier: Send + Sync {
    /// Delivers a prompt-generated event. Callers run this detached from the
    /// response path and only log failures.
    async fn prompt_generated(&self, event: &PromptEvent) -> PortResult<()>;
}
