//! crates/muse_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format,
//! except `UserProfile`, which the client state container serializes into
//! its storage port.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A writing prompt returned by the generation service.
///
/// Immutable once received; the service never edits generated content.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPrompt {
    pub title: String,
    pub content: String,
    pub genres: Vec<String>,
    pub difficulty: String,
    pub word_count: u32,
    pub tips: Vec<String>,
}

/// Markdown-subset text returned by a feedback call.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackResult {
    pub markdown: String,
}

/// A user's writing submission, sent for feedback against the exercise
/// it responds to.
#[derive(Debug, Clone)]
pub struct WritingSubmission {
    pub exercise: String,
    pub exercise_type: String,
    pub user_writing: String,
    pub genres: Vec<String>,
    pub difficulty: String,
    pub word_count_target: u32,
}

/// A drawing uploaded for feedback. The image travels as a data-URI string
/// (`data:image/...;base64,...`) exactly as the browser produced it.
#[derive(Debug, Clone)]
pub struct DrawingSubmission {
    pub image_data_uri: String,
    pub exercise: String,
    pub skills: Vec<String>,
    pub difficulty: String,
}

/// A generated drawing exercise.
#[derive(Debug, Clone)]
pub struct DrawingExercise {
    pub title: String,
    pub content: String,
    pub skills: Vec<String>,
    pub difficulty: String,
    pub estimated_time: String,
    pub tips: Vec<String>,
}

/// The kind of sound-design exercise requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundExerciseKind {
    /// Recreate a concrete sound (genre-specific, references an artist).
    Technical,
    /// Open-ended sound exploration.
    Creative,
}

impl SoundExerciseKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "technical" => Some(Self::Technical),
            "creative" => Some(Self::Creative),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Technical => "technical",
            Self::Creative => "creative",
        }
    }
}

/// What the user asked the sound-design generator for.
#[derive(Debug, Clone)]
pub struct SoundDesignBrief {
    pub synthesizer: String,
    pub kind: SoundExerciseKind,
    pub genre: Option<String>,
}

/// A generated sound-design exercise.
#[derive(Debug, Clone)]
pub struct SoundDesignExercise {
    pub title: String,
    pub content: String,
    pub difficulty: String,
    pub estimated_time: String,
    /// Reference artist for technical exercises, rotated without repetition.
    pub reference_artist: Option<String>,
}

/// A chord progression with its rendered Standard MIDI File.
#[derive(Debug, Clone)]
pub struct ChordProgression {
    pub progression: String,
    pub explanation: String,
    pub difficulty: String,
    pub midi: Vec<u8>,
}

/// A prompt persisted for the user's history, joined with its genre rows.
#[derive(Debug, Clone)]
pub struct StoredPrompt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub difficulty: String,
    pub word_count: u32,
    pub genres: Vec<String>,
    pub created_at: DateTime<Utc>,
}

// Represents a user - used throughout the app and persisted client-side,
// hence the serde derives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// Claims extracted from a verified OAuth credential.
#[derive(Debug, Clone)]
pub struct GoogleIdentity {
    pub subject: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// Payload for the best-effort webhook fired after a prompt is generated.
#[derive(Debug, Clone)]
pub struct PromptEvent {
    pub user_id: Uuid,
    pub title: String,
    pub difficulty: String,
    pub word_count: u32,
    pub genres: Vec<String>,
}
