//! services/api/src/adapters/chords_llm.rs
//!
//! This module contains the adapter for chord-progression generation.
//! It implements the `ChordProgressionService` port from the `core` crate:
//! the model proposes a progression as JSON, and the progression is then
//! rendered to a Standard MIDI File locally.

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use muse_core::{
    domain::ChordProgression,
    ports::{ChordProgressionService, PortError, PortResult},
};
use serde::Deserialize;

use crate::adapters::strip_code_fences;
use crate::midi;

const SYSTEM_INSTRUCTIONS: &str = "You are a music theory tutor. Given 1-2 target emotions, propose one chord progression of 4-8 chords that evokes them, using plain chord symbols (like 'Cmaj7 - Am7 - Fmaj7 - G'). Reply with ONLY a JSON object with keys: progression (the chord symbols joined by ' - '), explanation (2-4 sentences on why the harmony carries those emotions), difficulty (one of Beginner, Intermediate, Advanced).";

#[derive(Deserialize)]
struct ProgressionReply {
    progression: String,
    explanation: String,
    #[serde(default)]
    difficulty: Option<String>,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ChordProgressionService` using an
/// OpenAI-compatible LLM plus local MIDI rendering.
pub struct OpenAiChordAdapter {
    client: Option<Client<OpenAIConfig>>,
    model: String,
    timeout: Duration,
}

impl OpenAiChordAdapter {
    /// Creates a new `OpenAiChordAdapter`.
    pub fn new(client: Option<Client<OpenAIConfig>>, model: String, timeout: Duration) -> Self {
        Self {
            client,
            model,
            timeout,
        }
    }
}

//=========================================================================================
// `ChordProgressionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ChordProgressionService for OpenAiChordAdapter {
    async fn generate_progression(&self, emotions: &[String]) -> PortResult<ChordProgression> {
        let client = self.client.as_ref().ok_or_else(|| {
            PortError::Unexpected("generation backend is not configured".to_string())
        })?;

        let user_prompt = format!(
            "Target emotions: {}. Propose the progression.",
            emotions.join(", ")
        );

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.8)
            .max_tokens(400u32)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = tokio::time::timeout(self.timeout, client.chat().create(request))
            .await
            .map_err(|_| PortError::Unexpected("generation call timed out".to_string()))?
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected("generation backend returned no text".to_string())
            })?;

        let cleaned = strip_code_fences(&content);
        let reply: ProgressionReply = serde_json::from_str(&cleaned)
            .map_err(|e| PortError::Unexpected(format!("malformed progression reply: {e}")))?;

        let midi = midi::render_progression(&reply.progression).ok_or_else(|| {
            PortError::Unexpected(format!(
                "progression contained no playable chords: {}",
                reply.progression
            ))
        })?;

        Ok(ChordProgression {
            progression: reply.progression,
            explanation: reply.explanation,
            difficulty: reply.difficulty.unwrap_or_else(|| "Intermediate".to_string()),
            midi,
        })
    }
}
