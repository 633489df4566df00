//! services/api/src/adapters/sound_llm.rs
//!
//! This module contains the adapter for sound-design exercise generation.
//! It implements the `SoundDesignService` port from the `core` crate.
//! Technical exercises reference a real artist's sound, rotated without
//! repetition per synthesizer via the `CounterStore`.

use std::sync::Arc;
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
    domain::{SoundDesignBrief, SoundDesignExercise, SoundExerciseKind},
    ports::{CounterStore, PortError, PortResult, SoundDesignService},
};
use rand::seq::SliceRandom;
use serde::Deserialize;

use crate::adapters::strip_code_fences;

const SYSTEM_INSTRUCTIONS: &str = "You are a sound-design tutor writing one synthesis exercise for the named synthesizer. Technical exercises ask the student to recreate a characteristic sound of the named artist in the named genre; creative exercises pose an open sound-exploration challenge. Reply with ONLY a JSON object with keys: title (must name the synthesizer), content (markdown with ### section headings and - bullets walking through the patch), difficulty (one of Beginner, Intermediate, Advanced), estimatedTime (like '45 minutes').";

/// Reference artists rotated through for technical exercises.
const ARTIST_POOL: [&str; 8] = [
    "Skrillex",
    "Virtual Riot",
    "Noisia",
    "Aphex Twin",
    "Flume",
    "Porter Robinson",
    "Mr. Bill",
    "Culprate",
];

#[derive(Deserialize)]
struct ExerciseReply {
    title: String,
    content: String,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(rename = "estimatedTime", default)]
    estimated_time: Option<String>,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `SoundDesignService` using an OpenAI-compatible
/// LLM, composing the cache store for artist rotation.
pub struct OpenAiSoundDesignAdapter {
    client: Option<Client<OpenAIConfig>>,
    model: String,
    timeout: Duration,
    cache: Arc<dyn CounterStore>,
}

impl OpenAiSoundDesignAdapter {
    /// Creates a new `OpenAiSoundDesignAdapter`.
    pub fn new(
        client: Option<Client<OpenAIConfig>>,
        model: String,
        timeout: Duration,
        cache: Arc<dyn CounterStore>,
    ) -> Self {
        Self {
            client,
            model,
            timeout,
            cache,
        }
    }

    /// Picks the next reference artist for `synthesizer`, never repeating one
    /// until the whole pool has been used, then starting over.
    async fn next_artist(&self, synthesizer: &str) -> PortResult<String> {
        let key = format!("sound:artists:{}", synthesizer.to_lowercase().replace(' ', "-"));
        let used = self.cache.set_members(&key).await?;

        let unused: Vec<&str> = ARTIST_POOL
            .iter()
            .copied()
            .filter(|artist| !used.iter().any(|u| u == artist))
            .collect();

        let artist = if unused.is_empty() {
            // Pool exhausted: reset the rotation and draw fresh.
            self.cache.delete(&key).await?;
            *ARTIST_POOL
                .choose(&mut rand::thread_rng())
                .expect("artist pool is non-empty")
        } else {
            *unused
                .choose(&mut rand::thread_rng())
                .expect("unused pool is non-empty")
        };

        self.cache.set_add(&key, artist).await?;
        Ok(artist.to_string())
    }
}

//=========================================================================================
// `SoundDesignService` Trait Implementation
//=========================================================================================

#[async_trait]
impl SoundDesignService for OpenAiSoundDesignAdapter {
    async fn generate_exercise(
        &self,
        brief: &SoundDesignBrief,
    ) -> PortResult<SoundDesignExercise> {
        let client = self.client.as_ref().ok_or_else(|| {
            PortError::Unexpected("generation backend is not configured".to_string())
        })?;

        let reference_artist = match brief.kind {
            SoundExerciseKind::Technical => Some(self.next_artist(&brief.synthesizer).await?),
            SoundExerciseKind::Creative => None,
        };

        let mut user_prompt = format!(
            "Write a {} sound-design exercise for {}.",
            brief.kind.as_str(),
            brief.synthesizer,
        );
        if let Some(genre) = &brief.genre {
            user_prompt.push_str(&format!(" Genre: {genre}."));
        }
        if let Some(artist) = &reference_artist {
            user_prompt.push_str(&format!(" Reference artist: {artist}."));
        }

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
            .max_tokens(700u32)
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
        let reply: ExerciseReply = serde_json::from_str(&cleaned)
            .map_err(|e| PortError::Unexpected(format!("malformed exercise reply: {e}")))?;

        Ok(SoundDesignExercise {
            title: reply.title,
            content: reply.content,
            difficulty: reply.difficulty.unwrap_or_else(|| "Intermediate".to_string()),
            estimated_time: reply
                .estimated_time
                .unwrap_or_else(|| "45 minutes".to_string()),
            reference_artist,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// In-memory stand-in for the cache store, tracking one rotation set.
    #[derive(Default)]
    struct MemoryCache {
        sets: Mutex<std::collections::HashMap<String, Vec<String>>>,
    }

    #[async_trait]
    impl CounterStore for MemoryCache {
        async fn increment_with_expiry(&self, _key: &str, _window: u64) -> PortResult<u64> {
            Ok(1)
        }
        async fn put_with_expiry(&self, _key: &str, _value: &str, _ttl: u64) -> PortResult<()> {
            Ok(())
        }
        async fn set_members(&self, key: &str) -> PortResult<Vec<String>> {
            Ok(self.sets.lock().unwrap().get(key).cloned().unwrap_or_default())
        }
        async fn set_add(&self, key: &str, member: &str) -> PortResult<()> {
            self.sets
                .lock()
                .unwrap()
                .entry(key.to_string())
                .or_default()
                .push(member.to_string());
            Ok(())
        }
        async fn delete(&self, key: &str) -> PortResult<()> {
            self.sets.lock().unwrap().remove(key);
            Ok(())
        }
        async fn ping(&self) -> PortResult<()> {
            Ok(())
        }
    }

    fn adapter_with(cache: Arc<dyn CounterStore>) -> OpenAiSoundDesignAdapter {
        OpenAiSoundDesignAdapter::new(
            None,
            "test-model".to_string(),
            Duration::from_secs(1),
            cache,
        )
    }

    #[tokio::test]
    async fn artists_rotate_without_repetition() {
        let cache = Arc::new(MemoryCache::default());
        let adapter = adapter_with(cache.clone());

        let mut seen = std::collections::HashSet::new();
        for _ in 0..ARTIST_POOL.len() {
            let artist = adapter.next_artist("Serum 2").await.unwrap();
            assert!(seen.insert(artist), "artist repeated before pool exhausted");
        }
        assert_eq!(seen.len(), ARTIST_POOL.len());
    }

    #[tokio::test]
    async fn exhausted_pool_resets_and_draws_again() {
        let cache = Arc::new(MemoryCache::default());
        let adapter = adapter_with(cache.clone());

        for _ in 0..ARTIST_POOL.len() {
            adapter.next_artist("Phase Plant").await.unwrap();
        }
        // The next pick starts a fresh rotation with exactly one entry used.
        let artist = adapter.next_artist("Phase Plant").await.unwrap();
        assert!(ARTIST_POOL.contains(&artist.as_str()));
        let used = cache
            .set_members("sound:artists:phase-plant")
            .await
            .unwrap();
        assert_eq!(used, vec![artist]);
    }

    #[tokio::test]
    async fn rotation_is_scoped_per_synthesizer() {
        let cache = Arc::new(MemoryCache::default());
        let adapter = adapter_with(cache.clone());

        adapter.next_artist("Serum 2").await.unwrap();
        let other = cache.set_members("sound:artists:phase-plant").await.unwrap();
        assert!(other.is_empty());
    }
}
