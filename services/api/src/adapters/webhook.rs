//! services/api/src/adapters/webhook.rs
//!
//! This module contains the adapter for the best-effort webhook fired after
//! a prompt is generated. It implements the `EventNotifier` port from the
//! `core` crate. Callers spawn it detached from the response path; delivery
//! failure is logged and never surfaced.

use async_trait::async_trait;
use muse_core::{
    domain::PromptEvent,
    ports::{EventNotifier, PortError, PortResult},
};
use serde_json::json;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `EventNotifier` over a plain HTTP POST.
/// With no URL configured, notifications are dropped silently.
#[derive(Clone)]
pub struct WebhookNotifier {
    http: reqwest::Client,
    url: Option<String>,
}

impl WebhookNotifier {
    /// Creates a new `WebhookNotifier`.
    pub fn new(http: reqwest::Client, url: Option<String>) -> Self {
        Self { http, url }
    }
}

//=========================================================================================
// `EventNotifier` Trait Implementation
//=========================================================================================

#[async_trait]
impl EventNotifier for WebhookNotifier {
    async fn prompt_generated(&self, event: &PromptEvent) -> PortResult<()> {
        let Some(url) = &self.url else {
            return Ok(());
        };

        let body = json!({
            "event": "prompt.generated",
            "userId": event.user_id,
            "title": event.title,
            "difficulty": event.difficulty,
            "wordCount": event.word_count,
            "genres": event.genres,
        });

        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PortError::Unexpected(format!(
                "webhook returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
