//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::web::auth::TokenKeys;
use muse_core::ports::{
    ChordProgressionService, CounterStore, DrawingService, EventNotifier, IdentityVerifier,
    PromptStore, SoundDesignService, WritingFeedbackService, WritingPromptService,
};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all
/// handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn PromptStore>,
    pub cache: Arc<dyn CounterStore>,
    pub writing_prompts: Arc<dyn WritingPromptService>,
    pub writing_feedback: Arc<dyn WritingFeedbackService>,
    pub drawing: Arc<dyn DrawingService>,
    pub sound_design: Arc<dyn SoundDesignService>,
    pub chords: Arc<dyn ChordProgressionService>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub notifier: Arc<dyn EventNotifier>,
    pub token_keys: TokenKeys,
    pub config: Arc<Config>,
}
