pub mod cache;
pub mod chords_llm;
pub mod db;
pub mod drawing_llm;
pub mod fallback;
pub mod google_auth;
pub mod sound_llm;
pub mod webhook;
pub mod writing_llm;

pub use cache::RedisCache;
pub use chords_llm::OpenAiChordAdapter;
pub use db::PgStore;
pub use drawing_llm::OpenAiDrawingAdapter;
pub use google_auth::GoogleVerifier;
pub use sound_llm::OpenAiSoundDesignAdapter;
pub use webhook::WebhookNotifier;
pub use writing_llm::OpenAiWritingAdapter;

use regex::Regex;

/// Strips the ``` fences models like to wrap JSON replies in.
pub(crate) fn strip_code_fences(content: &str) -> String {
    let fence = Regex::new(r"^```[a-zA-Z]*\s*|\s*```$").unwrap();
    fence.replace_all(content.trim(), "").to_string()
}
