//! services/api/src/adapters/drawing_llm.rs
//!
//! This module contains the adapter for drawing exercises: generation of
//! skill-targeted exercises and vision-based feedback on uploaded drawings.
//! It implements the `DrawingService` port from the `core` crate.

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ImageDetail,
        ImageUrlArgs,
    },
    Client,
};
use async_trait::async_trait;
use muse_core::{
    domain::{DrawingExercise, DrawingSubmission, FeedbackResult},
    ports::{DrawingService, PortError, PortResult},
};
use serde::Deserialize;

use crate::adapters::strip_code_fences;

const EXERCISE_SYSTEM_INSTRUCTIONS: &str = "You are a drawing instructor designing one focused practice exercise for the requested skills. Reply with ONLY a JSON object with keys: title, content (the exercise instructions, markdown with ### section headings and - bullets), difficulty (one of Beginner, Intermediate, Advanced), estimatedTime (like '30 minutes'), tips (array of exactly 3 short strings).";

const FEEDBACK_SYSTEM_INSTRUCTIONS: &str = "You are a drawing instructor reviewing a student's work against the exercise they attempted. Look carefully at the attached image. Be honest and specific; address the student as 'you'. Structure the reply with '### Strengths' and '### Areas for Improvement' sections with - bullets, referencing the skills the exercise targeted.";

/// What the exercise-generation model is asked to return.
#[derive(Deserialize)]
struct ExerciseReply {
    title: String,
    content: String,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(rename = "estimatedTime", default)]
    estimated_time: Option<String>,
    #[serde(default)]
    tips: Vec<String>,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `DrawingService` using a vision-capable
/// OpenAI-compatible LLM.
pub struct OpenAiDrawingAdapter {
    client: Option<Client<OpenAIConfig>>,
    model: String,
    timeout: Duration,
}

impl OpenAiDrawingAdapter {
    /// Creates a new `OpenAiDrawingAdapter`. `model` must be vision-capable.
    pub fn new(client: Option<Client<OpenAIConfig>>, model: String, timeout: Duration) -> Self {
        Self {
            client,
            model,
            timeout,
        }
    }

    fn client(&self) -> PortResult<&Client<OpenAIConfig>> {
        self.client.as_ref().ok_or_else(|| {
            PortError::Unexpected("generation backend is not configured".to_string())
        })
    }
}

/// Clamps a model-supplied difficulty onto the label set the UI knows.
fn normalize_difficulty(difficulty: Option<String>) -> String {
    match difficulty.as_deref() {
        Some("Beginner") | Some("Intermediate") | Some("Advanced") => difficulty.unwrap(),
        _ => "Intermediate".to_string(),
    }
}

/// Exercises always ship exactly three tips.
fn normalize_tips(mut tips: Vec<String>) -> Vec<String> {
    let general = [
        "Warm up with 30-second gestures before the main exercise.",
        "Work from big shapes to small details, never the reverse.",
        "Compare your drawing to the subject in a mirror to reset your eye.",
    ];
    for tip in general {
        if tips.len() >= 3 {
            break;
        }
        tips.push(tip.to_string());
    }
    tips.truncate(3);
    tips
}

//=========================================================================================
// `DrawingService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DrawingService for OpenAiDrawingAdapter {
    async fn generate_exercise(&self, skills: &[String]) -> PortResult<DrawingExercise> {
        let client = self.client()?;
        let user_prompt = format!(
            "Design one drawing exercise practicing: {}. Keep it achievable in a single sitting.",
            skills.join(", ")
        );

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(EXERCISE_SYSTEM_INSTRUCTIONS)
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
            .max_tokens(600u32)
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

        Ok(DrawingExercise {
            title: reply.title,
            content: reply.content,
            skills: skills.to_vec(),
            difficulty: normalize_difficulty(reply.difficulty),
            estimated_time: reply
                .estimated_time
                .unwrap_or_else(|| "30 minutes".to_string()),
            tips: normalize_tips(reply.tips),
        })
    }

    async fn review_drawing(&self, submission: &DrawingSubmission) -> PortResult<FeedbackResult> {
        let client = self.client()?;
        let context = format!(
            "Exercise: {}\nSkills practiced: {}\nDifficulty: {}",
            submission.exercise,
            submission.skills.join(", "),
            submission.difficulty,
        );

        // The image travels as its data-URI, exactly as uploaded.
        let text_part = ChatCompletionRequestMessageContentPartTextArgs::default()
            .text(context)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let image_part = ChatCompletionRequestMessageContentPartImageArgs::default()
            .image_url(
                ImageUrlArgs::default()
                    .url(submission.image_data_uri.clone())
                    .detail(ImageDetail::Auto)
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?,
            )
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(FEEDBACK_SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(vec![text_part.into(), image_part.into()])
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_tokens(800u32)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = tokio::time::timeout(self.timeout, client.chat().create(request))
            .await
            .map_err(|_| PortError::Unexpected("feedback call timed out".to_string()))?
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let markdown = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected("feedback backend returned no text".to_string())
            })?;

        Ok(FeedbackResult { markdown })
    }
}
