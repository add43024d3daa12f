//! Generation collaborators and their OpenAI-compatible implementation.

use async_trait::async_trait;
use reel_core::model::{ContentDraft, ContentSlide, QuizDraft};

use crate::error::AiError;

mod client;
mod parse;
mod prompts;

pub use client::{AiClient, AiConfig};
pub use parse::{parse_quiz, parse_summary};

/// Turns a chunk of source text into slide fields.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// # Errors
    ///
    /// Returns `AiError::SummarizerFormat` when the reply cannot be parsed,
    /// or a transport error.
    async fn summarize(&self, chunk: &str) -> Result<ContentDraft, AiError>;
}

/// Writes one multiple-choice question about recent slides.
#[async_trait]
pub trait QuizGenerator: Send + Sync {
    /// # Errors
    ///
    /// Returns `AiError::QuizFormat` when the reply cannot be parsed,
    /// or a transport error.
    async fn generate_quiz(&self, slides: &[ContentSlide]) -> Result<QuizDraft, AiError>;
}

/// Text to speech.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// # Errors
    ///
    /// Returns `AiError` when no audio could be produced.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, AiError>;
}

#[async_trait]
impl Summarizer for AiClient {
    async fn summarize(&self, chunk: &str) -> Result<ContentDraft, AiError> {
        let reply = self
            .complete(prompts::SUMMARY_SYSTEM, &prompts::summary_request(chunk))
            .await?;
        parse_summary(&reply)
    }
}

#[async_trait]
impl QuizGenerator for AiClient {
    async fn generate_quiz(&self, slides: &[ContentSlide]) -> Result<QuizDraft, AiError> {
        let reply = self
            .complete(prompts::QUIZ_SYSTEM, &prompts::quiz_request(slides))
            .await?;
        parse_quiz(&reply)
    }
}

#[async_trait]
impl Synthesizer for AiClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, AiError> {
        self.speech(text).await
    }
}
