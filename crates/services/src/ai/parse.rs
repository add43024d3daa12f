//! Lenient JSON extraction from model replies.

use reel_core::model::{ContentDraft, QuizDraft};

use crate::error::AiError;

/// Parse a summarizer reply into slide fields.
///
/// # Errors
///
/// Returns `AiError::SummarizerFormat` when no matching JSON object is found.
pub fn parse_summary(reply: &str) -> Result<ContentDraft, AiError> {
    let json = json_object(reply).ok_or_else(|| AiError::SummarizerFormat(snippet(reply)))?;
    serde_json::from_str(json).map_err(|err| AiError::SummarizerFormat(err.to_string()))
}

/// Parse a quiz generator reply.
///
/// # Errors
///
/// Returns `AiError::QuizFormat` when no matching JSON object is found.
pub fn parse_quiz(reply: &str) -> Result<QuizDraft, AiError> {
    let json = json_object(reply).ok_or_else(|| AiError::QuizFormat(snippet(reply)))?;
    serde_json::from_str(json).map_err(|err| AiError::QuizFormat(err.to_string()))
}

/// Outermost `{...}` span, which also skips Markdown code fences.
fn json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

fn snippet(reply: &str) -> String {
    reply.chars().take(80).collect()
}
