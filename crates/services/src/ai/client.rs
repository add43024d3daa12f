use std::env;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AiError;

#[derive(Clone, Debug)]
pub struct AiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub tts_model: String,
    pub tts_voice: String,
}

impl AiConfig {
    /// Read `REEL_AI_*` and `REEL_TTS_*` variables. `None` without an API key.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("REEL_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url =
            env::var("REEL_AI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let model = env::var("REEL_AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        let tts_model = env::var("REEL_TTS_MODEL").unwrap_or_else(|_| "tts-1".into());
        let tts_voice = env::var("REEL_TTS_VOICE").unwrap_or_else(|_| "alloy".into());
        Some(Self {
            base_url,
            api_key,
            model,
            tts_model,
            tts_voice,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }
}

/// OpenAI-compatible client for chat completions and speech.
#[derive(Clone)]
pub struct AiClient {
    client: Client,
    config: Option<AiConfig>,
}

impl AiClient {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(AiConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<AiConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    fn config(&self) -> Result<&AiConfig, AiError> {
        self.config.as_ref().ok_or(AiError::Disabled)
    }

    /// Run one chat completion and return the trimmed reply.
    ///
    /// # Errors
    ///
    /// Returns `AiError` when the client is disabled, the request fails,
    /// or the response is empty.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, AiError> {
        let config = self.config()?;
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user.to_string(),
                },
            ],
            temperature: 0.4,
        };

        let response = self
            .client
            .post(config.endpoint("chat/completions"))
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AiError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AiError::EmptyResponse)?;

        debug!(model = %config.model, chars = content.len(), "chat completion received");
        Ok(content.trim().to_string())
    }

    /// Render `text` as MP3 audio.
    ///
    /// # Errors
    ///
    /// Returns `AiError::Disabled` without configuration and
    /// `AiError::Synthesis` for any request, status or empty-body failure.
    pub async fn speech(&self, text: &str) -> Result<Vec<u8>, AiError> {
        let config = self.config()?;
        let payload = SpeechRequest {
            model: &config.tts_model,
            input: text,
            voice: &config.tts_voice,
            response_format: "mp3",
        };

        let response = self
            .client
            .post(config.endpoint("audio/speech"))
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| AiError::Synthesis(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AiError::Synthesis(format!("speech request failed with status {status}")));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|err| AiError::Synthesis(err.to_string()))?;
        if audio.is_empty() {
            return Err(AiError::Synthesis("empty audio response".into()));
        }
        debug!(model = %config.tts_model, bytes = audio.len(), "speech received");
        Ok(audio.to_vec())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'static str,
}
