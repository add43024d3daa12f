//! Shared error types for the services crate.

use thiserror::Error;

use reel_core::model::PreferencesError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `DocumentExtractor`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractError {
    #[error("unsupported document type: {0}")]
    UnsupportedType(String),
    #[error("could not parse document: {0}")]
    Parse(String),
    #[error("document is not valid UTF-8 text")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Errors emitted by the AI clients.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AiError {
    #[error("AI client is not configured")]
    Disabled,
    #[error("AI service returned an empty response")]
    EmptyResponse,
    #[error("AI request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("summary was not in the expected format: {0}")]
    SummarizerFormat(String),
    #[error("quiz was not in the expected format: {0}")]
    QuizFormat(String),
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),
}

/// Errors emitted by `VoiceoverStore` implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VoiceoverError {
    #[error("could not write voiceover: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid voiceover url: {0}")]
    Url(#[from] url::ParseError),
}

/// Errors emitted by `IngestService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IngestError {
    #[error("no file uploaded")]
    MissingFile,
    #[error("file is {size} bytes; the limit is {limit}")]
    TooLarge { size: usize, limit: usize },
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("document contains no readable text")]
    Empty,
    #[error("no slides could be produced from {chunks} chunks")]
    NoSlides { chunks: usize },
}

/// Errors emitted by `PreferencesService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PreferencesServiceError {
    #[error(transparent)]
    Preferences(#[from] PreferencesError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
