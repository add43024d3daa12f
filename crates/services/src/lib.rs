#![forbid(unsafe_code)]

pub mod ai;
pub mod app_services;
pub mod chunking;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod preferences_service;
pub mod voiceover;

pub use reel_core::Clock;

pub use ai::{AiClient, AiConfig, QuizGenerator, Summarizer, Synthesizer};
pub use app_services::AppServices;
pub use chunking::{ChunkingConfig, chunk_text};
pub use error::{
    AiError, AppServicesError, ExtractError, IngestError, PreferencesServiceError, VoiceoverError,
};
pub use extract::{DocumentExtractor, DocumentKind, TextExtractor};
pub use ingest::{
    IngestConfig, IngestOutcome, IngestReport, IngestService, MAX_UPLOAD_BYTES, SkippedChunk,
    Upload, UploadBody, UploadResponse,
};
pub use preferences_service::PreferencesService;
pub use voiceover::{FsVoiceoverStore, VoiceoverStore};
