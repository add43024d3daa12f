//! Document upload to slide list.
//!
//! Extraction and chunking failures reject the whole upload. Generation
//! failures only cost the affected chunk or quiz; the upload fails when no
//! content slide survives. Synthesis failures produce silent slides.

use std::sync::Arc;

use rand::seq::SliceRandom;
use reel_core::Clock;
use reel_core::model::{ContentSlide, QUIZ_OPTION_COUNT, QuizDraft, Slide, SlideId, SlideVideo};
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use crate::ai::{QuizGenerator, Summarizer, Synthesizer};
use crate::chunking::{ChunkingConfig, chunk_text};
use crate::error::{ExtractError, IngestError};
use crate::extract::{DocumentKind, TextExtractor};
use crate::voiceover::VoiceoverStore;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq)]
pub struct IngestConfig {
    pub max_upload_bytes: usize,
    pub chunking: ChunkingConfig,
    /// Insert a quiz after this many content slides. Zero disables quizzes.
    pub quiz_every: usize,
    pub shuffle_quiz_options: bool,
    /// Background clips assigned to content slides in rotation.
    pub videos: Vec<SlideVideo>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: MAX_UPLOAD_BYTES,
            chunking: ChunkingConfig::default(),
            quiz_every: 3,
            shuffle_quiz_options: true,
            videos: Vec::new(),
        }
    }
}

/// One uploaded file.
#[derive(Clone, Debug)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedChunk {
    pub index: usize,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub chunks: usize,
    pub skipped_chunks: Vec<SkippedChunk>,
    pub skipped_quizzes: usize,
    pub silent_slides: usize,
}

#[derive(Clone, Debug)]
pub struct IngestOutcome {
    pub slides: Vec<Slide>,
    pub report: IngestReport,
}

/// Body of the upload response.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum UploadBody {
    Slides { success: bool, slides: Vec<Slide> },
    Error { error: String },
}

#[derive(Clone, Debug)]
pub struct UploadResponse {
    pub status: StatusCode,
    pub body: UploadBody,
}

impl IngestError {
    /// HTTP status reported for this failure.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            IngestError::MissingFile => StatusCode::BAD_REQUEST,
            IngestError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            IngestError::Extract(ExtractError::UnsupportedType(_)) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            IngestError::Extract(_) | IngestError::Empty => StatusCode::UNPROCESSABLE_ENTITY,
            IngestError::NoSlides { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

#[derive(Clone)]
pub struct IngestService {
    clock: Clock,
    config: IngestConfig,
    extractor: Arc<dyn TextExtractor>,
    summarizer: Arc<dyn Summarizer>,
    quizzes: Arc<dyn QuizGenerator>,
    synthesizer: Arc<dyn Synthesizer>,
    voiceovers: Arc<dyn VoiceoverStore>,
}

impl IngestService {
    #[must_use]
    pub fn new(
        clock: Clock,
        config: IngestConfig,
        extractor: Arc<dyn TextExtractor>,
        summarizer: Arc<dyn Summarizer>,
        quizzes: Arc<dyn QuizGenerator>,
        synthesizer: Arc<dyn Synthesizer>,
        voiceovers: Arc<dyn VoiceoverStore>,
    ) -> Self {
        Self {
            clock,
            config,
            extractor,
            summarizer,
            quizzes,
            synthesizer,
            voiceovers,
        }
    }

    #[must_use]
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Run the upload contract: slides on success, `{error}` with a non-2xx
    /// status otherwise.
    pub async fn respond(&self, upload: Option<Upload>) -> UploadResponse {
        let result = match upload {
            Some(upload) => self.ingest(upload).await,
            None => Err(IngestError::MissingFile),
        };
        match result {
            Ok(outcome) => UploadResponse {
                status: StatusCode::OK,
                body: UploadBody::Slides {
                    success: true,
                    slides: outcome.slides,
                },
            },
            Err(err) => {
                warn!(error = %err, "upload rejected");
                UploadResponse {
                    status: err.status(),
                    body: UploadBody::Error {
                        error: err.to_string(),
                    },
                }
            }
        }
    }

    /// Turn one document into an ordered slide list.
    ///
    /// # Errors
    ///
    /// Returns `IngestError` when the file is too large, of an unsupported
    /// type, unreadable, empty, or when every chunk failed to summarize.
    pub async fn ingest(&self, upload: Upload) -> Result<IngestOutcome, IngestError> {
        let size = upload.bytes.len();
        if size > self.config.max_upload_bytes {
            return Err(IngestError::TooLarge {
                size,
                limit: self.config.max_upload_bytes,
            });
        }
        let kind = DocumentKind::from_file_name(&upload.file_name)?;
        let extractor = Arc::clone(&self.extractor);
        let bytes = upload.bytes;
        let text = tokio::task::spawn_blocking(move || extractor.extract(&bytes, kind))
            .await
            .map_err(|err| ExtractError::Parse(format!("extraction task failed: {err}")))??;
        let chunks = chunk_text(&text, self.config.chunking);
        if chunks.is_empty() {
            return Err(IngestError::Empty);
        }
        info!(file = %upload.file_name, ?kind, bytes = size, chunks = chunks.len(), "ingesting document");

        let mut report = IngestReport {
            chunks: chunks.len(),
            ..IngestReport::default()
        };
        let mut slides = Vec::new();
        let mut recent: Vec<ContentSlide> = Vec::new();
        let mut next_id = SlideId::new(1);
        let mut content_count = 0usize;

        for (index, chunk) in chunks.iter().enumerate() {
            let slide = match self.content_slide(next_id, chunk, content_count, &mut report).await {
                Ok(slide) => slide,
                Err(reason) => {
                    warn!(chunk = index, %reason, "skipping chunk");
                    report.skipped_chunks.push(SkippedChunk { index, reason });
                    continue;
                }
            };
            next_id = next_id.next();
            content_count += 1;
            recent.push(slide.clone());
            slides.push(Slide::Content(slide));

            if self.config.quiz_every > 0 && recent.len() == self.config.quiz_every {
                match self.quiz_slide(next_id, &recent).await {
                    Ok(quiz) => {
                        next_id = next_id.next();
                        slides.push(quiz);
                    }
                    Err(reason) => {
                        warn!(after_chunk = index, %reason, "skipping quiz");
                        report.skipped_quizzes += 1;
                    }
                }
                recent.clear();
            }
        }

        if content_count == 0 {
            return Err(IngestError::NoSlides {
                chunks: report.chunks,
            });
        }
        info!(
            slides = slides.len(),
            skipped_chunks = report.skipped_chunks.len(),
            skipped_quizzes = report.skipped_quizzes,
            silent = report.silent_slides,
            "ingest finished"
        );
        Ok(IngestOutcome { slides, report })
    }

    async fn content_slide(
        &self,
        id: SlideId,
        chunk: &str,
        position: usize,
        report: &mut IngestReport,
    ) -> Result<ContentSlide, String> {
        let draft = self
            .summarizer
            .summarize(chunk)
            .await
            .map_err(|err| err.to_string())?;
        let script = draft.narration_script();
        let voiceover = self.voiceover(id, &script).await;
        let video = self.video_for(position);
        let slide = draft
            .validate(id, voiceover, video, self.clock.now())
            .map_err(|err| err.to_string())?;
        if slide.is_silent() {
            report.silent_slides += 1;
        }
        Ok(slide)
    }

    async fn voiceover(&self, id: SlideId, script: &str) -> Option<Url> {
        let audio = match self.synthesizer.synthesize(script).await {
            Ok(audio) => audio,
            Err(err) => {
                warn!(slide = %id, error = %err, "synthesis failed; slide will be silent");
                return None;
            }
        };
        match self.voiceovers.store(id, &audio).await {
            Ok(url) => Some(url),
            Err(err) => {
                warn!(slide = %id, error = %err, "could not store voiceover; slide will be silent");
                None
            }
        }
    }

    fn video_for(&self, position: usize) -> Option<SlideVideo> {
        let videos = &self.config.videos;
        (!videos.is_empty()).then(|| videos[position % videos.len()].clone())
    }

    async fn quiz_slide(&self, id: SlideId, recent: &[ContentSlide]) -> Result<Slide, String> {
        let draft = self
            .quizzes
            .generate_quiz(recent)
            .await
            .map_err(|err| err.to_string())?;
        let draft = if self.config.shuffle_quiz_options {
            shuffled(draft)
        } else {
            draft
        };
        draft
            .validate(id, self.clock.now())
            .map(Slide::Quiz)
            .map_err(|err| err.to_string())
    }
}

fn shuffled(draft: QuizDraft) -> QuizDraft {
    if draft.options.len() != QUIZ_OPTION_COUNT {
        return draft;
    }
    let mut order: Vec<usize> = (0..QUIZ_OPTION_COUNT).collect();
    order.shuffle(&mut rand::rng());
    draft.reordered(&order)
}
