use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use reel_core::model::{ContentDraft, ContentSlide, QuizDraft, Slide, SlideId, SlideKind, SlideVideo};
use reel_core::time::fixed_now;
use reqwest::StatusCode;
use services::{
    AiError, ChunkingConfig, Clock, DocumentExtractor, IngestConfig, IngestError, IngestService,
    QuizGenerator, Summarizer, Synthesizer, Upload, UploadBody, VoiceoverError, VoiceoverStore,
};
use url::Url;

/// Summarizes by echoing the chunk; chunks containing "garbled" fail.
struct EchoSummarizer;

#[async_trait]
impl Summarizer for EchoSummarizer {
    async fn summarize(&self, chunk: &str) -> Result<ContentDraft, AiError> {
        if chunk.contains("garbled") {
            return Err(AiError::SummarizerFormat("not json".into()));
        }
        Ok(ContentDraft {
            title: chunk.split_whitespace().take(2).collect::<Vec<_>>().join(" "),
            intro: "Listen up.".into(),
            simple_explanation: chunk.to_owned(),
            fun_example: "Imagine a cat.".into(),
        })
    }
}

struct CountingQuiz {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl QuizGenerator for CountingQuiz {
    async fn generate_quiz(&self, slides: &[ContentSlide]) -> Result<QuizDraft, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AiError::QuizFormat("missing options".into()));
        }
        Ok(QuizDraft {
            question: format!("Which came first of {}?", slides.len()),
            options: slides
                .iter()
                .map(|slide| slide.title().to_owned())
                .chain(std::iter::once("None of these".to_owned()))
                .collect(),
            correct_answer: 0,
            explanation: "Order of appearance.".into(),
        })
    }
}

/// Fails for scripts mentioning "silent".
struct FakeSpeech;

#[async_trait]
impl Synthesizer for FakeSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, AiError> {
        if text.contains("silent") {
            return Err(AiError::Synthesis("voice unavailable".into()));
        }
        Ok(text.as_bytes().to_vec())
    }
}

struct UrlStore;

#[async_trait]
impl VoiceoverStore for UrlStore {
    async fn store(&self, slide: SlideId, _audio: &[u8]) -> Result<Url, VoiceoverError> {
        Ok(Url::parse(&format!("https://cdn.test/voice/{slide}.mp3"))?)
    }
}

fn service(quiz_fails: bool, config: IngestConfig) -> (IngestService, Arc<CountingQuiz>) {
    let quizzes = Arc::new(CountingQuiz {
        calls: AtomicUsize::new(0),
        fail: quiz_fails,
    });
    let service = IngestService::new(
        Clock::fixed(fixed_now()),
        config,
        Arc::new(DocumentExtractor),
        Arc::new(EchoSummarizer),
        Arc::clone(&quizzes) as Arc<dyn QuizGenerator>,
        Arc::new(FakeSpeech),
        Arc::new(UrlStore),
    );
    (service, quizzes)
}

fn config() -> IngestConfig {
    IngestConfig {
        chunking: ChunkingConfig {
            max_chunks: 8,
            min_chars: 1,
            max_chars: 500,
        },
        shuffle_quiz_options: false,
        ..IngestConfig::default()
    }
}

fn upload(paragraphs: &[&str]) -> Upload {
    Upload {
        file_name: "notes.txt".into(),
        bytes: paragraphs.join("\n\n").into_bytes(),
    }
}

fn kinds(slides: &[Slide]) -> Vec<SlideKind> {
    slides.iter().map(Slide::kind).collect()
}

#[tokio::test]
async fn quiz_follows_every_third_content_slide() {
    let (service, quizzes) = service(false, config());
    let outcome = service
        .ingest(upload(&[
            "Atoms are small.",
            "Molecules join atoms.",
            "Cells hold molecules.",
            "Organs group cells.",
        ]))
        .await
        .expect("ingest");

    assert_eq!(
        kinds(&outcome.slides),
        vec![
            SlideKind::Content,
            SlideKind::Content,
            SlideKind::Content,
            SlideKind::Quiz,
            SlideKind::Content
        ]
    );
    assert_eq!(quizzes.calls.load(Ordering::SeqCst), 1);

    let ids: Vec<u64> = outcome.slides.iter().map(|slide| slide.id().value()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);

    let quiz = outcome.slides[3].as_quiz().expect("quiz");
    assert_eq!(quiz.options()[0], "Atoms are");
    assert!(quiz.is_correct(0));

    let first = outcome.slides[0].as_content().expect("content");
    assert_eq!(
        first.voiceover_url().map(Url::as_str),
        Some("https://cdn.test/voice/1.mp3")
    );
    assert_eq!(outcome.report.chunks, 4);
    assert!(outcome.report.skipped_chunks.is_empty());
}

#[tokio::test]
async fn failing_chunks_are_skipped_and_reported() {
    let (service, _) = service(false, config());
    let outcome = service
        .ingest(upload(&["Good one.", "garbled output", "Another good one."]))
        .await
        .expect("ingest");

    assert_eq!(outcome.slides.len(), 2);
    assert_eq!(outcome.report.skipped_chunks.len(), 1);
    assert_eq!(outcome.report.skipped_chunks[0].index, 1);
    // Ids stay dense after a skip.
    assert_eq!(outcome.slides[1].id(), SlideId::new(2));
}

#[tokio::test]
async fn synthesis_failure_yields_silent_slide() {
    let (service, _) = service(false, config());
    let outcome = service
        .ingest(upload(&["This one stays silent.", "This one talks."]))
        .await
        .expect("ingest");

    let silent = outcome.slides[0].as_content().expect("content");
    assert!(silent.is_silent());
    assert!(!outcome.slides[1].as_content().expect("content").is_silent());
    assert_eq!(outcome.report.silent_slides, 1);

    let json = serde_json::to_value(&outcome.slides[0]).unwrap();
    assert!(json["voiceoverUrl"].is_null());
    assert_eq!(json["type"], "content");
}

#[tokio::test]
async fn failed_quiz_does_not_fail_upload() {
    let (service, quizzes) = service(true, config());
    let outcome = service
        .ingest(upload(&["One a.", "Two b.", "Three c."]))
        .await
        .expect("ingest");
    assert_eq!(kinds(&outcome.slides), vec![SlideKind::Content; 3]);
    assert_eq!(quizzes.calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.report.skipped_quizzes, 1);
}

#[tokio::test]
async fn upload_fails_when_nothing_survives() {
    let (service, _) = service(false, config());
    let err = service
        .ingest(upload(&["garbled", "garbled again"]))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::NoSlides { chunks: 2 }));
}

#[tokio::test]
async fn upload_contract_reports_errors_with_status() {
    let limited = IngestConfig {
        max_upload_bytes: 4,
        ..config()
    };
    let (service, _) = service(false, limited);

    let response = service.respond(Some(upload(&["far too long"]))).await;
    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(matches!(response.body, UploadBody::Error { .. }));

    let response = service.respond(None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let json = serde_json::to_value(&response.body).unwrap();
    assert_eq!(json["error"], "no file uploaded");

    let response = service
        .respond(Some(Upload {
            file_name: "deck.pptx".into(),
            bytes: vec![1],
        }))
        .await;
    assert_eq!(response.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn unreadable_pdf_is_rejected_as_unprocessable() {
    let (service, quizzes) = service(false, config());
    let response = service
        .respond(Some(Upload {
            file_name: "lecture.pdf".into(),
            bytes: b"%PDF-1.4\ntruncated".to_vec(),
        }))
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    let json = serde_json::to_value(&response.body).unwrap();
    assert!(json["error"].as_str().unwrap().starts_with("could not parse document"));
    assert_eq!(quizzes.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn upload_contract_returns_slides() {
    let (service, _) = service(false, config());
    let response = service.respond(Some(upload(&["Just one."]))).await;
    assert_eq!(response.status, StatusCode::OK);
    let json = serde_json::to_value(&response.body).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["slides"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn blank_document_is_empty() {
    let (service, _) = service(false, config());
    let err = service.ingest(upload(&["   ", "\n"])).await.unwrap_err();
    assert!(matches!(err, IngestError::Empty));
}

#[tokio::test]
async fn videos_rotate_across_content_slides() {
    let clip = |name: &str| SlideVideo {
        src: Url::parse(&format!("https://cdn.test/{name}.mp4")).unwrap(),
        blurred_backdrop: true,
    };
    let config = IngestConfig {
        videos: vec![clip("a"), clip("b")],
        quiz_every: 0,
        ..config()
    };
    let (service, quizzes) = service(false, config);
    let outcome = service
        .ingest(upload(&["One.", "Two.", "Three."]))
        .await
        .expect("ingest");

    let sources: Vec<String> = outcome
        .slides
        .iter()
        .filter_map(Slide::as_content)
        .filter_map(|slide| slide.video().map(|video| video.src.to_string()))
        .collect();
    assert_eq!(
        sources,
        vec![
            "https://cdn.test/a.mp4",
            "https://cdn.test/b.mp4",
            "https://cdn.test/a.mp4"
        ]
    );
    assert_eq!(quizzes.calls.load(Ordering::SeqCst), 0);
}
