use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::ids::SlideId;

/// Number of answer options every quiz slide carries.
pub const QUIZ_OPTION_COUNT: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SlideError {
    #[error("{field} cannot be empty")]
    EmptyField { field: &'static str },

    #[error("quiz needs exactly {expected} options, got {got}")]
    OptionCount { expected: usize, got: usize },

    #[error("quiz option {index} cannot be empty")]
    EmptyOption { index: usize },

    #[error("correct answer {index} is out of range for {len} options")]
    AnswerOutOfRange { index: usize, len: usize },
}

//
// ─── SLIDE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlideKind {
    Content,
    Quiz,
}

/// One unit of the feed. Serialized with a `"type"` tag and camelCase fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Slide {
    Content(ContentSlide),
    Quiz(QuizSlide),
}

impl Slide {
    #[must_use]
    pub fn id(&self) -> SlideId {
        match self {
            Slide::Content(slide) => slide.id,
            Slide::Quiz(slide) => slide.id,
        }
    }

    #[must_use]
    pub fn kind(&self) -> SlideKind {
        match self {
            Slide::Content(_) => SlideKind::Content,
            Slide::Quiz(_) => SlideKind::Quiz,
        }
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Slide::Content(slide) => slide.timestamp,
            Slide::Quiz(slide) => slide.timestamp,
        }
    }

    #[must_use]
    pub fn as_content(&self) -> Option<&ContentSlide> {
        match self {
            Slide::Content(slide) => Some(slide),
            Slide::Quiz(_) => None,
        }
    }

    #[must_use]
    pub fn as_quiz(&self) -> Option<&QuizSlide> {
        match self {
            Slide::Quiz(slide) => Some(slide),
            Slide::Content(_) => None,
        }
    }
}

/// Video shown behind a content slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideVideo {
    pub src: Url,
    /// Also render the same clip blurred and scaled behind the foreground.
    #[serde(default)]
    pub blurred_backdrop: bool,
}

//
// ─── CONTENT SLIDE ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ContentSlideRecord")]
pub struct ContentSlide {
    id: SlideId,
    title: String,
    intro: String,
    simple_explanation: String,
    fun_example: String,
    voiceover_url: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    video: Option<SlideVideo>,
    timestamp: DateTime<Utc>,
}

/// Unvalidated slide fields, as produced by the summarizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDraft {
    pub title: String,
    pub intro: String,
    pub simple_explanation: String,
    pub fun_example: String,
}

impl ContentDraft {
    /// Validate the draft into an immutable content slide.
    ///
    /// # Errors
    ///
    /// Returns `SlideError::EmptyField` if the title or explanation is blank.
    pub fn validate(
        self,
        id: SlideId,
        voiceover_url: Option<Url>,
        video: Option<SlideVideo>,
        timestamp: DateTime<Utc>,
    ) -> Result<ContentSlide, SlideError> {
        let title = require_text(self.title, "title")?;
        let simple_explanation = require_text(self.simple_explanation, "simpleExplanation")?;

        Ok(ContentSlide {
            id,
            title,
            intro: self.intro.trim().to_owned(),
            simple_explanation,
            fun_example: self.fun_example.trim().to_owned(),
            voiceover_url,
            video,
            timestamp,
        })
    }

    /// Text read aloud for a slide built from this draft.
    #[must_use]
    pub fn narration_script(&self) -> String {
        join_script(&[&self.intro, &self.simple_explanation, &self.fun_example])
    }
}

impl ContentSlide {
    #[must_use]
    pub fn id(&self) -> SlideId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn intro(&self) -> &str {
        &self.intro
    }

    #[must_use]
    pub fn simple_explanation(&self) -> &str {
        &self.simple_explanation
    }

    #[must_use]
    pub fn fun_example(&self) -> &str {
        &self.fun_example
    }

    #[must_use]
    pub fn voiceover_url(&self) -> Option<&Url> {
        self.voiceover_url.as_ref()
    }

    #[must_use]
    pub fn video(&self) -> Option<&SlideVideo> {
        self.video.as_ref()
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns true when no voiceover was produced for this slide.
    #[must_use]
    pub fn is_silent(&self) -> bool {
        self.voiceover_url.is_none()
    }

    /// The text the voiceover reads, used to derive captions.
    #[must_use]
    pub fn narration_script(&self) -> String {
        join_script(&[&self.intro, &self.simple_explanation, &self.fun_example])
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentSlideRecord {
    id: SlideId,
    title: String,
    #[serde(default)]
    intro: String,
    simple_explanation: String,
    #[serde(default)]
    fun_example: String,
    #[serde(default)]
    voiceover_url: Option<Url>,
    #[serde(default)]
    video: Option<SlideVideo>,
    timestamp: DateTime<Utc>,
}

impl TryFrom<ContentSlideRecord> for ContentSlide {
    type Error = SlideError;

    fn try_from(record: ContentSlideRecord) -> Result<Self, Self::Error> {
        ContentDraft {
            title: record.title,
            intro: record.intro,
            simple_explanation: record.simple_explanation,
            fun_example: record.fun_example,
        }
        .validate(record.id, record.voiceover_url, record.video, record.timestamp)
    }
}

//
// ─── QUIZ SLIDE ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "QuizSlideRecord")]
pub struct QuizSlide {
    id: SlideId,
    question: String,
    options: [String; QUIZ_OPTION_COUNT],
    correct_answer: usize,
    explanation: String,
    timestamp: DateTime<Utc>,
}

/// Unvalidated quiz fields, as produced by the quiz generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDraft {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: String,
}

impl QuizDraft {
    /// Validate the draft into an immutable quiz slide.
    ///
    /// # Errors
    ///
    /// Returns `SlideError` if the question is blank, the option count is not
    /// exactly four, any option is blank, or the answer index is out of range.
    pub fn validate(self, id: SlideId, timestamp: DateTime<Utc>) -> Result<QuizSlide, SlideError> {
        let question = require_text(self.question, "question")?;

        let got = self.options.len();
        let options: [String; QUIZ_OPTION_COUNT] = self
            .options
            .into_iter()
            .map(|option| option.trim().to_owned())
            .collect::<Vec<_>>()
            .try_into()
            .map_err(|_| SlideError::OptionCount {
                expected: QUIZ_OPTION_COUNT,
                got,
            })?;

        if let Some(index) = options.iter().position(String::is_empty) {
            return Err(SlideError::EmptyOption { index });
        }
        if self.correct_answer >= QUIZ_OPTION_COUNT {
            return Err(SlideError::AnswerOutOfRange {
                index: self.correct_answer,
                len: QUIZ_OPTION_COUNT,
            });
        }

        Ok(QuizSlide {
            id,
            question,
            options,
            correct_answer: self.correct_answer,
            explanation: self.explanation.trim().to_owned(),
            timestamp,
        })
    }

    /// Reorder options with the given permutation, keeping the answer index
    /// pointed at the same option text.
    ///
    /// `order[i]` is the old index of the option placed at position `i`.
    /// Orders that are not a permutation of the current indices are ignored.
    #[must_use]
    pub fn reordered(mut self, order: &[usize]) -> Self {
        let len = self.options.len();
        let mut seen = vec![false; len];
        let is_permutation = order.len() == len
            && order
                .iter()
                .all(|&idx| idx < len && !std::mem::replace(&mut seen[idx], true));
        if !is_permutation {
            return self;
        }

        let mut old = std::mem::take(&mut self.options)
            .into_iter()
            .map(Some)
            .collect::<Vec<_>>();
        self.options = order
            .iter()
            .map(|&idx| old[idx].take().unwrap_or_default())
            .collect();
        if let Some(position) = order.iter().position(|&idx| idx == self.correct_answer) {
            self.correct_answer = position;
        }
        self
    }
}

impl QuizSlide {
    #[must_use]
    pub fn id(&self) -> SlideId {
        self.id
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn options(&self) -> &[String; QUIZ_OPTION_COUNT] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> usize {
        self.correct_answer
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_answer
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuizSlideRecord {
    id: SlideId,
    question: String,
    options: Vec<String>,
    correct_answer: usize,
    #[serde(default)]
    explanation: String,
    timestamp: DateTime<Utc>,
}

impl TryFrom<QuizSlideRecord> for QuizSlide {
    type Error = SlideError;

    fn try_from(record: QuizSlideRecord) -> Result<Self, Self::Error> {
        QuizDraft {
            question: record.question,
            options: record.options,
            correct_answer: record.correct_answer,
            explanation: record.explanation,
        }
        .validate(record.id, record.timestamp)
    }
}

fn require_text(value: String, field: &'static str) -> Result<String, SlideError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SlideError::EmptyField { field });
    }
    Ok(trimmed.to_owned())
}

fn join_script(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
