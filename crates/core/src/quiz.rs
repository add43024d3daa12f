//! Interaction state for a single quiz slide.
//!
//! `Unanswered → Submitted → Revealed → Answered`. Submission moves straight
//! through `Submitted` into `Revealed`; the answered signal fires once after
//! the reveal delay and the machine is then spent.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::model::{QUIZ_OPTION_COUNT, QuizSlide};

/// How long the explanation stays up before the feed moves on.
pub const QUIZ_REVEAL_MS: i64 = 3_000;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("select an option before submitting")]
    NoSelection,
    #[error("answer already submitted")]
    AlreadySubmitted,
    #[error("option {index} does not exist")]
    OptionOutOfRange { index: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuizPhase {
    Unanswered,
    Revealed { correct: bool },
    /// The answered signal has fired; the machine should be discarded.
    Answered { correct: bool },
}

/// Visual tag for one option.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionMark {
    Neutral,
    Selected,
    Correct,
    Incorrect,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuizVerdict {
    pub selected: usize,
    pub correct: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Unanswered,
    Revealed {
        correct: bool,
        advance_at: DateTime<Utc>,
    },
    Answered {
        correct: bool,
    },
}

#[derive(Clone, Debug)]
pub struct QuizMachine {
    correct_answer: usize,
    selected: Option<usize>,
    state: State,
    reveal_delay: Duration,
}

impl QuizMachine {
    #[must_use]
    pub fn new(slide: &QuizSlide) -> Self {
        Self::with_reveal_delay(slide, Duration::milliseconds(QUIZ_REVEAL_MS))
    }

    #[must_use]
    pub fn with_reveal_delay(slide: &QuizSlide, reveal_delay: Duration) -> Self {
        Self {
            correct_answer: slide.correct_answer(),
            selected: None,
            state: State::Unanswered,
            reveal_delay,
        }
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        match self.state {
            State::Unanswered => QuizPhase::Unanswered,
            State::Revealed { correct, .. } => QuizPhase::Revealed { correct },
            State::Answered { correct } => QuizPhase::Answered { correct },
        }
    }

    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        matches!(self.state, State::Unanswered) && self.selected.is_some()
    }

    #[must_use]
    pub fn explanation_visible(&self) -> bool {
        !matches!(self.state, State::Unanswered)
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        matches!(self.state, State::Answered { .. })
    }

    /// Record the chosen option. Re-selecting overwrites.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::AlreadySubmitted` once locked, or
    /// `QuizError::OptionOutOfRange` for an unknown option.
    pub fn select(&mut self, index: usize) -> Result<(), QuizError> {
        if !matches!(self.state, State::Unanswered) {
            return Err(QuizError::AlreadySubmitted);
        }
        if index >= QUIZ_OPTION_COUNT {
            return Err(QuizError::OptionOutOfRange { index });
        }
        self.selected = Some(index);
        Ok(())
    }

    /// Lock the selection and reveal the result.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoSelection` before an option is chosen and
    /// `QuizError::AlreadySubmitted` on repeat submissions.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<QuizVerdict, QuizError> {
        if !matches!(self.state, State::Unanswered) {
            return Err(QuizError::AlreadySubmitted);
        }
        let selected = self.selected.ok_or(QuizError::NoSelection)?;
        let correct = selected == self.correct_answer;
        self.state = State::Revealed {
            correct,
            advance_at: now + self.reveal_delay,
        };
        Ok(QuizVerdict { selected, correct })
    }

    /// Fire the answered signal once the reveal delay has elapsed.
    ///
    /// Returns `Some(correct)` exactly once.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<bool> {
        match self.state {
            State::Revealed {
                correct,
                advance_at,
            } if now >= advance_at => {
                self.state = State::Answered { correct };
                Some(correct)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn option_marks(&self) -> [OptionMark; QUIZ_OPTION_COUNT] {
        let submitted = self.explanation_visible();
        std::array::from_fn(|index| {
            let is_selected = self.selected == Some(index);
            let is_answer = index == self.correct_answer;
            match (submitted, is_selected, is_answer) {
                (false, true, _) => OptionMark::Selected,
                (false, false, _) => OptionMark::Neutral,
                (true, _, true) => OptionMark::Correct,
                (true, true, false) => OptionMark::Incorrect,
                (true, false, false) => OptionMark::Neutral,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuizDraft, SlideId};
    use crate::time::fixed_now;

    fn slide() -> QuizSlide {
        QuizDraft {
            question: "2 + 2?".into(),
            options: vec!["3".into(), "5".into(), "4".into(), "22".into()],
            correct_answer: 2,
            explanation: "Two pairs make four.".into(),
        }
        .validate(SlideId::new(9), fixed_now())
        .unwrap()
    }

    fn at(millis: i64) -> DateTime<Utc> {
        fixed_now() + Duration::milliseconds(millis)
    }

    #[test]
    fn submit_requires_selection() {
        let mut quiz = QuizMachine::new(&slide());
        assert!(!quiz.can_submit());
        assert_eq!(quiz.submit(at(0)), Err(QuizError::NoSelection));
        assert_eq!(quiz.phase(), QuizPhase::Unanswered);
    }

    #[test]
    fn reselect_overwrites_until_submitted() {
        let mut quiz = QuizMachine::new(&slide());
        quiz.select(0).unwrap();
        quiz.select(1).unwrap();
        assert_eq!(quiz.selected(), Some(1));
        assert_eq!(quiz.select(4), Err(QuizError::OptionOutOfRange { index: 4 }));

        quiz.submit(at(0)).unwrap();
        assert_eq!(quiz.select(2), Err(QuizError::AlreadySubmitted));
        assert_eq!(quiz.selected(), Some(1));
    }

    #[test]
    fn correct_answer_reveals_correct() {
        let mut quiz = QuizMachine::new(&slide());
        quiz.select(2).unwrap();
        let verdict = quiz.submit(at(0)).unwrap();
        assert!(verdict.correct);
        assert_eq!(quiz.phase(), QuizPhase::Revealed { correct: true });
        assert!(quiz.explanation_visible());
        assert_eq!(
            quiz.option_marks(),
            [
                OptionMark::Neutral,
                OptionMark::Neutral,
                OptionMark::Correct,
                OptionMark::Neutral
            ]
        );
    }

    #[test]
    fn wrong_answer_marks_both_options() {
        let mut quiz = QuizMachine::new(&slide());
        quiz.select(3).unwrap();
        assert_eq!(quiz.option_marks()[3], OptionMark::Selected);
        let verdict = quiz.submit(at(0)).unwrap();
        assert!(!verdict.correct);
        let marks = quiz.option_marks();
        assert_eq!(marks[2], OptionMark::Correct);
        assert_eq!(marks[3], OptionMark::Incorrect);
        assert_eq!(quiz.submit(at(1)), Err(QuizError::AlreadySubmitted));
    }

    #[test]
    fn answered_fires_once_after_delay() {
        let mut quiz = QuizMachine::new(&slide());
        quiz.select(2).unwrap();
        quiz.submit(at(0)).unwrap();
        assert_eq!(quiz.poll(at(2_999)), None);
        assert_eq!(quiz.poll(at(3_000)), Some(true));
        assert!(quiz.is_answered());
        assert_eq!(quiz.poll(at(10_000)), None);
    }
}
