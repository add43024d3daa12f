//! Caption phrases derived from narration text.
//!
//! Narration is split into fixed groups of words and each group is shown for
//! an equal share of the audio duration. Nothing here keeps state between
//! calls apart from the phrase list memoized by [`CaptionTrack`].

use std::str::SplitWhitespace;

/// Words shown together in one caption phrase.
pub const WORDS_PER_PHRASE: usize = 4;

/// Lazily split narration text into phrases of [`WORDS_PER_PHRASE`] words.
///
/// Whitespace-only input yields an empty sequence.
#[must_use]
pub fn segment(text: &str) -> Phrases<'_> {
    Phrases {
        words: text.split_whitespace(),
    }
}

/// Iterator returned by [`segment`].
#[derive(Debug, Clone)]
pub struct Phrases<'a> {
    words: SplitWhitespace<'a>,
}

impl Iterator for Phrases<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let mut phrase = String::new();
        for word in self.words.by_ref().take(WORDS_PER_PHRASE) {
            if !phrase.is_empty() {
                phrase.push(' ');
            }
            phrase.push_str(word);
        }
        (!phrase.is_empty()).then_some(phrase)
    }
}

/// Phrase visible at `current_time` seconds into audio lasting `duration` seconds.
///
/// Returns `None` when there are no phrases, the duration is unknown
/// (non-finite or not positive), the time is negative, or the time lies past
/// the last phrase.
#[must_use]
pub fn current_phrase<S: AsRef<str>>(
    phrases: &[S],
    duration: f64,
    current_time: f64,
) -> Option<&str> {
    if phrases.is_empty() || !duration.is_finite() || duration <= 0.0 {
        return None;
    }
    if !current_time.is_finite() || current_time < 0.0 {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let time_per_phrase = duration / phrases.len() as f64;
    let index = (current_time / time_per_phrase).floor();

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let index = index as usize;
    phrases.get(index).map(AsRef::as_ref)
}

/// Memoized phrases for one slide's narration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptionTrack {
    phrases: Vec<String>,
}

impl CaptionTrack {
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            phrases: segment(text).collect(),
        }
    }

    #[must_use]
    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    #[must_use]
    pub fn phrase_at(&self, duration: f64, current_time: f64) -> Option<&str> {
        current_phrase(&self.phrases, duration, current_time)
    }

    /// Phrase to render right now; captions are hidden while narration is paused.
    #[must_use]
    pub fn visible(&self, duration: f64, current_time: f64, playing: bool) -> Option<&str> {
        if !playing {
            return None;
        }
        self.phrase_at(duration, current_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "The mitochondria is the powerhouse of the cell. It makes energy!";

    #[test]
    fn segments_into_four_word_groups() {
        let phrases: Vec<String> = segment(TEXT).collect();
        assert_eq!(
            phrases,
            vec![
                "The mitochondria is the",
                "powerhouse of the cell.",
                "It makes energy!",
            ]
        );
    }

    #[test]
    fn blank_text_has_no_phrases() {
        assert_eq!(segment("   \n\t ").count(), 0);
        assert!(CaptionTrack::new("").is_empty());
    }

    #[test]
    fn collapses_irregular_whitespace() {
        let phrases: Vec<String> = segment("  one\n\ntwo   three\tfour five ").collect();
        assert_eq!(phrases, vec!["one two three four", "five"]);
    }

    #[test]
    fn picks_phrase_by_equal_time_share() {
        let track = CaptionTrack::new(TEXT);
        assert_eq!(track.phrase_at(9.0, 0.0), Some("The mitochondria is the"));
        assert_eq!(track.phrase_at(9.0, 3.0), Some("powerhouse of the cell."));
        assert_eq!(track.phrase_at(9.0, 8.99), Some("It makes energy!"));
        assert_eq!(track.phrase_at(9.0, 9.0), None);
    }

    #[test]
    fn unknown_duration_or_bad_time_yields_none() {
        let track = CaptionTrack::new(TEXT);
        assert_eq!(track.phrase_at(f64::NAN, 1.0), None);
        assert_eq!(track.phrase_at(0.0, 1.0), None);
        assert_eq!(track.phrase_at(9.0, -1.0), None);
        assert_eq!(current_phrase::<String>(&[], 9.0, 1.0), None);
    }

    #[test]
    fn lookup_is_idempotent() {
        let track = CaptionTrack::new(TEXT);
        let first = track.phrase_at(9.0, 4.5).map(str::to_owned);
        let second = track.phrase_at(9.0, 4.5).map(str::to_owned);
        assert_eq!(first, second);
    }

    #[test]
    fn hidden_while_paused() {
        let track = CaptionTrack::new(TEXT);
        assert_eq!(track.visible(9.0, 1.0, false), None);
        assert!(track.visible(9.0, 1.0, true).is_some());
    }
}
