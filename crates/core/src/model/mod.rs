mod ids;
mod preferences;
pub mod slide;

pub use ids::SlideId;
pub use preferences::{PlayerPreferences, PreferencesError, Volume};
pub use slide::{
    ContentDraft, ContentSlide, QUIZ_OPTION_COUNT, QuizDraft, QuizSlide, Slide, SlideError,
    SlideKind, SlideVideo,
};
