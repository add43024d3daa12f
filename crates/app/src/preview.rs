//! Terminal walk-through of a slide feed on the headless backend.

use player::{FeedConfig, FeedEvent, FeedInput, HeadlessBackend, SlideFeed, VolumeControl};
use reel_core::Clock;
use reel_core::time::to_chrono;
use reel_core::model::{PlayerPreferences, Slide};
use tracing::{debug, info};

pub struct PreviewOptions {
    pub step: std::time::Duration,
    pub narration_secs: f64,
    /// Stop after this many simulated seconds even if the feed never wraps.
    pub max_secs: i64,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            step: std::time::Duration::from_millis(250),
            narration_secs: 6.0,
            max_secs: 600,
        }
    }
}

/// Play `slides` once through and return how many slides were shown.
pub fn run(
    slides: Vec<Slide>,
    prefs: PlayerPreferences,
    options: &PreviewOptions,
) -> Result<u64, Box<dyn std::error::Error>> {
    let mut clock = Clock::fixed(chrono::Utc::now());
    let backend = HeadlessBackend::with_default_duration(options.narration_secs);
    let mut feed = SlideFeed::new(
        slides,
        backend.clone(),
        VolumeControl::new(prefs.volume),
        FeedConfig::default(),
        clock.now(),
    )?;
    info!(slides = feed.slides().len(), volume = prefs.volume.value(), "starting preview");

    let started = clock.now();
    let step = to_chrono(options.step);
    let step_secs = options.step.as_secs_f64();
    let mut last_caption: Option<String> = None;
    let mut views = 0;
    announce(&feed);

    while (clock.now() - started).num_seconds() < options.max_secs {
        if feed.quiz().is_some_and(|quiz| !quiz.explanation_visible()) {
            answer_quiz(&mut feed, clock.now())?;
        }

        clock.advance(step);
        backend.advance(step_secs);
        let mut wrapped = false;
        for event in feed.tick(clock.now()) {
            match event {
                FeedEvent::SlideChanged {
                    transition,
                    progress,
                } => {
                    debug!(?transition, "slide changed");
                    println!("── {:>3.0}% ──", progress.percent());
                    wrapped = transition.to == 0;
                    last_caption = None;
                    if !wrapped {
                        announce(&feed);
                    }
                }
                FeedEvent::QuizCompleted { correct } => {
                    println!("   quiz {}", if correct { "passed" } else { "missed" });
                }
                FeedEvent::PlaybackBlocked { reason } => println!("   (playback blocked: {reason})"),
                _ => {}
            }
        }
        views += feed.take_new_views();
        if wrapped {
            break;
        }

        let caption = feed.caption().map(str::to_owned);
        if caption.is_some() && caption != last_caption {
            if let Some(text) = &caption {
                println!("   » {text}");
            }
        }
        last_caption = caption;
    }

    Ok(views)
}

fn announce(feed: &SlideFeed<HeadlessBackend>) {
    let progress = feed.progress();
    match feed.current_slide() {
        Slide::Content(slide) => {
            let audio = if slide.is_silent() { " (silent)" } else { "" };
            println!("[{}/{}] {}{audio}", progress.index + 1, progress.total, slide.title());
        }
        Slide::Quiz(quiz) => {
            println!("[{}/{}] Quiz: {}", progress.index + 1, progress.total, quiz.question());
            for (index, option) in quiz.options().iter().enumerate() {
                println!("    {}. {option}", index + 1);
            }
        }
    }
}

/// The preview always picks the right answer.
fn answer_quiz(
    feed: &mut SlideFeed<HeadlessBackend>,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(quiz) = feed.current_slide().as_quiz() else {
        return Ok(());
    };
    let answer = quiz.correct_answer();
    let explanation = quiz.explanation().to_owned();
    feed.handle(FeedInput::SelectOption(answer), now)?;
    feed.handle(FeedInput::SubmitAnswer, now)?;
    println!("   answered {}: {explanation}", answer + 1);
    Ok(())
}
