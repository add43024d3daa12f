//! The slide feed: one navigation controller, one mounted slide.
//!
//! Input arrives through [`SlideFeed::handle`]; timers and media
//! notifications are processed by [`SlideFeed::tick`]. Both take the current
//! time from the caller so a fixed clock drives the whole feed in tests.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use reel_core::input::{Key, KeyCommand, command_for_key};
use reel_core::model::{Slide, SlideId, Volume};
use reel_core::navigation::{
    NavTrigger, NavigationConfig, NavigationController, Progress, Transition, TransitionRejected,
};
use reel_core::quiz::{QUIZ_REVEAL_MS, QuizMachine, QuizVerdict};
use thiserror::Error;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, info, trace};

use crate::media::{MediaBackend, MediaEvent, SessionId};
use crate::session::{PlaybackSession, SessionSignal};
use crate::volume::VolumeControl;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeedConfig {
    pub navigation: NavigationConfig,
    /// How long a revealed quiz stays up before the feed moves on.
    pub quiz_reveal: Duration,
    /// Start playback as soon as a content slide mounts.
    pub autoplay: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            navigation: NavigationConfig::default(),
            quiz_reveal: Duration::milliseconds(QUIZ_REVEAL_MS),
            autoplay: true,
        }
    }
}

/// User input the feed understands.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FeedInput {
    /// Net vertical displacement of a finished drag, in pixels.
    DragEnd { delta_y: f64 },
    Next,
    Previous,
    /// Position indicator click.
    JumpTo(usize),
    Key(Key),
    TogglePlayback,
    SelectOption(usize),
    SubmitAnswer,
}

/// Observable outcome of input or a tick.
#[derive(Clone, Debug, PartialEq)]
pub enum FeedEvent {
    SlideChanged {
        transition: Transition,
        progress: Progress,
    },
    /// A navigation request was ignored. Not meant for display.
    NavigationRejected(TransitionRejected),
    /// Playback was refused and needs a manual retry.
    PlaybackBlocked { reason: String },
    PlaybackToggled { playing: bool },
    QuizSubmitted(QuizVerdict),
    /// The reveal delay ran out; the feed advances next.
    QuizCompleted { correct: bool },
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FeedError {
    #[error(transparent)]
    Core(#[from] reel_core::Error),
    #[error("slide {0} is not a quiz")]
    NotAQuiz(SlideId),
}

enum Mounted {
    Content(PlaybackSession),
    Quiz(QuizMachine),
}

pub struct SlideFeed<B: MediaBackend> {
    slides: Arc<[Slide]>,
    navigation: NavigationController,
    backend: B,
    mounted: Option<Mounted>,
    events_tx: UnboundedSender<MediaEvent>,
    events_rx: UnboundedReceiver<MediaEvent>,
    volume: VolumeControl,
    config: FeedConfig,
    next_session: u64,
    /// Automatic advance that hit the transition lock; retried on tick.
    pending_advance: Option<NavTrigger>,
    new_views: u64,
}

impl<B: MediaBackend> SlideFeed<B> {
    /// Build a feed positioned on the first slide and mount it.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::Core` when `slides` is empty.
    pub fn new(
        slides: impl Into<Arc<[Slide]>>,
        backend: B,
        volume: VolumeControl,
        config: FeedConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, FeedError> {
        let slides = slides.into();
        let navigation = NavigationController::new(slides.len(), config.navigation, now)
            .map_err(reel_core::Error::from)?;
        let (events_tx, events_rx) = unbounded_channel();
        let mut feed = Self {
            slides,
            navigation,
            backend,
            mounted: None,
            events_tx,
            events_rx,
            volume,
            config,
            next_session: 1,
            pending_advance: None,
            new_views: 0,
        };
        feed.mount(0);
        info!(slides = feed.slides.len(), "slide feed ready");
        Ok(feed)
    }

    // ─── Accessors ─────────────────────────────────────────────────────────

    #[must_use]
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.navigation.current_index()
    }

    #[must_use]
    pub fn current_slide(&self) -> &Slide {
        &self.slides[self.navigation.current_index()]
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        self.navigation.progress()
    }

    #[must_use]
    pub fn navigation(&self) -> &NavigationController {
        &self.navigation
    }

    #[must_use]
    pub fn session(&self) -> Option<&PlaybackSession> {
        match &self.mounted {
            Some(Mounted::Content(session)) => Some(session),
            _ => None,
        }
    }

    #[must_use]
    pub fn quiz(&self) -> Option<&QuizMachine> {
        match &self.mounted {
            Some(Mounted::Quiz(quiz)) => Some(quiz),
            _ => None,
        }
    }

    /// Caption for the mounted content slide, if one is showing.
    #[must_use]
    pub fn caption(&self) -> Option<&str> {
        self.session().and_then(PlaybackSession::caption)
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.session().is_some_and(PlaybackSession::is_playing)
    }

    #[must_use]
    pub fn volume(&self) -> Volume {
        self.volume.current()
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Slides mounted since the last call, counting the initial one.
    pub fn take_new_views(&mut self) -> u64 {
        std::mem::take(&mut self.new_views)
    }

    // ─── Input ─────────────────────────────────────────────────────────────

    /// Change the narration volume for this and every later slide.
    pub fn set_volume(&mut self, volume: Volume) {
        self.volume.set(volume);
        if let Some(Mounted::Content(session)) = self.mounted.as_mut() {
            session.sync_volume();
        }
    }

    /// Apply one user input.
    ///
    /// # Errors
    ///
    /// Returns `FeedError` for quiz input that does not fit the mounted slide
    /// or its current phase. Navigation requests never fail; rejections are
    /// reported as `FeedEvent::NavigationRejected`.
    pub fn handle(&mut self, input: FeedInput, now: DateTime<Utc>) -> Result<Vec<FeedEvent>, FeedError> {
        let event = match input {
            FeedInput::DragEnd { delta_y } => {
                let result = self.navigation.drag_end(delta_y, now);
                self.settle(result)
            }
            FeedInput::Next => {
                let result = self.navigation.next(NavTrigger::Control, now);
                self.settle(result)
            }
            FeedInput::Previous => {
                let result = self.navigation.previous(NavTrigger::Control, now);
                self.settle(result)
            }
            FeedInput::JumpTo(index) => {
                let result = self.navigation.jump_to(index, NavTrigger::Indicator, now);
                self.settle(result)
            }
            FeedInput::Key(key) => match command_for_key(key) {
                Some(command) => self.key_command(command, now),
                None => None,
            },
            FeedInput::TogglePlayback => self.toggle_playback(),
            FeedInput::SelectOption(index) => {
                self.quiz_mut()?
                    .select(index)
                    .map_err(reel_core::Error::from)?;
                None
            }
            FeedInput::SubmitAnswer => {
                let verdict = self
                    .quiz_mut()?
                    .submit(now)
                    .map_err(reel_core::Error::from)?;
                debug!(selected = verdict.selected, correct = verdict.correct, "quiz answered");
                Some(FeedEvent::QuizSubmitted(verdict))
            }
        };
        Ok(event.into_iter().collect())
    }

    fn key_command(&mut self, command: KeyCommand, now: DateTime<Utc>) -> Option<FeedEvent> {
        let last = self.slides.len() - 1;
        let result = match command {
            KeyCommand::Next => self.navigation.next(NavTrigger::Keyboard, now),
            KeyCommand::Previous => self.navigation.previous(NavTrigger::Keyboard, now),
            KeyCommand::First => self.navigation.jump_to(0, NavTrigger::Keyboard, now),
            KeyCommand::Last => self.navigation.jump_to(last, NavTrigger::Keyboard, now),
            KeyCommand::JumpTo(index) => self.navigation.jump_to(index, NavTrigger::Keyboard, now),
            KeyCommand::TogglePlayback => return self.toggle_playback(),
        };
        self.settle(result)
    }

    fn toggle_playback(&mut self) -> Option<FeedEvent> {
        let Some(Mounted::Content(session)) = self.mounted.as_mut() else {
            return None;
        };
        let was_playing = session.is_playing();
        session
            .toggle()
            .then_some(FeedEvent::PlaybackToggled {
                playing: !was_playing,
            })
    }

    fn quiz_mut(&mut self) -> Result<&mut QuizMachine, FeedError> {
        let id = self.current_slide().id();
        match self.mounted.as_mut() {
            Some(Mounted::Quiz(quiz)) => Ok(quiz),
            _ => Err(FeedError::NotAQuiz(id)),
        }
    }

    // ─── Timers and media ──────────────────────────────────────────────────

    /// Process media notifications and due timers.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<FeedEvent> {
        let mut events = Vec::new();

        while let Ok(event) = self.events_rx.try_recv() {
            let signal = match self.mounted.as_mut() {
                Some(Mounted::Content(session)) if session.id() == event.session => {
                    session.handle_event(&event)
                }
                _ => {
                    trace!(session = %event.session, role = ?event.role, "dropping stale media event");
                    continue;
                }
            };
            match signal {
                Some(SessionSignal::NarrationEnded) => {
                    events.extend(self.auto_advance(NavTrigger::NarrationEnded, now));
                }
                Some(SessionSignal::PlaybackBlocked { reason, .. }) => {
                    events.push(FeedEvent::PlaybackBlocked { reason });
                }
                None => {}
            }
        }

        if let Some(Mounted::Content(session)) = self.mounted.as_mut() {
            session.sync_volume();
        }

        let answered = match self.mounted.as_mut() {
            Some(Mounted::Quiz(quiz)) => quiz.poll(now),
            _ => None,
        };
        if let Some(correct) = answered {
            events.push(FeedEvent::QuizCompleted { correct });
            events.extend(self.auto_advance(NavTrigger::QuizAnswered, now));
        }

        if let Some(trigger) = self.pending_advance.take() {
            events.extend(self.auto_advance(trigger, now));
        }

        if let Some(transition) = self.navigation.poll(now) {
            self.remount(transition.to);
            events.push(self.slide_changed(transition));
        }

        events
    }

    fn auto_advance(&mut self, trigger: NavTrigger, now: DateTime<Utc>) -> Option<FeedEvent> {
        match self.navigation.next(trigger, now) {
            Ok(transition) => {
                self.pending_advance = None;
                self.remount(transition.to);
                Some(self.slide_changed(transition))
            }
            Err(TransitionRejected::Locked) => {
                self.pending_advance = Some(trigger);
                None
            }
            Err(rejected) => {
                debug!(?trigger, %rejected, "automatic advance stopped");
                None
            }
        }
    }

    // ─── Mounting ──────────────────────────────────────────────────────────

    fn settle(&mut self, result: Result<Transition, TransitionRejected>) -> Option<FeedEvent> {
        match result {
            Ok(transition) => {
                // Manual navigation supersedes any queued automatic advance.
                self.pending_advance = None;
                self.remount(transition.to);
                Some(self.slide_changed(transition))
            }
            Err(rejected) => {
                trace!(%rejected, "navigation request ignored");
                Some(FeedEvent::NavigationRejected(rejected))
            }
        }
    }

    fn slide_changed(&self, transition: Transition) -> FeedEvent {
        FeedEvent::SlideChanged {
            transition,
            progress: self.navigation.progress(),
        }
    }

    fn remount(&mut self, index: usize) {
        // Release the outgoing slide before anything new is created.
        self.mounted = None;
        self.mount(index);
    }

    fn mount(&mut self, index: usize) {
        let Some(slide) = self.slides.get(index) else {
            return;
        };
        self.new_views += 1;
        self.mounted = Some(match slide {
            Slide::Content(content) => {
                let id = SessionId::new(self.next_session);
                self.next_session += 1;
                let mut session = PlaybackSession::attach(
                    id,
                    content,
                    &mut self.backend,
                    self.volume.subscribe(),
                    &self.events_tx,
                );
                if self.config.autoplay {
                    session.play();
                }
                Mounted::Content(session)
            }
            Slide::Quiz(quiz) => {
                Mounted::Quiz(QuizMachine::with_reveal_delay(quiz, self.config.quiz_reveal))
            }
        });
        debug!(index, slide = %slide.id(), kind = ?slide.kind(), "mounted slide");
    }
}
