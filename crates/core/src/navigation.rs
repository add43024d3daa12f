//! Slide index state machine.
//!
//! The controller is the only owner of the current index. Every accepted
//! transition engages a short transition lock, and every index change pushes
//! the idle-advance deadline forward. Timers are deadlines compared against
//! the `now` passed by the caller; [`NavigationController::poll`] fires them.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// Minimum vertical drag distance that counts as a swipe.
pub const SWIPE_THRESHOLD: f64 = 50.0;

/// Length of the slide enter/exit animation.
pub const TRANSITION_SETTLE_MS: i64 = 300;

/// Inactivity window before the feed advances on its own.
pub const IDLE_ADVANCE_SECS: i64 = 60;

/// What a "next" request does on the last slide.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EndPolicy {
    /// Loop back to the first slide.
    #[default]
    Wrap,
    /// Stay on the last slide.
    Clamp,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NavigationConfig {
    pub swipe_threshold: f64,
    pub settle: Duration,
    /// `None` disables idle advance.
    pub idle_timeout: Option<Duration>,
    pub end_policy: EndPolicy,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            swipe_threshold: SWIPE_THRESHOLD,
            settle: Duration::milliseconds(TRANSITION_SETTLE_MS),
            idle_timeout: Some(Duration::seconds(IDLE_ADVANCE_SECS)),
            end_policy: EndPolicy::default(),
        }
    }
}

/// Animation hint for the incoming slide. Has no behavioral effect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    #[default]
    None,
}

/// Where a navigation request came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavTrigger {
    Gesture,
    Keyboard,
    Control,
    Indicator,
    IdleTimeout,
    NarrationEnded,
    QuizAnswered,
}

/// An accepted index change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub from: usize,
    pub to: usize,
    pub direction: Direction,
    pub trigger: NavTrigger,
}

/// Why a request did not move the feed. Never shown to the user.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub enum TransitionRejected {
    #[error("a transition is still settling")]
    Locked,
    #[error("drag of {delta_y} did not reach the swipe threshold")]
    BelowThreshold { delta_y: f64 },
    #[error("already at the {edge:?} edge of the feed")]
    AtBoundary { edge: Edge },
    #[error("index {index} is outside a feed of {len} slides")]
    OutOfRange { index: usize, len: usize },
    #[error("slide {index} is already current")]
    SameIndex { index: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    First,
    Last,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum NavigationError {
    #[error("cannot navigate an empty feed")]
    NoSlides,
}

/// Progress through the feed after an index change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Progress {
    pub index: usize,
    pub total: usize,
}

impl Progress {
    /// Percentage of the feed reached, counting the current slide as seen.
    #[must_use]
    pub fn percent(self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = (self.index + 1) as f64 / self.total as f64;
        ratio * 100.0
    }
}

#[derive(Clone, Debug)]
pub struct NavigationController {
    config: NavigationConfig,
    slide_count: usize,
    current: usize,
    direction: Direction,
    is_transitioning: bool,
    settle_at: Option<DateTime<Utc>>,
    idle_deadline: Option<DateTime<Utc>>,
}

impl NavigationController {
    /// Start at the first slide.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::NoSlides` when `slide_count` is zero.
    pub fn new(
        slide_count: usize,
        config: NavigationConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, NavigationError> {
        if slide_count == 0 {
            return Err(NavigationError::NoSlides);
        }
        Ok(Self {
            config,
            slide_count,
            current: 0,
            direction: Direction::None,
            is_transitioning: false,
            settle_at: None,
            idle_deadline: config.idle_timeout.map(|timeout| now + timeout),
        })
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn slide_count(&self) -> usize {
        self.slide_count
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.is_transitioning
    }

    #[must_use]
    pub fn idle_deadline(&self) -> Option<DateTime<Utc>> {
        self.idle_deadline
    }

    #[must_use]
    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress {
            index: self.current,
            total: self.slide_count,
        }
    }

    /// Interpret the net vertical displacement of a finished drag.
    ///
    /// Upward drags (negative `delta_y`) move forward; downward drags move back.
    /// Swipes never wrap past either end.
    ///
    /// # Errors
    ///
    /// Returns `TransitionRejected` when locked, below threshold, or at an edge.
    pub fn drag_end(
        &mut self,
        delta_y: f64,
        now: DateTime<Utc>,
    ) -> Result<Transition, TransitionRejected> {
        self.check_unlocked(now)?;
        if !delta_y.is_finite() || delta_y.abs() < self.config.swipe_threshold {
            return Err(TransitionRejected::BelowThreshold { delta_y });
        }

        if delta_y < 0.0 {
            if self.current + 1 >= self.slide_count {
                return Err(TransitionRejected::AtBoundary { edge: Edge::Last });
            }
            Ok(self.accept(self.current + 1, NavTrigger::Gesture, now))
        } else {
            if self.current == 0 {
                return Err(TransitionRejected::AtBoundary { edge: Edge::First });
            }
            Ok(self.accept(self.current - 1, NavTrigger::Gesture, now))
        }
    }

    /// Advance one slide, applying the end policy on the last slide.
    ///
    /// # Errors
    ///
    /// Returns `TransitionRejected::Locked` while settling, or `AtBoundary`
    /// on the last slide under `EndPolicy::Clamp` (or a single-slide feed).
    pub fn next(
        &mut self,
        trigger: NavTrigger,
        now: DateTime<Utc>,
    ) -> Result<Transition, TransitionRejected> {
        self.check_unlocked(now)?;
        let target = if self.current + 1 < self.slide_count {
            self.current + 1
        } else {
            match self.config.end_policy {
                EndPolicy::Wrap if self.slide_count > 1 => 0,
                EndPolicy::Wrap | EndPolicy::Clamp => {
                    return Err(TransitionRejected::AtBoundary { edge: Edge::Last });
                }
            }
        };
        let transition = self.accept(target, trigger, now);
        // Wrapping restarts the feed but is still forward motion.
        self.direction = Direction::Forward;
        Ok(Transition {
            direction: Direction::Forward,
            ..transition
        })
    }

    /// Step back one slide.
    ///
    /// # Errors
    ///
    /// Returns `TransitionRejected` while settling or on the first slide.
    pub fn previous(
        &mut self,
        trigger: NavTrigger,
        now: DateTime<Utc>,
    ) -> Result<Transition, TransitionRejected> {
        self.check_unlocked(now)?;
        if self.current == 0 {
            return Err(TransitionRejected::AtBoundary { edge: Edge::First });
        }
        Ok(self.accept(self.current - 1, trigger, now))
    }

    /// Jump straight to `index`.
    ///
    /// # Errors
    ///
    /// Returns `TransitionRejected` while settling, for an invalid index, or
    /// when `index` is already current.
    pub fn jump_to(
        &mut self,
        index: usize,
        trigger: NavTrigger,
        now: DateTime<Utc>,
    ) -> Result<Transition, TransitionRejected> {
        self.check_unlocked(now)?;
        if index >= self.slide_count {
            return Err(TransitionRejected::OutOfRange {
                index,
                len: self.slide_count,
            });
        }
        if index == self.current {
            return Err(TransitionRejected::SameIndex { index });
        }
        Ok(self.accept(index, trigger, now))
    }

    /// Fire due timers: release the transition lock and run idle advance.
    ///
    /// Returns the transition performed by an idle advance, if any.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<Transition> {
        self.release_lock_if_settled(now);

        let deadline = self.idle_deadline?;
        if now < deadline {
            return None;
        }
        match self.next(NavTrigger::IdleTimeout, now) {
            Ok(transition) => Some(transition),
            Err(TransitionRejected::AtBoundary { .. }) => {
                // Nothing left to advance to; stop the timer until the index changes.
                self.idle_deadline = None;
                None
            }
            Err(_) => None,
        }
    }

    fn check_unlocked(&mut self, now: DateTime<Utc>) -> Result<(), TransitionRejected> {
        self.release_lock_if_settled(now);
        if self.is_transitioning {
            return Err(TransitionRejected::Locked);
        }
        Ok(())
    }

    fn release_lock_if_settled(&mut self, now: DateTime<Utc>) {
        if let Some(settle_at) = self.settle_at {
            if now >= settle_at {
                self.is_transitioning = false;
                self.settle_at = None;
            }
        }
    }

    fn accept(&mut self, to: usize, trigger: NavTrigger, now: DateTime<Utc>) -> Transition {
        let from = self.current;
        let direction = if to > from {
            Direction::Forward
        } else {
            Direction::Backward
        };

        self.current = to;
        self.direction = direction;
        self.is_transitioning = true;
        self.settle_at = Some(now + self.config.settle);
        self.idle_deadline = self.config.idle_timeout.map(|timeout| now + timeout);

        Transition {
            from,
            to,
            direction,
            trigger,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn controller(count: usize) -> NavigationController {
        NavigationController::new(count, NavigationConfig::default(), fixed_now()).unwrap()
    }

    fn ms(millis: i64) -> DateTime<Utc> {
        fixed_now() + Duration::milliseconds(millis)
    }

    #[test]
    fn empty_feed_is_rejected() {
        let err = NavigationController::new(0, NavigationConfig::default(), fixed_now());
        assert_eq!(err.unwrap_err(), NavigationError::NoSlides);
    }

    #[test]
    fn small_drags_snap_back() {
        let mut nav = controller(3);
        for delta in [-49.9, 0.0, 49.9, f64::NAN] {
            assert!(nav.drag_end(delta, ms(0)).is_err());
            assert_eq!(nav.current_index(), 0);
        }
        assert!(!nav.is_transitioning());
    }

    #[test]
    fn upward_swipe_advances_and_downward_retreats() {
        let mut nav = controller(3);
        let transition = nav.drag_end(-50.0, ms(0)).unwrap();
        assert_eq!((transition.from, transition.to), (0, 1));
        assert_eq!(transition.direction, Direction::Forward);

        let transition = nav.drag_end(80.0, ms(400)).unwrap();
        assert_eq!((transition.from, transition.to), (1, 0));
        assert_eq!(nav.direction(), Direction::Backward);
    }

    #[test]
    fn swipes_do_not_wrap() {
        let mut nav = controller(2);
        assert_eq!(
            nav.drag_end(60.0, ms(0)),
            Err(TransitionRejected::AtBoundary { edge: Edge::First })
        );
        nav.drag_end(-60.0, ms(0)).unwrap();
        assert_eq!(
            nav.drag_end(-60.0, ms(1_000)),
            Err(TransitionRejected::AtBoundary { edge: Edge::Last })
        );
    }

    #[test]
    fn lock_blocks_rapid_inputs_until_settled() {
        let mut nav = controller(5);
        nav.next(NavTrigger::Control, ms(0)).unwrap();
        assert!(nav.is_transitioning());
        assert_eq!(
            nav.next(NavTrigger::Control, ms(100)),
            Err(TransitionRejected::Locked)
        );
        assert_eq!(nav.drag_end(-200.0, ms(299)), Err(TransitionRejected::Locked));
        assert_eq!(nav.current_index(), 1);

        assert!(nav.poll(ms(300)).is_none());
        assert!(!nav.is_transitioning());
        nav.next(NavTrigger::Control, ms(300)).unwrap();
        assert_eq!(nav.current_index(), 2);
    }

    #[test]
    fn next_wraps_on_last_slide_by_default() {
        let mut nav = controller(2);
        nav.next(NavTrigger::Control, ms(0)).unwrap();
        let transition = nav.next(NavTrigger::QuizAnswered, ms(500)).unwrap();
        assert_eq!((transition.from, transition.to), (1, 0));
        assert_eq!(transition.direction, Direction::Forward);
    }

    #[test]
    fn next_clamps_when_configured() {
        let config = NavigationConfig {
            end_policy: EndPolicy::Clamp,
            ..NavigationConfig::default()
        };
        let mut nav = NavigationController::new(2, config, fixed_now()).unwrap();
        nav.next(NavTrigger::Control, ms(0)).unwrap();
        assert_eq!(
            nav.next(NavTrigger::Control, ms(500)),
            Err(TransitionRejected::AtBoundary { edge: Edge::Last })
        );
        assert_eq!(nav.current_index(), 1);
    }

    #[test]
    fn jump_sets_direction_and_validates_index() {
        let mut nav = controller(4);
        let transition = nav.jump_to(3, NavTrigger::Indicator, ms(0)).unwrap();
        assert_eq!(transition.direction, Direction::Forward);
        assert!(matches!(
            nav.jump_to(9, NavTrigger::Indicator, ms(400)),
            Err(TransitionRejected::OutOfRange { index: 9, len: 4 })
        ));
        assert!(matches!(
            nav.jump_to(3, NavTrigger::Indicator, ms(400)),
            Err(TransitionRejected::SameIndex { index: 3 })
        ));
        nav.jump_to(1, NavTrigger::Indicator, ms(400)).unwrap();
        assert_eq!(nav.direction(), Direction::Backward);
    }

    #[test]
    fn idle_timeout_advances_and_resets_on_change() {
        let mut nav = controller(3);
        assert!(nav.poll(ms(59_999)).is_none());
        let transition = nav.poll(ms(60_000)).unwrap();
        assert_eq!(transition.to, 1);
        assert_eq!(transition.trigger, NavTrigger::IdleTimeout);

        // Manual change at 70s pushes the deadline to 130s.
        nav.next(NavTrigger::Control, ms(70_000)).unwrap();
        assert!(nav.poll(ms(120_000)).is_none());
        assert_eq!(nav.poll(ms(130_000)).unwrap().to, 0);
    }

    #[test]
    fn idle_timeout_stops_at_clamped_end() {
        let config = NavigationConfig {
            end_policy: EndPolicy::Clamp,
            ..NavigationConfig::default()
        };
        let mut nav = NavigationController::new(1, config, fixed_now()).unwrap();
        assert!(nav.poll(ms(61_000)).is_none());
        assert!(nav.idle_deadline().is_none());
    }

    #[test]
    fn progress_counts_current_slide() {
        let mut nav = controller(4);
        assert_eq!(nav.progress().percent(), 25.0);
        nav.jump_to(3, NavTrigger::Indicator, ms(0)).unwrap();
        assert_eq!(nav.progress().percent(), 100.0);
    }
}
