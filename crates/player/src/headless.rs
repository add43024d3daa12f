//! In-process media backend with a manual clock.
//!
//! Nothing is decoded. Each handle tracks a position that moves only when
//! [`HeadlessBackend::advance`] is called, which makes it usable both for
//! tests and for a terminal preview. Clones share the same state so a caller
//! can keep one to inspect what the feed did with the other.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

use reel_core::model::Volume;
use tracing::trace;
use url::Url;

use crate::media::{
    EventSink, ListenerId, MediaBackend, MediaError, MediaEventKind, MediaHandle, MediaRequest,
    TrackRole,
};

/// Duration reported for sources without an explicit one.
pub const DEFAULT_DURATION_SECS: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LoadState {
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug)]
struct HandleState {
    role: TrackRole,
    source: Url,
    looping: bool,
    muted: bool,
    volume: Volume,
    duration: f64,
    position: f64,
    load: LoadState,
    playing: bool,
    wants_play: bool,
    listeners: Vec<(ListenerId, EventSink)>,
}

impl HandleState {
    fn emit(&self, kind: &MediaEventKind) {
        for (_, sink) in &self.listeners {
            sink.emit(kind.clone());
        }
    }

    fn start(&mut self, autoplay_blocked: bool) {
        if autoplay_blocked {
            self.playing = false;
            self.emit(&MediaEventKind::PlayRejected {
                reason: "autoplay blocked".to_owned(),
            });
            return;
        }
        if !self.playing {
            self.playing = true;
            self.emit(&MediaEventKind::Playing);
        }
    }

    fn tick(&mut self, dt: f64) {
        if !self.playing || dt <= 0.0 {
            return;
        }
        self.position += dt;
        if self.position < self.duration {
            self.emit(&MediaEventKind::TimeUpdate {
                position: self.position,
            });
            return;
        }
        if self.looping && self.duration > 0.0 {
            self.position %= self.duration;
            self.emit(&MediaEventKind::TimeUpdate {
                position: self.position,
            });
        } else {
            self.position = self.duration;
            self.playing = false;
            self.emit(&MediaEventKind::TimeUpdate {
                position: self.position,
            });
            self.emit(&MediaEventKind::Ended);
        }
    }
}

#[derive(Debug)]
struct State {
    next_handle: u64,
    next_listener: u64,
    handles: BTreeMap<u64, HandleState>,
    durations: HashMap<String, f64>,
    default_duration: f64,
    failing: HashSet<String>,
    unopenable: HashSet<String>,
    autoplay_blocked: bool,
    play_requests: usize,
}

#[derive(Clone, Debug)]
pub struct HeadlessBackend {
    state: Rc<RefCell<State>>,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::with_default_duration(DEFAULT_DURATION_SECS)
    }

    #[must_use]
    pub fn with_default_duration(seconds: f64) -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                next_handle: 1,
                next_listener: 1,
                handles: BTreeMap::new(),
                durations: HashMap::new(),
                default_duration: seconds,
                failing: HashSet::new(),
                unopenable: HashSet::new(),
                autoplay_blocked: false,
                play_requests: 0,
            })),
        }
    }

    /// Report `seconds` as the length of `source`.
    pub fn set_duration(&self, source: &str, seconds: f64) {
        self.state
            .borrow_mut()
            .durations
            .insert(source.to_owned(), seconds);
    }

    /// Make loads of `source` fail.
    pub fn fail_source(&self, source: &str) {
        self.state.borrow_mut().failing.insert(source.to_owned());
    }

    /// Make `open` refuse `source`.
    pub fn refuse_source(&self, source: &str) {
        self.state.borrow_mut().unopenable.insert(source.to_owned());
    }

    /// Refuse every start request while set, like a browser autoplay policy.
    pub fn block_autoplay(&self, blocked: bool) {
        self.state.borrow_mut().autoplay_blocked = blocked;
    }

    /// Move the clock forward by `seconds`.
    ///
    /// Pending loads complete first; handles that finish loading in this call
    /// do not also advance.
    pub fn advance(&self, seconds: f64) {
        let mut state = self.state.borrow_mut();
        let State {
            handles,
            failing,
            autoplay_blocked,
            ..
        } = &mut *state;
        for handle in handles.values_mut() {
            if handle.load == LoadState::Loading {
                if failing.contains(handle.source.as_str()) {
                    handle.load = LoadState::Failed;
                    handle.wants_play = false;
                    handle.emit(&MediaEventKind::LoadFailed {
                        reason: format!("could not fetch {}", handle.source),
                    });
                } else {
                    handle.load = LoadState::Ready;
                    handle.emit(&MediaEventKind::Loaded {
                        duration: handle.duration,
                    });
                    if std::mem::take(&mut handle.wants_play) {
                        handle.start(*autoplay_blocked);
                    }
                }
                continue;
            }
            handle.tick(seconds);
        }
    }

    /// Handles opened and not yet released.
    #[must_use]
    pub fn live_handles(&self) -> usize {
        self.state.borrow().handles.len()
    }

    /// Listeners attached across all live handles.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.state
            .borrow()
            .handles
            .values()
            .map(|handle| handle.listeners.len())
            .sum()
    }

    /// Total `play` calls received, including refused ones.
    #[must_use]
    pub fn play_requests(&self) -> usize {
        self.state.borrow().play_requests
    }

    #[must_use]
    pub fn volume_of(&self, role: TrackRole) -> Option<Volume> {
        self.find(role, |handle| handle.volume)
    }

    #[must_use]
    pub fn is_playing(&self, role: TrackRole) -> bool {
        self.find(role, |handle| handle.playing).unwrap_or(false)
    }

    #[must_use]
    pub fn is_muted(&self, role: TrackRole) -> Option<bool> {
        self.find(role, |handle| handle.muted)
    }

    #[must_use]
    pub fn position_of(&self, role: TrackRole) -> Option<f64> {
        self.find(role, |handle| handle.position)
    }

    fn find<T>(&self, role: TrackRole, read: impl Fn(&HandleState) -> T) -> Option<T> {
        self.state
            .borrow()
            .handles
            .values()
            .find(|handle| handle.role == role)
            .map(read)
    }
}

impl MediaBackend for HeadlessBackend {
    fn open(&mut self, request: MediaRequest<'_>) -> Result<Box<dyn MediaHandle>, MediaError> {
        let mut state = self.state.borrow_mut();
        if state.unopenable.contains(request.source.as_str()) {
            return Err(MediaError::Unsupported(request.source.to_string()));
        }
        let id = state.next_handle;
        state.next_handle += 1;
        let duration = state
            .durations
            .get(request.source.as_str())
            .copied()
            .unwrap_or(state.default_duration);
        state.handles.insert(
            id,
            HandleState {
                role: request.role,
                source: request.source.clone(),
                looping: request.looping,
                muted: request.muted,
                volume: Volume::FULL,
                duration,
                position: 0.0,
                load: LoadState::Idle,
                playing: false,
                wants_play: false,
                listeners: Vec::new(),
            },
        );
        trace!(handle = id, role = ?request.role, source = %request.source, "opened headless handle");
        Ok(Box::new(HeadlessHandle {
            id,
            state: Rc::clone(&self.state),
        }))
    }
}

struct HeadlessHandle {
    id: u64,
    state: Rc<RefCell<State>>,
}

impl HeadlessHandle {
    fn with<T>(&self, apply: impl FnOnce(&mut HandleState, bool) -> T) -> Option<T> {
        let mut state = self.state.borrow_mut();
        let blocked = state.autoplay_blocked;
        state
            .handles
            .get_mut(&self.id)
            .map(|handle| apply(handle, blocked))
    }
}

impl MediaHandle for HeadlessHandle {
    fn load(&mut self) {
        self.with(|handle, _| {
            if handle.load == LoadState::Idle {
                handle.load = LoadState::Loading;
            }
        });
    }

    fn play(&mut self) {
        self.state.borrow_mut().play_requests += 1;
        self.with(|handle, blocked| match handle.load {
            LoadState::Ready => handle.start(blocked),
            LoadState::Idle | LoadState::Loading => handle.wants_play = true,
            LoadState::Failed => handle.emit(&MediaEventKind::PlayRejected {
                reason: "source unavailable".to_owned(),
            }),
        });
    }

    fn pause(&mut self) {
        self.with(|handle, _| {
            handle.wants_play = false;
            if handle.playing {
                handle.playing = false;
                handle.emit(&MediaEventKind::Paused);
            }
        });
    }

    fn seek(&mut self, position: f64) {
        self.with(|handle, _| {
            handle.position = position.clamp(0.0, handle.duration.max(0.0));
            handle.emit(&MediaEventKind::TimeUpdate {
                position: handle.position,
            });
        });
    }

    fn set_volume(&mut self, volume: Volume) {
        self.with(|handle, _| handle.volume = volume);
    }

    fn subscribe(&mut self, sink: EventSink) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let listener = ListenerId(state.next_listener);
        state.next_listener += 1;
        if let Some(handle) = state.handles.get_mut(&self.id) {
            handle.listeners.push((listener, sink));
        }
        listener
    }

    fn unsubscribe(&mut self, listener: ListenerId) {
        self.with(|handle, _| handle.listeners.retain(|(id, _)| *id != listener));
    }

    fn release(&mut self) {
        if self.state.borrow_mut().handles.remove(&self.id).is_some() {
            trace!(handle = self.id, "released headless handle");
        }
    }
}
