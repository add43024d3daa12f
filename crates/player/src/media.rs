//! Boundary between the feed and whatever actually decodes audio and video.
//!
//! Handles are fire-and-forget: `load`, `play` and `pause` return at once and
//! report their outcome later as [`MediaEvent`]s pushed through the
//! [`EventSink`] registered with `subscribe`.

use std::fmt;

use reel_core::model::Volume;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use url::Url;

/// Identifies one playback session. Never reused within a feed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which element of a slide a handle backs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackRole {
    Narration,
    Foreground,
    Backdrop,
}

impl TrackRole {
    #[must_use]
    pub fn is_video(self) -> bool {
        !matches!(self, TrackRole::Narration)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MediaEventKind {
    /// Enough data is available to start; duration in seconds.
    Loaded { duration: f64 },
    LoadFailed { reason: String },
    TimeUpdate { position: f64 },
    Playing,
    Paused,
    /// A start request was refused, typically by autoplay policy.
    PlayRejected { reason: String },
    Ended,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MediaEvent {
    pub session: SessionId,
    pub role: TrackRole,
    pub kind: MediaEventKind,
}

/// Token returned by `subscribe`, used to detach the same listener later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Sender half given to a handle, pre-tagged with session and role.
#[derive(Clone, Debug)]
pub struct EventSink {
    session: SessionId,
    role: TrackRole,
    tx: UnboundedSender<MediaEvent>,
}

impl EventSink {
    #[must_use]
    pub fn new(session: SessionId, role: TrackRole, tx: UnboundedSender<MediaEvent>) -> Self {
        Self { session, role, tx }
    }

    #[must_use]
    pub fn session(&self) -> SessionId {
        self.session
    }

    #[must_use]
    pub fn role(&self) -> TrackRole {
        self.role
    }

    /// Push an event. Returns false once the feed has gone away.
    pub fn emit(&self, kind: MediaEventKind) -> bool {
        self.tx
            .send(MediaEvent {
                session: self.session,
                role: self.role,
                kind,
            })
            .is_ok()
    }
}

/// What to open for a slide element.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaRequest<'a> {
    pub role: TrackRole,
    pub source: &'a Url,
    pub looping: bool,
    pub muted: bool,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MediaError {
    #[error("unsupported media source: {0}")]
    Unsupported(String),
}

/// One live audio or video element.
pub trait MediaHandle {
    /// Begin fetching; completion arrives as `Loaded` or `LoadFailed`.
    fn load(&mut self);
    /// Request playback; outcome arrives as `Playing` or `PlayRejected`.
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, position: f64);
    fn set_volume(&mut self, volume: Volume);
    fn subscribe(&mut self, sink: EventSink) -> ListenerId;
    fn unsubscribe(&mut self, listener: ListenerId);
    /// Drop the underlying resource. The handle must not emit afterwards.
    fn release(&mut self);
}

/// Factory for media handles.
pub trait MediaBackend {
    /// Open a handle for `request`.
    ///
    /// # Errors
    ///
    /// Returns `MediaError` when the backend cannot create the element.
    fn open(&mut self, request: MediaRequest<'_>) -> Result<Box<dyn MediaHandle>, MediaError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn sink_tags_events_and_detects_closed_feed() {
        let (tx, mut rx) = unbounded_channel();
        let sink = EventSink::new(SessionId::new(3), TrackRole::Narration, tx);
        assert!(sink.emit(MediaEventKind::Playing));

        let event = rx.try_recv().unwrap();
        assert_eq!(event.session, SessionId::new(3));
        assert_eq!(event.role, TrackRole::Narration);
        assert_eq!(event.kind, MediaEventKind::Playing);

        drop(rx);
        assert!(!sink.emit(MediaEventKind::Paused));
    }

    #[test]
    fn only_narration_is_audio() {
        assert!(!TrackRole::Narration.is_video());
        assert!(TrackRole::Foreground.is_video());
        assert!(TrackRole::Backdrop.is_video());
    }
}
