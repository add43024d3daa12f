//! Media bundle backing one content slide.
//!
//! A `PlaybackSession` owns every handle and listener it registered in
//! [`PlaybackSession::attach`] and gives all of them back in
//! [`PlaybackSession::dispose`] (also run on drop). Playing state follows the
//! narration track; videos loop underneath it.

use reel_core::captions::CaptionTrack;
use reel_core::model::{ContentSlide, SlideId, Volume};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};
use url::Url;

use crate::media::{
    EventSink, ListenerId, MediaBackend, MediaEvent, MediaEventKind, MediaHandle, MediaRequest,
    SessionId, TrackRole,
};
use crate::volume::VolumeSubscription;

/// Something the feed has to react to.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionSignal {
    /// Narration finished; the feed advances.
    NarrationEnded,
    /// A start request was refused; playback needs a manual retry.
    PlaybackBlocked { role: TrackRole, reason: String },
}

struct Track {
    role: TrackRole,
    handle: Box<dyn MediaHandle>,
    listener: ListenerId,
    loaded: bool,
    playing: bool,
}

impl Track {
    fn open(
        backend: &mut dyn MediaBackend,
        request: MediaRequest<'_>,
        sink: EventSink,
    ) -> Option<Self> {
        let role = request.role;
        let source = request.source.clone();
        match backend.open(request) {
            Ok(mut handle) => {
                let listener = handle.subscribe(sink);
                Some(Self {
                    role,
                    handle,
                    listener,
                    loaded: false,
                    playing: false,
                })
            }
            Err(err) => {
                warn!(?role, %source, error = %err, "could not open media element");
                None
            }
        }
    }

    fn release(mut self) {
        self.handle.pause();
        self.handle.unsubscribe(self.listener);
        self.handle.release();
    }
}

pub struct PlaybackSession {
    id: SessionId,
    slide_id: SlideId,
    narration: Option<Track>,
    videos: Vec<Track>,
    captions: CaptionTrack,
    volume: VolumeSubscription,
    duration: Option<f64>,
    position: f64,
    play_pending: bool,
    ended: bool,
    disposed: bool,
}

impl PlaybackSession {
    /// Create handles for `slide`, wire their listeners and start loading.
    ///
    /// Elements the backend cannot open are skipped; a slide whose narration
    /// cannot be opened plays as a silent slide.
    pub fn attach(
        id: SessionId,
        slide: &ContentSlide,
        backend: &mut dyn MediaBackend,
        volume: VolumeSubscription,
        events: &UnboundedSender<MediaEvent>,
    ) -> Self {
        let sink = |role| EventSink::new(id, role, events.clone());

        let narration = slide.voiceover_url().and_then(|source| {
            let request = MediaRequest {
                role: TrackRole::Narration,
                source,
                looping: false,
                muted: false,
            };
            Track::open(backend, request, sink(TrackRole::Narration))
        });

        let mut videos = Vec::new();
        if let Some(video) = slide.video() {
            let mut roles = vec![TrackRole::Foreground];
            if video.blurred_backdrop {
                roles.push(TrackRole::Backdrop);
            }
            for role in roles {
                let request = video_request(role, &video.src);
                if let Some(track) = Track::open(backend, request, sink(role)) {
                    videos.push(track);
                }
            }
        }

        let mut session = Self {
            id,
            slide_id: slide.id(),
            narration,
            videos,
            captions: CaptionTrack::new(&slide.narration_script()),
            volume,
            duration: None,
            position: 0.0,
            play_pending: false,
            ended: false,
            disposed: false,
        };

        let initial = session.volume.current();
        if let Some(track) = session.narration.as_mut() {
            track.handle.set_volume(initial);
        }
        for track in session.tracks_mut() {
            track.handle.load();
        }

        debug!(
            session = %id,
            slide = %session.slide_id,
            narrated = session.narration.is_some(),
            videos = session.videos.len(),
            "attached playback session"
        );
        session
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn slide_id(&self) -> SlideId {
        self.slide_id
    }

    #[must_use]
    pub fn has_narration(&self) -> bool {
        self.narration.is_some()
    }

    /// True once narration can start. Silent slides are always ready.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.narration.as_ref().is_none_or(|track| track.loaded)
    }

    /// Playing state of the narration, or of the foreground video on a silent slide.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        match &self.narration {
            Some(track) => track.playing,
            None => self
                .videos
                .iter()
                .find(|track| track.role == TrackRole::Foreground)
                .is_some_and(|track| track.playing),
        }
    }

    #[must_use]
    pub fn is_play_pending(&self) -> bool {
        self.play_pending
    }

    #[must_use]
    pub fn has_ended(&self) -> bool {
        self.ended
    }

    #[must_use]
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    #[must_use]
    pub fn position(&self) -> f64 {
        self.position
    }

    #[must_use]
    pub fn captions(&self) -> &CaptionTrack {
        &self.captions
    }

    /// Caption phrase for the current narration position.
    #[must_use]
    pub fn caption(&self) -> Option<&str> {
        let duration = self.duration?;
        self.captions
            .visible(duration, self.position, self.is_playing())
    }

    /// Start every track in one pass. Deferred until narration has loaded.
    pub fn play(&mut self) {
        if self.disposed {
            return;
        }
        if !self.is_ready() {
            self.play_pending = true;
            return;
        }
        self.play_pending = false;
        if self.ended {
            // Replaying after the end starts over.
            self.ended = false;
            self.position = 0.0;
            if let Some(track) = self.narration.as_mut() {
                track.handle.seek(0.0);
            }
        }
        for track in self.tracks_mut() {
            track.handle.play();
        }
    }

    pub fn pause(&mut self) {
        if self.disposed {
            return;
        }
        self.play_pending = false;
        for track in self.tracks_mut() {
            track.handle.pause();
        }
    }

    /// Pause when playing, play otherwise. No-op until narration has loaded.
    ///
    /// Returns false when the toggle was ignored.
    pub fn toggle(&mut self) -> bool {
        if self.disposed || !self.is_ready() {
            return false;
        }
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
        true
    }

    /// Apply a pending volume change to the narration handle.
    pub fn sync_volume(&mut self) -> Option<Volume> {
        let volume = self.volume.take_change()?;
        if let Some(track) = self.narration.as_mut() {
            track.handle.set_volume(volume);
        }
        Some(volume)
    }

    /// Update state from a media notification.
    ///
    /// Events for other sessions, or arriving after dispose, are ignored.
    pub fn handle_event(&mut self, event: &MediaEvent) -> Option<SessionSignal> {
        if self.disposed || event.session != self.id {
            return None;
        }
        match event.role {
            TrackRole::Narration => self.handle_narration(&event.kind),
            role => self.handle_video(role, &event.kind),
        }
    }

    fn handle_narration(&mut self, kind: &MediaEventKind) -> Option<SessionSignal> {
        let track = self.narration.as_mut()?;
        match kind {
            MediaEventKind::Loaded { duration } => {
                track.loaded = true;
                self.duration = (duration.is_finite() && *duration > 0.0).then_some(*duration);
                if self.play_pending {
                    self.play();
                }
                None
            }
            MediaEventKind::LoadFailed { reason } => {
                warn!(session = %self.id, %reason, "narration failed to load; continuing silent");
                if let Some(track) = self.narration.take() {
                    track.release();
                }
                if self.play_pending {
                    self.play();
                }
                None
            }
            MediaEventKind::TimeUpdate { position } => {
                if position.is_finite() && *position >= 0.0 {
                    self.position = *position;
                }
                None
            }
            MediaEventKind::Playing => {
                track.playing = true;
                None
            }
            MediaEventKind::Paused => {
                track.playing = false;
                None
            }
            MediaEventKind::PlayRejected { reason } => {
                track.playing = false;
                warn!(session = %self.id, %reason, "narration start was blocked");
                Some(SessionSignal::PlaybackBlocked {
                    role: TrackRole::Narration,
                    reason: reason.clone(),
                })
            }
            MediaEventKind::Ended => {
                track.playing = false;
                self.ended = true;
                if let Some(duration) = self.duration {
                    self.position = duration;
                }
                debug!(session = %self.id, "narration ended");
                Some(SessionSignal::NarrationEnded)
            }
        }
    }

    fn handle_video(&mut self, role: TrackRole, kind: &MediaEventKind) -> Option<SessionSignal> {
        let narrated = self.narration.is_some();
        let track = self.videos.iter_mut().find(|track| track.role == role)?;
        match kind {
            MediaEventKind::Loaded { .. } => track.loaded = true,
            MediaEventKind::LoadFailed { reason } => {
                warn!(session = %self.id, ?role, %reason, "video failed to load");
            }
            MediaEventKind::TimeUpdate { .. } => {}
            MediaEventKind::Playing => track.playing = true,
            MediaEventKind::Paused => track.playing = false,
            MediaEventKind::PlayRejected { reason } => {
                track.playing = false;
                warn!(session = %self.id, ?role, %reason, "video start was blocked");
                if !narrated && role == TrackRole::Foreground {
                    return Some(SessionSignal::PlaybackBlocked {
                        role,
                        reason: reason.clone(),
                    });
                }
            }
            MediaEventKind::Ended => {
                // Videos loop under the narration; restart if the backend stopped.
                track.handle.seek(0.0);
                track.handle.play();
            }
        }
        None
    }

    /// Pause everything, detach every listener and release every handle.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.play_pending = false;
        if let Some(track) = self.narration.take() {
            track.release();
        }
        for track in self.videos.drain(..) {
            track.release();
        }
        debug!(session = %self.id, slide = %self.slide_id, "released playback session");
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn tracks_mut(&mut self) -> impl Iterator<Item = &mut Track> {
        self.narration.iter_mut().chain(self.videos.iter_mut())
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn video_request(role: TrackRole, source: &Url) -> MediaRequest<'_> {
    MediaRequest {
        role,
        source,
        looping: true,
        muted: true,
    }
}
