#![forbid(unsafe_code)]

//! Client side of the slide reel: media sessions, the feed orchestrator and a
//! headless backend for tests and terminal previews.

pub mod feed;
pub mod headless;
pub mod media;
pub mod session;
pub mod volume;

pub use feed::{FeedConfig, FeedError, FeedEvent, FeedInput, SlideFeed};
pub use headless::HeadlessBackend;
pub use media::{MediaBackend, MediaError, MediaEvent, MediaHandle, SessionId, TrackRole};
pub use session::{PlaybackSession, SessionSignal};
pub use volume::{VolumeControl, VolumeSubscription};
