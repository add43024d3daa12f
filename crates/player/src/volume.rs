//! Process-wide narration volume.
//!
//! The current value is read when a session attaches; later changes are
//! pushed through a watch channel that every live session observes.

use reel_core::model::Volume;
use tokio::sync::watch;

#[derive(Clone, Debug)]
pub struct VolumeControl {
    tx: watch::Sender<Volume>,
}

impl VolumeControl {
    #[must_use]
    pub fn new(initial: Volume) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    #[must_use]
    pub fn current(&self) -> Volume {
        *self.tx.borrow()
    }

    /// Store a new volume and notify subscribers. Returns the previous value.
    pub fn set(&self, volume: Volume) -> Volume {
        self.tx.send_replace(volume)
    }

    #[must_use]
    pub fn subscribe(&self) -> VolumeSubscription {
        VolumeSubscription {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for VolumeControl {
    fn default() -> Self {
        Self::new(Volume::default())
    }
}

#[derive(Debug)]
pub struct VolumeSubscription {
    rx: watch::Receiver<Volume>,
}

impl VolumeSubscription {
    /// Value at subscription time or after the last `take_change`.
    #[must_use]
    pub fn current(&self) -> Volume {
        *self.rx.borrow()
    }

    /// Returns the new volume if it changed since the last call.
    pub fn take_change(&mut self) -> Option<Volume> {
        match self.rx.has_changed() {
            Ok(true) => Some(*self.rx.borrow_and_update()),
            Ok(false) | Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_see_initial_value_without_change() {
        let control = VolumeControl::new(Volume::new(0.5).unwrap());
        let mut sub = control.subscribe();
        assert_eq!(sub.current().value(), 0.5);
        assert_eq!(sub.take_change(), None);
    }

    #[test]
    fn changes_are_delivered_once() {
        let control = VolumeControl::default();
        let mut first = control.subscribe();
        let mut second = control.subscribe();

        let previous = control.set(Volume::new(0.2).unwrap());
        assert_eq!(previous, Volume::FULL);
        assert_eq!(first.take_change().map(Volume::value), Some(0.2));
        assert_eq!(first.take_change(), None);
        assert_eq!(second.take_change().map(Volume::value), Some(0.2));
        assert_eq!(control.current().value(), 0.2);
    }

    #[test]
    fn set_without_subscribers_still_updates() {
        let control = VolumeControl::default();
        control.set(Volume::MUTED);
        assert!(control.current().is_muted());
        assert!(control.subscribe().current().is_muted());
    }
}
