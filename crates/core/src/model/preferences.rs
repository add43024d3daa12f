use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum PreferencesError {
    #[error("volume must be a finite number between 0.0 and 1.0, got {0}")]
    InvalidVolume(f64),
}

/// Narration volume, always within `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Volume(f64);

impl Volume {
    pub const MUTED: Self = Self(0.0);
    pub const FULL: Self = Self(1.0);

    /// Build a volume, rejecting values outside `0.0..=1.0`.
    ///
    /// # Errors
    ///
    /// Returns `PreferencesError::InvalidVolume` for non-finite or out-of-range input.
    pub fn new(value: f64) -> Result<Self, PreferencesError> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(PreferencesError::InvalidVolume(value));
        }
        Ok(Self(value))
    }

    /// Build a volume, clamping into range. Non-finite input maps to full volume.
    #[must_use]
    pub fn clamped(value: f64) -> Self {
        if value.is_finite() {
            Self(value.clamp(0.0, 1.0))
        } else {
            Self::FULL
        }
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn is_muted(self) -> bool {
        self.0 == 0.0
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::FULL
    }
}

impl TryFrom<f64> for Volume {
    type Error = PreferencesError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Volume> for f64 {
    fn from(volume: Volume) -> Self {
        volume.0
    }
}

/// Client-local preferences that survive between runs.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPreferences {
    pub volume: Volume,
    /// Total slides viewed across all sessions.
    pub slides_viewed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_rejects_out_of_range() {
        assert!(Volume::new(1.2).is_err());
        assert!(Volume::new(-0.1).is_err());
        assert!(Volume::new(f64::NAN).is_err());
        assert_eq!(Volume::new(0.4).unwrap().value(), 0.4);
    }

    #[test]
    fn volume_clamps() {
        assert_eq!(Volume::clamped(3.0), Volume::FULL);
        assert_eq!(Volume::clamped(-1.0), Volume::MUTED);
        assert_eq!(Volume::clamped(f64::INFINITY), Volume::FULL);
        assert!(Volume::clamped(0.0).is_muted());
    }

    #[test]
    fn preferences_default_to_full_volume() {
        let prefs = PlayerPreferences::default();
        assert_eq!(prefs.volume, Volume::FULL);
        assert_eq!(prefs.slides_viewed, 0);
    }
}
