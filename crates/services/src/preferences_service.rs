use std::sync::Arc;

use reel_core::Clock;
use reel_core::model::{PlayerPreferences, Volume};
use storage::repository::PreferencesRepository;
use tracing::debug;

use crate::error::PreferencesServiceError;

#[derive(Clone)]
pub struct PreferencesService {
    clock: Clock,
    repo: Arc<dyn PreferencesRepository>,
}

impl PreferencesService {
    #[must_use]
    pub fn new(clock: Clock, repo: Arc<dyn PreferencesRepository>) -> Self {
        Self { clock, repo }
    }

    /// Load persisted preferences (or defaults if missing).
    ///
    /// # Errors
    ///
    /// Returns `PreferencesServiceError` on storage failures.
    pub async fn load(&self) -> Result<PlayerPreferences, PreferencesServiceError> {
        let prefs = self.repo.load_preferences().await?;
        Ok(prefs.unwrap_or_default())
    }

    /// Validate and persist a new narration volume.
    ///
    /// # Errors
    ///
    /// Returns `PreferencesServiceError` if the value is outside 0.0–1.0 or
    /// persistence fails.
    pub async fn set_volume(&self, value: f64) -> Result<Volume, PreferencesServiceError> {
        let volume = Volume::new(value)?;
        self.repo.save_volume(volume, self.clock.now()).await?;
        debug!(volume = volume.value(), "saved volume preference");
        Ok(volume)
    }

    /// Add freshly viewed slides to the local counter. Returns the new total.
    ///
    /// # Errors
    ///
    /// Returns `PreferencesServiceError` on storage failures.
    pub async fn record_views(&self, count: u64) -> Result<u64, PreferencesServiceError> {
        if count == 0 {
            return Ok(self.load().await?.slides_viewed);
        }
        let total = self.repo.add_slides_viewed(count, self.clock.now()).await?;
        debug!(count, total, "recorded slide views");
        Ok(total)
    }
}
