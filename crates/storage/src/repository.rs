use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reel_core::model::{PlayerPreferences, Volume};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for the client-local preferences row.
#[async_trait]
pub trait PreferencesRepository: Send + Sync {
    /// Fetch stored preferences, if any were ever saved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the row cannot be read or decoded.
    async fn load_preferences(&self) -> Result<Option<PlayerPreferences>, StorageError>;

    /// Persist the volume preference, leaving the progress counter untouched.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the volume cannot be stored.
    async fn save_volume(&self, volume: Volume, at: DateTime<Utc>) -> Result<(), StorageError>;

    /// Add `count` to the slides-viewed counter and return the new total.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the counter cannot be updated.
    async fn add_slides_viewed(&self, count: u64, at: DateTime<Utc>) -> Result<u64, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    preferences: Arc<Mutex<Option<PlayerPreferences>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferencesRepository for InMemoryRepository {
    async fn load_preferences(&self) -> Result<Option<PlayerPreferences>, StorageError> {
        let guard = self
            .preferences
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(*guard)
    }

    async fn save_volume(&self, volume: Volume, _at: DateTime<Utc>) -> Result<(), StorageError> {
        let mut guard = self
            .preferences
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get_or_insert_with(PlayerPreferences::default).volume = volume;
        Ok(())
    }

    async fn add_slides_viewed(&self, count: u64, _at: DateTime<Utc>) -> Result<u64, StorageError> {
        let mut guard = self
            .preferences
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let prefs = guard.get_or_insert_with(PlayerPreferences::default);
        prefs.slides_viewed = prefs.slides_viewed.saturating_add(count);
        Ok(prefs.slides_viewed)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub preferences: Arc<dyn PreferencesRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let preferences: Arc<dyn PreferencesRepository> = Arc::new(InMemoryRepository::new());
        Self { preferences }
    }
}
