use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::ai::AiClient;
use crate::error::AppServicesError;
use crate::extract::DocumentExtractor;
use crate::ingest::{IngestConfig, IngestService};
use crate::preferences_service::PreferencesService;
use crate::voiceover::VoiceoverStore;

/// Assembles app-facing services.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    preferences: Arc<PreferencesService>,
    ai: Arc<AiClient>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock))
    }

    /// Build services over an existing storage aggregate, with the AI client
    /// configured from the environment.
    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock) -> Self {
        Self {
            clock,
            preferences: Arc::new(PreferencesService::new(
                clock,
                Arc::clone(&storage.preferences),
            )),
            ai: Arc::new(AiClient::from_env()),
        }
    }

    #[must_use]
    pub fn preferences(&self) -> Arc<PreferencesService> {
        Arc::clone(&self.preferences)
    }

    #[must_use]
    pub fn ai(&self) -> Arc<AiClient> {
        Arc::clone(&self.ai)
    }

    /// Ingest pipeline using the shared AI client for every generation step.
    #[must_use]
    pub fn ingest(
        &self,
        config: IngestConfig,
        voiceovers: Arc<dyn VoiceoverStore>,
    ) -> IngestService {
        IngestService::new(
            self.clock,
            config,
            Arc::new(DocumentExtractor),
            self.ai.clone(),
            self.ai.clone(),
            self.ai.clone(),
            voiceovers,
        )
    }
}
