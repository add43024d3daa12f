use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reel_core::model::{PlayerPreferences, Volume};
use sqlx::Row;

use crate::repository::{PreferencesRepository, StorageError};

use super::SqliteRepository;
use super::mapping::{map_preferences_row, u64_to_i64};

#[async_trait]
impl PreferencesRepository for SqliteRepository {
    async fn load_preferences(&self) -> Result<Option<PlayerPreferences>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT volume, slides_viewed
            FROM player_preferences
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        row.as_ref().map(map_preferences_row).transpose()
    }

    async fn save_volume(&self, volume: Volume, at: DateTime<Utc>) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO player_preferences (id, volume, slides_viewed, updated_at)
            VALUES (1, ?1, 0, ?2)
            ON CONFLICT(id) DO UPDATE SET
                volume = excluded.volume,
                updated_at = excluded.updated_at
            ",
        )
        .bind(volume.value())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }

    async fn add_slides_viewed(&self, count: u64, at: DateTime<Utc>) -> Result<u64, StorageError> {
        let count = u64_to_i64("slides_viewed", count)?;
        let default_volume = Volume::default().value();

        let row = sqlx::query(
            r"
            INSERT INTO player_preferences (id, volume, slides_viewed, updated_at)
            VALUES (1, ?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                slides_viewed = player_preferences.slides_viewed + excluded.slides_viewed,
                updated_at = excluded.updated_at
            RETURNING slides_viewed
            ",
        )
        .bind(default_volume)
        .bind(count)
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        let total: i64 = row
            .try_get("slides_viewed")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        u64::try_from(total).map_err(|_| StorageError::Serialization("slides_viewed sign".into()))
    }
}
