use reel_core::model::{PlayerPreferences, Volume};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn u64_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn map_preferences_row(row: &SqliteRow) -> Result<PlayerPreferences, StorageError> {
    let volume: f64 = row.try_get("volume").map_err(ser)?;
    let slides_viewed: i64 = row.try_get("slides_viewed").map_err(ser)?;

    Ok(PlayerPreferences {
        volume: Volume::new(volume).map_err(ser)?,
        slides_viewed: i64_to_u64("slides_viewed", slides_viewed)?,
    })
}
