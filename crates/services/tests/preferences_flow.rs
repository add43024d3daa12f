use std::sync::Arc;

use reel_core::model::Volume;
use reel_core::time::fixed_now;
use services::{Clock, PreferencesService, PreferencesServiceError};
use storage::repository::Storage;

#[tokio::test]
async fn preferences_default_until_saved() {
    let storage = Storage::in_memory();
    let service = PreferencesService::new(Clock::fixed(fixed_now()), Arc::clone(&storage.preferences));

    let prefs = service.load().await.expect("load");
    assert_eq!(prefs.volume, Volume::FULL);
    assert_eq!(prefs.slides_viewed, 0);
}

#[tokio::test]
async fn volume_is_validated_and_persisted() {
    let storage = Storage::sqlite("sqlite:file:memdb_prefs_service?mode=memory&cache=shared")
        .await
        .expect("connect sqlite");
    let service = PreferencesService::new(Clock::fixed(fixed_now()), Arc::clone(&storage.preferences));

    let err = service.set_volume(1.5).await.unwrap_err();
    assert!(matches!(err, PreferencesServiceError::Preferences(_)));

    service.set_volume(0.35).await.expect("save volume");
    assert_eq!(service.record_views(3).await.expect("views"), 3);
    assert_eq!(service.record_views(0).await.expect("no views"), 3);

    let prefs = service.load().await.expect("load");
    assert_eq!(prefs.volume.value(), 0.35);
    assert_eq!(prefs.slides_viewed, 3);
}
