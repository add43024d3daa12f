use reel_core::model::Volume;
use reel_core::time::fixed_now;
use storage::repository::PreferencesRepository;
use storage::sqlite::SqliteRepository;

async fn memory_repo(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_preferences_start_empty() {
    let repo = memory_repo("memdb_prefs_empty").await;
    assert!(repo.load_preferences().await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_roundtrips_volume_and_counter() {
    let repo = memory_repo("memdb_prefs_roundtrip").await;

    repo.save_volume(Volume::new(0.25).unwrap(), fixed_now())
        .await
        .unwrap();
    assert_eq!(repo.add_slides_viewed(4, fixed_now()).await.unwrap(), 4);
    assert_eq!(repo.add_slides_viewed(1, fixed_now()).await.unwrap(), 5);

    // Saving volume again must not reset the counter.
    repo.save_volume(Volume::new(0.75).unwrap(), fixed_now())
        .await
        .unwrap();

    let prefs = repo.load_preferences().await.unwrap().expect("row");
    assert_eq!(prefs.volume.value(), 0.75);
    assert_eq!(prefs.slides_viewed, 5);
}

#[tokio::test]
async fn sqlite_counter_without_volume_uses_default_volume() {
    let repo = memory_repo("memdb_prefs_counter_first").await;
    repo.add_slides_viewed(2, fixed_now()).await.unwrap();

    let prefs = repo.load_preferences().await.unwrap().expect("row");
    assert_eq!(prefs.volume, Volume::FULL);
    assert_eq!(prefs.slides_viewed, 2);
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = memory_repo("memdb_prefs_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
    repo.save_volume(Volume::MUTED, fixed_now()).await.unwrap();
    let prefs = repo.load_preferences().await.unwrap().expect("row");
    assert!(prefs.volume.is_muted());
}
