mod common;

use agrisync::infrastructure::connectivity::ManualConnectivityWatcher;
use agrisync::shared::config::AppConfig;
use agrisync::{Farm, OfflineService};
use common::mocks::MockRemoteService;
use std::sync::Arc;

fn file_config(dir: &tempfile::TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("data").join("agrisync.db").display()
    );
    config.sync.auto_sync = false;
    config
}

async fn open_service(dir: &tempfile::TempDir) -> OfflineService {
    let service = OfflineService::with_sqlite(
        file_config(dir),
        Arc::new(MockRemoteService::unreachable()),
        Arc::new(ManualConnectivityWatcher::new()),
    )
    .await
    .unwrap();
    service.init().await.unwrap();
    service
}

#[tokio::test]
async fn queue_and_cache_survive_restart() {
    let dir = tempfile::tempdir().unwrap();

    let service = open_service(&dir).await;
    let farms = service.accessor::<Farm>().unwrap();
    let created = farms.create(Farm::new("Persistent Acres")).await.unwrap();
    let key = created.value.id.unwrap();
    service.shutdown().await;

    let reopened = open_service(&dir).await;
    let stats = reopened.offline_stats().await;
    assert_eq!(stats.pending_actions, 1);
    assert_eq!(stats.cached_entities, 1);

    let farms = reopened.accessor::<Farm>().unwrap();
    assert_eq!(
        farms.get_by_id(&key).await.unwrap().name,
        "Persistent Acres"
    );

    let export = reopened.export_offline_data().await;
    assert_eq!(export.queue[0].local_key, key);
    reopened.shutdown().await;
}

#[tokio::test]
async fn invalid_configuration_is_rejected_before_opening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = file_config(&dir);
    config.sync.batch_size = 0;

    let result = OfflineService::with_sqlite(
        config,
        Arc::new(MockRemoteService::new()),
        Arc::new(ManualConnectivityWatcher::new()),
    )
    .await;

    assert!(matches!(
        result,
        Err(agrisync::AppError::ConfigurationError(_))
    ));
    assert!(!dir.path().join("data").exists());
}
