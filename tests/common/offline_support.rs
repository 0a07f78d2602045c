use super::mocks::MockRemoteService;
use agrisync::application::ports::LocalStore;
use agrisync::infrastructure::cache::MemoryLocalStore;
use agrisync::infrastructure::connectivity::ManualConnectivityWatcher;
use agrisync::infrastructure::database::{ConnectionPool, SqliteActionQueueRepository};
use agrisync::shared::config::AppConfig;
use agrisync::{LinkInfo, OfflineDependencies, OfflineService};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub struct OfflineTestContext {
    pub service: OfflineService,
    pub remote: Arc<MockRemoteService>,
    pub watcher: Arc<ManualConnectivityWatcher>,
    pub local: Arc<dyn LocalStore>,
}

impl OfflineTestContext {
    /// Reports a link and waits until the monitor has applied it.
    pub async fn go_online(&self) {
        self.watcher.set_online(LinkInfo::new("wifi", "4g"));
        let service = &self.service;
        assert!(wait_until(|| async move { service.network_status().is_online }).await);
    }

    pub async fn go_offline(&self) {
        self.watcher.set_offline();
        let service = &self.service;
        assert!(wait_until(|| async move { !service.network_status().is_online }).await);
    }
}

pub fn test_config(auto_sync: bool) -> AppConfig {
    let mut config = AppConfig::default();
    config.sync.auto_sync = auto_sync;
    config.sync.sync_interval_ms = 50;
    config.sync.max_retries = 3;
    config
}

pub async fn setup_offline_service(config: AppConfig) -> OfflineTestContext {
    setup_with_store(config, Arc::new(MemoryLocalStore::new())).await
}

pub async fn setup_with_store(config: AppConfig, local: Arc<dyn LocalStore>) -> OfflineTestContext {
    let pool = ConnectionPool::from_memory().await.expect("in-memory sqlite");
    let remote = Arc::new(MockRemoteService::new());
    let watcher = Arc::new(ManualConnectivityWatcher::new());

    let service = OfflineService::new(
        config,
        OfflineDependencies {
            local_store: local.clone(),
            queue_repository: Arc::new(SqliteActionQueueRepository::new(pool.clone())),
            remote: remote.clone(),
            watcher: watcher.clone(),
            schema: Some(pool),
        },
    );
    service.init().await.expect("init");

    OfflineTestContext {
        service,
        remote,
        watcher,
        local,
    }
}

/// Polls `condition` until it holds or two seconds pass.
pub async fn wait_until<F, Fut>(mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition().await
}
