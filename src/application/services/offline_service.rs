use crate::application::ports::{
    ActionQueueRepository, ConnectivityWatcher, LocalStore, RemoteDataService, SyncObserver,
};
use crate::application::services::{
    ActionQueue, HybridDataAccessor, NetworkMonitor, SyncScheduler,
};
use crate::domain::entities::{
    NetworkStatus, OfflineExport, OfflineStats, SyncEntity, SyncReport,
};
use crate::infrastructure::connectivity::ReachabilityProbe;
use crate::infrastructure::database::{
    ConnectionPool, SqliteActionQueueRepository, SqliteLocalStore,
};
use crate::infrastructure::offline::SyncMetricsSnapshot;
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Adapters the offline service is composed from.
pub struct OfflineDependencies {
    pub local_store: Arc<dyn LocalStore>,
    pub queue_repository: Arc<dyn ActionQueueRepository>,
    pub remote: Arc<dyn RemoteDataService>,
    pub watcher: Arc<dyn ConnectivityWatcher>,
    /// Database whose schema `init` migrates, when the stores are SQL-backed.
    pub schema: Option<ConnectionPool>,
}

/// Composition root for the offline-first stack; owns the scheduler and
/// watcher lifecycles.
pub struct OfflineService {
    config: AppConfig,
    local: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteDataService>,
    watcher: Arc<dyn ConnectivityWatcher>,
    schema: Option<ConnectionPool>,
    queue: ActionQueue,
    monitor: Arc<NetworkMonitor>,
    scheduler: Arc<SyncScheduler>,
    initialized: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl OfflineService {
    pub fn new(config: AppConfig, deps: OfflineDependencies) -> Self {
        let queue = ActionQueue::new(deps.queue_repository, config.sync.max_retries);
        let monitor = Arc::new(NetworkMonitor::new());
        let scheduler = Arc::new(SyncScheduler::new(
            queue.clone(),
            Arc::clone(&deps.remote),
            Arc::clone(&monitor),
            &config.sync,
        ));

        Self {
            config,
            local: deps.local_store,
            remote: deps.remote,
            watcher: deps.watcher,
            schema: deps.schema,
            queue,
            monitor,
            scheduler,
            initialized: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Opens the configured SQLite database and backs both stores with it.
    pub async fn with_sqlite(
        config: AppConfig,
        remote: Arc<dyn RemoteDataService>,
        watcher: Arc<dyn ConnectivityWatcher>,
    ) -> Result<Self, AppError> {
        config.validate().map_err(AppError::ConfigurationError)?;
        let pool = ConnectionPool::new(
            &config.database.url,
            config.database.max_connections,
            config.database.connection_timeout,
        )
        .await?;

        let deps = OfflineDependencies {
            local_store: Arc::new(SqliteLocalStore::new(pool.clone())),
            queue_repository: Arc::new(SqliteActionQueueRepository::new(pool.clone())),
            remote,
            watcher,
            schema: Some(pool),
        };
        Ok(Self::new(config, deps))
    }

    /// Migrates the schema, attaches the connectivity watcher and starts the
    /// scheduler when auto sync is on. Later calls are no-ops.
    ///
    /// A failed migration leaves the service in degraded mode rather than
    /// failing: reads return empty results and stats report zeros.
    pub async fn init(&self) -> Result<(), AppError> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if let Err(message) = self.config.validate() {
            self.initialized.store(false, Ordering::SeqCst);
            return Err(AppError::ConfigurationError(message));
        }

        if let Some(pool) = &self.schema {
            match pool.migrate().await {
                Ok(()) => tracing::info!(target: "offline::service", "local schema up to date"),
                Err(err) => tracing::error!(
                    target: "offline::service",
                    error = %err,
                    "schema migration failed, running degraded"
                ),
            }
        }

        let mut handles = vec![self.monitor.attach(Arc::clone(&self.watcher))];

        if self.config.sync.reachability_probe_ms > 0 {
            let probe = ReachabilityProbe::new(
                Arc::clone(&self.remote),
                Duration::from_millis(self.config.sync.reachability_probe_ms),
            );
            handles.push(self.monitor.attach(probe.clone()));
            handles.push(probe.start());
        }

        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.extend(handles);
        }

        if self.config.sync.auto_sync {
            self.scheduler.start(self.config.sync.interval());
        }

        tracing::info!(
            target: "offline::service",
            auto_sync = self.config.sync.auto_sync,
            max_retries = self.config.sync.max_retries,
            "offline service initialized"
        );
        Ok(())
    }

    pub fn network_status(&self) -> NetworkStatus {
        self.monitor.status()
    }

    pub fn network_monitor(&self) -> Arc<NetworkMonitor> {
        Arc::clone(&self.monitor)
    }

    pub fn action_queue(&self) -> &ActionQueue {
        &self.queue
    }

    pub fn scheduler(&self) -> Arc<SyncScheduler> {
        Arc::clone(&self.scheduler)
    }

    /// Runs one sync pass now and returns its report.
    pub async fn trigger_sync(&self) -> SyncReport {
        self.scheduler.sync_once().await
    }

    pub async fn offline_stats(&self) -> OfflineStats {
        let status = self.monitor.status();
        let queue = self.queue.stats().await;

        OfflineStats {
            is_online: status.is_online,
            last_online_at: status.last_online_at,
            pending_actions: queue.pending,
            failed_actions: queue.failed,
            synced_actions: queue.synced,
            total_actions: queue.total,
            cached_entities: self.cached_entity_count().await,
            last_sync_at: self.scheduler.last_sync_at(),
        }
    }

    /// Purges synced queue entries; returns how many were removed.
    pub async fn clear_synced_actions(&self) -> u64 {
        match self.queue.purge_synced().await {
            Ok(purged) => purged,
            Err(err) => {
                tracing::warn!(
                    target: "offline::service",
                    error = %err,
                    "failed to clear synced actions"
                );
                0
            }
        }
    }

    /// Makes failed entries eligible again and runs a sync pass; returns how
    /// many entries were reset.
    pub async fn retry_failed_actions(&self) -> u64 {
        let reset = match self.queue.reset_failed().await {
            Ok(reset) => reset,
            Err(err) => {
                tracing::warn!(
                    target: "offline::service",
                    error = %err,
                    "failed to reset failed actions"
                );
                return 0;
            }
        };

        if reset > 0 {
            self.scheduler.sync_once().await;
        }
        reset
    }

    pub async fn export_offline_data(&self) -> OfflineExport {
        let mut collections = BTreeMap::new();

        match self.local.collections().await {
            Ok(names) => {
                for name in names {
                    match self.local.scan(&name).await {
                        Ok(records) => {
                            collections.insert(
                                name.to_string(),
                                records.into_iter().map(|(_, value)| value).collect(),
                            );
                        }
                        Err(err) => tracing::warn!(
                            target: "offline::service",
                            collection = %name,
                            error = %err,
                            "collection skipped in export"
                        ),
                    }
                }
            }
            Err(err) => tracing::warn!(
                target: "offline::service",
                error = %err,
                "local collections unavailable for export"
            ),
        }

        let queue = self.queue.list_all().await.unwrap_or_else(|err| {
            tracing::warn!(
                target: "offline::service",
                error = %err,
                "queue unavailable for export"
            );
            Vec::new()
        });

        OfflineExport {
            exported_at: Utc::now(),
            collections,
            queue,
        }
    }

    pub fn sync_metrics(&self) -> SyncMetricsSnapshot {
        self.scheduler.metrics()
    }

    /// Builds the accessor for `E` and registers it to receive confirmed
    /// creates of its collection.
    pub fn accessor<E: SyncEntity>(&self) -> Result<Arc<HybridDataAccessor<E>>, AppError> {
        let accessor = Arc::new(HybridDataAccessor::<E>::new(
            Arc::clone(&self.remote),
            Arc::clone(&self.local),
            self.queue.clone(),
            Arc::clone(&self.monitor),
        )?);

        let observer: Arc<dyn SyncObserver> = accessor.clone();
        self.scheduler
            .register_observer(accessor.collection().clone(), observer);
        Ok(accessor)
    }

    /// Stops the scheduler and connectivity tasks and closes the database.
    pub async fn shutdown(&self) {
        self.scheduler.stop().await;

        let handles = match self.tasks.lock() {
            Ok(mut tasks) => std::mem::take(&mut *tasks),
            Err(_) => Vec::new(),
        };
        for handle in handles {
            handle.abort();
        }

        if let Some(pool) = &self.schema {
            pool.close().await;
        }
        self.initialized.store(false, Ordering::SeqCst);
        tracing::info!(target: "offline::service", "offline service shut down");
    }

    async fn cached_entity_count(&self) -> u64 {
        let names = match self.local.collections().await {
            Ok(names) => names,
            Err(err) => {
                tracing::debug!(target: "offline::service", error = %err, "cache size unknown");
                return 0;
            }
        };

        let mut total = 0u64;
        for name in names {
            if let Ok(records) = self.local.scan(&name).await {
                total += records.len() as u64;
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Farm;
    use crate::domain::value_objects::{CollectionName, EntityKey};
    use crate::infrastructure::cache::MemoryLocalStore;
    use crate::infrastructure::connectivity::ManualConnectivityWatcher;
    use async_trait::async_trait;
    use serde_json::Value;

    struct NoRemote;

    #[async_trait]
    impl RemoteDataService for NoRemote {
        async fn list(&self, _: &CollectionName) -> Result<Vec<Value>, AppError> {
            Err(AppError::Network("down".into()))
        }

        async fn get_by_id(
            &self,
            _: &CollectionName,
            _: &EntityKey,
        ) -> Result<Option<Value>, AppError> {
            Err(AppError::Network("down".into()))
        }

        async fn insert(&self, _: &CollectionName, _: Value) -> Result<Value, AppError> {
            Err(AppError::Network("down".into()))
        }

        async fn update(
            &self,
            _: &CollectionName,
            _: &EntityKey,
            _: Value,
        ) -> Result<Value, AppError> {
            Err(AppError::Network("down".into()))
        }

        async fn delete(&self, _: &CollectionName, _: &EntityKey) -> Result<(), AppError> {
            Err(AppError::Network("down".into()))
        }

        async fn is_authenticated(&self) -> bool {
            false
        }

        async fn is_reachable(&self) -> bool {
            false
        }
    }

    async fn setup_service() -> OfflineService {
        let pool = ConnectionPool::from_memory().await.unwrap();
        let mut config = AppConfig::default();
        config.sync.auto_sync = false;

        OfflineService::new(
            config,
            OfflineDependencies {
                local_store: Arc::new(MemoryLocalStore::new()),
                queue_repository: Arc::new(SqliteActionQueueRepository::new(pool.clone())),
                remote: Arc::new(NoRemote),
                watcher: Arc::new(ManualConnectivityWatcher::new()),
                schema: Some(pool),
            },
        )
    }

    #[tokio::test]
    async fn init_migrates_once_and_reports_empty_stats() {
        let service = setup_service().await;
        service.init().await.unwrap();
        service.init().await.unwrap();

        let stats = service.offline_stats().await;
        assert!(!stats.is_online);
        assert_eq!(stats.total_actions, 0);
        assert_eq!(stats.cached_entities, 0);
        assert!(stats.last_sync_at.is_none());
    }

    #[tokio::test]
    async fn export_includes_cache_and_queue() {
        let service = setup_service().await;
        service.init().await.unwrap();
        let farms = service.accessor::<Farm>().unwrap();

        farms.create(Farm::new("Test Vineyard")).await.unwrap();

        let export = service.export_offline_data().await;
        assert_eq!(export.collections["farms"].len(), 1);
        assert_eq!(export.queue.len(), 1);
        assert_eq!(service.offline_stats().await.pending_actions, 1);

        service.shutdown().await;
    }
}
