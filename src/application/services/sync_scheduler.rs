use crate::application::ports::{remote_key_of, RemoteDataService, SyncObserver};
use crate::application::services::{ActionQueue, NetworkMonitor};
use crate::domain::entities::{QueuedAction, SyncReport};
use crate::domain::value_objects::{ActionKind, ActionPayload, CollectionName, EntityKey};
use crate::infrastructure::offline::{SyncMetrics, SyncMetricsSnapshot};
use crate::shared::config::SyncConfig;
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::{oneshot, Mutex as AsyncMutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settlement {
    Synced,
    /// Accepted remotely after the entry was dropped from the queue.
    Discarded,
    Retried,
    Failed,
}

struct Worker {
    handle: JoinHandle<()>,
    stop: oneshot::Sender<()>,
}

/// Drains the action queue against the remote service.
///
/// Runs happen on every timer tick while online, on each offline to online
/// transition and on explicit triggers. Runs are serialized by `gate`.
pub struct SyncScheduler {
    queue: ActionQueue,
    remote: Arc<dyn RemoteDataService>,
    monitor: Arc<NetworkMonitor>,
    metrics: SyncMetrics,
    batch_size: u32,
    fail_fast_on_rejection: bool,
    observers: RwLock<HashMap<CollectionName, Arc<dyn SyncObserver>>>,
    gate: AsyncMutex<()>,
    trigger: Notify,
    worker: Mutex<Option<Worker>>,
    last_sync_at: Mutex<Option<DateTime<Utc>>>,
}

impl SyncScheduler {
    pub fn new(
        queue: ActionQueue,
        remote: Arc<dyn RemoteDataService>,
        monitor: Arc<NetworkMonitor>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            queue,
            remote,
            monitor,
            metrics: SyncMetrics::new(),
            batch_size: config.batch_size.max(1),
            fail_fast_on_rejection: config.fail_fast_on_rejection,
            observers: RwLock::new(HashMap::new()),
            gate: AsyncMutex::new(()),
            trigger: Notify::new(),
            worker: Mutex::new(None),
            last_sync_at: Mutex::new(None),
        }
    }

    /// Replaces any observer previously registered for the collection.
    pub fn register_observer(&self, collection: CollectionName, observer: Arc<dyn SyncObserver>) {
        if let Ok(mut observers) = self.observers.write() {
            observers.insert(collection, observer);
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .map(|worker| {
                worker
                    .as_ref()
                    .map(|w| !w.handle.is_finished())
                    .unwrap_or(false)
            })
            .unwrap_or(false)
    }

    /// Spawns the background loop. A second call while running is a no-op.
    pub fn start(self: &Arc<Self>, interval: Duration) {
        let interval = interval.max(Duration::from_millis(1));
        let Ok(mut worker) = self.worker.lock() else {
            tracing::error!(target: "offline::scheduler", "scheduler state poisoned");
            return;
        };
        if worker.as_ref().is_some_and(|w| !w.handle.is_finished()) {
            tracing::debug!(target: "offline::scheduler", "scheduler already running");
            return;
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let scheduler = Arc::clone(self);
        let handle = tokio::spawn(async move {
            scheduler.run_loop(interval, stop_rx).await;
        });
        *worker = Some(Worker {
            handle,
            stop: stop_tx,
        });
        tracing::info!(
            target: "offline::scheduler",
            interval_ms = interval.as_millis() as u64,
            batch_size = self.batch_size,
            "sync scheduler started"
        );
    }

    /// Halts future ticks. A batch already in flight completes first.
    pub async fn stop(&self) {
        let worker = match self.worker.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        let Some(worker) = worker else {
            return;
        };

        let _ = worker.stop.send(());
        if let Err(err) = worker.handle.await {
            if !err.is_cancelled() {
                tracing::error!(target: "offline::scheduler", error = %err, "scheduler task panicked");
            }
        }
        tracing::info!(target: "offline::scheduler", "sync scheduler stopped");
    }

    /// Asks the background loop for an immediate run.
    pub fn trigger(&self) {
        self.trigger.notify_one();
    }

    pub fn metrics(&self) -> SyncMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn last_sync_at(&self) -> Option<DateTime<Utc>> {
        self.last_sync_at.lock().ok().and_then(|guard| *guard)
    }

    /// Runs one batch now and waits until every attempt has settled.
    pub async fn sync_once(&self) -> SyncReport {
        self.run("manual").await
    }

    async fn run_loop(&self, interval: Duration, mut stop: oneshot::Receiver<()>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut network = self.monitor.subscribe();
        let mut was_online = network.borrow_and_update().is_online;

        loop {
            let trigger = tokio::select! {
                _ = &mut stop => break,
                _ = ticker.tick() => "tick",
                _ = self.trigger.notified() => "manual",
                changed = network.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let online = network.borrow_and_update().is_online;
                    let reconnected = online && !was_online;
                    was_online = online;
                    if !reconnected {
                        continue;
                    }
                    "reconnect"
                }
            };

            if !self.monitor.is_online() {
                tracing::trace!(target: "offline::scheduler", trigger, "offline, run skipped");
                continue;
            }
            self.run(trigger).await;
        }
    }

    async fn run(&self, trigger: &str) -> SyncReport {
        let started_at = Utc::now();
        let _gate = self.gate.lock().await;

        if !self.monitor.is_online() {
            return SyncReport::offline(started_at);
        }

        let batch = match self.queue.list_pending(self.batch_size).await {
            Ok(batch) => batch,
            Err(err) => {
                tracing::warn!(
                    target: "offline::scheduler",
                    error = %err,
                    "failed to read pending actions"
                );
                return SyncReport::empty(started_at);
            }
        };
        if batch.is_empty() {
            return SyncReport::empty(started_at);
        }

        let settlements: Vec<Settlement> =
            join_all(group_by_entity(batch).into_iter().map(|group| self.process_group(group)))
                .await
                .into_iter()
                .flatten()
                .collect();

        let mut report = SyncReport::empty(started_at);
        report.attempted = settlements.len() as u32;
        for settlement in settlements {
            match settlement {
                Settlement::Synced | Settlement::Discarded => report.synced += 1,
                Settlement::Retried => report.retried += 1,
                Settlement::Failed => report.failed += 1,
            }
        }
        report.finished_at = Utc::now();

        self.metrics.record(&report, trigger);
        if let Ok(mut last) = self.last_sync_at.lock() {
            *last = Some(report.finished_at);
        }
        tracing::info!(
            target: "offline::scheduler",
            trigger,
            attempted = report.attempted,
            synced = report.synced,
            retried = report.retried,
            failed = report.failed,
            "sync run finished"
        );
        report
    }

    /// Replays one entity's actions in queue order. The first action that does
    /// not settle as synced holds the rest back until the next run.
    async fn process_group(&self, group: Vec<QueuedAction>) -> Vec<Settlement> {
        let mut settlements = Vec::with_capacity(group.len());
        let mut assigned: Option<EntityKey> = None;

        for mut action in group {
            if action.remote_key.is_none() {
                action.remote_key = assigned.clone();
            }
            let (settlement, remote_key) = self.process(&action).await;
            settlements.push(settlement);
            if settlement != Settlement::Synced {
                break;
            }
            if action.kind == ActionKind::Create {
                assigned = remote_key;
            }
        }
        settlements
    }

    async fn process(&self, action: &QueuedAction) -> (Settlement, Option<EntityKey>) {
        match self.dispatch(action).await {
            Ok(confirmed) => {
                let remote_key = confirmed
                    .as_ref()
                    .and_then(|row| remote_key_of(row, self.remote.key_field()));
                let settlement = self.confirm(action, confirmed, remote_key.as_ref()).await;
                (settlement, remote_key)
            }
            Err(err) => (self.reject(action, err).await, None),
        }
    }

    async fn dispatch(&self, action: &QueuedAction) -> Result<Option<Value>, AppError> {
        let payload = action.payload.as_json().clone();
        match action.kind {
            ActionKind::Create => self
                .remote
                .insert(&action.collection, payload)
                .await
                .map(Some),
            ActionKind::Update => self
                .remote
                .update(&action.collection, action.target_key(), payload)
                .await
                .map(Some),
            ActionKind::Delete => {
                match self
                    .remote
                    .delete(&action.collection, action.target_key())
                    .await
                {
                    Ok(()) => Ok(None),
                    // Only a server key proves the row existed and is now gone.
                    Err(AppError::NotFound(_)) if !action.target_key().is_local() => Ok(None),
                    Err(err) => Err(err),
                }
            }
        }
    }

    async fn confirm(
        &self,
        action: &QueuedAction,
        confirmed: Option<Value>,
        remote_key: Option<&EntityKey>,
    ) -> Settlement {
        match self.queue.mark_synced(action.id, remote_key).await {
            Ok(true) => {}
            Ok(false) => {
                if action.kind == ActionKind::Create {
                    self.compensate_discarded_create(action, remote_key).await;
                    return Settlement::Discarded;
                }
                return Settlement::Synced;
            }
            Err(err) => {
                tracing::error!(
                    target: "offline::scheduler",
                    id = %action.id,
                    error = %err,
                    "remote accepted action but queue update failed"
                );
                return Settlement::Retried;
            }
        }

        if action.kind != ActionKind::Create {
            return Settlement::Synced;
        }

        if let Some(remote_key) = remote_key {
            if let Err(err) = self
                .queue
                .assign_remote_key(&action.collection, &action.local_key, remote_key)
                .await
            {
                tracing::warn!(
                    target: "offline::scheduler",
                    id = %action.id,
                    error = %err,
                    "failed to propagate server key to queued actions"
                );
            }
        }

        let observer = self
            .observers
            .read()
            .ok()
            .and_then(|observers| observers.get(&action.collection).cloned());
        if let Some(observer) = observer {
            observer.on_action_synced(action, confirmed.as_ref()).await;
        }

        Settlement::Synced
    }

    /// The create was discarded while in flight, so the row it produced is
    /// unwanted. Queue its removal under the server key.
    async fn compensate_discarded_create(
        &self,
        action: &QueuedAction,
        remote_key: Option<&EntityKey>,
    ) {
        let Some(remote_key) = remote_key else {
            return;
        };
        let queued = match ActionPayload::new(Value::String(remote_key.as_str().to_string())) {
            Ok(payload) => {
                self.queue
                    .enqueue(
                        ActionKind::Delete,
                        action.collection.clone(),
                        payload,
                        remote_key.clone(),
                    )
                    .await
            }
            Err(err) => Err(AppError::ValidationError(err)),
        };
        match queued {
            Ok(_) => tracing::info!(
                target: "offline::scheduler",
                id = %action.id,
                key = %remote_key,
                "create discarded while in flight, removal queued"
            ),
            Err(err) => tracing::error!(
                target: "offline::scheduler",
                id = %action.id,
                key = %remote_key,
                error = %err,
                "failed to queue removal of discarded create"
            ),
        }
    }

    async fn reject(&self, action: &QueuedAction, err: AppError) -> Settlement {
        let message = err.to_string();

        if self.fail_fast_on_rejection && err.is_rejection() {
            if let Err(store_err) = self.queue.mark_failed(action.id, Some(&message)).await {
                tracing::error!(
                    target: "offline::scheduler",
                    id = %action.id,
                    error = %store_err,
                    "failed to record rejection"
                );
            }
            return Settlement::Failed;
        }

        tracing::debug!(
            target: "offline::scheduler",
            id = %action.id,
            retry = action.retry_count + 1,
            error = %message,
            "action will be retried"
        );
        if let Err(store_err) = self.queue.increment_retry(action.id, Some(&message)).await {
            tracing::error!(
                target: "offline::scheduler",
                id = %action.id,
                error = %store_err,
                "failed to record retry"
            );
            return Settlement::Retried;
        }

        if action.retry_count + 1 >= self.queue.max_retries() {
            Settlement::Failed
        } else {
            Settlement::Retried
        }
    }
}

/// Splits a batch by target entity, keeping queue order within each group
/// and ordering groups by their oldest entry.
fn group_by_entity(batch: Vec<QueuedAction>) -> Vec<Vec<QueuedAction>> {
    let mut index: HashMap<(CollectionName, EntityKey), usize> = HashMap::new();
    let mut groups: Vec<Vec<QueuedAction>> = Vec::new();
    for action in batch {
        let entity = (action.collection.clone(), action.target_key().clone());
        match index.get(&entity) {
            Some(&slot) => groups[slot].push(action),
            None => {
                index.insert(entity, groups.len());
                groups.push(vec![action]);
            }
        }
    }
    groups
}
