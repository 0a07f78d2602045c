use crate::application::ports::{remote_key_of, LocalStore, RemoteDataService, SyncObserver};
use crate::application::services::{ActionQueue, NetworkMonitor};
use crate::domain::entities::{QueuedAction, SyncEntity, WriteOutcome};
use crate::domain::value_objects::{
    ActionKind, ActionPayload, CollectionName, EntityKey, FieldMapper,
};
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

/// Read/write façade for one entity collection.
///
/// Goes to the remote service when online and authenticated, mirrors every
/// confirmed result into the local store, and falls back to the local store
/// plus the action queue otherwise.
pub struct HybridDataAccessor<E: SyncEntity> {
    collection: CollectionName,
    mapper: FieldMapper,
    remote: Arc<dyn RemoteDataService>,
    local: Arc<dyn LocalStore>,
    queue: ActionQueue,
    monitor: Arc<NetworkMonitor>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: SyncEntity> HybridDataAccessor<E> {
    pub fn new(
        remote: Arc<dyn RemoteDataService>,
        local: Arc<dyn LocalStore>,
        queue: ActionQueue,
        monitor: Arc<NetworkMonitor>,
    ) -> Result<Self, AppError> {
        let collection =
            CollectionName::new(E::COLLECTION).map_err(AppError::ConfigurationError)?;
        Ok(Self {
            collection,
            mapper: E::field_mapper(),
            remote,
            local,
            queue,
            monitor,
            _entity: PhantomData,
        })
    }

    pub fn collection(&self) -> &CollectionName {
        &self.collection
    }

    async fn remote_available(&self) -> bool {
        self.monitor.is_online() && self.remote.is_authenticated().await
    }

    pub async fn get_all(&self) -> Vec<E> {
        if self.remote_available().await {
            match self.remote.list(&self.collection).await {
                Ok(rows) => {
                    let entities: Vec<E> = rows
                        .into_iter()
                        .filter_map(|row| self.decode_remote(row))
                        .collect();
                    self.reconcile_all(&entities).await;
                    return entities;
                }
                Err(err) => {
                    tracing::warn!(
                        target: "offline::accessor",
                        collection = %self.collection,
                        error = %err,
                        "remote list failed, serving local cache"
                    );
                }
            }
        }

        self.local_all().await
    }

    pub async fn get_by_id(&self, key: &EntityKey) -> Option<E> {
        if !key.is_local() && self.remote_available().await {
            match self.remote.get_by_id(&self.collection, key).await {
                Ok(Some(row)) => {
                    if let Some(entity) = self.decode_remote(row) {
                        self.mirror(&entity).await;
                        return Some(entity);
                    }
                }
                Ok(None) | Err(AppError::NotFound(_)) => {
                    if let Err(err) = self.local.delete(&self.collection, key).await {
                        tracing::warn!(
                            target: "offline::accessor",
                            collection = %self.collection,
                            key = %key,
                            error = %err,
                            "failed to drop stale local copy"
                        );
                    }
                    return None;
                }
                Err(err) => {
                    tracing::warn!(
                        target: "offline::accessor",
                        collection = %self.collection,
                        key = %key,
                        error = %err,
                        "remote read failed, serving local cache"
                    );
                }
            }
        }

        match self.local.get(&self.collection, key).await {
            Ok(Some(value)) => self.decode_local(value),
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(
                    target: "offline::accessor",
                    collection = %self.collection,
                    error = %err,
                    "local store unavailable"
                );
                None
            }
        }
    }

    pub async fn create(&self, entity: E) -> Result<WriteOutcome<E>, AppError> {
        let mut entity = entity;

        if self.remote_available().await {
            let payload = self.remote_payload(&entity)?;
            match self.remote.insert(&self.collection, payload).await {
                Ok(row) => {
                    let confirmed = self.confirmed_entity(row, &entity);
                    self.mirror(&confirmed).await;
                    return Ok(WriteOutcome::remote(confirmed));
                }
                Err(err) => self.log_deferred("create", &err),
            }
        }

        let key = entity.key().unwrap_or_else(EntityKey::generate_local);
        entity.set_key(key.clone());
        let action = self
            .write_locally_and_enqueue(ActionKind::Create, &key, &entity)
            .await?;
        Ok(WriteOutcome::local(entity, action.id))
    }

    pub async fn update(&self, entity: E) -> Result<WriteOutcome<E>, AppError> {
        let key = entity.key().ok_or_else(|| {
            AppError::ValidationError(format!("{} update requires a key", self.collection))
        })?;

        // Records created offline only exist locally until their create is replayed.
        if !key.is_local() && self.remote_available().await {
            let payload = self.remote_payload(&entity)?;
            match self.remote.update(&self.collection, &key, payload).await {
                Ok(row) => {
                    let confirmed = self.confirmed_entity(row, &entity);
                    self.mirror(&confirmed).await;
                    return Ok(WriteOutcome::remote(confirmed));
                }
                Err(err) => self.log_deferred("update", &err),
            }
        }

        let action = self
            .write_locally_and_enqueue(ActionKind::Update, &key, &entity)
            .await?;
        Ok(WriteOutcome::local(entity, action.id))
    }

    pub async fn delete(&self, key: &EntityKey) -> Result<WriteOutcome<EntityKey>, AppError> {
        if key.is_local() {
            // A record whose create is still queued never existed remotely.
            if self.queue.discard_unsynced(&self.collection, key).await? > 0 {
                self.local.delete(&self.collection, key).await?;
                return Ok(WriteOutcome::local_only(key.clone()));
            }
        } else if self.remote_available().await {
            match self.remote.delete(&self.collection, key).await {
                Ok(()) | Err(AppError::NotFound(_)) => {
                    if let Err(err) = self.local.delete(&self.collection, key).await {
                        tracing::warn!(
                            target: "offline::accessor",
                            collection = %self.collection,
                            key = %key,
                            error = %err,
                            "failed to mirror remote delete"
                        );
                    }
                    return Ok(WriteOutcome::remote(key.clone()));
                }
                Err(err) => self.log_deferred("delete", &err),
            }
        }

        self.local.delete(&self.collection, key).await?;
        let payload = ActionPayload::new(Value::String(key.as_str().to_string()))
            .map_err(AppError::ValidationError)?;
        let action = self
            .queue
            .enqueue(ActionKind::Delete, self.collection.clone(), payload, key.clone())
            .await?;
        Ok(WriteOutcome::local(key.clone(), action.id))
    }

    async fn write_locally_and_enqueue(
        &self,
        kind: ActionKind,
        key: &EntityKey,
        entity: &E,
    ) -> Result<QueuedAction, AppError> {
        let local_value = serde_json::to_value(entity)?;
        let remote_value = self.strip_local_key(self.mapper.to_remote(local_value.clone()), key);
        let payload = ActionPayload::new(remote_value).map_err(AppError::ValidationError)?;

        self.local.put(&self.collection, key, local_value).await?;
        self.queue
            .enqueue(kind, self.collection.clone(), payload, key.clone())
            .await
    }

    fn remote_payload(&self, entity: &E) -> Result<Value, AppError> {
        let remote = self.mapper.to_remote(serde_json::to_value(entity)?);
        Ok(match entity.key() {
            Some(key) => self.strip_local_key(remote, &key),
            None => remote,
        })
    }

    /// Locally generated keys never reach the remote service.
    fn strip_local_key(&self, payload: Value, key: &EntityKey) -> Value {
        let mut payload = payload;
        if key.is_local() {
            if let Value::Object(map) = &mut payload {
                map.remove(self.remote.key_field());
            }
        }
        payload
    }

    fn decode_remote(&self, row: Value) -> Option<E> {
        let mut row = row;
        let key = remote_key_of(&row, self.remote.key_field());
        if let (Some(key), Value::Object(map)) = (key, &mut row) {
            map.insert(
                self.remote.key_field().to_string(),
                Value::String(key.into()),
            );
        }

        match serde_json::from_value::<E>(self.mapper.to_local(row)) {
            Ok(entity) => Some(entity),
            Err(err) => {
                tracing::warn!(
                    target: "offline::accessor",
                    collection = %self.collection,
                    error = %err,
                    "skipping malformed remote row"
                );
                None
            }
        }
    }

    fn decode_local(&self, value: Value) -> Option<E> {
        match serde_json::from_value::<E>(value) {
            Ok(entity) => Some(entity),
            Err(err) => {
                tracing::warn!(
                    target: "offline::accessor",
                    collection = %self.collection,
                    error = %err,
                    "skipping malformed local record"
                );
                None
            }
        }
    }

    /// The remote-confirmed row, or the submitted entity carrying the server key.
    fn confirmed_entity(&self, row: Value, submitted: &E) -> E {
        let key = remote_key_of(&row, self.remote.key_field());
        match self.decode_remote(row) {
            Some(entity) if entity.key().is_some() => entity,
            _ => {
                let mut entity = submitted.clone();
                if let Some(key) = key {
                    entity.set_key(key);
                }
                entity
            }
        }
    }

    async fn mirror(&self, entity: &E) {
        let Some(key) = entity.key() else {
            return;
        };
        let result = match serde_json::to_value(entity) {
            Ok(value) => self.local.put(&self.collection, &key, value).await,
            Err(err) => Err(err.into()),
        };
        if let Err(err) = result {
            tracing::warn!(
                target: "offline::accessor",
                collection = %self.collection,
                key = %key,
                error = %err,
                "failed to mirror remote entity locally"
            );
        }
    }

    async fn reconcile_all(&self, entities: &[E]) {
        let mut remote_keys = HashSet::new();
        for entity in entities {
            if let Some(key) = entity.key() {
                remote_keys.insert(key);
            }
            self.mirror(entity).await;
        }

        let local = match self.local.scan(&self.collection).await {
            Ok(local) => local,
            Err(err) => {
                tracing::warn!(
                    target: "offline::accessor",
                    collection = %self.collection,
                    error = %err,
                    "skipping stale entry cleanup"
                );
                return;
            }
        };

        let mut removed = 0usize;
        for (key, _) in local {
            if remote_keys.contains(&key) {
                continue;
            }
            match self.local.delete(&self.collection, &key).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(err) => tracing::warn!(
                    target: "offline::accessor",
                    collection = %self.collection,
                    key = %key,
                    error = %err,
                    "failed to remove stale local entity"
                ),
            }
        }
        tracing::debug!(
            target: "offline::accessor",
            collection = %self.collection,
            cached = remote_keys.len(),
            removed,
            "local cache reconciled"
        );
    }

    async fn local_all(&self) -> Vec<E> {
        let records = match self.local.scan(&self.collection).await {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(
                    target: "offline::accessor",
                    collection = %self.collection,
                    error = %err,
                    "local store unavailable"
                );
                return Vec::new();
            }
        };

        if !records.is_empty() {
            return records
                .into_iter()
                .filter_map(|(_, value)| self.decode_local(value))
                .collect();
        }

        let demo = E::demo_dataset();
        if !demo.is_empty() {
            tracing::info!(
                target: "offline::accessor",
                collection = %self.collection,
                count = demo.len(),
                "seeding empty cache with demo records"
            );
            for entity in &demo {
                self.mirror(entity).await;
            }
        }
        demo
    }

    fn log_deferred(&self, operation: &str, err: &AppError) {
        tracing::info!(
            target: "offline::accessor",
            collection = %self.collection,
            operation,
            error = %err,
            "remote write failed, deferring to queue"
        );
    }
}

#[async_trait]
impl<E: SyncEntity> SyncObserver for HybridDataAccessor<E> {
    async fn on_action_synced(&self, action: &QueuedAction, confirmed: Option<&Value>) {
        if action.kind != ActionKind::Create {
            return;
        }
        let Some(row) = confirmed else {
            return;
        };
        let Some(server_key) = remote_key_of(row, self.remote.key_field()) else {
            return;
        };

        // The local copy carries edits queued after the create; only its key changes.
        let existing = match self.local.get(&self.collection, &action.local_key).await {
            Ok(Some(value)) => value,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(
                    target: "offline::accessor",
                    collection = %self.collection,
                    error = %err,
                    "cannot rekey synced record"
                );
                return;
            }
        };

        let Some(mut entity) = self
            .decode_local(existing)
            .or_else(|| self.decode_remote(row.clone()))
        else {
            return;
        };
        entity.set_key(server_key.clone());
        self.mirror(&entity).await;

        if server_key != action.local_key {
            if let Err(err) = self.local.delete(&self.collection, &action.local_key).await {
                tracing::warn!(
                    target: "offline::accessor",
                    collection = %self.collection,
                    key = %action.local_key,
                    error = %err,
                    "failed to drop local-key record after rekey"
                );
                return;
            }
            tracing::debug!(
                target: "offline::accessor",
                collection = %self.collection,
                from = %action.local_key,
                to = %server_key,
                "record rekeyed to server key"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{DataSource, Farm};
    use crate::infrastructure::cache::MemoryLocalStore;
    use crate::infrastructure::database::{ConnectionPool, SqliteActionQueueRepository};

    struct OfflineRemote;

    #[async_trait]
    impl RemoteDataService for OfflineRemote {
        async fn list(&self, _: &CollectionName) -> Result<Vec<Value>, AppError> {
            Err(AppError::Network("offline".into()))
        }

        async fn get_by_id(
            &self,
            _: &CollectionName,
            _: &EntityKey,
        ) -> Result<Option<Value>, AppError> {
            Err(AppError::Network("offline".into()))
        }

        async fn insert(&self, _: &CollectionName, _: Value) -> Result<Value, AppError> {
            Err(AppError::Network("offline".into()))
        }

        async fn update(
            &self,
            _: &CollectionName,
            _: &EntityKey,
            _: Value,
        ) -> Result<Value, AppError> {
            Err(AppError::Network("offline".into()))
        }

        async fn delete(&self, _: &CollectionName, _: &EntityKey) -> Result<(), AppError> {
            Err(AppError::Network("offline".into()))
        }

        async fn is_authenticated(&self) -> bool {
            false
        }

        async fn is_reachable(&self) -> bool {
            false
        }
    }

    async fn setup() -> (HybridDataAccessor<Farm>, Arc<MemoryLocalStore>, ActionQueue) {
        let pool = ConnectionPool::from_memory().await.unwrap();
        pool.migrate().await.unwrap();
        let queue = ActionQueue::new(Arc::new(SqliteActionQueueRepository::new(pool)), 3);
        let local = Arc::new(MemoryLocalStore::new());
        let accessor = HybridDataAccessor::<Farm>::new(
            Arc::new(OfflineRemote),
            local.clone(),
            queue.clone(),
            Arc::new(NetworkMonitor::new()),
        )
        .unwrap();
        (accessor, local, queue)
    }

    #[tokio::test]
    async fn empty_cache_is_seeded_with_demo_farms() {
        let (accessor, local, _queue) = setup().await;

        let farms = accessor.get_all().await;
        assert_eq!(farms.len(), 2);
        assert_eq!(local.size().await, 2);

        let demo_key = EntityKey::new("demo-farm-1").unwrap();
        assert_eq!(
            accessor.get_by_id(&demo_key).await.unwrap().name,
            "Quinta do Vale"
        );
    }

    #[tokio::test]
    async fn offline_create_gets_local_key_and_queues_remote_payload() {
        let (accessor, _local, queue) = setup().await;
        let mut farm = Farm::new("Test Vineyard");
        farm.total_area_ha = Some(3.5);

        let outcome = accessor.create(farm).await.unwrap();
        assert_eq!(outcome.source, DataSource::Local);
        let key = outcome.value.id.clone().unwrap();
        assert!(key.is_local());

        let pending = queue.list_pending(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].local_key, key);
        let payload = pending[0].payload.as_json();
        assert!(payload.get("id").is_none());
        assert_eq!(payload["total_area"], 3.5);

        let cached = accessor.get_by_id(&key).await.unwrap();
        assert_eq!(cached.name, "Test Vineyard");
    }

    #[tokio::test]
    async fn offline_delete_removes_local_copy_and_queues_key() {
        let (accessor, local, queue) = setup().await;
        let key = EntityKey::new("12").unwrap();
        let mut farm = Farm::new("Old Orchard");
        farm.set_key(key.clone());
        local
            .put(accessor.collection(), &key, serde_json::to_value(&farm).unwrap())
            .await
            .unwrap();

        let outcome = accessor.delete(&key).await.unwrap();
        assert!(outcome.is_deferred());
        assert!(accessor.get_by_id(&key).await.is_none());

        let pending = queue.list_pending(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].kind, ActionKind::Delete);
        assert_eq!(pending[0].payload.as_json(), &Value::String(key.to_string()));
    }

    #[tokio::test]
    async fn deleting_unsynced_record_drops_its_queued_history() {
        let (accessor, local, queue) = setup().await;
        let created = accessor.create(Farm::new("Doomed Plot")).await.unwrap();
        let mut renamed = created.value.clone();
        renamed.name = "Doomed Plot II".to_string();
        accessor.update(renamed).await.unwrap();
        let key = created.value.id.unwrap();

        let outcome = accessor.delete(&key).await.unwrap();
        assert_eq!(outcome.source, DataSource::Local);
        assert!(!outcome.is_deferred());

        assert_eq!(queue.stats().await.total, 0);
        assert_eq!(local.size().await, 0);
    }

    #[tokio::test]
    async fn get_by_id_miss_does_not_seed_demo_records() {
        let (accessor, local, _queue) = setup().await;

        assert!(accessor.get_by_id(&EntityKey::new("404").unwrap()).await.is_none());
        assert_eq!(local.size().await, 0);
    }

    #[tokio::test]
    async fn update_without_key_is_rejected() {
        let (accessor, _local, queue) = setup().await;
        let err = accessor.update(Farm::new("No Key")).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(queue.stats().await.total, 0);
    }
}
