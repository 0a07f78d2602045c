use crate::application::ports::ActionQueueRepository;
use crate::domain::entities::{QueueStats, QueuedAction, QueuedActionDraft};
use crate::domain::value_objects::{
    ActionKind, ActionPayload, CollectionName, EntityKey, QueuedActionId,
};
use crate::shared::error::AppError;
use std::sync::Arc;

/// Persisted FIFO of mutations awaiting remote confirmation.
///
/// Entries are pending while `retry_count < max_retries`, failed once the
/// budget is spent, and synced entries are never touched again except by
/// [`ActionQueue::purge_synced`]. No method performs network I/O.
#[derive(Clone)]
pub struct ActionQueue {
    repository: Arc<dyn ActionQueueRepository>,
    max_retries: u32,
}

impl ActionQueue {
    pub fn new(repository: Arc<dyn ActionQueueRepository>, max_retries: u32) -> Self {
        Self {
            repository,
            max_retries: max_retries.max(1),
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub async fn enqueue(
        &self,
        kind: ActionKind,
        collection: CollectionName,
        payload: ActionPayload,
        local_key: EntityKey,
    ) -> Result<QueuedAction, AppError> {
        let action = self
            .repository
            .insert(QueuedActionDraft::new(kind, collection, payload, local_key))
            .await?;
        tracing::debug!(
            target: "offline::queue",
            id = %action.id,
            kind = %action.kind,
            collection = %action.collection,
            key = %action.local_key,
            "action queued"
        );
        Ok(action)
    }

    pub async fn list_pending(&self, limit: u32) -> Result<Vec<QueuedAction>, AppError> {
        self.repository
            .list_pending(self.max_retries, limit.max(1))
            .await
    }

    pub async fn list_all(&self) -> Result<Vec<QueuedAction>, AppError> {
        self.repository.list_all().await
    }

    pub async fn find(&self, id: QueuedActionId) -> Result<Option<QueuedAction>, AppError> {
        self.repository.find(id).await
    }

    /// Returns false when the entry was already synced.
    pub async fn mark_synced(
        &self,
        id: QueuedActionId,
        remote_key: Option<&EntityKey>,
    ) -> Result<bool, AppError> {
        let updated = self.repository.mark_synced(id, remote_key).await?;
        if !updated {
            tracing::debug!(target: "offline::queue", id = %id, "action already settled");
        }
        Ok(updated)
    }

    pub async fn increment_retry(
        &self,
        id: QueuedActionId,
        error: Option<&str>,
    ) -> Result<bool, AppError> {
        self.repository.increment_retry(id, error).await
    }

    pub async fn mark_failed(
        &self,
        id: QueuedActionId,
        error: Option<&str>,
    ) -> Result<bool, AppError> {
        let updated = self
            .repository
            .mark_failed(id, self.max_retries, error)
            .await?;
        if updated {
            tracing::warn!(
                target: "offline::queue",
                id = %id,
                error = error.unwrap_or_default(),
                "action moved to failed"
            );
        }
        Ok(updated)
    }

    pub async fn assign_remote_key(
        &self,
        collection: &CollectionName,
        local_key: &EntityKey,
        remote_key: &EntityKey,
    ) -> Result<u64, AppError> {
        if local_key == remote_key {
            return Ok(0);
        }
        self.repository
            .assign_remote_key(collection, local_key, remote_key)
            .await
    }

    /// Drops the queued history of an entity that never reached the remote.
    /// Returns 0 when the entity has no unsynced create.
    pub async fn discard_unsynced(
        &self,
        collection: &CollectionName,
        local_key: &EntityKey,
    ) -> Result<u64, AppError> {
        let discarded = self
            .repository
            .discard_unsynced(collection, local_key)
            .await?;
        if discarded > 0 {
            tracing::debug!(
                target: "offline::queue",
                collection = %collection,
                key = %local_key,
                discarded,
                "unsynced actions discarded"
            );
        }
        Ok(discarded)
    }

    pub async fn reset_failed(&self) -> Result<u64, AppError> {
        let reset = self.repository.reset_failed(self.max_retries).await?;
        if reset > 0 {
            tracing::info!(target: "offline::queue", reset, "failed actions reset");
        }
        Ok(reset)
    }

    pub async fn purge_synced(&self) -> Result<u64, AppError> {
        let purged = self.repository.purge_synced().await?;
        tracing::debug!(target: "offline::queue", purged, "synced actions purged");
        Ok(purged)
    }

    /// Zeros when the store cannot be read.
    pub async fn stats(&self) -> QueueStats {
        match self.repository.stats(self.max_retries).await {
            Ok(stats) => stats,
            Err(err) => {
                tracing::warn!(target: "offline::queue", error = %err, "queue stats unavailable");
                QueueStats::default()
            }
        }
    }
}
