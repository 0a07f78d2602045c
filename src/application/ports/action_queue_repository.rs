use crate::domain::entities::{QueueStats, QueuedAction, QueuedActionDraft};
use crate::domain::value_objects::{CollectionName, EntityKey, QueuedActionId};
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Durable storage behind the action queue. Every method touches entries by id
/// in a single statement, so concurrent callers never interleave on one entry.
#[async_trait]
pub trait ActionQueueRepository: Send + Sync {
    async fn insert(&self, draft: QueuedActionDraft) -> Result<QueuedAction, AppError>;

    async fn find(&self, id: QueuedActionId) -> Result<Option<QueuedAction>, AppError>;

    /// Unsynced entries below `max_retries`, oldest first.
    async fn list_pending(
        &self,
        max_retries: u32,
        limit: u32,
    ) -> Result<Vec<QueuedAction>, AppError>;

    async fn list_all(&self) -> Result<Vec<QueuedAction>, AppError>;

    /// Returns false when the entry was already synced or does not exist.
    async fn mark_synced(
        &self,
        id: QueuedActionId,
        remote_key: Option<&EntityKey>,
    ) -> Result<bool, AppError>;

    async fn increment_retry(
        &self,
        id: QueuedActionId,
        error: Option<&str>,
    ) -> Result<bool, AppError>;

    async fn mark_failed(
        &self,
        id: QueuedActionId,
        max_retries: u32,
        error: Option<&str>,
    ) -> Result<bool, AppError>;

    async fn assign_remote_key(
        &self,
        collection: &CollectionName,
        local_key: &EntityKey,
        remote_key: &EntityKey,
    ) -> Result<u64, AppError>;

    /// Deletes every unsynced entry of an entity whose create never reached
    /// the remote. Entities without an unsynced create are left untouched.
    async fn discard_unsynced(
        &self,
        collection: &CollectionName,
        local_key: &EntityKey,
    ) -> Result<u64, AppError>;

    async fn reset_failed(&self, max_retries: u32) -> Result<u64, AppError>;

    async fn purge_synced(&self) -> Result<u64, AppError>;

    async fn stats(&self, max_retries: u32) -> Result<QueueStats, AppError>;
}
