use super::queries::{
    ASSIGN_ACTION_REMOTE_KEY, DISCARD_UNSYNCED_ENTITY_ACTIONS, INCREMENT_ACTION_RETRY, INSERT_QUEUED_ACTION, MARK_ACTION_FAILED,
    MARK_ACTION_SYNCED, PURGE_SYNCED_ACTIONS, RESET_FAILED_ACTIONS, SELECT_ALL_ACTIONS,
    SELECT_PENDING_ACTIONS, SELECT_QUEUED_ACTION_BY_ID, SELECT_QUEUE_STATS,
};
use super::rows::{QueueStatsRow, QueuedActionRow};
use super::ConnectionPool;
use crate::application::ports::ActionQueueRepository;
use crate::domain::entities::{QueueStats, QueuedAction, QueuedActionDraft};
use crate::domain::value_objects::{CollectionName, EntityKey, QueuedActionId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;

pub struct SqliteActionQueueRepository {
    pool: ConnectionPool,
}

impl SqliteActionQueueRepository {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }
}

fn to_domain(rows: Vec<QueuedActionRow>) -> Result<Vec<QueuedAction>, AppError> {
    rows.into_iter().map(QueuedAction::try_from).collect()
}

#[async_trait]
impl ActionQueueRepository for SqliteActionQueueRepository {
    async fn insert(&self, draft: QueuedActionDraft) -> Result<QueuedAction, AppError> {
        let payload = serde_json::to_string(draft.payload.as_json())?;
        let now = Utc::now().timestamp_millis();

        let result = sqlx::query(INSERT_QUEUED_ACTION)
            .bind(draft.kind.as_str())
            .bind(draft.collection.as_str())
            .bind(payload)
            .bind(draft.local_key.as_str())
            .bind(now)
            .execute(self.pool.get_pool())
            .await?;

        let id = QueuedActionId::new(result.last_insert_rowid()).map_err(AppError::Storage)?;
        self.find(id)
            .await?
            .ok_or_else(|| AppError::Storage(format!("Queued action {id} vanished after insert")))
    }

    async fn find(&self, id: QueuedActionId) -> Result<Option<QueuedAction>, AppError> {
        let row = sqlx::query_as::<_, QueuedActionRow>(SELECT_QUEUED_ACTION_BY_ID)
            .bind(id.value())
            .fetch_optional(self.pool.get_pool())
            .await?;

        row.map(QueuedAction::try_from).transpose()
    }

    async fn list_pending(
        &self,
        max_retries: u32,
        limit: u32,
    ) -> Result<Vec<QueuedAction>, AppError> {
        let rows = sqlx::query_as::<_, QueuedActionRow>(SELECT_PENDING_ACTIONS)
            .bind(i64::from(max_retries))
            .bind(i64::from(limit))
            .fetch_all(self.pool.get_pool())
            .await?;

        to_domain(rows)
    }

    async fn list_all(&self) -> Result<Vec<QueuedAction>, AppError> {
        let rows = sqlx::query_as::<_, QueuedActionRow>(SELECT_ALL_ACTIONS)
            .fetch_all(self.pool.get_pool())
            .await?;

        to_domain(rows)
    }

    async fn mark_synced(
        &self,
        id: QueuedActionId,
        remote_key: Option<&EntityKey>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(MARK_ACTION_SYNCED)
            .bind(id.value())
            .bind(remote_key.map(EntityKey::as_str))
            .bind(Utc::now().timestamp_millis())
            .execute(self.pool.get_pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_retry(
        &self,
        id: QueuedActionId,
        error: Option<&str>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(INCREMENT_ACTION_RETRY)
            .bind(id.value())
            .bind(error)
            .bind(Utc::now().timestamp_millis())
            .execute(self.pool.get_pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_failed(
        &self,
        id: QueuedActionId,
        max_retries: u32,
        error: Option<&str>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(MARK_ACTION_FAILED)
            .bind(id.value())
            .bind(i64::from(max_retries))
            .bind(error)
            .bind(Utc::now().timestamp_millis())
            .execute(self.pool.get_pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn assign_remote_key(
        &self,
        collection: &CollectionName,
        local_key: &EntityKey,
        remote_key: &EntityKey,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(ASSIGN_ACTION_REMOTE_KEY)
            .bind(collection.as_str())
            .bind(local_key.as_str())
            .bind(remote_key.as_str())
            .bind(Utc::now().timestamp_millis())
            .execute(self.pool.get_pool())
            .await?;
        Ok(result.rows_affected())
    }

    async fn discard_unsynced(
        &self,
        collection: &CollectionName,
        local_key: &EntityKey,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(DISCARD_UNSYNCED_ENTITY_ACTIONS)
            .bind(collection.as_str())
            .bind(local_key.as_str())
            .execute(self.pool.get_pool())
            .await?;
        Ok(result.rows_affected())
    }

    async fn reset_failed(&self, max_retries: u32) -> Result<u64, AppError> {
        let result = sqlx::query(RESET_FAILED_ACTIONS)
            .bind(i64::from(max_retries))
            .bind(Utc::now().timestamp_millis())
            .execute(self.pool.get_pool())
            .await?;
        Ok(result.rows_affected())
    }

    async fn purge_synced(&self) -> Result<u64, AppError> {
        let result = sqlx::query(PURGE_SYNCED_ACTIONS)
            .execute(self.pool.get_pool())
            .await?;
        Ok(result.rows_affected())
    }

    async fn stats(&self, max_retries: u32) -> Result<QueueStats, AppError> {
        let row = sqlx::query_as::<_, QueueStatsRow>(SELECT_QUEUE_STATS)
            .bind(i64::from(max_retries))
            .fetch_one(self.pool.get_pool())
            .await?;

        Ok(QueueStats {
            total: row.total.max(0) as u64,
            pending: row.pending.max(0) as u64,
            failed: row.failed.max(0) as u64,
            synced: row.synced.max(0) as u64,
        })
    }
}
