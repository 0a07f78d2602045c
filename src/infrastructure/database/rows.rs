use crate::domain::entities::QueuedAction;
use crate::domain::value_objects::{
    ActionKind, ActionPayload, CollectionName, EntityKey, QueuedActionId,
};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::str::FromStr;

#[derive(Debug, Clone, FromRow)]
pub struct LocalEntityRow {
    pub collection: String,
    pub entity_key: String,
    pub value: String,
    pub updated_at: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct QueuedActionRow {
    pub id: i64,
    pub kind: String,
    pub collection: String,
    pub payload: String,
    pub local_key: String,
    pub remote_key: Option<String>,
    pub is_synced: bool,
    pub retry_count: i64,
    pub last_error: Option<String>,
    pub enqueued_at: i64,
    pub updated_at: i64,
    pub synced_at: Option<i64>,
}

#[derive(Debug, Clone, Copy, FromRow)]
pub struct QueueStatsRow {
    pub total: i64,
    pub pending: i64,
    pub failed: i64,
    pub synced: i64,
}

fn timestamp(millis: i64, column: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| AppError::Storage(format!("Invalid {column} timestamp: {millis}")))
}

impl TryFrom<QueuedActionRow> for QueuedAction {
    type Error = AppError;

    fn try_from(row: QueuedActionRow) -> Result<Self, Self::Error> {
        let payload = ActionPayload::from_json_str(&row.payload).map_err(AppError::Storage)?;

        Ok(QueuedAction {
            id: QueuedActionId::new(row.id).map_err(AppError::Storage)?,
            kind: ActionKind::from_str(&row.kind).map_err(AppError::Storage)?,
            collection: CollectionName::new(row.collection).map_err(AppError::Storage)?,
            payload,
            local_key: EntityKey::new(row.local_key).map_err(AppError::Storage)?,
            remote_key: row
                .remote_key
                .map(EntityKey::new)
                .transpose()
                .map_err(AppError::Storage)?,
            synced: row.is_synced,
            retry_count: row.retry_count.clamp(0, u32::MAX as i64) as u32,
            last_error: row.last_error,
            enqueued_at: timestamp(row.enqueued_at, "enqueued_at")?,
            updated_at: timestamp(row.updated_at, "updated_at")?,
            synced_at: row
                .synced_at
                .map(|value| timestamp(value, "synced_at"))
                .transpose()?,
        })
    }
}
