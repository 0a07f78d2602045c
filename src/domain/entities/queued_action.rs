use crate::domain::value_objects::{
    ActionKind, ActionPayload, CollectionName, EntityKey, QueuedActionId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A mutation waiting for confirmation by the remote service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueuedAction {
    pub id: QueuedActionId,
    pub kind: ActionKind,
    pub collection: CollectionName,
    pub payload: ActionPayload,
    pub local_key: EntityKey,
    pub remote_key: Option<EntityKey>,
    pub synced: bool,
    pub retry_count: u32,
    pub last_error: Option<String>,
    pub enqueued_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub synced_at: Option<DateTime<Utc>>,
}

impl QueuedAction {
    pub fn is_failed(&self, max_retries: u32) -> bool {
        !self.synced && self.retry_count >= max_retries
    }

    pub fn is_pending(&self, max_retries: u32) -> bool {
        !self.synced && self.retry_count < max_retries
    }

    /// Key to address on the remote side: the server key once known, else the local one.
    pub fn target_key(&self) -> &EntityKey {
        self.remote_key.as_ref().unwrap_or(&self.local_key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueuedActionDraft {
    pub kind: ActionKind,
    pub collection: CollectionName,
    pub payload: ActionPayload,
    pub local_key: EntityKey,
}

impl QueuedActionDraft {
    pub fn new(
        kind: ActionKind,
        collection: CollectionName,
        payload: ActionPayload,
        local_key: EntityKey,
    ) -> Self {
        Self {
            kind,
            collection,
            payload,
            local_key,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub total: u64,
    pub pending: u64,
    pub failed: u64,
    pub synced: u64,
}
