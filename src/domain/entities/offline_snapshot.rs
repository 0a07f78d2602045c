use crate::domain::entities::QueuedAction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineStats {
    pub is_online: bool,
    pub last_online_at: Option<DateTime<Utc>>,
    pub pending_actions: u64,
    pub failed_actions: u64,
    pub synced_actions: u64,
    pub total_actions: u64,
    pub cached_entities: u64,
    pub last_sync_at: Option<DateTime<Utc>>,
}

/// Read-only backup of everything held locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineExport {
    pub exported_at: DateTime<Utc>,
    pub collections: BTreeMap<String, Vec<Value>>,
    pub queue: Vec<QueuedAction>,
}
