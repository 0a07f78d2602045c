use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Settled outcome of one scheduler pass over a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub attempted: u32,
    pub synced: u32,
    pub retried: u32,
    pub failed: u32,
    pub skipped_offline: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    pub fn empty(started_at: DateTime<Utc>) -> Self {
        Self {
            attempted: 0,
            synced: 0,
            retried: 0,
            failed: 0,
            skipped_offline: false,
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn offline(started_at: DateTime<Utc>) -> Self {
        Self {
            skipped_offline: true,
            ..Self::empty(started_at)
        }
    }

    pub fn is_clean(&self) -> bool {
        self.attempted == self.synced
    }
}
