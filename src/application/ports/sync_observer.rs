use crate::domain::entities::QueuedAction;
use async_trait::async_trait;
use serde_json::Value;

/// Notified after the scheduler confirms a queued action against the remote service.
#[async_trait]
pub trait SyncObserver: Send + Sync {
    /// `confirmed` is the row returned by the remote service for creates and updates.
    async fn on_action_synced(&self, action: &QueuedAction, confirmed: Option<&Value>);
}
