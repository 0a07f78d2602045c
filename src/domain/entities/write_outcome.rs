use crate::domain::value_objects::QueuedActionId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Remote,
    Local,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome<T> {
    pub value: T,
    pub source: DataSource,
    /// Set when the write was deferred to the sync queue.
    pub queued_action: Option<QueuedActionId>,
}

impl<T> WriteOutcome<T> {
    pub fn remote(value: T) -> Self {
        Self {
            value,
            source: DataSource::Remote,
            queued_action: None,
        }
    }

    pub fn local(value: T, queued_action: QueuedActionId) -> Self {
        Self {
            value,
            source: DataSource::Local,
            queued_action: Some(queued_action),
        }
    }

    /// Settled locally with nothing left to replay.
    pub fn local_only(value: T) -> Self {
        Self {
            value,
            source: DataSource::Local,
            queued_action: None,
        }
    }

    pub fn is_deferred(&self) -> bool {
        self.queued_action.is_some()
    }
}
