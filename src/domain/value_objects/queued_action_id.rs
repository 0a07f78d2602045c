use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic primary key of an entry in the action queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueuedActionId(i64);

impl QueuedActionId {
    pub fn new(value: i64) -> Result<Self, String> {
        if value <= 0 {
            return Err("Queued action ID must be positive".to_string());
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for QueuedActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<QueuedActionId> for i64 {
    fn from(id: QueuedActionId) -> Self {
        id.0
    }
}
