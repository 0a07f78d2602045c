use crate::domain::entities::ConnectivityEvent;
use tokio::sync::broadcast;

/// Source of platform online/offline transitions.
pub trait ConnectivityWatcher: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent>;

    /// Whether the platform currently reports a link, if it knows.
    fn current(&self) -> Option<ConnectivityEvent> {
        None
    }
}
