use crate::application::ports::ConnectivityWatcher;
use crate::domain::entities::{ConnectivityEvent, LinkInfo};
use std::sync::Mutex;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 32;

/// Watcher fed by the host platform (or a test) through explicit calls.
pub struct ManualConnectivityWatcher {
    sender: broadcast::Sender<ConnectivityEvent>,
    last: Mutex<Option<ConnectivityEvent>>,
}

impl ManualConnectivityWatcher {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            last: Mutex::new(None),
        }
    }

    pub fn set_online(&self, link: LinkInfo) {
        self.publish(ConnectivityEvent::Online(link));
    }

    pub fn set_offline(&self) {
        self.publish(ConnectivityEvent::Offline);
    }

    fn publish(&self, event: ConnectivityEvent) {
        if let Ok(mut guard) = self.last.lock() {
            *guard = Some(event.clone());
        }
        // No subscribers yet is fine; `current` replays the last event on attach.
        let _ = self.sender.send(event);
    }
}

impl Default for ManualConnectivityWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityWatcher for ManualConnectivityWatcher {
    fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.sender.subscribe()
    }

    fn current(&self) -> Option<ConnectivityEvent> {
        self.last.lock().ok().and_then(|guard| guard.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_transitions_in_order() {
        let watcher = ManualConnectivityWatcher::new();
        let mut rx = watcher.subscribe();

        watcher.set_online(LinkInfo::new("wifi", "4g"));
        watcher.set_offline();

        assert_eq!(
            rx.recv().await.unwrap(),
            ConnectivityEvent::Online(LinkInfo::new("wifi", "4g"))
        );
        assert_eq!(rx.recv().await.unwrap(), ConnectivityEvent::Offline);
        assert_eq!(watcher.current(), Some(ConnectivityEvent::Offline));
    }
}
