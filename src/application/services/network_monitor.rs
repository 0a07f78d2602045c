use crate::application::ports::ConnectivityWatcher;
use crate::domain::entities::{ConnectivityEvent, LinkInfo, NetworkStatus};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

/// Tracks connectivity transitions. Never touches the queue or entity stores.
pub struct NetworkMonitor {
    status: watch::Sender<NetworkStatus>,
}

impl NetworkMonitor {
    pub fn new() -> Self {
        let (status, _) = watch::channel(NetworkStatus::default());
        Self { status }
    }

    pub fn on_online(&self, link: LinkInfo) {
        let now = Utc::now();
        self.status.send_modify(|status| {
            let was_online = status.is_online;
            status.is_online = true;
            status.last_online_at = Some(now);
            status.connection_type = link.connection_type;
            status.effective_type = link.effective_type;
            if !was_online {
                tracing::info!(
                    target: "offline::network",
                    connection_type = %status.connection_type,
                    effective_type = %status.effective_type,
                    "back online"
                );
            }
        });
    }

    pub fn on_offline(&self) {
        self.status.send_if_modified(|status| {
            if !status.is_online {
                return false;
            }
            status.is_online = false;
            tracing::info!(target: "offline::network", "connection lost");
            true
        });
    }

    pub fn status(&self) -> NetworkStatus {
        self.status.borrow().clone()
    }

    pub fn is_online(&self) -> bool {
        self.status.borrow().is_online
    }

    pub fn subscribe(&self) -> watch::Receiver<NetworkStatus> {
        self.status.subscribe()
    }

    pub fn apply(&self, event: ConnectivityEvent) {
        match event {
            ConnectivityEvent::Online(link) => self.on_online(link),
            ConnectivityEvent::Offline => self.on_offline(),
        }
    }

    /// Forwards the watcher's events until its channel closes.
    pub fn attach(self: &Arc<Self>, watcher: Arc<dyn ConnectivityWatcher>) -> JoinHandle<()> {
        let mut events = watcher.subscribe();
        if let Some(current) = watcher.current() {
            self.apply(current);
        }

        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => monitor.apply(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            target: "offline::network",
                            skipped,
                            "connectivity events dropped"
                        );
                        if let Some(current) = watcher.current() {
                            monitor.apply(current);
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}
