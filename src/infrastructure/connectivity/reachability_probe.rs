use crate::application::ports::{ConnectivityWatcher, RemoteDataService};
use crate::domain::entities::{ConnectivityEvent, LinkInfo};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const CHANNEL_CAPACITY: usize = 32;

/// Derives connectivity from the remote service's own reachability check.
///
/// Emits an event only when the observed state changes.
pub struct ReachabilityProbe {
    remote: Arc<dyn RemoteDataService>,
    interval: Duration,
    sender: broadcast::Sender<ConnectivityEvent>,
    last: Mutex<Option<ConnectivityEvent>>,
}

impl ReachabilityProbe {
    pub fn new(remote: Arc<dyn RemoteDataService>, interval: Duration) -> Arc<Self> {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Arc::new(Self {
            remote,
            interval,
            sender,
            last: Mutex::new(None),
        })
    }

    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let probe = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(probe.interval);
            loop {
                ticker.tick().await;
                probe.probe_once().await;
            }
        })
    }

    /// Checks reachability once; returns the event when the state changed.
    pub async fn probe_once(&self) -> Option<ConnectivityEvent> {
        let event = if self.remote.is_reachable().await {
            ConnectivityEvent::Online(LinkInfo::new("remote-probe", LinkInfo::UNKNOWN))
        } else {
            ConnectivityEvent::Offline
        };

        let changed = match self.last.lock() {
            Ok(mut guard) => {
                let changed = guard.as_ref() != Some(&event);
                if changed {
                    *guard = Some(event.clone());
                }
                changed
            }
            Err(_) => false,
        };

        if !changed {
            return None;
        }

        tracing::debug!(
            target: "offline::network",
            online = matches!(event, ConnectivityEvent::Online(_)),
            "reachability changed"
        );
        let _ = self.sender.send(event.clone());
        Some(event)
    }
}

impl ConnectivityWatcher for ReachabilityProbe {
    fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.sender.subscribe()
    }

    fn current(&self) -> Option<ConnectivityEvent> {
        self.last.lock().ok().and_then(|guard| guard.clone())
    }
}
