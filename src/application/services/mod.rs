pub mod action_queue;
pub mod hybrid_accessor;
pub mod network_monitor;
pub mod offline_service;
pub mod sync_scheduler;

pub use action_queue::ActionQueue;
pub use hybrid_accessor::HybridDataAccessor;
pub use network_monitor::NetworkMonitor;
pub use offline_service::{OfflineDependencies, OfflineService};
pub use sync_scheduler::SyncScheduler;
