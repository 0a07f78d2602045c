pub mod farm;
pub mod network_status;
pub mod offline_snapshot;
pub mod queued_action;
pub mod sync_entity;
pub mod sync_report;
pub mod write_outcome;

pub use farm::{Farm, IrrigationRecord};
pub use network_status::{ConnectivityEvent, LinkInfo, NetworkStatus};
pub use offline_snapshot::{OfflineExport, OfflineStats};
pub use queued_action::{QueueStats, QueuedAction, QueuedActionDraft};
pub use sync_entity::SyncEntity;
pub use sync_report::SyncReport;
pub use write_outcome::{DataSource, WriteOutcome};
