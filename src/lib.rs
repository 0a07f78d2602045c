//! Offline-first synchronization core for farm record keeping.
//!
//! Mutations made while the remote data service is unavailable are applied
//! to a local store, queued, and replayed by a background scheduler once
//! connectivity returns.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

pub use application::services::{
    ActionQueue, HybridDataAccessor, NetworkMonitor, OfflineDependencies, OfflineService,
    SyncScheduler,
};
pub use domain::entities::{
    DataSource, Farm, IrrigationRecord, LinkInfo, NetworkStatus, OfflineExport, OfflineStats,
    QueueStats, QueuedAction, SyncEntity, SyncReport, WriteOutcome,
};
pub use shared::error::{AppError, Result};
pub use shared::logging::init_logging;
