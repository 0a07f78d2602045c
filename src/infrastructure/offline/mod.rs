pub mod metrics;

pub use metrics::{SyncMetrics, SyncMetricsSnapshot, SyncRunOutcome};
