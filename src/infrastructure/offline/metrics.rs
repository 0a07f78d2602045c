use crate::domain::entities::SyncReport;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncRunOutcome {
    Success,
    Partial,
    Failure,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetricsSnapshot {
    pub total_runs: u64,
    pub total_synced: u64,
    pub total_retried: u64,
    pub total_failed: u64,
    pub consecutive_failure: u64,
    pub last_success_ms: Option<u64>,
    pub last_failure_ms: Option<u64>,
    pub last_outcome: Option<SyncRunOutcome>,
    pub last_trigger: Option<String>,
    pub last_attempted: Option<u32>,
    pub last_duration_ms: Option<u64>,
}

#[derive(Default, Clone)]
struct LastRunMetadata {
    outcome: Option<SyncRunOutcome>,
    trigger: Option<String>,
    attempted: Option<u32>,
    duration_ms: Option<u64>,
}

/// Counters for scheduler runs that actually dispatched something.
pub struct SyncMetrics {
    runs: AtomicU64,
    synced: AtomicU64,
    retried: AtomicU64,
    failed: AtomicU64,
    consecutive_failure: AtomicU64,
    last_success_ms: AtomicU64,
    last_failure_ms: AtomicU64,
    metadata: Mutex<LastRunMetadata>,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self {
            runs: AtomicU64::new(0),
            synced: AtomicU64::new(0),
            retried: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            consecutive_failure: AtomicU64::new(0),
            last_success_ms: AtomicU64::new(0),
            last_failure_ms: AtomicU64::new(0),
            metadata: Mutex::new(LastRunMetadata::default()),
        }
    }

    pub fn record(&self, report: &SyncReport, trigger: &str) {
        if report.attempted == 0 {
            return;
        }

        self.runs.fetch_add(1, Ordering::Relaxed);
        self.synced
            .fetch_add(u64::from(report.synced), Ordering::Relaxed);
        self.retried
            .fetch_add(u64::from(report.retried), Ordering::Relaxed);
        self.failed
            .fetch_add(u64::from(report.failed), Ordering::Relaxed);

        let outcome = if report.is_clean() {
            SyncRunOutcome::Success
        } else if report.synced > 0 {
            SyncRunOutcome::Partial
        } else {
            SyncRunOutcome::Failure
        };

        match outcome {
            SyncRunOutcome::Success | SyncRunOutcome::Partial => {
                self.last_success_ms
                    .store(current_unix_ms(), Ordering::Relaxed);
                self.consecutive_failure.store(0, Ordering::Relaxed);
            }
            SyncRunOutcome::Failure => {
                self.last_failure_ms
                    .store(current_unix_ms(), Ordering::Relaxed);
                self.consecutive_failure.fetch_add(1, Ordering::Relaxed);
            }
        }

        let duration_ms = report
            .finished_at
            .signed_duration_since(report.started_at)
            .num_milliseconds()
            .max(0) as u64;

        if let Ok(mut guard) = self.metadata.lock() {
            guard.outcome = Some(outcome);
            guard.trigger = Some(trigger.to_string());
            guard.attempted = Some(report.attempted);
            guard.duration_ms = Some(duration_ms);
        }
    }

    pub fn snapshot(&self) -> SyncMetricsSnapshot {
        let metadata = self
            .metadata
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default();

        SyncMetricsSnapshot {
            total_runs: self.runs.load(Ordering::Relaxed),
            total_synced: self.synced.load(Ordering::Relaxed),
            total_retried: self.retried.load(Ordering::Relaxed),
            total_failed: self.failed.load(Ordering::Relaxed),
            consecutive_failure: self.consecutive_failure.load(Ordering::Relaxed),
            last_success_ms: to_option(self.last_success_ms.load(Ordering::Relaxed)),
            last_failure_ms: to_option(self.last_failure_ms.load(Ordering::Relaxed)),
            last_outcome: metadata.outcome,
            last_trigger: metadata.trigger,
            last_attempted: metadata.attempted,
            last_duration_ms: metadata.duration_ms,
        }
    }
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn to_option(value: u64) -> Option<u64> {
    if value == 0 {
        None
    } else {
        Some(value)
    }
}

fn current_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn report(attempted: u32, synced: u32, retried: u32) -> SyncReport {
        let mut report = SyncReport::empty(Utc::now());
        report.attempted = attempted;
        report.synced = synced;
        report.retried = retried;
        report
    }

    #[test]
    fn record_success_and_failure() {
        let metrics = SyncMetrics::new();

        metrics.record(&report(2, 2, 0), "timer");
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_runs, 1);
        assert_eq!(snapshot.total_synced, 2);
        assert_eq!(snapshot.last_outcome, Some(SyncRunOutcome::Success));
        assert_eq!(snapshot.last_trigger.as_deref(), Some("timer"));

        metrics.record(&report(1, 0, 1), "reconnect");
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_runs, 2);
        assert_eq!(snapshot.total_retried, 1);
        assert_eq!(snapshot.consecutive_failure, 1);
        assert_eq!(snapshot.last_outcome, Some(SyncRunOutcome::Failure));
        assert!(snapshot.last_failure_ms.is_some());
    }

    #[test]
    fn empty_runs_are_not_counted() {
        let metrics = SyncMetrics::new();
        metrics.record(&report(0, 0, 0), "timer");
        assert_eq!(metrics.snapshot().total_runs, 0);
        assert!(metrics.snapshot().last_outcome.is_none());
    }
}
