// Synchronization metrics module
//
// Provides lightweight counters for monitoring generator runs and parses

use crate::services::generator::GeneratorExit;
use crate::services::reconcile::ReconcileReport;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Counters collected by the controller
///
/// Uses atomic operations for thread-safe metric tracking without locks.
/// The summary is logged on shutdown.
#[derive(Debug)]
pub struct SyncMetrics {
    /// Generator processes started
    pub invocations: AtomicUsize,

    /// Generator runs that exited with a non-zero code
    pub invocations_failed: AtomicUsize,

    /// Generator runs that ended without an exit code
    pub invocations_crashed: AtomicUsize,

    /// Total generator run time in milliseconds
    pub total_invocation_time_ms: AtomicU64,

    /// Successful metadata parses
    pub parses: AtomicUsize,

    /// Missing or malformed metadata documents
    pub parse_failures: AtomicUsize,

    pub files_added: AtomicUsize,
    pub files_removed: AtomicUsize,

    start_time: Instant,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self {
            invocations: AtomicUsize::new(0),
            invocations_failed: AtomicUsize::new(0),
            invocations_crashed: AtomicUsize::new(0),
            total_invocation_time_ms: AtomicU64::new(0),
            parses: AtomicUsize::new(0),
            parse_failures: AtomicUsize::new(0),
            files_added: AtomicUsize::new(0),
            files_removed: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_invocation(&self) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record how a generator run ended and how long it took
    pub fn record_exit(&self, exit: GeneratorExit, duration: Duration) {
        match exit {
            GeneratorExit::Success => {}
            GeneratorExit::Failed(_) => {
                self.invocations_failed.fetch_add(1, Ordering::Relaxed);
            }
            GeneratorExit::Crashed => {
                self.invocations_crashed.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.total_invocation_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_parse(&self, report: &ReconcileReport) {
        self.parses.fetch_add(1, Ordering::Relaxed);
        self.files_added.fetch_add(report.added.len(), Ordering::Relaxed);
        self.files_removed.fetch_add(report.removed.len(), Ordering::Relaxed);
    }

    pub fn record_parse_failure(&self) {
        self.parse_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average generator run time in milliseconds
    pub fn avg_invocation_time_ms(&self) -> f64 {
        let total = self.total_invocation_time_ms.load(Ordering::Relaxed);
        let count = self.invocations.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Synchronization Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Generator runs: {} started, {} failed, {} crashed (avg: {:.2}ms)",
            self.invocations.load(Ordering::Relaxed),
            self.invocations_failed.load(Ordering::Relaxed),
            self.invocations_crashed.load(Ordering::Relaxed),
            self.avg_invocation_time_ms()
        );
        tracing::info!(
            "Parses: {} ok, {} failed",
            self.parses.load(Ordering::Relaxed),
            self.parse_failures.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Files: {} added, {} removed",
            self.files_added.load(Ordering::Relaxed),
            self.files_removed.load(Ordering::Relaxed)
        );
    }
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new()
    }
}
