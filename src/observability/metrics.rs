//! Metrics registry
//!
//! - Counters only
//! - Monotonic increase
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};

/// Operational counters for one store.
///
/// Relaxed ordering throughout; counters are observational only.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Records assembled from stored documents
    records_read: AtomicU64,
    /// Reads that found no document
    reads_missing: AtomicU64,
    /// Record assemblies aborted by a decode error
    decode_failures: AtomicU64,
    /// Documents written
    writes: AtomicU64,
    /// Puts ignored as neither new nor dirty
    puts_skipped: AtomicU64,
    /// Revision conflicts observed
    conflicts: AtomicU64,
    /// Conflicts cleared by fetch-delete-retry
    conflicts_recovered: AtomicU64,
    /// Documents deleted
    deletes: AtomicU64,
    /// Scans executed
    queries_executed: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_records_read(&self) {
        self.records_read.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_reads_missing(&self) {
        self.reads_missing.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_decode_failures(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_writes(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_puts_skipped(&self) {
        self.puts_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_conflicts(&self) {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_conflicts_recovered(&self) {
        self.conflicts_recovered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_deletes(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_read: self.records_read.load(Ordering::Relaxed),
            reads_missing: self.reads_missing.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            puts_skipped: self.puts_skipped.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            conflicts_recovered: self.conflicts_recovered.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
        }
    }

    /// Get current snapshot of all metrics as JSON
    pub fn to_json(&self) -> String {
        let s = self.snapshot();
        format!(
            r#"{{"records_read":{},"reads_missing":{},"decode_failures":{},"writes":{},"puts_skipped":{},"conflicts":{},"conflicts_recovered":{},"deletes":{},"queries_executed":{}}}"#,
            s.records_read,
            s.reads_missing,
            s.decode_failures,
            s.writes,
            s.puts_skipped,
            s.conflicts,
            s.conflicts_recovered,
            s.deletes,
            s.queries_executed,
        )
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub records_read: u64,
    pub reads_missing: u64,
    pub decode_failures: u64,
    pub writes: u64,
    pub puts_skipped: u64,
    pub conflicts: u64,
    pub conflicts_recovered: u64,
    pub deletes: u64,
    pub queries_executed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        let registry = MetricsRegistry::new();
        assert_eq!(registry.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_increment_counters() {
        let registry = MetricsRegistry::new();

        registry.increment_writes();
        registry.increment_writes();
        registry.increment_conflicts();
        registry.increment_conflicts_recovered();
        registry.increment_puts_skipped();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.writes, 2);
        assert_eq!(snapshot.conflicts, 1);
        assert_eq!(snapshot.conflicts_recovered, 1);
        assert_eq!(snapshot.puts_skipped, 1);
        assert_eq!(snapshot.deletes, 0);
    }

    #[test]
    fn test_to_json_is_valid() {
        let registry = MetricsRegistry::new();
        registry.increment_records_read();

        let parsed: serde_json::Value = serde_json::from_str(&registry.to_json()).unwrap();
        assert_eq!(parsed["records_read"], 1);
        assert_eq!(parsed["writes"], 0);
    }
}
