//! Engine counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one engine instance.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    projection_scans: AtomicU64,
    projected_records: AtomicU64,
    column_batches: AtomicU64,
    column_predicates: AtomicU64,
    relationship_lookups: AtomicU64,
    cache_key_lookups: AtomicU64,
    cache_key_misses: AtomicU64,
}

/// Point-in-time copy of [`EngineMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Completed backing-store scans (at most one per instance).
    pub projection_scans: u64,
    /// Records assigned a position by the scan.
    pub projected_records: u64,
    /// Bulk column lookups executed.
    pub column_batches: u64,
    /// Column predicates consumed across all batches.
    pub column_predicates: u64,
    /// Relationship index lookups executed.
    pub relationship_lookups: u64,
    /// Cache key requests.
    pub cache_key_lookups: u64,
    /// Cache key requests that found no mapping.
    pub cache_key_misses: u64,
}

impl EngineMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed projection scan.
    pub fn record_scan(&self, records: u64) {
        self.projection_scans.fetch_add(1, Ordering::Relaxed);
        self.projected_records.fetch_add(records, Ordering::Relaxed);
    }

    /// Record a bulk column lookup of `predicates` columns.
    pub fn record_column_batch(&self, predicates: u64) {
        self.column_batches.fetch_add(1, Ordering::Relaxed);
        self.column_predicates.fetch_add(predicates, Ordering::Relaxed);
    }

    /// Record a relationship index lookup.
    pub fn record_relationship_lookup(&self) {
        self.relationship_lookups.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cache key request and whether it resolved.
    pub fn record_cache_key(&self, hit: bool) {
        self.cache_key_lookups.fetch_add(1, Ordering::Relaxed);
        if !hit {
            self.cache_key_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Number of completed projection scans.
    pub fn projection_scans(&self) -> u64 {
        self.projection_scans.load(Ordering::Relaxed)
    }

    /// Copy the current values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            projection_scans: self.projection_scans.load(Ordering::Relaxed),
            projected_records: self.projected_records.load(Ordering::Relaxed),
            column_batches: self.column_batches.load(Ordering::Relaxed),
            column_predicates: self.column_predicates.load(Ordering::Relaxed),
            relationship_lookups: self.relationship_lookups.load(Ordering::Relaxed),
            cache_key_lookups: self.cache_key_lookups.load(Ordering::Relaxed),
            cache_key_misses: self.cache_key_misses.load(Ordering::Relaxed),
        }
    }

    /// Export to Prometheus text format.
    pub fn to_prometheus(&self) -> String {
        let s = self.snapshot();
        let mut out = String::new();

        let counters = [
            ("casedb_projection_scans_total", "Backing store scans", s.projection_scans),
            ("casedb_projected_records_total", "Records given a position", s.projected_records),
            ("casedb_column_batches_total", "Bulk column lookups", s.column_batches),
            ("casedb_column_predicates_total", "Column predicates consumed", s.column_predicates),
            ("casedb_relationship_lookups_total", "Relationship index lookups", s.relationship_lookups),
            ("casedb_cache_key_lookups_total", "Cache key requests", s.cache_key_lookups),
            ("casedb_cache_key_misses_total", "Cache key requests without a mapping", s.cache_key_misses),
        ];

        for (name, help, value) in counters {
            out.push_str(&format!("# HELP {} {}\n", name, help));
            out.push_str(&format!("# TYPE {} counter\n", name));
            out.push_str(&format!("{} {}\n", name, value));
        }

        out
    }
}
