//! Lazy id <-> position projection of the backing store.

use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::metrics::EngineMetrics;
use crate::storage::{IdSet, RecordId, RecordStore};

/// Immutable mapping between record ids and child positions.
///
/// Positions are dense: `0..len()` in backing-store iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    /// position -> id
    ids: Vec<RecordId>,
    /// id -> position
    positions: HashMap<RecordId, usize>,
}

impl Projection {
    /// Assign positions to `ids` in iteration order.
    ///
    /// A repeated id keeps its first position so the two maps stay inverse.
    pub fn build<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = RecordId>,
    {
        let iter = ids.into_iter();
        let (lower, _) = iter.size_hint();
        let mut projection = Self {
            ids: Vec::with_capacity(lower),
            positions: HashMap::with_capacity(lower),
        };

        for id in iter {
            if projection.positions.contains_key(&id) {
                warn!(id, "Backing store yielded a duplicate id; keeping first position");
                continue;
            }
            projection.positions.insert(id, projection.ids.len());
            projection.ids.push(id);
        }

        projection
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if the collection has no children.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Id of the child at `position`.
    pub fn id_at(&self, position: usize) -> Option<RecordId> {
        self.ids.get(position).copied()
    }

    /// Position of the child with `id`.
    pub fn position_of(&self, id: RecordId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    /// Check if `id` is projected.
    pub fn contains(&self, id: RecordId) -> bool {
        self.positions.contains_key(&id)
    }

    /// All ids in position order.
    pub fn ids(&self) -> &[RecordId] {
        &self.ids
    }

    /// All ids as a set (the full scan).
    pub fn id_set(&self) -> IdSet {
        self.ids.iter().copied().collect()
    }
}

/// Builds a [`Projection`] at most once.
///
/// Concurrent first callers are serialized on a per-instance load guard so
/// exactly one scan runs; later reads go straight to the populated cell.
#[derive(Debug, Default)]
pub struct ProjectionLoader {
    loaded: OnceLock<Projection>,
    guard: Mutex<()>,
}

impl ProjectionLoader {
    /// Create an unpopulated loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the projection has been built.
    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    /// The projection, if built.
    pub fn get(&self) -> Option<&Projection> {
        self.loaded.get()
    }

    /// Return the projection, scanning `store` first if needed.
    ///
    /// A failed scan leaves the loader empty, so the call can be retried.
    pub fn ensure_loaded<S>(&self, store: &S, metrics: &EngineMetrics) -> Result<&Projection, Error>
    where
        S: RecordStore + ?Sized,
    {
        if let Some(projection) = self.loaded.get() {
            return Ok(projection);
        }

        let _guard = self.guard.lock();
        if let Some(projection) = self.loaded.get() {
            return Ok(projection);
        }

        debug!("Scanning backing store for projection");
        let started = Instant::now();
        let projection = Projection::build(store.iterate_ids()?);

        metrics.record_scan(projection.len() as u64);
        info!(
            records = projection.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Projection loaded"
        );

        Ok(self.loaded.get_or_init(|| projection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FixedStore(Vec<RecordId>);

    impl RecordStore for FixedStore {
        fn iterate_ids(&self) -> Result<Vec<RecordId>, Error> {
            Ok(self.0.clone())
        }

        fn ids_for_values(&self, _: &[String], _: &[String]) -> Result<IdSet, Error> {
            Ok(IdSet::new())
        }
    }

    /// Fails the first scan, succeeds afterwards.
    struct FlakyStore {
        failed: AtomicBool,
    }

    impl RecordStore for FlakyStore {
        fn iterate_ids(&self) -> Result<Vec<RecordId>, Error> {
            if !self.failed.swap(true, Ordering::SeqCst) {
                return Err(Error::Backend("disk unavailable".into()));
            }
            Ok(vec![10, 20])
        }

        fn ids_for_values(&self, _: &[String], _: &[String]) -> Result<IdSet, Error> {
            Ok(IdSet::new())
        }
    }

    #[test]
    fn test_build_is_bijective() {
        let projection = Projection::build(vec![42, 7, 19]);
        assert_eq!(projection.len(), 3);
        for position in 0..projection.len() {
            let id = projection.id_at(position).unwrap();
            assert_eq!(projection.position_of(id), Some(position));
        }
        assert_eq!(projection.id_at(0), Some(42));
        assert_eq!(projection.id_at(3), None);
        assert_eq!(projection.position_of(99), None);
    }

    #[test]
    fn test_build_skips_duplicates() {
        let projection = Projection::build(vec![5, 6, 5, 7]);
        assert_eq!(projection.ids(), &[5, 6, 7]);
        assert_eq!(projection.position_of(7), Some(2));
    }

    #[test]
    fn test_empty_store() {
        let loader = ProjectionLoader::new();
        let metrics = EngineMetrics::new();
        let projection = loader.ensure_loaded(&FixedStore(vec![]), &metrics).unwrap();
        assert!(projection.is_empty());
        assert!(loader.is_loaded());
        assert_eq!(metrics.projection_scans(), 1);
    }

    #[test]
    fn test_loads_once() {
        let loader = ProjectionLoader::new();
        let metrics = EngineMetrics::new();
        let store = FixedStore(vec![1, 2, 3]);

        loader.ensure_loaded(&store, &metrics).unwrap();
        loader.ensure_loaded(&store, &metrics).unwrap();

        assert_eq!(metrics.projection_scans(), 1);
        assert_eq!(loader.get().unwrap().ids(), &[1, 2, 3]);
    }

    #[test]
    fn test_failed_scan_can_be_retried() {
        let loader = ProjectionLoader::new();
        let metrics = EngineMetrics::new();
        let store = FlakyStore {
            failed: AtomicBool::new(false),
        };

        assert!(loader.ensure_loaded(&store, &metrics).is_err());
        assert!(!loader.is_loaded());
        assert_eq!(metrics.projection_scans(), 0);

        let projection = loader.ensure_loaded(&store, &metrics).unwrap();
        assert_eq!(projection.ids(), &[10, 20]);
        assert_eq!(metrics.projection_scans(), 1);
    }
}
