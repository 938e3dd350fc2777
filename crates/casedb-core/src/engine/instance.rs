//! The engine instance for one collection node.

use tracing::debug;

use super::projection::{Projection, ProjectionLoader};
use crate::cache::{self, BatchSnapshot, PrimingHint};
use crate::config::InstanceConfig;
use crate::error::Error;
use crate::metrics::EngineMetrics;
use crate::predicate::{Predicate, PredicateQueue};
use crate::query::{intersect, QueryPlanner};
use crate::reference::TreeReference;
use crate::storage::{IdSet, RecordId, RecordStore, RelationshipIndex};
use crate::tree::{CacheHost, ChildResolver};

/// Projects a case store into an ordered collection of children.
///
/// One instance serves one collection node for one query or session. The
/// projection, the priming snapshot and the counters all live and die with
/// the instance.
pub struct CaseInstance<S, I> {
    config: InstanceConfig,
    store: S,
    index: I,
    projection: ProjectionLoader,
    snapshot: BatchSnapshot,
    metrics: EngineMetrics,
}

impl<S, I> CaseInstance<S, I>
where
    S: RecordStore,
    I: RelationshipIndex,
{
    /// Create an instance over a store and its relationship index.
    pub fn new(store: S, index: I, config: InstanceConfig) -> Self {
        debug!(
            collection = %config.collection_name,
            item = %config.item_name,
            report_mode = config.report_mode,
            "Created case instance"
        );

        Self {
            config,
            store,
            index,
            projection: ProjectionLoader::new(),
            snapshot: BatchSnapshot::new(),
            metrics: EngineMetrics::new(),
        }
    }

    /// Create an instance with the default collection names and marker.
    pub fn with_defaults(store: S, index: I) -> Self {
        Self::new(store, index, InstanceConfig::default())
    }

    /// Instance configuration.
    pub fn config(&self) -> &InstanceConfig {
        &self.config
    }

    /// Instance counters.
    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Build the id <-> position projection if it has not been built yet.
    pub fn ensure_loaded(&self) -> Result<&Projection, Error> {
        self.projection.ensure_loaded(&self.store, &self.metrics)
    }

    /// Decode raw predicates using this instance's relationship marker.
    pub fn queue_for<P>(&self, predicates: P) -> PredicateQueue
    where
        P: IntoIterator<Item = Predicate>,
    {
        PredicateQueue::decode(predicates, &self.config.relationship_marker)
    }

    /// Execute the next batch of `queue` and consume its predicates.
    ///
    /// Calling this with an empty queue is a caller error and yields
    /// [`Error::EmptyPredicateQueue`].
    pub fn resolve_batch(&self, queue: &mut PredicateQueue) -> Result<IdSet, Error> {
        self.planner().resolve_batch(queue)
    }

    /// Ids of the children matching every predicate in `queue`.
    ///
    /// Starts from the full scan and narrows it batch by batch. Once the
    /// running set is empty no lookup can add to it, so resolution stops and
    /// the remaining predicates stay in the queue. An empty store resolves to
    /// an empty set without consulting the store or index.
    pub fn resolve_children(&self, queue: &mut PredicateQueue) -> Result<IdSet, Error> {
        let projection = self.ensure_loaded()?;
        if projection.is_empty() {
            return Ok(IdSet::new());
        }

        let planner = self.planner();
        let mut selected: Option<IdSet> = None;

        while !queue.is_empty() {
            let matched = planner.resolve_batch(queue)?;
            let narrowed = match selected {
                Some(current) => intersect(&current, &matched),
                None => matched,
            };

            if narrowed.is_empty() {
                return Ok(narrowed);
            }
            selected = Some(narrowed);
        }

        Ok(match selected {
            Some(ids) => ids.into_iter().filter(|id| projection.contains(*id)).collect(),
            None => projection.id_set(),
        })
    }

    /// Positions of the matching children, ascending.
    pub fn select_positions(&self, queue: &mut PredicateQueue) -> Result<Vec<usize>, Error> {
        let ids = self.resolve_children(queue)?;
        let projection = self.ensure_loaded()?;

        let mut positions: Vec<usize> = ids
            .into_iter()
            .filter_map(|id| projection.position_of(id))
            .collect();
        positions.sort_unstable();
        Ok(positions)
    }

    /// Check if `reference` is a bare pointer to one child of this collection.
    pub fn is_cacheable(&self, reference: &TreeReference) -> bool {
        cache::is_cacheable(reference, &self.config)
    }

    /// Backing id of the child addressed by `reference`'s item segment.
    ///
    /// Does not check [`is_cacheable`](Self::is_cacheable); callers gate on
    /// it first. A missing or unbound item position, or a position past the
    /// end of the collection, yields `None`.
    pub fn cache_key_for(&self, reference: &TreeReference) -> Result<Option<RecordId>, Error> {
        let projection = self.ensure_loaded()?;
        let id = cache::item_position(reference).and_then(|p| projection.id_at(p));
        self.metrics.record_cache_key(id.is_some());
        Ok(id)
    }

    /// The last executed column batch, if the most recent resolution was one.
    pub fn priming_hint(&self) -> Option<PrimingHint> {
        self.snapshot.get()
    }

    fn planner(&self) -> QueryPlanner<'_, S, I> {
        QueryPlanner::new(&self.store, &self.index, &self.snapshot, &self.metrics)
    }
}

impl<S, I> ChildResolver for CaseInstance<S, I>
where
    S: RecordStore,
    I: RelationshipIndex,
{
    fn resolve_children(&self, queue: &mut PredicateQueue) -> Result<IdSet, Error> {
        CaseInstance::resolve_children(self, queue)
    }

    fn child_count(&self) -> Result<usize, Error> {
        Ok(self.ensure_loaded()?.len())
    }

    fn child_id(&self, position: usize) -> Result<Option<RecordId>, Error> {
        Ok(self.ensure_loaded()?.id_at(position))
    }

    fn child_position(&self, id: RecordId) -> Result<Option<usize>, Error> {
        Ok(self.ensure_loaded()?.position_of(id))
    }
}

impl<S, I> CacheHost for CaseInstance<S, I>
where
    S: RecordStore,
    I: RelationshipIndex,
{
    fn is_reference_cacheable(&self, reference: &TreeReference) -> bool {
        self.is_cacheable(reference)
    }

    fn cache_index(&self, reference: &TreeReference) -> Result<Option<RecordId>, Error> {
        self.cache_key_for(reference)
    }

    fn cache_prime_guess(&self) -> Option<PrimingHint> {
        self.priming_hint()
    }
}
