//! Batch planning over a predicate queue.
//!
//! Each call to [`QueryPlanner::resolve_batch`] consumes a prefix of the
//! queue: either the single relationship predicate at its head, or the
//! maximal run of column predicates before the next relationship predicate.

use tracing::trace;

use crate::cache::BatchSnapshot;
use crate::error::Error;
use crate::metrics::EngineMetrics;
use crate::predicate::{PredicateQueue, RoutedPredicate};
use crate::storage::{IdSet, RecordStore, RelationshipIndex};

/// The next unit of work taken from the head of a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchPlan {
    /// One relationship index lookup.
    Relationship { relationship: String, value: String },
    /// One bulk conjunctive column lookup.
    Columns {
        names: Vec<String>,
        values: Vec<String>,
    },
}

impl BatchPlan {
    /// Plan the next batch without consuming anything.
    ///
    /// Returns `None` for an exhausted queue.
    pub fn next(queue: &PredicateQueue) -> Option<Self> {
        match queue.front()? {
            RoutedPredicate::Relationship {
                relationship,
                value,
            } => Some(BatchPlan::Relationship {
                relationship: relationship.clone(),
                value: value.clone(),
            }),
            RoutedPredicate::Column { .. } => {
                let (names, values) = queue.column_run();
                Some(BatchPlan::Columns { names, values })
            }
        }
    }

    /// Number of predicates this batch consumes.
    pub fn len(&self) -> usize {
        match self {
            BatchPlan::Relationship { .. } => 1,
            BatchPlan::Columns { names, .. } => names.len(),
        }
    }

    /// Check if the batch consumes nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Routes predicate batches to the store or the relationship index.
pub struct QueryPlanner<'a, S: ?Sized, I: ?Sized> {
    store: &'a S,
    index: &'a I,
    snapshot: &'a BatchSnapshot,
    metrics: &'a EngineMetrics,
}

impl<'a, S, I> QueryPlanner<'a, S, I>
where
    S: RecordStore + ?Sized,
    I: RelationshipIndex + ?Sized,
{
    /// Create a planner over one engine instance's collaborators and state.
    pub fn new(
        store: &'a S,
        index: &'a I,
        snapshot: &'a BatchSnapshot,
        metrics: &'a EngineMetrics,
    ) -> Self {
        Self {
            store,
            index,
            snapshot,
            metrics,
        }
    }

    /// Execute the next batch and consume its predicates.
    ///
    /// A relationship batch clears the priming snapshot; a column batch
    /// replaces it. On a store or index error nothing is consumed.
    pub fn resolve_batch(&self, queue: &mut PredicateQueue) -> Result<IdSet, Error> {
        let plan = BatchPlan::next(queue).ok_or(Error::EmptyPredicateQueue)?;
        let consumed = plan.len();

        let ids = match plan {
            BatchPlan::Relationship {
                relationship,
                value,
            } => {
                let ids = self.index.cases_matching_index(&relationship, &value)?;
                self.snapshot.clear();
                self.metrics.record_relationship_lookup();
                trace!(%relationship, matched = ids.len(), "Resolved relationship predicate");
                ids
            }
            BatchPlan::Columns { names, values } => {
                let ids = self.store.ids_for_values(&names, &values)?;
                self.metrics.record_column_batch(consumed as u64);
                trace!(columns = consumed, matched = ids.len(), "Resolved column batch");
                self.snapshot.record(names, values);
                ids
            }
        };

        queue.discard_front(consumed);
        Ok(ids)
    }
}
