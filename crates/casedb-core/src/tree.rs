//! Capabilities a projected collection offers to the path evaluator.

use crate::cache::PrimingHint;
use crate::error::Error;
use crate::predicate::PredicateQueue;
use crate::reference::TreeReference;
use crate::storage::{IdSet, RecordId};

/// Resolves the children of a collection node.
pub trait ChildResolver {
    /// Ids of the children matching every predicate in `queue`.
    fn resolve_children(&self, queue: &mut PredicateQueue) -> Result<IdSet, Error>;

    /// Number of children.
    fn child_count(&self) -> Result<usize, Error>;

    /// Id of the child at `position`.
    fn child_id(&self, position: usize) -> Result<Option<RecordId>, Error>;

    /// Position of the child with `id`.
    fn child_position(&self, id: RecordId) -> Result<Option<usize>, Error>;
}

/// Lets an external cache memoize and prime single-reference lookups.
pub trait CacheHost {
    /// Check if `reference` has a shape the cache may key on.
    fn is_reference_cacheable(&self, reference: &TreeReference) -> bool;

    /// Backing id for a cacheable reference.
    fn cache_index(&self, reference: &TreeReference) -> Result<Option<RecordId>, Error>;

    /// Most recent column batch, if the last resolution produced one.
    fn cache_prime_guess(&self) -> Option<PrimingHint>;
}
