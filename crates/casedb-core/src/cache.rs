//! Cache hooks for single-reference lookups.
//!
//! An external caching layer memoizes references of the form
//! `/casedb/case[n]` by the backing id they resolve to, and primes itself
//! from the most recent bulk column lookup.

use parking_lot::Mutex;

use crate::config::InstanceConfig;
use crate::reference::{Multiplicity, TreeReference};

/// The most recent column batch, as parallel name/value lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimingHint {
    pub names: Vec<String>,
    pub values: Vec<String>,
}

impl PrimingHint {
    /// Create a hint from parallel lists.
    pub fn new(names: Vec<String>, values: Vec<String>) -> Self {
        Self { names, values }
    }

    /// Iterate over `(name, value)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }
}

/// Last-batch snapshot owned by one engine instance.
///
/// The lock only guards the swap of the stored hint; it is never held
/// across a store or index call.
#[derive(Debug, Default)]
pub struct BatchSnapshot {
    last: Mutex<Option<PrimingHint>>,
}

impl BatchSnapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot with a freshly executed column batch.
    pub fn record(&self, names: Vec<String>, values: Vec<String>) {
        *self.last.lock() = Some(PrimingHint::new(names, values));
    }

    /// Forget the snapshot; relationship lookups are not useful primers.
    pub fn clear(&self) {
        *self.last.lock() = None;
    }

    /// Current snapshot, if the last resolution was a column batch.
    pub fn get(&self) -> Option<PrimingHint> {
        self.last.lock().clone()
    }
}

/// Check if `reference` is a bare pointer to one child of the collection.
///
/// True only for an absolute, predicate-free, two-segment reference whose
/// segment names match the configured collection and item names (ignoring
/// ASCII case) and whose item segment has a concrete position.
pub fn is_cacheable(reference: &TreeReference, config: &InstanceConfig) -> bool {
    if !reference.is_absolute() || reference.has_predicates() || reference.size() != 2 {
        return false;
    }

    let names_match = matches!(
        (reference.name(0), reference.name(1)),
        (Some(collection), Some(item))
            if collection.eq_ignore_ascii_case(&config.collection_name)
                && item.eq_ignore_ascii_case(&config.item_name)
    );

    names_match && matches!(reference.multiplicity(1), Some(Multiplicity::Position(_)))
}

/// Position addressed by the item segment, without any shape check.
pub fn item_position(reference: &TreeReference) -> Option<usize> {
    reference.multiplicity(1).and_then(Multiplicity::position)
}
