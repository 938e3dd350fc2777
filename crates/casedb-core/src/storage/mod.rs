//! Backing record store and relationship index.
//!
//! The engine only sees the [`RecordStore`] and [`RelationshipIndex`] traits.
//! [`CaseStore`] and [`CaseIndexTable`] are the sled-backed implementations.

mod case_store;
mod config;
mod record;
mod value_index;

pub mod key;

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::Error;

pub use case_store::{CaseIndexTable, CaseStore};
pub use config::StorageConfig;
pub use record::{CaseIndex, CaseRecord};
pub use value_index::ValueIndex;

/// Unique id of a stored record.
pub type RecordId = u64;

/// Unordered set of record ids.
pub type IdSet = HashSet<RecordId>;

/// Keyed table of records.
pub trait RecordStore: Send + Sync {
    /// All record ids, in the store's native order.
    ///
    /// The order must be stable across calls on an unchanged store.
    fn iterate_ids(&self) -> Result<Vec<RecordId>, Error>;

    /// Ids whose column `names[k]` equals `values[k]` for every `k`.
    fn ids_for_values(&self, names: &[String], values: &[String]) -> Result<IdSet, Error>;
}

/// Secondary index of named relationships.
pub trait RelationshipIndex: Send + Sync {
    /// Ids of records whose `relationship` edge points at `value`.
    fn cases_matching_index(&self, relationship: &str, value: &str) -> Result<IdSet, Error>;
}

impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    fn iterate_ids(&self) -> Result<Vec<RecordId>, Error> {
        (**self).iterate_ids()
    }

    fn ids_for_values(&self, names: &[String], values: &[String]) -> Result<IdSet, Error> {
        (**self).ids_for_values(names, values)
    }
}

impl<T: RelationshipIndex + ?Sized> RelationshipIndex for Arc<T> {
    fn cases_matching_index(&self, relationship: &str, value: &str) -> Result<IdSet, Error> {
        (**self).cases_matching_index(relationship, value)
    }
}
