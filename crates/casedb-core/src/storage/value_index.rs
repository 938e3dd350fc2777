//! Equality index over `(name, value)` pairs.
//!
//! Used for both column values and relationship edges. Each entry maps an
//! encoded `(name, value)` key to the packed list of record ids carrying it.

use std::collections::HashSet;

use sled::{Db, Tree};

use super::key::{decode_id_list, encode_id_list, index_key};
use super::RecordId;
use crate::error::Error;

/// Tree name for column equality entries.
pub const COLUMN_INDEX_TREE: &str = "index:column";

/// Tree name for relationship entries.
pub const RELATIONSHIP_INDEX_TREE: &str = "index:relationship";

/// A sled-backed `(name, value) -> ids` index.
#[derive(Clone)]
pub struct ValueIndex {
    tree: Tree,
}

impl ValueIndex {
    /// Open or create the index stored in `tree_name`.
    pub fn open(db: &Db, tree_name: &str) -> Result<Self, Error> {
        Ok(Self {
            tree: db.open_tree(tree_name)?,
        })
    }

    /// Add `id` under `(name, value)`. Adding an id twice is a no-op.
    pub fn insert(&self, name: &str, value: &str, id: RecordId) -> Result<(), Error> {
        let key = index_key(name, value);
        self.tree.fetch_and_update(key, |existing| {
            let mut ids = existing.map(decode_id_list).unwrap_or_default();
            if !ids.contains(&id) {
                ids.push(id);
            }
            Some(encode_id_list(&ids))
        })?;
        Ok(())
    }

    /// Remove `id` from `(name, value)`, dropping the entry once it is empty.
    pub fn remove(&self, name: &str, value: &str, id: RecordId) -> Result<(), Error> {
        let key = index_key(name, value);
        self.tree.fetch_and_update(key, |existing| {
            let mut ids = existing.map(decode_id_list)?;
            ids.retain(|existing_id| *existing_id != id);
            if ids.is_empty() {
                None
            } else {
                Some(encode_id_list(&ids))
            }
        })?;
        Ok(())
    }

    /// All ids stored under `(name, value)`. Empty when nothing matches.
    pub fn lookup(&self, name: &str, value: &str) -> Result<HashSet<RecordId>, Error> {
        match self.tree.get(index_key(name, value))? {
            Some(bytes) => Ok(decode_id_list(&bytes).into_iter().collect()),
            None => Ok(HashSet::new()),
        }
    }

    /// Ids matching every `(names[k], values[k])` pair.
    ///
    /// Lookups run smallest-first so the running set shrinks as early as
    /// possible; the result does not depend on the order.
    pub fn lookup_all(&self, names: &[String], values: &[String]) -> Result<HashSet<RecordId>, Error> {
        let mut sets = names
            .iter()
            .zip(values)
            .map(|(name, value)| self.lookup(name, value))
            .collect::<Result<Vec<_>, Error>>()?;
        sets.sort_by_key(|s| s.len());

        let mut sets = sets.into_iter();
        let mut result = match sets.next() {
            Some(first) => first,
            None => return Ok(HashSet::new()),
        };
        for set in sets {
            if result.is_empty() {
                break;
            }
            result.retain(|id| set.contains(id));
        }
        Ok(result)
    }

    /// Number of distinct `(name, value)` entries.
    pub fn entry_count(&self) -> usize {
        self.tree.len()
    }
}
