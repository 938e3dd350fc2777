//! sled-backed case store and relationship index.

use std::collections::HashSet;

use sled::{Db, Tree};
use tracing::debug;

use super::key::{decode_id, encode_id};
use super::value_index::{ValueIndex, COLUMN_INDEX_TREE, RELATIONSHIP_INDEX_TREE};
use super::{CaseRecord, IdSet, RecordId, RecordStore, RelationshipIndex, StorageConfig};
use crate::error::Error;

/// Tree name for case data.
const DATA_TREE: &str = "cases";

/// Durable table of cases with a column equality index.
///
/// Every write keeps the column index and the relationship index in step with
/// the stored record. Clones share the same database.
#[derive(Clone)]
pub struct CaseStore {
    /// The underlying sled database.
    db: Db,

    /// Tree for case data (id -> record).
    data_tree: Tree,

    /// Column equality index.
    columns: ValueIndex,

    /// Relationship index.
    relationships: CaseIndexTable,
}

impl CaseStore {
    /// Open or create a case store with the given configuration.
    pub fn open(config: StorageConfig) -> Result<Self, Error> {
        let db = config.to_sled_config().open()?;
        let data_tree = db.open_tree(DATA_TREE)?;
        let columns = ValueIndex::open(&db, COLUMN_INDEX_TREE)?;
        let relationships = CaseIndexTable::open(&db)?;

        Ok(Self {
            db,
            data_tree,
            columns,
            relationships,
        })
    }

    /// Handle to the relationship index backed by this store.
    pub fn relationship_index(&self) -> CaseIndexTable {
        self.relationships.clone()
    }

    /// Insert or replace a case.
    pub fn put(&self, record: &CaseRecord) -> Result<(), Error> {
        if let Some(previous) = self.get(record.id)? {
            self.unindex(&previous)?;
        }

        self.data_tree.insert(encode_id(record.id), record.to_bytes()?)?;

        for (name, value) in &record.columns {
            self.columns.insert(name, value, record.id)?;
        }
        self.relationships.index_case(record)?;

        debug!(id = record.id, columns = record.columns.len(), "Stored case");
        Ok(())
    }

    /// Get a case by id.
    pub fn get(&self, id: RecordId) -> Result<Option<CaseRecord>, Error> {
        match self.data_tree.get(encode_id(id))? {
            Some(bytes) => Ok(Some(CaseRecord::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Remove a case. Returns whether it existed.
    pub fn remove(&self, id: RecordId) -> Result<bool, Error> {
        match self.get(id)? {
            Some(previous) => {
                self.unindex(&previous)?;
                self.data_tree.remove(encode_id(id))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Number of stored cases.
    pub fn len(&self) -> usize {
        self.data_tree.len()
    }

    /// Check if the store holds no cases.
    pub fn is_empty(&self) -> bool {
        self.data_tree.is_empty()
    }

    /// Flush all trees to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.db.flush()?;
        Ok(())
    }

    fn unindex(&self, record: &CaseRecord) -> Result<(), Error> {
        for (name, value) in &record.columns {
            self.columns.remove(name, value, record.id)?;
        }
        self.relationships.unindex_case(record)
    }
}

impl RecordStore for CaseStore {
    fn iterate_ids(&self) -> Result<Vec<RecordId>, Error> {
        self.data_tree
            .iter()
            .keys()
            .map(|key| decode_id(&key?).ok_or(Error::InvalidKey))
            .collect()
    }

    fn ids_for_values(&self, names: &[String], values: &[String]) -> Result<IdSet, Error> {
        self.columns.lookup_all(names, values)
    }
}

/// Relationship index: `(relationship name, target) -> case ids`.
#[derive(Clone)]
pub struct CaseIndexTable {
    index: ValueIndex,
}

impl CaseIndexTable {
    /// Open or create the relationship index in `db`.
    pub fn open(db: &Db) -> Result<Self, Error> {
        Ok(Self {
            index: ValueIndex::open(db, RELATIONSHIP_INDEX_TREE)?,
        })
    }

    /// Index every relationship edge of a case.
    pub fn index_case(&self, record: &CaseRecord) -> Result<(), Error> {
        for edge in &record.indices {
            self.index.insert(&edge.name, &edge.target, record.id)?;
        }
        Ok(())
    }

    /// Remove every relationship edge of a case.
    pub fn unindex_case(&self, record: &CaseRecord) -> Result<(), Error> {
        for edge in &record.indices {
            self.index.remove(&edge.name, &edge.target, record.id)?;
        }
        Ok(())
    }
}

impl RelationshipIndex for CaseIndexTable {
    fn cases_matching_index(&self, relationship: &str, value: &str) -> Result<HashSet<RecordId>, Error> {
        self.index.lookup(relationship, value)
    }
}
