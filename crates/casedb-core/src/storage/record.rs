//! Case record stored in the backing store.

use rkyv::{Archive, Deserialize, Serialize};

use super::RecordId;
use crate::error::Error;

/// A named relationship edge from a case to a target value.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct CaseIndex {
    /// Relationship name, e.g. `parent`.
    pub name: String,

    /// Value the relationship points at, usually another case's identifier.
    pub target: String,
}

impl CaseIndex {
    /// Create a new relationship edge.
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
        }
    }
}

/// A stored case.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Unique record id.
    pub id: RecordId,

    /// Equality-queryable columns as `(name, value)` pairs.
    pub columns: Vec<(String, String)>,

    /// Relationship edges, materialized in the relationship index.
    pub indices: Vec<CaseIndex>,
}

impl CaseRecord {
    /// Create an empty record.
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            columns: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Set a column value, replacing any previous value for that column.
    pub fn with_column(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.columns.push((name, value)),
        }
        self
    }

    /// Add a relationship edge.
    pub fn with_index(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.indices.push(CaseIndex::new(name, target));
        self
    }

    /// Value of a column.
    pub fn column(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Serialize the record to bytes using rkyv.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a record from bytes using rkyv.
    ///
    /// sled hands out values with arbitrary alignment, so the bytes are copied
    /// into an aligned buffer before validation.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let mut aligned = rkyv::util::AlignedVec::<16>::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(&aligned)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}
