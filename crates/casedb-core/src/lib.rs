//! casedb Core - Tree projection and index-accelerated child resolution.
//!
//! This crate projects a flat, keyed case store into an ordered collection
//! that a path evaluator can address by position, resolves predicate-based
//! child selection through the store's column index or a relationship index,
//! and exposes hooks for an external reference cache.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod predicate;
pub mod query;
pub mod reference;
pub mod storage;
pub mod tree;

pub use cache::{is_cacheable, PrimingHint};
pub use config::InstanceConfig;
pub use engine::{CaseInstance, Projection};
pub use error::{Error, Result};
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use predicate::{Predicate, PredicateQueue, RoutedPredicate};
pub use query::intersect;
pub use reference::{Multiplicity, PathSegment, TreeReference};
pub use storage::{
    CaseIndex, CaseIndexTable, CaseRecord, CaseStore, IdSet, RecordId, RecordStore,
    RelationshipIndex, StorageConfig,
};
pub use tree::{CacheHost, ChildResolver};
