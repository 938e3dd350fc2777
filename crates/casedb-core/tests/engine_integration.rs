//! Integration tests for the case projection engine.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use casedb_core::{
    CaseIndexTable, CaseInstance, CaseRecord, CaseStore, Error, IdSet, InstanceConfig, Predicate,
    PredicateQueue, PrimingHint, RecordId, RecordStore, RelationshipIndex, StorageConfig,
    TreeReference,
};

struct TestContext {
    engine: CaseInstance<CaseStore, CaseIndexTable>,
    _dir: tempfile::TempDir,
}

impl TestContext {
    fn new(records: &[CaseRecord]) -> Self {
        Self::with_config(records, InstanceConfig::default())
    }

    fn with_config(records: &[CaseRecord], config: InstanceConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = CaseStore::open(StorageConfig::new(dir.path())).unwrap();
        for record in records {
            store.put(record).unwrap();
        }
        let index = store.relationship_index();

        Self {
            engine: CaseInstance::new(store, index, config),
            _dir: dir,
        }
    }

    fn queue(&self, pairs: &[(&str, &str)]) -> PredicateQueue {
        self.engine
            .queue_for(pairs.iter().map(|(k, v)| Predicate::new(*k, *v)))
    }
}

fn household() -> Vec<CaseRecord> {
    vec![
        CaseRecord::new(101)
            .with_column("name", "Bob")
            .with_column("age", "30")
            .with_column("status", "open"),
        CaseRecord::new(102)
            .with_column("name", "Bob")
            .with_column("age", "52")
            .with_column("status", "open")
            .with_index("parent", "H1"),
        CaseRecord::new(103)
            .with_column("name", "Ann")
            .with_column("age", "30")
            .with_column("status", "closed")
            .with_index("parent", "H1"),
        CaseRecord::new(104)
            .with_column("name", "Bob")
            .with_column("age", "30")
            .with_column("status", "open")
            .with_index("parent", "H1")
            .with_index("host", "S9"),
        CaseRecord::new(105)
            .with_column("name", "Cid")
            .with_column("age", "7")
            .with_column("status", "open")
            .with_index("parent", "H2"),
    ]
}

#[test]
fn test_projection_is_contiguous_bijection() {
    let ctx = TestContext::new(&household());
    let projection = ctx.engine.ensure_loaded().unwrap();

    assert_eq!(projection.len(), 5);
    let mut seen = IdSet::new();
    for position in 0..projection.len() {
        let id = projection.id_at(position).unwrap();
        assert_eq!(projection.position_of(id), Some(position));
        assert!(seen.insert(id));
    }
    assert_eq!(seen, IdSet::from([101, 102, 103, 104, 105]));
    assert_eq!(projection.id_at(5), None);
}

#[test]
fn test_empty_store_resolves_empty() {
    let ctx = TestContext::new(&[]);

    assert!(ctx.engine.ensure_loaded().unwrap().is_empty());
    for pairs in [
        vec![],
        vec![("name", "Bob")],
        vec![("case-in-parent", "H1"), ("name", "Bob")],
    ] {
        let mut queue = ctx.queue(&pairs);
        assert!(ctx.engine.resolve_children(&mut queue).unwrap().is_empty());
    }
    assert_eq!(ctx.engine.metrics().snapshot().column_batches, 0);
}

#[test]
fn test_relationship_first_then_column_batch() {
    let ctx = TestContext::new(&household());
    let mut queue = ctx.queue(&[("case-in-parent", "H1"), ("name", "Bob")]);

    let first = ctx.engine.resolve_batch(&mut queue).unwrap();
    assert_eq!(first, IdSet::from([102, 103, 104]));
    assert_eq!(queue.len(), 1);
    assert_eq!(ctx.engine.priming_hint(), None);

    let second = ctx.engine.resolve_batch(&mut queue).unwrap();
    assert_eq!(second, IdSet::from([101, 102, 104]));
    assert!(queue.is_empty());
    assert_eq!(
        ctx.engine.priming_hint(),
        Some(PrimingHint::new(vec!["name".into()], vec!["Bob".into()]))
    );
}

#[test]
fn test_column_run_is_single_batch() {
    let ctx = TestContext::new(&household());
    let mut queue = ctx.queue(&[("name", "Bob"), ("age", "30")]);

    let ids = ctx.engine.resolve_batch(&mut queue).unwrap();
    assert_eq!(ids, IdSet::from([101, 104]));
    assert!(queue.is_empty());

    let hint = ctx.engine.priming_hint().unwrap();
    assert_eq!(hint.names, vec!["name", "age"]);
    assert_eq!(hint.values, vec!["Bob", "30"]);
}

#[test]
fn test_partitioning_does_not_change_result() {
    let ctx = TestContext::new(&household());

    let interleaved = [
        ("name", "Bob"),
        ("case-in-parent", "H1"),
        ("status", "open"),
        ("case-in-host", "S9"),
        ("age", "30"),
    ];
    let grouped = [
        ("case-in-host", "S9"),
        ("case-in-parent", "H1"),
        ("name", "Bob"),
        ("status", "open"),
        ("age", "30"),
    ];

    let a = ctx
        .engine
        .resolve_children(&mut ctx.queue(&interleaved))
        .unwrap();
    let b = ctx.engine.resolve_children(&mut ctx.queue(&grouped)).unwrap();

    assert_eq!(a, IdSet::from([104]));
    assert_eq!(a, b);
}

#[test]
fn test_cacheable_shapes() {
    let ctx = TestContext::new(&household());
    let engine = &ctx.engine;

    let cacheable = TreeReference::parse("/casedb/case[3]").unwrap();
    assert!(engine.is_cacheable(&cacheable));

    for text in [
        "/casedb/case[3][@name='Bob']",
        "casedb/case[3]",
        "/casedb/case",
        "/casedb/case[*]",
    ] {
        let reference = TreeReference::parse(text).unwrap();
        assert!(!engine.is_cacheable(&reference), "{} should not be cacheable", text);
    }
}

#[test]
fn test_cache_key_for_positions() {
    let ctx = TestContext::new(&household());
    let engine = &ctx.engine;

    let third = TreeReference::parse("/casedb/case[3]").unwrap();
    let expected = engine.ensure_loaded().unwrap().id_at(3).unwrap();
    assert_eq!(engine.cache_key_for(&third).unwrap(), Some(expected));
    assert_eq!(expected, 104);

    let tenth = TreeReference::parse("/casedb/case[10]").unwrap();
    assert_eq!(engine.cache_key_for(&tenth).unwrap(), None);
}

#[test]
fn test_cache_key_loads_projection() {
    let ctx = TestContext::new(&household());
    assert_eq!(ctx.engine.metrics().projection_scans(), 0);

    let reference = TreeReference::parse("/casedb/case[0]").unwrap();
    assert_eq!(ctx.engine.cache_key_for(&reference).unwrap(), Some(101));
    assert_eq!(ctx.engine.metrics().projection_scans(), 1);
}

#[test]
fn test_custom_marker_and_names() {
    let config = InstanceConfig::new("ledger", "entry").with_relationship_marker("rel:");
    let ctx = TestContext::with_config(&household(), config);

    let mut queue = ctx.queue(&[("rel:parent", "H1"), ("case-in-parent", "H1")]);
    // Under a custom marker the default one is just a column name
    let ids = ctx.engine.resolve_children(&mut queue).unwrap();
    assert!(ids.is_empty());

    let reference = TreeReference::parse("/LEDGER/Entry[1]").unwrap();
    assert!(ctx.engine.is_cacheable(&reference));
    assert_eq!(ctx.engine.cache_key_for(&reference).unwrap(), Some(102));
}

#[test]
fn test_reference_predicates_drive_resolution() {
    let ctx = TestContext::new(&household());
    let reference =
        TreeReference::parse("/casedb/case[@case-in-parent='H1'][@status='open']").unwrap();

    let mut queue = ctx.engine.queue_for(reference.last_predicates().to_vec());
    let positions = ctx.engine.select_positions(&mut queue).unwrap();
    assert_eq!(positions, vec![1, 3]);
}

/// In-memory store that counts scans and holds each scan open briefly.
struct CountingStore {
    ids: Vec<RecordId>,
    columns: HashMap<RecordId, Vec<(&'static str, &'static str)>>,
    scans: AtomicUsize,
}

impl RecordStore for CountingStore {
    fn iterate_ids(&self) -> Result<Vec<RecordId>, Error> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        Ok(self.ids.clone())
    }

    fn ids_for_values(&self, names: &[String], values: &[String]) -> Result<IdSet, Error> {
        Ok(self
            .columns
            .iter()
            .filter(|(_, cols)| {
                names
                    .iter()
                    .zip(values)
                    .all(|(n, v)| {
                        cols.iter()
                            .any(|&(name, value)| name == n.as_str() && value == v.as_str())
                    })
            })
            .map(|(id, _)| *id)
            .collect())
    }
}

struct NoRelationships;

impl RelationshipIndex for NoRelationships {
    fn cases_matching_index(&self, _: &str, _: &str) -> Result<IdSet, Error> {
        Ok(IdSet::new())
    }
}

#[test]
fn test_concurrent_first_use_scans_once() {
    let store = Arc::new(CountingStore {
        ids: vec![1, 2, 3, 4],
        columns: HashMap::from([
            (1, vec![("kind", "a")]),
            (2, vec![("kind", "b")]),
            (3, vec![("kind", "a")]),
            (4, vec![("kind", "b")]),
        ]),
        scans: AtomicUsize::new(0),
    });
    let engine = Arc::new(CaseInstance::with_defaults(store.clone(), NoRelationships));
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = ["a", "b"]
        .into_iter()
        .map(|kind| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut queue = engine.queue_for([Predicate::new("kind", kind)]);
                barrier.wait();
                let ids = engine.resolve_children(&mut queue).unwrap();
                let projection = engine.ensure_loaded().unwrap();
                assert_eq!(projection.len(), 4);
                ids
            })
        })
        .collect();

    let results: Vec<IdSet> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results[0], IdSet::from([1, 3]));
    assert_eq!(results[1], IdSet::from([2, 4]));
    assert_eq!(store.scans.load(Ordering::SeqCst), 1);
    assert_eq!(engine.metrics().projection_scans(), 1);
}
