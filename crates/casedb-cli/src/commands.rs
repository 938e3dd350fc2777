//! Subcommand implementations.

use std::collections::BTreeMap;
use std::path::Path;

use casedb_core::{
    CaseInstance, CaseRecord, CaseStore, InstanceConfig, RecordId, TreeReference,
};
use serde::Deserialize;
use tracing::info;

use crate::error::CliError;
use crate::formatter::{CaseRow, Formatter};

/// One case as read from an import file.
#[derive(Debug, Deserialize)]
pub struct CaseInput {
    pub id: RecordId,
    #[serde(default)]
    pub columns: BTreeMap<String, String>,
    #[serde(default)]
    pub indices: BTreeMap<String, String>,
}

impl From<CaseInput> for CaseRecord {
    fn from(input: CaseInput) -> Self {
        let record = input
            .columns
            .into_iter()
            .fold(CaseRecord::new(input.id), |r, (name, value)| {
                r.with_column(name, value)
            });
        input
            .indices
            .into_iter()
            .fold(record, |r, (name, target)| r.with_index(name, target))
    }
}

/// Load cases from a JSON array file into the store.
pub fn import(store: &CaseStore, file: &Path, formatter: &dyn Formatter) -> Result<String, CliError> {
    let content = std::fs::read_to_string(file)?;
    let cases: Vec<CaseInput> = serde_json::from_str(&content)?;
    let count = cases.len();

    for case in cases {
        store.put(&CaseRecord::from(case))?;
    }
    store.flush()?;

    info!(count, file = %file.display(), "Imported cases");
    Ok(formatter.format_message(&format!("Imported {} case(s)", count)))
}

/// Resolve the children selected by a reference's final predicates.
pub fn query(
    store: CaseStore,
    config: InstanceConfig,
    reference: &str,
    formatter: &dyn Formatter,
) -> Result<String, CliError> {
    let reference = TreeReference::parse(reference)?;
    let lookup = store.clone();
    let index = store.relationship_index();
    let engine = CaseInstance::new(store, index, config);

    let mut queue = engine.queue_for(reference.last_predicates().to_vec());
    let positions = engine.select_positions(&mut queue)?;
    let projection = engine.ensure_loaded()?;

    let mut rows = Vec::with_capacity(positions.len());
    for position in positions {
        let Some(id) = projection.id_at(position) else {
            continue;
        };
        if let Some(record) = lookup.get(id)? {
            rows.push(CaseRow { position, record });
        }
    }

    Ok(format!(
        "{}\n{}",
        formatter.format_cases(&rows),
        formatter.format_hint(engine.priming_hint().as_ref())
    ))
}

/// Report whether a reference is cacheable and the id it resolves to.
pub fn cache_key(
    store: CaseStore,
    config: InstanceConfig,
    text: &str,
    formatter: &dyn Formatter,
) -> Result<String, CliError> {
    let reference = TreeReference::parse(text)?;
    let index = store.relationship_index();
    let engine = CaseInstance::new(store, index, config);

    let cacheable = engine.is_cacheable(&reference);
    let id = if cacheable {
        engine.cache_key_for(&reference)?
    } else {
        None
    };

    Ok(formatter.format_cache_key(text, cacheable, id))
}

/// Project the store once and print the engine counters.
pub fn stats(store: CaseStore, config: InstanceConfig) -> Result<String, CliError> {
    let index = store.relationship_index();
    let engine = CaseInstance::new(store, index, config);
    engine.ensure_loaded()?;
    Ok(engine.metrics().to_prometheus())
}
