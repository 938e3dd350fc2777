//! Engine instance configuration.

use serde::{Deserialize, Serialize};

/// Default name of the collection node (first reference segment).
pub const DEFAULT_COLLECTION_NAME: &str = "casedb";

/// Default name of an item under the collection (second reference segment).
pub const DEFAULT_ITEM_NAME: &str = "case";

/// Default key prefix that routes a predicate to the relationship index.
pub const DEFAULT_RELATIONSHIP_MARKER: &str = "case-in-";

/// Configuration for one engine instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    /// Name of the collection node, matched case-insensitively.
    pub collection_name: String,

    /// Name of each item under the collection, matched case-insensitively.
    pub item_name: String,

    /// Predicate keys starting with this marker are relationship lookups.
    pub relationship_marker: String,

    /// Whether the instance serves a report (read-only, no form context).
    pub report_mode: bool,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            collection_name: DEFAULT_COLLECTION_NAME.to_string(),
            item_name: DEFAULT_ITEM_NAME.to_string(),
            relationship_marker: DEFAULT_RELATIONSHIP_MARKER.to_string(),
            report_mode: false,
        }
    }
}

impl InstanceConfig {
    /// Create a configuration for a differently named collection.
    pub fn new(collection_name: impl Into<String>, item_name: impl Into<String>) -> Self {
        Self {
            collection_name: collection_name.into(),
            item_name: item_name.into(),
            ..Default::default()
        }
    }

    /// Set the relationship marker.
    pub fn with_relationship_marker(mut self, marker: impl Into<String>) -> Self {
        self.relationship_marker = marker.into();
        self
    }

    /// Set report mode.
    pub fn report_mode(mut self, report_mode: bool) -> Self {
        self.report_mode = report_mode;
        self
    }
}
