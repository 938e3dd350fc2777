//! Output formatters for command results.

use std::collections::BTreeSet;

use casedb_core::{CaseRecord, PrimingHint, RecordId};
use clap::ValueEnum;
use comfy_table::{Cell, Table};
use serde_json::json;

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// A resolved child: its position in the collection and its record.
pub struct CaseRow {
    pub position: usize,
    pub record: CaseRecord,
}

/// Trait for formatting output.
pub trait Formatter {
    /// Format resolved children.
    fn format_cases(&self, rows: &[CaseRow]) -> String;

    /// Format the priming hint left by the last resolution.
    fn format_hint(&self, hint: Option<&PrimingHint>) -> String;

    /// Format a cache key lookup.
    fn format_cache_key(&self, reference: &str, cacheable: bool, id: Option<RecordId>) -> String;

    /// Format a simple message.
    fn format_message(&self, message: &str) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_cases(&self, rows: &[CaseRow]) -> String {
        if rows.is_empty() {
            return "No results".to_string();
        }

        // Union of column names, sorted for a stable header
        let columns: BTreeSet<&str> = rows
            .iter()
            .flat_map(|row| row.record.columns.iter().map(|(name, _)| name.as_str()))
            .collect();

        let mut table = Table::new();
        let mut headers = vec![Cell::new("position"), Cell::new("id")];
        headers.extend(columns.iter().map(Cell::new));
        table.set_header(headers);

        for row in rows {
            let mut cells = vec![Cell::new(row.position), Cell::new(row.record.id)];
            cells.extend(
                columns
                    .iter()
                    .map(|name| Cell::new(row.record.column(name).unwrap_or(""))),
            );
            table.add_row(cells);
        }

        format!("{}\n{} row(s)", table, rows.len())
    }

    fn format_hint(&self, hint: Option<&PrimingHint>) -> String {
        match hint {
            Some(hint) => {
                let pairs: Vec<String> = hint
                    .pairs()
                    .map(|(name, value)| format!("{}='{}'", name, value))
                    .collect();
                format!("Priming hint: {}", pairs.join(", "))
            }
            None => "Priming hint: none".to_string(),
        }
    }

    fn format_cache_key(&self, reference: &str, cacheable: bool, id: Option<RecordId>) -> String {
        let id = id.map(|id| id.to_string()).unwrap_or_else(|| "none".to_string());
        format!("{}: cacheable={}, id={}", reference, cacheable, id)
    }

    fn format_message(&self, message: &str) -> String {
        message.to_string()
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_cases(&self, rows: &[CaseRow]) -> String {
        let rows: Vec<serde_json::Value> = rows
            .iter()
            .map(|row| {
                let columns: serde_json::Map<String, serde_json::Value> = row
                    .record
                    .columns
                    .iter()
                    .map(|(name, value)| (name.clone(), json!(value)))
                    .collect();
                json!({
                    "position": row.position,
                    "id": row.record.id,
                    "columns": columns,
                })
            })
            .collect();

        serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_hint(&self, hint: Option<&PrimingHint>) -> String {
        match hint {
            Some(hint) => json!({ "names": hint.names, "values": hint.values }).to_string(),
            None => json!(null).to_string(),
        }
    }

    fn format_cache_key(&self, reference: &str, cacheable: bool, id: Option<RecordId>) -> String {
        json!({
            "reference": reference,
            "cacheable": cacheable,
            "id": id,
        })
        .to_string()
    }

    fn format_message(&self, message: &str) -> String {
        json!({ "message": message }).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<CaseRow> {
        vec![
            CaseRow {
                position: 0,
                record: CaseRecord::new(7).with_column("name", "Bob"),
            },
            CaseRow {
                position: 2,
                record: CaseRecord::new(9).with_column("age", "30"),
            },
        ]
    }

    #[test]
    fn test_table_lists_all_columns() {
        let output = TableFormatter.format_cases(&rows());
        assert!(output.contains("name"));
        assert!(output.contains("age"));
        assert!(output.ends_with("2 row(s)"));
        assert_eq!(TableFormatter.format_cases(&[]), "No results");
    }

    #[test]
    fn test_json_cases() {
        let output = JsonFormatter.format_cases(&rows());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["id"], 7);
        assert_eq!(value[1]["position"], 2);
        assert_eq!(value[1]["columns"]["age"], "30");
    }

    #[test]
    fn test_hint_formats() {
        let hint = PrimingHint::new(vec!["name".into()], vec!["Bob".into()]);
        assert_eq!(
            TableFormatter.format_hint(Some(&hint)),
            "Priming hint: name='Bob'"
        );
        assert_eq!(TableFormatter.format_hint(None), "Priming hint: none");
        assert_eq!(JsonFormatter.format_hint(None), "null");
    }

    #[test]
    fn test_cache_key_formats() {
        assert_eq!(
            TableFormatter.format_cache_key("/casedb/case[1]", true, Some(9)),
            "/casedb/case[1]: cacheable=true, id=9"
        );
        let value: serde_json::Value =
            serde_json::from_str(&JsonFormatter.format_cache_key("x", false, None)).unwrap();
        assert_eq!(value["cacheable"], false);
        assert!(value["id"].is_null());
    }
}
