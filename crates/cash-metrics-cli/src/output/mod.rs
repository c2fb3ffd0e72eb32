pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Flatten nested objects into `parent.child` rows so grouped report
/// sections fit a two-column layout. Arrays stay as single cells.
pub fn flatten_fields(map: &Map<String, Value>) -> Vec<(String, Value)> {
    let mut rows = Vec::new();
    flatten_into("", map, &mut rows);
    rows
}

fn flatten_into(prefix: &str, map: &Map<String, Value>, rows: &mut Vec<(String, Value)>) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) if !inner.is_empty() => flatten_into(&name, inner, rows),
            _ => rows.push((name, val.clone())),
        }
    }
}
