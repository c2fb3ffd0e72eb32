use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::flatten_fields;

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => print_result_table(result, map),
            None => print_field_table(map),
        },
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) => {
            // Per-entity credit and the daily trend series read better as
            // their own tables.
            let mut scalars = res_map.clone();
            let per_entity = take_array(&mut scalars, "per_entity");
            let daily = take_array(&mut scalars, "daily");

            print_field_table(&scalars);
            if let Some(rows) = per_entity {
                println!("\nPer entity:");
                print_array_table(&rows);
            }
            if let Some(rows) = daily {
                println!("\nDaily net flow:");
                print_array_table(&rows);
            }
        }
        other => println!("{}", format_value(other)),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// Remove a top-level array, or one nested in a report section.
fn take_array(map: &mut Map<String, Value>, key: &str) -> Option<Vec<Value>> {
    if let Some(Value::Array(rows)) = map.remove(key) {
        return Some(rows);
    }
    for section in map.values_mut() {
        if let Value::Object(inner) = section {
            if let Some(Value::Array(rows)) = inner.remove(key) {
                return Some(rows);
            }
        }
    }
    None
}

fn print_field_table(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in flatten_fields(map) {
        builder.push_record([key, format_value(&val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
