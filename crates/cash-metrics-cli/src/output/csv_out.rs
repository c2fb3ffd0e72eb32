use serde_json::Value;
use std::io;

use super::flatten_fields;

/// Write output as CSV to stdout.
///
/// Envelopes become `field,value` rows over the flattened result. A result
/// carrying a `daily` series (trend) is written as one row per day instead.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            let result = map.get("result").unwrap_or(value);
            match result {
                Value::Object(res) => {
                    if let Some(Value::Array(daily)) = res.get("daily") {
                        write_array_csv(&mut wtr, daily);
                    } else {
                        let _ = wtr.write_record(["field", "value"]);
                        for (key, val) in flatten_fields(res) {
                            let _ = wtr.write_record([key.as_str(), &format_csv_value(&val)]);
                        }
                    }
                }
                other => {
                    let _ = wtr.write_record([&format_csv_value(other)]);
                }
            }
        }
        Value::Array(arr) => {
            write_array_csv(&mut wtr, arr);
        }
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);

    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
