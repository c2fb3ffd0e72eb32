use serde_json::Value;

/// Headline figure per command, in priority order. Nested report sections
/// are searched one level down after the top-level keys.
const PRIORITY_KEYS: [&str; 7] = [
    "ccc",
    "efficiency_pct",
    "trend_value",
    "total",
    "net_forecast",
    "net_flow",
    "projection",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        // The liquidity report leads with its funding alert.
        if let Some(alert) = map.get("funding_alert") {
            println!("{}", format_alert(alert));
            return;
        }

        let sections = map.values().filter_map(Value::as_object);
        for candidate in std::iter::once(map).chain(sections) {
            if let Some(val) = find_priority(candidate) {
                println!("{}", format_minimal(val));
                return;
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn find_priority(map: &serde_json::Map<String, Value>) -> Option<&Value> {
    PRIORITY_KEYS
        .iter()
        .filter_map(|key| map.get(*key))
        .find(|val| !val.is_null())
}

fn format_alert(alert: &Value) -> String {
    let level = alert.get("level").and_then(Value::as_str).unwrap_or("unknown");
    match alert.get("days") {
        Some(days) => format!("{level} ({} days)", format_minimal(days)),
        None => level.to_string(),
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}={}", format_minimal(v)))
            .collect::<Vec<_>>()
            .join(" "),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
