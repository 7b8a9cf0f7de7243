//! Generic compact rendering of tool results.
//!
//! A list of flat records (a bare JSON array, or an object carrying a
//! `results` array) becomes CSV with one header row built from the keys in
//! first-seen order. A single object becomes `key: value` lines. Anything
//! else has no compact form.

use serde_json::{Map, Value};

pub fn to_compact(json: &str) -> Option<String> {
    let value: Value = serde_json::from_str(json).ok()?;
    match value {
        Value::Array(items) => records_to_csv(&items),
        Value::Object(obj) => match obj.get("results") {
            Some(Value::Array(items)) => records_to_csv(items),
            _ => Some(object_to_lines(&obj)),
        },
        _ => None,
    }
}

fn records_to_csv(items: &[Value]) -> Option<String> {
    if items.is_empty() {
        return None;
    }

    let mut header: Vec<&str> = Vec::new();
    for item in items {
        let obj = item.as_object()?;
        for key in obj.keys() {
            if !header.contains(&key.as_str()) {
                header.push(key);
            }
        }
    }

    let mut out = String::new();
    push_row(&mut out, header.iter().map(|h| escape_csv(h)));
    for item in items {
        let obj = item.as_object()?;
        push_row(
            &mut out,
            header
                .iter()
                .map(|key| escape_csv(&cell(obj.get(*key).unwrap_or(&Value::Null)))),
        );
    }
    Some(out)
}

fn object_to_lines(obj: &Map<String, Value>) -> String {
    obj.iter()
        .map(|(k, v)| format!("{k}: {}", cell(v)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_row(out: &mut String, cells: impl Iterator<Item = String>) {
    let row: Vec<String> = cells.collect();
    out.push_str(&row.join(","));
    out.push('\n');
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
