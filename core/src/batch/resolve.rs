//! `${task.results[N].field}` substitution in task parameters.
//!
//! Placeholders that cannot be resolved (unknown task, result without a
//! `results` array, index out of range, missing field) are left in place
//! verbatim. Downstream tools are expected to cope with partial data, so
//! this never fails the task.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::module::Params;

use super::store::ResultStore;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{([a-zA-Z_][a-zA-Z0-9_]*)\.results\[(\d+)\]\.([a-zA-Z_][a-zA-Z0-9_]*)\}")
            .expect("placeholder regex is valid")
    })
}

/// Resolve every placeholder in `params`, recursing into objects and arrays.
pub fn resolve_params(params: &Params, store: &ResultStore) -> Params {
    params
        .iter()
        .map(|(k, v)| (k.clone(), resolve_value(v, store)))
        .collect()
}

pub fn resolve_value(value: &Value, store: &ResultStore) -> Value {
    match value {
        Value::String(s) => Value::String(resolve_str(s, store).into_owned()),
        Value::Array(items) => Value::Array(items.iter().map(|v| resolve_value(v, store)).collect()),
        Value::Object(map) => Value::Object(resolve_params(map, store)),
        other => other.clone(),
    }
}

pub fn resolve_str<'a>(input: &'a str, store: &ResultStore) -> Cow<'a, str> {
    if !input.contains("${") {
        return Cow::Borrowed(input);
    }
    placeholder_re().replace_all(input, |caps: &Captures| {
        lookup(&caps[1], &caps[2], &caps[3], store).unwrap_or_else(|| caps[0].to_string())
    })
}

fn lookup(task_id: &str, index: &str, field: &str, store: &ResultStore) -> Option<String> {
    let raw = store.get(task_id)?;
    let index: usize = index.parse().ok()?;

    let parsed: Value = serde_json::from_str(&raw).ok()?;
    let items = match parsed {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("results") {
            Some(Value::Array(items)) => items,
            _ => return None,
        },
        _ => return None,
    };

    let value = items.get(index)?.get(field)?;
    Some(match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn store() -> ResultStore {
        let store = ResultStore::new();
        store.publish("search", r#"[{"id":"page-123","title":"Design","rank":2}]"#);
        store.publish(
            "query",
            r#"{"results":[{"name":"alpha"},{"name":"beta","done":true}],"next":null}"#,
        );
        store.publish("scalar", r#""just text""#);
        store
    }

    #[test]
    fn resolves_bare_array_results() {
        let s = store();
        assert_eq!(resolve_str("${search.results[0].id}", &s), "page-123");
        assert_eq!(resolve_str("${search.results[0].rank}", &s), "2");
    }

    #[test]
    fn resolves_results_field_and_embedded_placeholders() {
        let s = store();
        assert_eq!(
            resolve_str("from ${query.results[0].name} to ${query.results[1].name}!", &s),
            "from alpha to beta!"
        );
        assert_eq!(resolve_str("${query.results[1].done}", &s), "true");
    }

    #[test]
    fn unresolvable_placeholders_are_left_verbatim() {
        let s = store();
        for input in [
            "${search.results[99].id}",
            "${missing.results[0].id}",
            "${search.results[0].nope}",
            "${scalar.results[0].id}",
        ] {
            assert_eq!(resolve_str(input, &s), input);
        }
    }

    #[test]
    fn recurses_into_containers_and_keeps_other_values() {
        let s = store();
        let params = json!({
            "page_id": "${search.results[0].id}",
            "limit": 5,
            "flags": [true, "${query.results[0].name}"],
            "filter": { "title": "${search.results[0].title}", "none": null }
        });
        let resolved = resolve_params(params.as_object().unwrap(), &s);
        assert_eq!(
            Value::Object(resolved),
            json!({
                "page_id": "page-123",
                "limit": 5,
                "flags": [true, "alpha"],
                "filter": { "title": "Design", "none": null }
            })
        );
    }
}
