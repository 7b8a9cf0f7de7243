//! Parameter validation against a tool's declared input schema.
//!
//! Only the subset of JSON schema that tool declarations actually use is
//! understood: `properties` with `type`, `enum` and `default`, the
//! top-level `required` list and `additionalProperties: false`. Scalars are
//! coerced where the intent is unambiguous (`"5"` for an integer field,
//! `"true"` for a boolean field) so callers can send loosely typed input.

use serde_json::{Map, Number, Value};

use crate::error::ValidationError;
use crate::module::Params;

/// Validate `params` against `schema`, returning the normalized parameters.
pub fn validate_params(schema: &Value, params: &Params) -> Result<Params, ValidationError> {
    let Some(schema) = schema.as_object() else {
        return Ok(params.clone());
    };

    let empty = Map::new();
    let properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let mut normalized = Params::new();
    for (key, value) in params {
        match properties.get(key) {
            Some(prop) => {
                normalized.insert(key.clone(), check_property(key, prop, value)?);
            }
            None if schema.get("additionalProperties") == Some(&Value::Bool(false)) => {
                return Err(ValidationError::UnknownParameter(key.clone()));
            }
            None => {
                normalized.insert(key.clone(), value.clone());
            }
        }
    }

    for (key, prop) in properties {
        if normalized.contains_key(key) {
            continue;
        }
        if let Some(default) = prop.get("default") {
            normalized.insert(key.clone(), default.clone());
        }
    }

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            match normalized.get(name) {
                None | Some(Value::Null) => {
                    return Err(ValidationError::MissingRequired(name.to_string()))
                }
                Some(_) => {}
            }
        }
    }

    Ok(normalized)
}

fn check_property(key: &str, prop: &Value, value: &Value) -> Result<Value, ValidationError> {
    let value = match prop.get("type").and_then(Value::as_str) {
        Some(expected) => coerce(key, expected, value)?,
        None => value.clone(),
    };

    if let Some(allowed) = prop.get("enum").and_then(Value::as_array) {
        if !allowed.contains(&value) {
            return Err(ValidationError::NotInEnum {
                field: key.to_string(),
                allowed: Value::Array(allowed.clone()).to_string(),
            });
        }
    }

    Ok(value)
}

fn coerce(key: &str, expected: &str, value: &Value) -> Result<Value, ValidationError> {
    let coerced = match (expected, value) {
        (_, Value::Null) => Some(Value::Null),
        ("string", Value::String(_)) => Some(value.clone()),
        ("string", Value::Number(n)) => Some(Value::String(n.to_string())),
        ("string", Value::Bool(b)) => Some(Value::String(b.to_string())),
        ("number", Value::Number(_)) => Some(value.clone()),
        ("number", Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        ("integer", Value::Number(n)) if n.is_i64() || n.is_u64() => Some(value.clone()),
        ("integer", Value::Number(n)) => n
            .as_f64()
            .filter(|f| f.fract() == 0.0)
            .map(|f| Value::from(f as i64)),
        ("integer", Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
        ("boolean", Value::Bool(_)) => Some(value.clone()),
        ("boolean", Value::String(s)) => match s.trim() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        ("array", Value::Array(_)) => Some(value.clone()),
        ("object", Value::Object(_)) => Some(value.clone()),
        // Unknown schema types are not enforced.
        (other, _)
            if !matches!(
                other,
                "string" | "number" | "integer" | "boolean" | "array" | "object"
            ) =>
        {
            Some(value.clone())
        }
        _ => None,
    };

    coerced.ok_or_else(|| ValidationError::TypeMismatch {
        field: key.to_string(),
        expected: expected.to_string(),
        actual: type_name(value).to_string(),
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(v: Value) -> Params {
        v.as_object().cloned().unwrap()
    }

    fn schema() -> Value {
        json!({
            "type": "object",
            "required": ["query"],
            "properties": {
                "query": { "type": "string" },
                "limit": { "type": "integer", "default": 10 },
                "archived": { "type": "boolean" },
                "sort": { "type": "string", "enum": ["asc", "desc"] }
            }
        })
    }

    #[test]
    fn missing_required_is_rejected() {
        let err = validate_params(&schema(), &params(json!({ "limit": 3 }))).unwrap_err();
        assert_eq!(err, ValidationError::MissingRequired("query".into()));
        assert_eq!(err.to_string(), "missing required parameter 'query'");
    }

    #[test]
    fn coerces_loosely_typed_scalars_and_fills_defaults() {
        let out = validate_params(
            &schema(),
            &params(json!({ "query": "design", "archived": "false" })),
        )
        .unwrap();
        assert_eq!(out["limit"], json!(10));
        assert_eq!(out["archived"], json!(false));

        let out = validate_params(&schema(), &params(json!({ "query": 42, "limit": "7" })))
            .unwrap();
        assert_eq!(out["query"], json!("42"));
        assert_eq!(out["limit"], json!(7));
    }

    #[test]
    fn type_mismatch_names_field() {
        let err = validate_params(&schema(), &params(json!({ "query": "x", "limit": "many" })))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "parameter 'limit' must be of type integer, got string"
        );
    }

    #[test]
    fn enum_and_additional_properties() {
        let err = validate_params(&schema(), &params(json!({ "query": "x", "sort": "up" })))
            .unwrap_err();
        assert!(matches!(err, ValidationError::NotInEnum { .. }));

        let strict = json!({ "properties": { "a": {} }, "additionalProperties": false });
        let err = validate_params(&strict, &params(json!({ "b": 1 }))).unwrap_err();
        assert_eq!(err, ValidationError::UnknownParameter("b".into()));

        let out = validate_params(&schema(), &params(json!({ "query": "x", "extra": [1] })));
        tokio_test::assert_ok!(out);
    }
}
