//! Validate tool call arguments against a JSON Schema before execution.
//!
//! Covers the subset of JSON Schema that tool parameter declarations use in
//! practice: `type`, `required`, `properties` (recursively), `enum`,
//! `additionalProperties: false`, and `items` for arrays.

use serde_json::Value;

/// Validate tool arguments against a JSON Schema.
///
/// Returns `Ok(())` when valid, `Err(message)` describing the first
/// violation found, naming the offending field by its dotted path.
pub fn validate_arguments(args: &Value, schema: &Value) -> Result<(), String> {
    validate_at(args, schema, "")
}

fn validate_at(value: &Value, schema: &Value, path: &str) -> Result<(), String> {
    if let Some(expected) = schema.get("type").and_then(Value::as_str) {
        if !value_matches_type(value, expected) {
            return Err(if path.is_empty() {
                format!("expected {expected} arguments, got {}", json_type_name(value))
            } else {
                format!(
                    "field '{path}' expected type '{expected}', got {}",
                    json_type_name(value)
                )
            });
        }
    }

    if let Some(allowed) = schema.get("enum").and_then(Value::as_array) {
        if !allowed.contains(value) {
            let choices: Vec<String> = allowed.iter().map(Value::to_string).collect();
            return Err(format!(
                "field '{}' must be one of [{}], got {value}",
                display_path(path),
                choices.join(", ")
            ));
        }
    }

    if let Some(obj) = value.as_object() {
        if let Some(required) = schema.get("required").and_then(Value::as_array) {
            for name in required.iter().filter_map(Value::as_str) {
                if !obj.contains_key(name) {
                    return Err(format!("missing required field '{}'", join(path, name)));
                }
            }
        }

        let properties = schema.get("properties").and_then(Value::as_object);
        let closed = schema.get("additionalProperties") == Some(&Value::Bool(false));

        for (key, field) in obj {
            match properties.and_then(|p| p.get(key)) {
                Some(prop_schema) => validate_at(field, prop_schema, &join(path, key))?,
                None if closed => {
                    return Err(format!("unexpected field '{}'", join(path, key)));
                }
                None => {}
            }
        }
    }

    if let (Some(items), Some(schema_items)) = (value.as_array(), schema.get("items")) {
        for (i, item) in items.iter().enumerate() {
            validate_at(item, schema_items, &format!("{}[{i}]", display_path(path)))?;
        }
    }

    Ok(())
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "arguments" } else { path }
}

fn value_matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
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

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string" },
                "top_k": { "type": "integer" },
                "mode": { "type": "string", "enum": ["fast", "thorough"] },
                "filter": {
                    "type": "object",
                    "properties": { "tag": { "type": "string" } },
                    "required": ["tag"]
                },
                "ids": { "type": "array", "items": { "type": "integer" } }
            },
            "required": ["query"]
        })
    }

    #[test]
    fn valid_arguments_pass() {
        let args = json!({"query": "rust", "top_k": 3, "mode": "fast", "ids": [1, 2]});
        assert!(validate_arguments(&args, &schema()).is_ok());
    }

    #[test]
    fn non_object_arguments_rejected() {
        let err = validate_arguments(&json!("rust"), &schema()).unwrap_err();
        assert_eq!(err, "expected object arguments, got string");
    }

    #[test]
    fn missing_required_field_named() {
        let err = validate_arguments(&json!({"top_k": 3}), &schema()).unwrap_err();
        assert_eq!(err, "missing required field 'query'");
    }

    #[test]
    fn wrong_type_names_field() {
        let err = validate_arguments(&json!({"query": 7}), &schema()).unwrap_err();
        assert_eq!(err, "field 'query' expected type 'string', got number");
    }

    #[test]
    fn float_is_not_an_integer() {
        let err = validate_arguments(&json!({"query": "q", "top_k": 2.5}), &schema()).unwrap_err();
        assert!(err.contains("top_k"));
    }

    #[test]
    fn enum_violation_lists_choices() {
        let err = validate_arguments(&json!({"query": "q", "mode": "slow"}), &schema()).unwrap_err();
        assert!(err.contains("'mode'"));
        assert!(err.contains("\"fast\""));
    }

    #[test]
    fn nested_required_uses_dotted_path() {
        let err = validate_arguments(&json!({"query": "q", "filter": {}}), &schema()).unwrap_err();
        assert_eq!(err, "missing required field 'filter.tag'");
    }

    #[test]
    fn array_items_checked() {
        let err = validate_arguments(&json!({"query": "q", "ids": [1, "two"]}), &schema()).unwrap_err();
        assert_eq!(err, "field 'ids[1]' expected type 'integer', got string");
    }

    #[test]
    fn closed_schema_rejects_unknown_fields() {
        let closed = json!({
            "type": "object",
            "properties": { "a": { "type": "string" } },
            "additionalProperties": false
        });
        let err = validate_arguments(&json!({"a": "x", "b": 1}), &closed).unwrap_err();
        assert_eq!(err, "unexpected field 'b'");
        assert!(validate_arguments(&json!({"a": "x", "b": 1}), &schema()).is_ok());
    }
}
