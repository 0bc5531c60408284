//! Schema validation helpers for Gambit JSON5 configuration.

use crate::ConfigError;
use serde_json::{Map, Value};

/// Validate a single config layer against the schema.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    ensure_allowed_keys(
        map,
        &["$schema", "model", "memory", "session", "agents"],
        layer,
        "",
    )?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = map.get("model") {
        validate_model(value, layer, "model")?;
    }
    if let Some(value) = map.get("memory") {
        validate_memory(value, layer, "memory")?;
    }
    if let Some(value) = map.get("session") {
        validate_session(value, layer, "session")?;
    }
    if let Some(value) = map.get("agents") {
        let arr = expect_array(value, layer, "agents")?;
        for (idx, entry) in arr.iter().enumerate() {
            validate_agent(entry, layer, &format!("agents[{idx}]"))?;
        }
    }

    Ok(())
}

/// Validate the "model" block.
fn validate_model(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["endpoint", "api_key", "model"], layer, path)?;

    if let Some(value) = map.get("endpoint") {
        expect_string(value, layer, &join_path(path, "endpoint"))?;
    }
    if let Some(value) = map.get("api_key") {
        expect_optional_string(value, layer, &join_path(path, "api_key"))?;
    }
    if let Some(value) = map.get("model") {
        expect_string(value, layer, &join_path(path, "model"))?;
    }
    Ok(())
}

/// Validate the "memory" block.
fn validate_memory(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["recent_n", "export_dir"], layer, path)?;

    if let Some(value) = map.get("recent_n")
        && !value.is_null()
    {
        expect_u64(value, layer, &join_path(path, "recent_n"))?;
    }
    if let Some(value) = map.get("export_dir") {
        expect_optional_string(value, layer, &join_path(path, "export_dir"))?;
    }
    Ok(())
}

/// Validate the "session" block.
fn validate_session(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["max_turns", "opening_prompt"], layer, path)?;

    if let Some(value) = map.get("max_turns") {
        expect_u64(value, layer, &join_path(path, "max_turns"))?;
    }
    if let Some(value) = map.get("opening_prompt") {
        expect_string(value, layer, &join_path(path, "opening_prompt"))?;
    }
    Ok(())
}

/// Validate a single agent definition.
fn validate_agent(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["name", "kind", "sys_prompt"], layer, path)?;

    let name_path = join_path(path, "name");
    let Some(name_value) = map.get("name") else {
        return Err(invalid_field(layer, &name_path, "missing required field"));
    };
    expect_string(name_value, layer, &name_path)?;

    if let Some(value) = map.get("kind") {
        let kind_path = join_path(path, "kind");
        match value.as_str() {
            Some("model" | "human") => {}
            Some(_) => {
                return Err(invalid_field(
                    layer,
                    &kind_path,
                    "expected one of: model, human",
                ));
            }
            None => return Err(invalid_field(layer, &kind_path, "expected string")),
        }
    }
    if let Some(value) = map.get("sys_prompt") {
        expect_optional_string(value, layer, &join_path(path, "sys_prompt"))?;
    }
    Ok(())
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(layer, path, "expected object")),
    }
}

/// Expect a JSON array or return a typed error.
fn expect_array<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Vec<Value>, ConfigError> {
    match value {
        Value::Array(arr) => Ok(arr),
        _ => Err(invalid_field(layer, path, "expected array")),
    }
}

fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_string() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string"))
    }
}

fn expect_optional_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_string() || value.is_null() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string or null"))
    }
}

fn expect_u64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_u64() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected non-negative integer"))
    }
}

/// Ensure an object contains only allowed keys.
fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    for key in map.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(invalid_field(layer, &join_path(path, key), "unknown key"));
        }
    }
    Ok(())
}

/// Join nested paths for better error messages.
fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Build a structured invalid-field error.
fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let normalized_path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{normalized_path}"),
        message: message.to_string(),
    }
}
