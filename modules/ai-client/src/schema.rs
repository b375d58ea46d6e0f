use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Types a model can be asked to produce.
///
/// Blanket-implemented for anything that is `JsonSchema + DeserializeOwned`.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Fully inlined JSON schema for strict structured-output modes.
    ///
    /// Strict modes (Mistral `json_schema`, OpenAI-compatible endpoints) want:
    /// 1. `additionalProperties: false` on every object
    /// 2. every property listed in `required`, nullable ones included
    /// 3. no `$ref` indirection
    ///
    /// Numeric ranges and string lengths declared via `#[schemars(...)]` are kept.
    fn strict_schema() -> Value {
        let root = schema_for!(Self);
        let mut value = serde_json::to_value(root).unwrap_or_default();

        let definitions = match &mut value {
            Value::Object(map) => {
                map.remove("$schema");
                map.remove("definitions")
            }
            _ => None,
        }
        .unwrap_or(Value::Null);

        normalize(&mut value, &definitions);
        value
    }

    /// Schema name as providers accept it: ASCII alphanumerics and underscores.
    fn wire_name() -> String {
        <Self as JsonSchema>::schema_name()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

fn normalize(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            let ref_name = map
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(|path| path.strip_prefix("#/definitions/"))
                .map(str::to_owned);
            if let Some(def) = ref_name.and_then(|name| definitions.get(&name)) {
                *value = def.clone();
                normalize(value, definitions);
                return;
            }

            // schemars wraps documented `$ref`s in a single-element allOf
            if let Some(Value::Array(all_of)) = map.get("allOf") {
                if all_of.len() == 1 {
                    let mut inner = all_of[0].clone();
                    normalize(&mut inner, definitions);
                    *value = inner;
                    return;
                }
            }

            if map.get("type").and_then(Value::as_str) == Some("object") {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
                if let Some(Value::Object(props)) = map.get("properties") {
                    let keys = props.keys().cloned().map(Value::String).collect();
                    map.insert("required".to_string(), Value::Array(keys));
                }
            }

            for child in map.values_mut() {
                normalize(child, definitions);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                normalize(item, definitions);
            }
        }
        _ => {}
    }
}
