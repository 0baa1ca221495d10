// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Derivation of [`Parameter`] trees from JSON-Schema documents.
//!
//! Hosts describe their argument types as JSON Schema (hand-written or
//! emitted by a schema-deriving macro); this module walks that document and
//! produces the equivalent [`Parameter`].  `$ref` pointers are resolved
//! against `#/$defs/...` and `#/definitions/...`.  A reference that is
//! already on the current resolution path is a cycle and fails with
//! [`SchemaError::CyclicReference`] — the entry is removed on return, so
//! sibling fields referencing the same definition do not false-positive.

use std::collections::HashSet;

use serde_json::Value;

use crate::{Parameter, ParameterType, SchemaError};

impl Parameter {
    /// Derive a parameter tree from a JSON-Schema document.
    pub fn from_json_schema(schema: &Value) -> Result<Parameter, SchemaError> {
        let mut path = HashSet::new();
        walk(schema, schema, "$", &mut path)
    }
}

fn walk(
    root: &Value,
    node: &Value,
    name: &str,
    path: &mut HashSet<String>,
) -> Result<Parameter, SchemaError> {
    // Pointer indirection: unwrap the reference before reading keywords.
    if let Some(reference) = node.get("$ref").and_then(Value::as_str) {
        if !path.insert(reference.to_string()) {
            return Err(SchemaError::CyclicReference {
                reference: reference.to_string(),
            });
        }
        let target = resolve_ref(root, reference).ok_or_else(|| SchemaError::InvalidParameter {
            name: name.to_string(),
            reason: format!("unresolvable $ref `{reference}`"),
        })?;
        let out = walk(root, target, name, path);
        path.remove(reference);
        return out;
    }

    let obj = match node {
        Value::Object(o) => o,
        other => {
            return Err(SchemaError::UnsupportedKind {
                name: name.to_string(),
                kind: format!("{other}"),
            })
        }
    };

    let type_str = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| SchemaError::UnsupportedKind {
            name: name.to_string(),
            kind: "untyped".into(),
        })?;
    let param_type = match type_str {
        "string" => ParameterType::String,
        "number" => ParameterType::Number,
        "integer" => ParameterType::Integer,
        "boolean" => ParameterType::Boolean,
        "array" => ParameterType::Array,
        "object" => ParameterType::Object,
        other => {
            return Err(SchemaError::UnsupportedKind {
                name: name.to_string(),
                kind: other.to_string(),
            })
        }
    };

    let mut p = Parameter::of_type(param_type);
    p.description = obj
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string);
    if let Some(values) = obj.get("enum").and_then(Value::as_array) {
        for v in values {
            match v.as_str() {
                Some(s) => p.enum_values.push(s.to_string()),
                None => {
                    return Err(SchemaError::InvalidParameter {
                        name: name.to_string(),
                        reason: format!("enum value {v} is not a string"),
                    })
                }
            }
        }
    }
    p.minimum = obj.get("minimum").and_then(Value::as_f64);
    p.maximum = obj.get("maximum").and_then(Value::as_f64);
    p.min_length = obj
        .get("minLength")
        .and_then(Value::as_u64)
        .map(|v| v as usize);
    p.max_length = obj
        .get("maxLength")
        .and_then(Value::as_u64)
        .map(|v| v as usize);
    p.pattern = obj
        .get("pattern")
        .and_then(Value::as_str)
        .map(str::to_string);
    p.min_items = obj
        .get("minItems")
        .and_then(Value::as_u64)
        .map(|v| v as usize);
    p.max_items = obj
        .get("maxItems")
        .and_then(Value::as_u64)
        .map(|v| v as usize);
    p.default = obj.get("default").cloned();

    if let Some(props) = obj.get("properties").and_then(Value::as_object) {
        for (key, prop_schema) in props {
            // A literal `false` schema is the ignore marker: the field exists
            // on the host type but must not appear in the derived parameters.
            if prop_schema == &Value::Bool(false) {
                continue;
            }
            let child = walk(root, prop_schema, &format!("{name}.{key}"), path)?;
            p.properties.insert(key.clone(), child);
        }
    }
    if let Some(required) = obj.get("required").and_then(Value::as_array) {
        for r in required {
            let key = r.as_str().unwrap_or_default();
            match p.properties.get_mut(key) {
                Some(child) => child.required = true,
                None => {
                    return Err(SchemaError::InvalidParameter {
                        name: name.to_string(),
                        reason: format!("required field `{key}` is not declared"),
                    })
                }
            }
        }
    }
    if let Some(items) = obj.get("items") {
        let child = walk(root, items, &format!("{name}[]"), path)?;
        p.items = Some(Box::new(child));
    }

    Ok(p)
}

/// Resolve `#/$defs/Name` or `#/definitions/Name` against the document root.
fn resolve_ref<'a>(root: &'a Value, reference: &str) -> Option<&'a Value> {
    let pointer = reference.strip_prefix('#')?;
    root.pointer(pointer)
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn derives_flat_object() {
        let schema = json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "search text" },
                "limit": { "type": "integer", "minimum": 1, "maximum": 100 }
            },
            "required": ["query"]
        });
        let p = Parameter::from_json_schema(&schema).unwrap();
        assert_eq!(p.param_type, Some(ParameterType::Object));
        let query = &p.properties["query"];
        assert!(query.required);
        assert_eq!(query.description.as_deref(), Some("search text"));
        let limit = &p.properties["limit"];
        assert!(!limit.required);
        assert_eq!(limit.minimum, Some(1.0));
        assert_eq!(limit.maximum, Some(100.0));
    }

    #[test]
    fn derives_string_constraints() {
        let schema = json!({
            "type": "string",
            "enum": ["red", "green"],
            "minLength": 1,
            "maxLength": 16,
            "pattern": "^[a-z]+$",
            "default": "red"
        });
        let p = Parameter::from_json_schema(&schema).unwrap();
        assert_eq!(p.enum_values, vec!["red", "green"]);
        assert_eq!(p.min_length, Some(1));
        assert_eq!(p.max_length, Some(16));
        assert_eq!(p.pattern.as_deref(), Some("^[a-z]+$"));
        assert_eq!(p.default, Some(json!("red")));
    }

    #[test]
    fn derives_array_with_bounds() {
        let schema = json!({
            "type": "array",
            "items": { "type": "number" },
            "minItems": 1,
            "maxItems": 4
        });
        let p = Parameter::from_json_schema(&schema).unwrap();
        assert_eq!(p.min_items, Some(1));
        assert_eq!(p.max_items, Some(4));
        assert_eq!(
            p.items.as_ref().unwrap().param_type,
            Some(ParameterType::Number)
        );
    }

    #[test]
    fn resolves_defs_reference() {
        let schema = json!({
            "type": "object",
            "properties": {
                "point": { "$ref": "#/$defs/Point" }
            },
            "$defs": {
                "Point": {
                    "type": "object",
                    "properties": {
                        "x": { "type": "number" },
                        "y": { "type": "number" }
                    }
                }
            }
        });
        let p = Parameter::from_json_schema(&schema).unwrap();
        let point = &p.properties["point"];
        assert_eq!(point.param_type, Some(ParameterType::Object));
        assert!(point.properties.contains_key("x"));
    }

    #[test]
    fn cyclic_reference_is_detected_not_hung() {
        let schema = json!({
            "type": "object",
            "properties": {
                "node": { "$ref": "#/$defs/Node" }
            },
            "$defs": {
                "Node": {
                    "type": "object",
                    "properties": {
                        "next": { "$ref": "#/$defs/Node" }
                    }
                }
            }
        });
        match Parameter::from_json_schema(&schema) {
            Err(SchemaError::CyclicReference { reference }) => {
                assert_eq!(reference, "#/$defs/Node");
            }
            other => panic!("expected cyclic reference error, got {other:?}"),
        }
    }

    #[test]
    fn sibling_refs_to_same_definition_are_not_a_cycle() {
        let schema = json!({
            "type": "object",
            "properties": {
                "from": { "$ref": "#/definitions/Point" },
                "to": { "$ref": "#/definitions/Point" }
            },
            "definitions": {
                "Point": {
                    "type": "object",
                    "properties": { "x": { "type": "number" } }
                }
            }
        });
        let p = Parameter::from_json_schema(&schema).unwrap();
        assert!(p.properties.contains_key("from"));
        assert!(p.properties.contains_key("to"));
    }

    #[test]
    fn false_property_schema_is_skipped() {
        let schema = json!({
            "type": "object",
            "properties": {
                "kept": { "type": "string" },
                "hidden": false
            }
        });
        let p = Parameter::from_json_schema(&schema).unwrap();
        assert!(p.properties.contains_key("kept"));
        assert!(!p.properties.contains_key("hidden"));
    }

    #[test]
    fn unsupported_type_fails() {
        let schema = json!({ "type": "null" });
        assert!(matches!(
            Parameter::from_json_schema(&schema),
            Err(SchemaError::UnsupportedKind { .. })
        ));
    }

    #[test]
    fn untyped_node_fails() {
        let schema = json!({ "description": "no type at all" });
        assert!(matches!(
            Parameter::from_json_schema(&schema),
            Err(SchemaError::UnsupportedKind { kind, .. }) if kind == "untyped"
        ));
    }

    #[test]
    fn undeclared_required_field_fails() {
        let schema = json!({
            "type": "object",
            "properties": { "a": { "type": "string" } },
            "required": ["missing"]
        });
        assert!(Parameter::from_json_schema(&schema).is_err());
    }
}
