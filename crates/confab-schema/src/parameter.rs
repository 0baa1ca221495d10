// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::SchemaError;

/// The JSON type a parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl std::fmt::Display for ParameterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        };
        write!(f, "{s}")
    }
}

/// Self-describing schema for one tool argument.
///
/// Constraints are per-type: numeric bounds apply to `number`/`integer`,
/// length and pattern to `string`, item bounds and `items` to `array`,
/// `properties` to `object`.  `required` refers to the parameter itself —
/// a `null` (or missing) value passes validation iff `required` is false.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Parameter {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub param_type: Option<ParameterType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Allowed values (string type only).
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    /// Nested parameters for object types.  Ordered so schema rendering is
    /// deterministic.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Parameter>,
    /// Element schema for array types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Parameter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Compiled `pattern`, filled on first use.  Public only so struct-update
    /// construction (`..Parameter::default()`) works across crates.
    #[serde(skip)]
    #[doc(hidden)]
    pub compiled_pattern: OnceLock<Regex>,
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.param_type == other.param_type
            && self.description == other.description
            && self.enum_values == other.enum_values
            && self.required == other.required
            && self.minimum == other.minimum
            && self.maximum == other.maximum
            && self.min_length == other.min_length
            && self.max_length == other.max_length
            && self.pattern == other.pattern
            && self.min_items == other.min_items
            && self.max_items == other.max_items
            && self.properties == other.properties
            && self.items == other.items
            && self.default == other.default
    }
}

impl Parameter {
    /// Bare parameter of the given type.
    pub fn of_type(param_type: ParameterType) -> Self {
        Self {
            param_type: Some(param_type),
            ..Self::default()
        }
    }

    /// Required string parameter with a description — the most common shape.
    pub fn required_string(description: impl Into<String>) -> Self {
        Self {
            param_type: Some(ParameterType::String),
            description: Some(description.into()),
            required: true,
            ..Self::default()
        }
    }

    /// Statically validate this parameter under the given name.
    ///
    /// Checks that the type is set, per-type constraints are coherent
    /// (min ≤ max, pattern compiles, object types declare properties, array
    /// types declare items), recurses into nested schemas, and — when a
    /// `default` is present — that the default itself passes
    /// [`validate_value`](Self::validate_value).
    pub fn validate(&self, name: &str) -> Result<(), SchemaError> {
        let ty = self.param_type.ok_or_else(|| SchemaError::InvalidParameter {
            name: name.to_string(),
            reason: "type is not set".into(),
        })?;

        if let (Some(min), Some(max)) = (self.minimum, self.maximum) {
            if min > max {
                return Err(SchemaError::InvalidParameter {
                    name: name.to_string(),
                    reason: format!("minimum {min} exceeds maximum {max}"),
                });
            }
        }
        if let (Some(min), Some(max)) = (self.min_length, self.max_length) {
            if min > max {
                return Err(SchemaError::InvalidParameter {
                    name: name.to_string(),
                    reason: format!("min_length {min} exceeds max_length {max}"),
                });
            }
        }
        if let (Some(min), Some(max)) = (self.min_items, self.max_items) {
            if min > max {
                return Err(SchemaError::InvalidParameter {
                    name: name.to_string(),
                    reason: format!("min_items {min} exceeds max_items {max}"),
                });
            }
        }
        if self.pattern.is_some() {
            self.pattern_regex(name)?;
        }

        match ty {
            ParameterType::Object => {
                if self.properties.is_empty() {
                    return Err(SchemaError::InvalidParameter {
                        name: name.to_string(),
                        reason: "object type requires properties".into(),
                    });
                }
                for (key, prop) in &self.properties {
                    prop.validate(&format!("{name}.{key}"))?;
                }
            }
            ParameterType::Array => match &self.items {
                None => {
                    return Err(SchemaError::InvalidParameter {
                        name: name.to_string(),
                        reason: "array type requires items".into(),
                    })
                }
                Some(items) => items.validate(&format!("{name}[]"))?,
            },
            _ => {}
        }

        if let Some(default) = &self.default {
            self.validate_value(name, default)?;
        }
        Ok(())
    }

    /// Validate a runtime value against this schema.
    ///
    /// `Null` passes iff the parameter is not required.  Numbers coerce
    /// freely between float and integer representations; an `integer`
    /// parameter additionally requires a zero fractional part.  Object
    /// values are checked property by property; keys that are not declared
    /// in the schema are ignored.
    pub fn validate_value(&self, name: &str, value: &Value) -> Result<(), SchemaError> {
        if value.is_null() {
            if self.required {
                return Err(SchemaError::InvalidValue {
                    name: name.to_string(),
                    reason: "required parameter is missing".into(),
                });
            }
            return Ok(());
        }

        match self.param_type {
            Some(ParameterType::String) => self.validate_string(name, value),
            Some(ParameterType::Number) => self.validate_number(name, value, false),
            Some(ParameterType::Integer) => self.validate_number(name, value, true),
            Some(ParameterType::Boolean) => match value {
                Value::Bool(_) => Ok(()),
                other => Err(type_mismatch(name, "boolean", other)),
            },
            Some(ParameterType::Array) => self.validate_array(name, value),
            Some(ParameterType::Object) => self.validate_object(name, value),
            None => Err(SchemaError::InvalidParameter {
                name: name.to_string(),
                reason: "type is not set".into(),
            }),
        }
    }

    fn validate_string(&self, name: &str, value: &Value) -> Result<(), SchemaError> {
        let s = match value {
            Value::String(s) => s,
            other => return Err(type_mismatch(name, "string", other)),
        };
        if !self.enum_values.is_empty() && !self.enum_values.iter().any(|e| e == s) {
            return Err(SchemaError::InvalidValue {
                name: name.to_string(),
                reason: format!("`{s}` is not one of [{}]", self.enum_values.join(", ")),
            });
        }
        let len = s.chars().count();
        if let Some(min) = self.min_length {
            if len < min {
                return Err(SchemaError::InvalidValue {
                    name: name.to_string(),
                    reason: format!("length {len} is below min_length {min}"),
                });
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                return Err(SchemaError::InvalidValue {
                    name: name.to_string(),
                    reason: format!("length {len} exceeds max_length {max}"),
                });
            }
        }
        if self.pattern.is_some() {
            let re = self.pattern_regex(name)?;
            if !re.is_match(s) {
                return Err(SchemaError::InvalidValue {
                    name: name.to_string(),
                    reason: format!("`{s}` does not match pattern `{}`", re.as_str()),
                });
            }
        }
        Ok(())
    }

    fn validate_number(&self, name: &str, value: &Value, integer: bool) -> Result<(), SchemaError> {
        let n = match value {
            Value::Number(n) => n,
            other => {
                let want = if integer { "integer" } else { "number" };
                return Err(type_mismatch(name, want, other));
            }
        };
        let f = n.as_f64().unwrap_or(0.0);
        if integer && n.as_i64().is_none() && n.as_u64().is_none() && f.fract() != 0.0 {
            return Err(SchemaError::InvalidValue {
                name: name.to_string(),
                reason: format!("{f} is not an integer"),
            });
        }
        if let Some(min) = self.minimum {
            if f < min {
                return Err(SchemaError::InvalidValue {
                    name: name.to_string(),
                    reason: format!("{f} is below minimum {min}"),
                });
            }
        }
        if let Some(max) = self.maximum {
            if f > max {
                return Err(SchemaError::InvalidValue {
                    name: name.to_string(),
                    reason: format!("{f} exceeds maximum {max}"),
                });
            }
        }
        Ok(())
    }

    fn validate_array(&self, name: &str, value: &Value) -> Result<(), SchemaError> {
        let arr = match value {
            Value::Array(a) => a,
            other => return Err(type_mismatch(name, "array", other)),
        };
        if let Some(min) = self.min_items {
            if arr.len() < min {
                return Err(SchemaError::InvalidValue {
                    name: name.to_string(),
                    reason: format!("{} items is below min_items {min}", arr.len()),
                });
            }
        }
        if let Some(max) = self.max_items {
            if arr.len() > max {
                return Err(SchemaError::InvalidValue {
                    name: name.to_string(),
                    reason: format!("{} items exceeds max_items {max}", arr.len()),
                });
            }
        }
        if let Some(items) = &self.items {
            for (i, elem) in arr.iter().enumerate() {
                items.validate_value(&format!("{name}[{i}]"), elem)?;
            }
        }
        Ok(())
    }

    fn validate_object(&self, name: &str, value: &Value) -> Result<(), SchemaError> {
        let obj = match value {
            Value::Object(o) => o,
            other => return Err(type_mismatch(name, "object", other)),
        };
        for (key, prop) in &self.properties {
            let v = obj.get(key).unwrap_or(&Value::Null);
            prop.validate_value(&format!("{name}.{key}"), v)?;
        }
        Ok(())
    }

    /// Render this parameter as a JSON-Schema value for provider consumption.
    pub fn schema_value(&self) -> Value {
        let mut out = serde_json::Map::new();
        if let Some(ty) = self.param_type {
            out.insert("type".into(), json!(ty.to_string()));
        }
        if let Some(d) = &self.description {
            out.insert("description".into(), json!(d));
        }
        if !self.enum_values.is_empty() {
            out.insert("enum".into(), json!(self.enum_values));
        }
        if let Some(v) = self.minimum {
            out.insert("minimum".into(), json!(v));
        }
        if let Some(v) = self.maximum {
            out.insert("maximum".into(), json!(v));
        }
        if let Some(v) = self.min_length {
            out.insert("minLength".into(), json!(v));
        }
        if let Some(v) = self.max_length {
            out.insert("maxLength".into(), json!(v));
        }
        if let Some(p) = &self.pattern {
            out.insert("pattern".into(), json!(p));
        }
        if let Some(v) = self.min_items {
            out.insert("minItems".into(), json!(v));
        }
        if let Some(v) = self.max_items {
            out.insert("maxItems".into(), json!(v));
        }
        if let Some(d) = &self.default {
            out.insert("default".into(), d.clone());
        }
        if !self.properties.is_empty() {
            let props: serde_json::Map<String, Value> = self
                .properties
                .iter()
                .map(|(k, p)| (k.clone(), p.schema_value()))
                .collect();
            out.insert("properties".into(), Value::Object(props));
            let required: Vec<&str> = self
                .properties
                .iter()
                .filter(|(_, p)| p.required)
                .map(|(k, _)| k.as_str())
                .collect();
            if !required.is_empty() {
                out.insert("required".into(), json!(required));
            }
        }
        if let Some(items) = &self.items {
            out.insert("items".into(), items.schema_value());
        }
        Value::Object(out)
    }

    /// Compiled pattern regex, cached after the first call.
    fn pattern_regex(&self, name: &str) -> Result<&Regex, SchemaError> {
        let pattern = self.pattern.as_deref().unwrap_or_default();
        if let Some(re) = self.compiled_pattern.get() {
            return Ok(re);
        }
        let re = Regex::new(pattern).map_err(|e| SchemaError::InvalidParameter {
            name: name.to_string(),
            reason: format!("pattern does not compile: {e}"),
        })?;
        Ok(self.compiled_pattern.get_or_init(|| re))
    }
}

fn type_mismatch(name: &str, want: &str, got: &Value) -> SchemaError {
    let got = match got {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    SchemaError::InvalidValue {
        name: name.to_string(),
        reason: format!("expected {want}, got {got}"),
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn string_param() -> Parameter {
        Parameter::of_type(ParameterType::String)
    }

    // ── Static validation ─────────────────────────────────────────────────────

    #[test]
    fn validate_rejects_missing_type() {
        let p = Parameter::default();
        assert!(matches!(
            p.validate("p"),
            Err(SchemaError::InvalidParameter { name, .. }) if name == "p"
        ));
    }

    #[test]
    fn validate_rejects_inverted_numeric_bounds() {
        let p = Parameter {
            minimum: Some(10.0),
            maximum: Some(1.0),
            ..Parameter::of_type(ParameterType::Number)
        };
        assert!(p.validate("n").is_err());
    }

    #[test]
    fn validate_rejects_inverted_length_bounds() {
        let p = Parameter {
            min_length: Some(5),
            max_length: Some(2),
            ..string_param()
        };
        assert!(p.validate("s").is_err());
    }

    #[test]
    fn validate_rejects_bad_pattern() {
        let p = Parameter {
            pattern: Some("([".into()),
            ..string_param()
        };
        assert!(p.validate("s").is_err());
    }

    #[test]
    fn validate_rejects_object_without_properties() {
        let p = Parameter::of_type(ParameterType::Object);
        assert!(p.validate("o").is_err());
    }

    #[test]
    fn validate_rejects_array_without_items() {
        let p = Parameter::of_type(ParameterType::Array);
        assert!(p.validate("a").is_err());
    }

    #[test]
    fn validate_names_nested_offender() {
        let mut props = std::collections::BTreeMap::new();
        props.insert("inner".to_string(), Parameter::default());
        let p = Parameter {
            properties: props,
            ..Parameter::of_type(ParameterType::Object)
        };
        match p.validate("outer") {
            Err(SchemaError::InvalidParameter { name, .. }) => assert_eq!(name, "outer.inner"),
            other => panic!("expected nested error, got {other:?}"),
        }
    }

    #[test]
    fn validate_checks_default_against_schema() {
        let p = Parameter {
            default: Some(json!(42)),
            ..string_param()
        };
        assert!(p.validate("s").is_err());
    }

    #[test]
    fn valid_default_passes_validate_value() {
        let p = Parameter {
            default: Some(json!("hello")),
            ..string_param()
        };
        p.validate("s").unwrap();
        p.validate_value("s", p.default.as_ref().unwrap()).unwrap();
    }

    // ── Runtime validation ────────────────────────────────────────────────────

    #[test]
    fn null_passes_when_not_required() {
        string_param().validate_value("s", &Value::Null).unwrap();
    }

    #[test]
    fn null_fails_when_required() {
        let p = Parameter {
            required: true,
            ..string_param()
        };
        assert!(p.validate_value("s", &Value::Null).is_err());
    }

    #[test]
    fn string_rejects_number() {
        assert!(string_param().validate_value("s", &json!(1)).is_err());
    }

    #[test]
    fn string_enum_enforced() {
        let p = Parameter {
            enum_values: vec!["a".into(), "b".into()],
            ..string_param()
        };
        p.validate_value("s", &json!("a")).unwrap();
        assert!(p.validate_value("s", &json!("c")).is_err());
    }

    #[test]
    fn string_length_bounds_enforced() {
        let p = Parameter {
            min_length: Some(2),
            max_length: Some(3),
            ..string_param()
        };
        assert!(p.validate_value("s", &json!("a")).is_err());
        p.validate_value("s", &json!("ab")).unwrap();
        assert!(p.validate_value("s", &json!("abcd")).is_err());
    }

    #[test]
    fn string_pattern_enforced_and_cached() {
        let p = Parameter {
            pattern: Some("^[a-z]+$".into()),
            ..string_param()
        };
        p.validate_value("s", &json!("abc")).unwrap();
        // Second call uses the cached regex.
        assert!(p.validate_value("s", &json!("ABC")).is_err());
    }

    #[test]
    fn number_accepts_integer_and_float() {
        let p = Parameter::of_type(ParameterType::Number);
        p.validate_value("n", &json!(1)).unwrap();
        p.validate_value("n", &json!(1.5)).unwrap();
        assert!(p.validate_value("n", &json!("1")).is_err());
    }

    #[test]
    fn number_bounds_enforced() {
        let p = Parameter {
            minimum: Some(0.0),
            maximum: Some(10.0),
            ..Parameter::of_type(ParameterType::Number)
        };
        assert!(p.validate_value("n", &json!(-1)).is_err());
        assert!(p.validate_value("n", &json!(11)).is_err());
        p.validate_value("n", &json!(5)).unwrap();
    }

    #[test]
    fn integer_accepts_whole_float() {
        let p = Parameter::of_type(ParameterType::Integer);
        p.validate_value("i", &json!(3)).unwrap();
        p.validate_value("i", &json!(3.0)).unwrap();
    }

    #[test]
    fn integer_rejects_fractional() {
        let p = Parameter::of_type(ParameterType::Integer);
        assert!(p.validate_value("i", &json!(3.5)).is_err());
    }

    #[test]
    fn boolean_accepts_only_bool() {
        let p = Parameter::of_type(ParameterType::Boolean);
        p.validate_value("b", &json!(true)).unwrap();
        assert!(p.validate_value("b", &json!("true")).is_err());
    }

    #[test]
    fn array_bounds_and_items_enforced() {
        let p = Parameter {
            min_items: Some(1),
            max_items: Some(2),
            items: Some(Box::new(Parameter::of_type(ParameterType::Integer))),
            ..Parameter::of_type(ParameterType::Array)
        };
        assert!(p.validate_value("a", &json!([])).is_err());
        p.validate_value("a", &json!([1, 2])).unwrap();
        assert!(p.validate_value("a", &json!([1, 2, 3])).is_err());
        assert!(p.validate_value("a", &json!(["x"])).is_err());
    }

    #[test]
    fn object_validates_declared_and_ignores_undeclared() {
        let mut props = std::collections::BTreeMap::new();
        props.insert(
            "count".to_string(),
            Parameter {
                required: true,
                ..Parameter::of_type(ParameterType::Integer)
            },
        );
        let p = Parameter {
            properties: props,
            ..Parameter::of_type(ParameterType::Object)
        };
        p.validate_value("o", &json!({"count": 1, "extra": "ignored"}))
            .unwrap();
        assert!(p.validate_value("o", &json!({"extra": "only"})).is_err());
    }

    // ── Schema rendering ──────────────────────────────────────────────────────

    #[test]
    fn schema_value_renders_object_with_required_list() {
        let mut props = std::collections::BTreeMap::new();
        props.insert("q".to_string(), Parameter::required_string("the query"));
        props.insert(
            "limit".to_string(),
            Parameter::of_type(ParameterType::Integer),
        );
        let p = Parameter {
            properties: props,
            ..Parameter::of_type(ParameterType::Object)
        };
        let v = p.schema_value();
        assert_eq!(v["type"], "object");
        assert_eq!(v["properties"]["q"]["type"], "string");
        assert_eq!(v["required"], json!(["q"]));
    }

    #[test]
    fn schema_value_renders_constraints() {
        let p = Parameter {
            minimum: Some(1.0),
            maximum: Some(9.0),
            ..Parameter::of_type(ParameterType::Number)
        };
        let v = p.schema_value();
        assert_eq!(v["minimum"], json!(1.0));
        assert_eq!(v["maximum"], json!(9.0));
    }

    // ── Serialisation round-trip ──────────────────────────────────────────────

    #[test]
    fn parameter_serde_round_trip() {
        let p = Parameter {
            description: Some("a name".into()),
            pattern: Some("^x".into()),
            required: true,
            ..string_param()
        };
        let s = serde_json::to_string(&p).unwrap();
        let back: Parameter = serde_json::from_str(&s).unwrap();
        assert_eq!(back, p);
    }
}
