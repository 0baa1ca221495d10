// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{ArgMap, Parameter, SchemaError};

/// Specification of a single tool: its name, what it does, and the
/// parameters it accepts.  Names must be unique across the active tool set
/// of a session; that uniqueness is enforced where tools are assembled, not
/// here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Parameter>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Add a parameter (builder style).
    pub fn with_parameter(mut self, name: impl Into<String>, parameter: Parameter) -> Self {
        self.parameters.insert(name.into(), parameter);
        self
    }

    /// Statically validate the spec: non-empty name plus every parameter.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.name.is_empty() {
            return Err(SchemaError::InvalidParameter {
                name: "(tool)".into(),
                reason: "tool name is empty".into(),
            });
        }
        for (name, p) in &self.parameters {
            p.validate(&format!("{}.{name}", self.name))?;
        }
        Ok(())
    }

    /// Validate a runtime argument map against the declared parameters.
    ///
    /// Missing arguments are treated as `null` (so `required` applies);
    /// arguments with no declared parameter are ignored.
    pub fn validate_args(&self, args: &ArgMap) -> Result<(), SchemaError> {
        for (name, p) in &self.parameters {
            let v = args.get(name).unwrap_or(&Value::Null);
            p.validate_value(name, v)?;
        }
        Ok(())
    }

    /// Render the parameter map as a single JSON-Schema object for the
    /// provider wire (`{"type":"object","properties":{...},"required":[...]}`).
    pub fn schema_value(&self) -> Value {
        let props: serde_json::Map<String, Value> = self
            .parameters
            .iter()
            .map(|(k, p)| (k.clone(), p.schema_value()))
            .collect();
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|(_, p)| p.required)
            .map(|(k, _)| k.as_str())
            .collect();
        let mut out = json!({
            "type": "object",
            "properties": props,
        });
        if !required.is_empty() {
            out["required"] = json!(required);
        }
        out
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ParameterType;

    fn spec() -> ToolSpec {
        ToolSpec::new("add", "add two numbers")
            .with_parameter("a", {
                Parameter {
                    required: true,
                    ..Parameter::of_type(ParameterType::Number)
                }
            })
            .with_parameter("b", {
                Parameter {
                    required: true,
                    ..Parameter::of_type(ParameterType::Number)
                }
            })
    }

    #[test]
    fn validate_accepts_well_formed_spec() {
        spec().validate().unwrap();
    }

    #[test]
    fn validate_rejects_empty_name() {
        let s = ToolSpec::new("", "anonymous");
        assert!(s.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_parameter() {
        let s = ToolSpec::new("t", "tool").with_parameter("p", Parameter::default());
        assert!(s.validate().is_err());
    }

    #[test]
    fn validate_args_accepts_matching_map() {
        let mut args = ArgMap::new();
        args.insert("a".into(), json!(2));
        args.insert("b".into(), json!(2));
        spec().validate_args(&args).unwrap();
    }

    #[test]
    fn validate_args_rejects_missing_required() {
        let mut args = ArgMap::new();
        args.insert("a".into(), json!(2));
        assert!(spec().validate_args(&args).is_err());
    }

    #[test]
    fn validate_args_ignores_undeclared_keys() {
        let mut args = ArgMap::new();
        args.insert("a".into(), json!(1));
        args.insert("b".into(), json!(2));
        args.insert("z".into(), json!("ignored"));
        spec().validate_args(&args).unwrap();
    }

    #[test]
    fn schema_value_lists_required_parameters() {
        let v = spec().schema_value();
        assert_eq!(v["type"], "object");
        assert_eq!(v["properties"]["a"]["type"], "number");
        assert_eq!(v["required"], json!(["a", "b"]));
    }

    #[test]
    fn schema_value_omits_required_when_none() {
        let s =
            ToolSpec::new("t", "d").with_parameter("p", Parameter::of_type(ParameterType::String));
        assert!(s.schema_value().get("required").is_none());
    }
}
