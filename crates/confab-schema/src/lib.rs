// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Tool and parameter schemas.
//!
//! A [`Parameter`] is a self-describing schema for a single tool argument;
//! a [`ToolSpec`] names a tool and maps argument names to parameters.
//! Both support static validation (`validate`) and runtime validation of
//! argument values (`validate_value` / `validate_args`).  Schemas can also
//! be derived from a JSON-Schema document via [`Parameter::from_json_schema`],
//! which detects cyclic `$ref` graphs instead of recursing forever.

mod derive;
mod error;
mod parameter;
mod spec;

pub use error::SchemaError;
pub use parameter::{Parameter, ParameterType};
pub use spec::ToolSpec;

/// Argument map passed to and returned from tools: a JSON object.
pub type ArgMap = serde_json::Map<String, serde_json::Value>;
