// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

/// Errors produced by schema validation and derivation.
///
/// Every variant names the offending parameter so callers can point the
/// host developer at the exact field that is wrong.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A tool or parameter specification is statically invalid.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// A runtime value does not conform to its parameter schema.
    #[error("invalid value for `{name}`: {reason}")]
    InvalidValue { name: String, reason: String },

    /// Schema derivation saw the same `$ref` twice on its resolution path.
    #[error("cyclic reference through `{reference}`")]
    CyclicReference { reference: String },

    /// Schema derivation hit a kind it cannot express as a parameter.
    #[error("unsupported schema kind `{kind}` at `{name}`")]
    UnsupportedKind { name: String, kind: String },
}
