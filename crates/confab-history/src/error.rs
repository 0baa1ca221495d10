// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

/// Errors from history construction, (de)serialization, and conversion.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Deserialization guard: the payload is not a usable history.
    #[error("invalid history data: {0}")]
    InvalidData(String),

    /// Deserialization guard: the version field does not match.
    #[error("history version {found} is not supported (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },

    /// A content part cannot be expressed in the target dialect and the
    /// situation is a programming mistake rather than a documented lossy
    /// conversion (e.g. a tool call inside a user message on the way out).
    #[error("unsupported content in {role} message: {detail}")]
    UnsupportedContent { role: String, detail: String },

    /// A constructor invariant was violated.
    #[error("invalid content: {0}")]
    InvalidContent(String),
}
