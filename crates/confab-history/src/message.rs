// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::content::{Content, Role};

/// One message: the output of a single role in a single turn.
///
/// Messages are appended to a history and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub contents: Vec<Content>,
    /// Optional sender name (OpenAI `name` field).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    pub fn new(role: Role, contents: Vec<Content>) -> Self {
        Self {
            role,
            contents,
            name: None,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, vec![Content::text(text)])
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Content::text(text)])
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![Content::text(text)])
    }

    /// Tool-response message for one completed tool call.
    pub fn tool_response(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        response: serde_json::Map<String, Value>,
    ) -> Self {
        Self::new(
            Role::Tool,
            vec![Content::tool_response(tool_call_id, name, response)],
        )
    }

    /// All text parts, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.contents.iter().filter_map(Content::as_text).collect()
    }

    /// The concatenated text of the message (parts joined by nothing).
    pub fn text(&self) -> String {
        self.texts().concat()
    }

    pub fn has_tool_calls(&self) -> bool {
        self.contents.iter().any(Content::is_tool_call)
    }

    pub fn has_tool_responses(&self) -> bool {
        self.contents.iter().any(Content::is_tool_response)
    }

    pub(crate) fn approx_chars(&self) -> usize {
        self.contents.iter().map(Content::approx_chars).sum()
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
