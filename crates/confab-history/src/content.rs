// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::HistoryError;

/// Who produced a message.
///
/// `Model` and `Function` exist so the Gemini dialect round-trips without
/// loss; converters alias them to `Assistant`/`Tool` where the target
/// dialect has no equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Model,
    Tool,
    Function,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Model => "model",
            Self::Tool => "tool",
            Self::Function => "function",
        };
        write!(f, "{s}")
    }
}

/// One content part of a message.
///
/// Image bytes are held decoded; base64 appears only on serialization
/// boundaries.  The `FunctionCall`/`FunctionResponse` variants are the
/// legacy single-call shapes — they are never synthesized by converters and
/// only survive when the source conversation already used them, so their
/// `arguments`/`response` stay as the raw strings the source emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    Text {
        text: String,
    },
    Image {
        #[serde(default, skip_serializing_if = "String::is_empty")]
        media_type: String,
        /// Decoded image bytes; base64 on the serialized wire.
        #[serde(default, with = "base64_bytes", skip_serializing_if = "Vec::is_empty")]
        data: Vec<u8>,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    ToolCall {
        id: String,
        name: String,
        arguments: serde_json::Map<String, Value>,
    },
    ToolResponse {
        tool_call_id: String,
        /// May be empty — some dialects omit the tool name in responses.
        #[serde(default, skip_serializing_if = "String::is_empty")]
        name: String,
        response: serde_json::Map<String, Value>,
        #[serde(default, skip_serializing_if = "is_false")]
        is_error: bool,
    },
    FunctionCall {
        name: String,
        /// Raw argument string as emitted by the source provider.
        arguments: String,
    },
    FunctionResponse {
        name: String,
        response: String,
    },
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Image from decoded bytes.  Rejects empty data.
    pub fn image_bytes(
        media_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Result<Self, HistoryError> {
        if data.is_empty() {
            return Err(HistoryError::InvalidContent(
                "image requires bytes or a url".into(),
            ));
        }
        Ok(Self::Image {
            media_type: media_type.into(),
            data,
            url: String::new(),
            detail: None,
        })
    }

    /// Image referenced by URL.  Rejects an empty URL.
    pub fn image_url(url: impl Into<String>) -> Result<Self, HistoryError> {
        let url = url.into();
        if url.is_empty() {
            return Err(HistoryError::InvalidContent(
                "image requires bytes or a url".into(),
            ));
        }
        Ok(Self::Image {
            media_type: String::new(),
            data: Vec::new(),
            url,
            detail: None,
        })
    }

    pub fn tool_call(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Map<String, Value>,
    ) -> Self {
        Self::ToolCall {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    pub fn tool_response(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        response: serde_json::Map<String, Value>,
    ) -> Self {
        Self::ToolResponse {
            tool_call_id: tool_call_id.into(),
            name: name.into(),
            response,
            is_error: false,
        }
    }

    /// The text of a `Text` part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn is_tool_call(&self) -> bool {
        matches!(self, Self::ToolCall { .. })
    }

    pub fn is_tool_response(&self) -> bool {
        matches!(self, Self::ToolResponse { .. })
    }

    /// Approximate character weight for token estimation (chars ÷ 4 at the
    /// caller).  Images count a flat 765 tokens' worth of characters, the
    /// usual high-detail vision estimate.
    pub(crate) fn approx_chars(&self) -> usize {
        match self {
            Self::Text { text } => text.len(),
            Self::Image { .. } => 765 * 4,
            Self::ToolCall {
                name, arguments, ..
            } => name.len() + Value::Object(arguments.clone()).to_string().len(),
            Self::ToolResponse { response, .. } => Value::Object(response.clone()).to_string().len(),
            Self::FunctionCall { name, arguments } => name.len() + arguments.len(),
            Self::FunctionResponse { name, response } => name.len() + response.len(),
        }
    }
}

/// Serde adapter: `Vec<u8>` as a base64 string on the wire.
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        STANDARD
            .decode(s.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
