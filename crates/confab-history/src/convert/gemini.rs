// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Gemini contents dialect.
//!
//! Gemini names its assistant role `model` and expects function responses
//! inside a `user` turn.  Parts mirror the current Gemini SDK shape: a flat
//! struct with at most one populated field (`text`, `inline_data`,
//! `file_data`, `function_call`, `function_response`); calls and responses
//! carry an optional `id`, which is what lets cross-provider chains keep
//! tool linkage without inventing identifiers.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::merge_system_messages;
use crate::{Content, History, HistoryError, Message, ProviderTag, Role};

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiContent {
    pub role: String,
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<GeminiBlob>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_data: Option<GeminiFileData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<GeminiFunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_response: Option<GeminiFunctionResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiBlob {
    pub mime_type: String,
    /// Base64 payload, as on the wire.
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiFileData {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mime_type: String,
    pub file_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiFunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub args: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiFunctionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub response: Value,
}

impl GeminiPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

// ─── From Gemini ─────────────────────────────────────────────────────────────

impl History {
    /// Build a neutral history from Gemini contents.
    ///
    /// `user` maps to user, `model` to assistant — except that a user-role
    /// content whose parts are all function responses is restored to the
    /// neutral `function` role, since that is how responses travel on this
    /// wire.
    pub fn from_gemini(contents: &[GeminiContent]) -> Result<Self, HistoryError> {
        let mut history = History::new(ProviderTag::Gemini);
        for c in contents {
            history.append(gemini_content_to_neutral(c)?);
        }
        Ok(history)
    }
}

fn gemini_content_to_neutral(c: &GeminiContent) -> Result<Message, HistoryError> {
    let wire_role = match c.role.as_str() {
        "user" => Role::User,
        "model" => Role::Assistant,
        "function" => Role::Function,
        other => {
            return Err(HistoryError::InvalidData(format!(
                "unknown gemini role `{other}`"
            )))
        }
    };

    let mut contents: Vec<Content> = Vec::with_capacity(c.parts.len());
    for part in &c.parts {
        contents.push(gemini_part_to_neutral(part)?);
    }

    let role = if wire_role == Role::User
        && !contents.is_empty()
        && contents.iter().all(Content::is_tool_response)
    {
        Role::Function
    } else {
        wire_role
    };

    Ok(Message::new(role, contents))
}

fn gemini_part_to_neutral(part: &GeminiPart) -> Result<Content, HistoryError> {
    if let Some(text) = &part.text {
        return Ok(Content::text(text));
    }
    if let Some(blob) = &part.inline_data {
        let data = match STANDARD.decode(blob.data.as_bytes()) {
            Ok(d) => d,
            Err(e) => {
                debug!(error = %e, "gemini inline data is not valid base64");
                blob.data.clone().into_bytes()
            }
        };
        return Ok(Content::Image {
            media_type: blob.mime_type.clone(),
            data,
            url: String::new(),
            detail: None,
        });
    }
    if let Some(file) = &part.file_data {
        return Ok(Content::Image {
            media_type: file.mime_type.clone(),
            data: Vec::new(),
            url: file.file_uri.clone(),
            detail: None,
        });
    }
    if let Some(fc) = &part.function_call {
        let arguments = match &fc.args {
            Value::Object(map) => map.clone(),
            other => {
                let mut map = serde_json::Map::new();
                map.insert("arguments".into(), other.clone());
                map
            }
        };
        return Ok(Content::ToolCall {
            id: fc.id.clone().unwrap_or_default(),
            name: fc.name.clone(),
            arguments,
        });
    }
    if let Some(fr) = &part.function_response {
        let response = match &fr.response {
            Value::Object(map) => map.clone(),
            other => {
                let mut map = serde_json::Map::new();
                map.insert("content".into(), other.clone());
                map
            }
        };
        return Ok(Content::ToolResponse {
            tool_call_id: fr.id.clone().unwrap_or_default(),
            name: fr.name.clone(),
            response,
            is_error: false,
        });
    }
    Err(HistoryError::InvalidData("empty gemini part".into()))
}

// ─── To Gemini ───────────────────────────────────────────────────────────────

impl History {
    /// Render this history as Gemini contents.
    ///
    /// System messages merge into the following user message; tool and
    /// function responses are emitted under role `user` because that is the
    /// turn Gemini expects function responses in.
    pub fn to_gemini(&self) -> Result<Vec<GeminiContent>, HistoryError> {
        let merged = merge_system_messages(self)?;
        let mut out: Vec<GeminiContent> = Vec::with_capacity(merged.len());

        for msg in &merged {
            let role = match msg.role {
                Role::Assistant | Role::Model => "model",
                Role::User | Role::Tool | Role::Function => "user",
                Role::System => unreachable!("merged away"),
            };
            let skip_paired_text = msg.role == Role::Tool;
            let mut parts: Vec<GeminiPart> = Vec::new();
            for c in &msg.contents {
                if let Some(part) = neutral_to_gemini_part(msg, c, skip_paired_text)? {
                    parts.push(part);
                }
            }
            if parts.is_empty() {
                continue;
            }
            out.push(GeminiContent {
                role: role.into(),
                parts,
            });
        }
        Ok(out)
    }
}

fn neutral_to_gemini_part(
    msg: &Message,
    c: &Content,
    skip_paired_text: bool,
) -> Result<Option<GeminiPart>, HistoryError> {
    let part = match c {
        Content::Text { .. } if skip_paired_text => return Ok(None),
        Content::Text { text } => GeminiPart::text(text),
        Content::Image {
            media_type,
            data,
            url,
            ..
        } => {
            if !data.is_empty() {
                GeminiPart {
                    inline_data: Some(GeminiBlob {
                        mime_type: media_type.clone(),
                        data: STANDARD.encode(data),
                    }),
                    ..GeminiPart::default()
                }
            } else {
                GeminiPart {
                    file_data: Some(GeminiFileData {
                        mime_type: media_type.clone(),
                        file_uri: url.clone(),
                    }),
                    ..GeminiPart::default()
                }
            }
        }
        Content::ToolCall {
            id,
            name,
            arguments,
        } => {
            if msg.role == Role::User {
                return Err(HistoryError::UnsupportedContent {
                    role: msg.role.to_string(),
                    detail: "tool call inside a user message".into(),
                });
            }
            GeminiPart {
                function_call: Some(GeminiFunctionCall {
                    id: none_if_empty(id),
                    name: name.clone(),
                    args: Value::Object(arguments.clone()),
                }),
                ..GeminiPart::default()
            }
        }
        Content::ToolResponse {
            tool_call_id,
            name,
            response,
            ..
        } => {
            // Gemini matches responses to calls by function name; fall back
            // to the call id when the source dialect omitted the name.
            let name = if name.is_empty() {
                tool_call_id.clone()
            } else {
                name.clone()
            };
            GeminiPart {
                function_response: Some(GeminiFunctionResponse {
                    id: none_if_empty(tool_call_id),
                    name,
                    response: Value::Object(response.clone()),
                }),
                ..GeminiPart::default()
            }
        }
        Content::FunctionCall { name, arguments } => GeminiPart {
            function_call: Some(GeminiFunctionCall {
                id: None,
                name: name.clone(),
                args: serde_json::from_str(arguments)
                    .unwrap_or(Value::Object(Default::default())),
            }),
            ..GeminiPart::default()
        },
        Content::FunctionResponse { name, response } => {
            let response = match serde_json::from_str::<Value>(response) {
                Ok(Value::Object(map)) => Value::Object(map),
                _ => {
                    let mut map = serde_json::Map::new();
                    map.insert("content".into(), Value::String(response.clone()));
                    Value::Object(map)
                }
            };
            GeminiPart {
                function_response: Some(GeminiFunctionResponse {
                    id: None,
                    name: name.clone(),
                    response,
                }),
                ..GeminiPart::default()
            }
        }
    };
    Ok(Some(part))
}

fn none_if_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
