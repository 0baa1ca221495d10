// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Claude messages dialect.
//!
//! Claude has no system role in the content array (system prompts merge into
//! the first user message) and accepts images only as base64 sources — a
//! URL-only image degrades to a bracketed text placeholder.  Tool responses
//! carry no tool name on this wire; the neutral `name` is cleared on the way
//! out and left empty on the way in.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{merge_system_messages, parse_arg_map, render_arg_map};
use crate::{Content, History, HistoryError, Message, ProviderTag, Role};

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaudeMessage {
    pub role: String,
    pub content: Vec<ClaudeBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeBlock {
    Text {
        text: String,
    },
    Image {
        source: ClaudeImageSource,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaudeImageSource {
    #[serde(rename = "type")]
    pub source_type: String,
    pub media_type: String,
    pub data: String,
}

/// Fallback id used when a legacy single-call part reaches the Claude wire,
/// which requires a non-empty `tool_use` id.
const FALLBACK_TOOL_ID: &str = "tc_fallback";

// ─── From Claude ─────────────────────────────────────────────────────────────

impl History {
    /// Build a neutral history from Claude messages.
    ///
    /// A user message whose blocks are all tool results is restored to the
    /// neutral `tool` role, so a history converted out and back keeps its
    /// shape.
    pub fn from_claude(messages: &[ClaudeMessage]) -> Result<Self, HistoryError> {
        let mut history = History::new(ProviderTag::Claude);
        for m in messages {
            history.append(claude_message_to_neutral(m)?);
        }
        Ok(history)
    }
}

fn claude_message_to_neutral(m: &ClaudeMessage) -> Result<Message, HistoryError> {
    let wire_role = match m.role.as_str() {
        "user" => Role::User,
        "assistant" => Role::Assistant,
        other => {
            return Err(HistoryError::InvalidData(format!(
                "unknown claude role `{other}`"
            )))
        }
    };

    let mut contents: Vec<Content> = Vec::with_capacity(m.content.len());
    for block in &m.content {
        contents.push(claude_block_to_neutral(block));
    }

    // Tool results travel under role=user on this wire; restore the neutral
    // tool role when that is all the message carries.
    let role = if wire_role == Role::User
        && !contents.is_empty()
        && contents.iter().all(Content::is_tool_response)
    {
        Role::Tool
    } else {
        wire_role
    };

    Ok(Message::new(role, contents))
}

fn claude_block_to_neutral(block: &ClaudeBlock) -> Content {
    match block {
        ClaudeBlock::Text { text } => Content::text(text),
        ClaudeBlock::Image { source } => {
            let data = match STANDARD.decode(source.data.as_bytes()) {
                Ok(d) => d,
                Err(e) => {
                    // Keep the raw bytes rather than dropping the image.
                    debug!(error = %e, "claude image source is not valid base64");
                    source.data.clone().into_bytes()
                }
            };
            Content::Image {
                media_type: source.media_type.clone(),
                data,
                url: String::new(),
                detail: None,
            }
        }
        ClaudeBlock::ToolUse { id, name, input } => {
            let arguments = match input {
                serde_json::Value::Object(map) => map.clone(),
                other => {
                    let mut map = serde_json::Map::new();
                    map.insert("arguments".into(), other.clone());
                    map
                }
            };
            Content::tool_call(id, name, arguments)
        }
        ClaudeBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => Content::ToolResponse {
            tool_call_id: tool_use_id.clone(),
            // Claude omits the tool name in results.
            name: String::new(),
            response: parse_arg_map(content, "content"),
            is_error: is_error.unwrap_or(false),
        },
    }
}

// ─── To Claude ───────────────────────────────────────────────────────────────

impl History {
    /// Render this history as Claude messages.
    ///
    /// System messages merge into the following user message; empty messages
    /// are dropped; URL-only images become `[Image: <url>]` text since this
    /// path accepts only base64 sources.
    pub fn to_claude(&self) -> Result<Vec<ClaudeMessage>, HistoryError> {
        let merged = merge_system_messages(self)?;
        let mut out: Vec<ClaudeMessage> = Vec::with_capacity(merged.len());

        for msg in &merged {
            let role = match msg.role {
                Role::Assistant | Role::Model => "assistant",
                Role::User | Role::Tool | Role::Function => "user",
                Role::System => unreachable!("merged away"),
            };
            let skip_paired_text = msg.role == Role::Tool;
            let mut blocks: Vec<ClaudeBlock> = Vec::new();
            for c in &msg.contents {
                if let Some(block) = neutral_to_claude_block(msg, c, skip_paired_text)? {
                    blocks.push(block);
                }
            }
            if blocks.is_empty() {
                continue;
            }
            out.push(ClaudeMessage {
                role: role.into(),
                content: blocks,
            });
        }
        Ok(out)
    }
}

fn neutral_to_claude_block(
    msg: &Message,
    c: &Content,
    skip_paired_text: bool,
) -> Result<Option<ClaudeBlock>, HistoryError> {
    let block = match c {
        // The raw-text copy inside a tool message duplicates the response
        // payload; emitting both would double the result on this wire.
        Content::Text { .. } if skip_paired_text => return Ok(None),
        Content::Text { text } => ClaudeBlock::Text { text: text.clone() },
        Content::Image {
            media_type,
            data,
            url,
            detail,
        } => {
            if data.is_empty() {
                let text = match detail {
                    Some(d) => format!("[Image ({d}): {url}]"),
                    None => format!("[Image: {url}]"),
                };
                ClaudeBlock::Text { text }
            } else {
                ClaudeBlock::Image {
                    source: ClaudeImageSource {
                        source_type: "base64".into(),
                        media_type: media_type.clone(),
                        data: STANDARD.encode(data),
                    },
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
            ClaudeBlock::ToolUse {
                id: id.clone(),
                name: name.clone(),
                input: serde_json::Value::Object(arguments.clone()),
            }
        }
        Content::ToolResponse {
            tool_call_id,
            response,
            is_error,
            ..
        } => ClaudeBlock::ToolResult {
            tool_use_id: tool_call_id.clone(),
            content: render_arg_map(response, "content"),
            is_error: if *is_error { Some(true) } else { None },
        },
        Content::FunctionCall { name, arguments } => {
            warn!(name = %name, "legacy function call on the claude wire; using fallback id");
            ClaudeBlock::ToolUse {
                id: FALLBACK_TOOL_ID.into(),
                name: name.clone(),
                input: serde_json::from_str(arguments)
                    .unwrap_or(serde_json::Value::Object(Default::default())),
            }
        }
        Content::FunctionResponse { response, .. } => ClaudeBlock::ToolResult {
            tool_use_id: FALLBACK_TOOL_ID.into(),
            content: response.clone(),
            is_error: None,
        },
    };
    Ok(Some(block))
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
