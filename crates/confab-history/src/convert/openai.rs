// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! OpenAI chat-completions dialect.
//!
//! The wire structs mirror the chat schema the OpenAI SDKs use: one message
//! per role with `content` or `multi_content` parts, `tool_calls` on
//! assistant messages, `tool_call_id` on role=tool messages, and the legacy
//! single-call `function_call`/role=function shapes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{parse_arg_map, parse_data_url, render_arg_map};
use crate::{Content, History, HistoryError, Message, ProviderTag, Role};

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub multi_content: Vec<ChatContentPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ChatToolCall>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tool_call_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<ChatFunctionCall>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatContentPart {
    Text { text: String },
    ImageUrl { image_url: ChatImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatImageUrl {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: ChatFunctionCall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatFunctionCall {
    pub name: String,
    /// JSON-encoded argument object, kept verbatim.
    pub arguments: String,
}

// ─── From OpenAI ─────────────────────────────────────────────────────────────

impl History {
    /// Build a neutral history from OpenAI chat messages.
    pub fn from_openai(messages: &[ChatMessage]) -> Result<Self, HistoryError> {
        let mut history = History::new(ProviderTag::OpenAi);
        for m in messages {
            history.append(chat_message_to_neutral(m)?);
        }
        Ok(history)
    }
}

fn chat_message_to_neutral(m: &ChatMessage) -> Result<Message, HistoryError> {
    let role = match m.role.as_str() {
        "system" => Role::System,
        "user" => Role::User,
        "assistant" => Role::Assistant,
        "tool" => Role::Tool,
        "function" => Role::Function,
        other => {
            return Err(HistoryError::InvalidData(format!(
                "unknown openai role `{other}`"
            )))
        }
    };

    let mut contents: Vec<Content> = Vec::new();
    match role {
        Role::Tool => {
            // A role=tool message carries both the raw text and the parsed
            // tool response, so nothing is lost either way.
            contents.push(Content::text(&m.content));
            contents.push(Content::ToolResponse {
                tool_call_id: m.tool_call_id.clone(),
                name: m.name.clone().unwrap_or_default(),
                response: parse_arg_map(&m.content, "content"),
                is_error: false,
            });
        }
        Role::Function => {
            contents.push(Content::FunctionResponse {
                name: m.name.clone().unwrap_or_default(),
                response: m.content.clone(),
            });
        }
        _ => {
            if !m.content.is_empty() {
                contents.push(Content::text(&m.content));
            }
            for part in &m.multi_content {
                contents.push(chat_part_to_neutral(part));
            }
            for tc in &m.tool_calls {
                contents.push(Content::ToolCall {
                    id: tc.id.clone(),
                    name: tc.function.name.clone(),
                    arguments: parse_arg_map(&tc.function.arguments, "arguments"),
                });
            }
            if let Some(fc) = &m.function_call {
                contents.push(Content::FunctionCall {
                    name: fc.name.clone(),
                    arguments: fc.arguments.clone(),
                });
            }
        }
    }

    Ok(Message {
        role,
        contents,
        name: m.name.clone(),
    })
}

fn chat_part_to_neutral(part: &ChatContentPart) -> Content {
    match part {
        ChatContentPart::Text { text } => Content::text(text),
        ChatContentPart::ImageUrl { image_url } => {
            if let Ok((mime, b64)) = parse_data_url(&image_url.url) {
                match STANDARD.decode(b64.as_bytes()) {
                    Ok(data) => {
                        // Both forms coexist: the source literally provided both.
                        return Content::Image {
                            media_type: mime,
                            data,
                            url: image_url.url.clone(),
                            detail: image_url.detail.clone(),
                        };
                    }
                    Err(e) => {
                        debug!(error = %e, "keeping undecodable data URL verbatim");
                    }
                }
            }
            Content::Image {
                media_type: String::new(),
                data: Vec::new(),
                url: image_url.url.clone(),
                detail: image_url.detail.clone(),
            }
        }
    }
}

// ─── To OpenAI ───────────────────────────────────────────────────────────────

impl History {
    /// Render this history as OpenAI chat messages.
    ///
    /// A neutral message that mixes assistant text/tool calls with tool
    /// responses splits into a main message plus one role=tool message per
    /// response, preserving response order.
    pub fn to_openai(&self) -> Result<Vec<ChatMessage>, HistoryError> {
        let mut out: Vec<ChatMessage> = Vec::with_capacity(self.messages.len());
        for msg in &self.messages {
            neutral_to_chat_messages(msg, &mut out)?;
        }
        Ok(out)
    }
}

fn neutral_to_chat_messages(
    msg: &Message,
    out: &mut Vec<ChatMessage>,
) -> Result<(), HistoryError> {
    if msg.role == Role::Tool {
        // Pair each response with its raw-text copy by position; a response
        // without one (agent-built history) serializes its map instead.
        let texts: Vec<&str> = msg.texts();
        let mut idx = 0usize;
        for c in &msg.contents {
            if let Content::ToolResponse {
                tool_call_id,
                response,
                ..
            } = c
            {
                let content = texts
                    .get(idx)
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| render_arg_map(response, "content"));
                idx += 1;
                out.push(ChatMessage {
                    role: "tool".into(),
                    content,
                    tool_call_id: tool_call_id.clone(),
                    name: msg.name.clone(),
                    ..ChatMessage::default()
                });
            }
        }
        return Ok(());
    }

    let role = match msg.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant | Role::Model => "assistant",
        Role::Function => "function",
        Role::Tool => unreachable!(),
    };

    let mut main = ChatMessage {
        role: role.into(),
        name: msg.name.clone(),
        ..ChatMessage::default()
    };
    let mut parts: Vec<ChatContentPart> = Vec::new();
    let mut trailing: Vec<ChatMessage> = Vec::new();

    for c in &msg.contents {
        match c {
            Content::Text { text } => parts.push(ChatContentPart::Text { text: text.clone() }),
            Content::Image {
                media_type,
                data,
                url,
                detail,
            } => {
                let url = if !url.is_empty() {
                    url.clone()
                } else {
                    format!("data:{media_type};base64,{}", STANDARD.encode(data))
                };
                parts.push(ChatContentPart::ImageUrl {
                    image_url: ChatImageUrl {
                        url,
                        detail: detail.clone(),
                    },
                });
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
                main.tool_calls.push(ChatToolCall {
                    id: id.clone(),
                    call_type: "function".into(),
                    function: ChatFunctionCall {
                        name: name.clone(),
                        arguments: render_arg_map(arguments, "arguments"),
                    },
                });
            }
            Content::ToolResponse {
                tool_call_id,
                response,
                ..
            } => trailing.push(ChatMessage {
                role: "tool".into(),
                content: render_arg_map(response, "content"),
                tool_call_id: tool_call_id.clone(),
                ..ChatMessage::default()
            }),
            Content::FunctionCall { name, arguments } => {
                main.function_call = Some(ChatFunctionCall {
                    name: name.clone(),
                    arguments: arguments.clone(),
                });
            }
            Content::FunctionResponse { name, response } => trailing.push(ChatMessage {
                role: "function".into(),
                content: response.clone(),
                name: Some(name.clone()),
                ..ChatMessage::default()
            }),
        }
    }

    // A lone text part collapses into plain `content`; anything multimodal
    // stays as ordered parts.
    let lone_text = match &parts[..] {
        [ChatContentPart::Text { text }] => Some(text.clone()),
        _ => None,
    };
    match lone_text {
        Some(text) => main.content = text,
        None if !parts.is_empty() => main.multi_content = parts,
        None => {}
    }

    let main_is_empty = main.content.is_empty()
        && main.multi_content.is_empty()
        && main.tool_calls.is_empty()
        && main.function_call.is_none();
    if !main_is_empty {
        out.push(main);
    }
    out.extend(trailing);
    Ok(())
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
