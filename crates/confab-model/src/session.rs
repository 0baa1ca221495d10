// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::BTreeMap;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde_json::Value;

use confab_history::{Content, History, Message, Role};
use confab_schema::{ArgMap, Parameter, ParameterType, SchemaError, ToolSpec};

/// Whether the model is asked for free text or schema-conforming JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    Text,
    Json,
}

/// Options for opening a session.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub system_prompt: Option<String>,
    /// Prior conversation; restores the provider-side cursor.
    pub history: Option<History>,
    pub tools: Vec<ToolSpec>,
    pub content_type: ContentType,
    /// Schema the provider must produce when `content_type` is JSON.
    /// Must be an object-typed parameter; validated before the session opens.
    pub response_schema: Option<Parameter>,
}

impl SessionOptions {
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_history(mut self, history: History) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_response_schema(mut self, schema: Parameter) -> Self {
        self.response_schema = Some(schema);
        self
    }

    /// Check the options before a driver opens the session.
    pub fn validate(&self) -> Result<(), SchemaError> {
        for tool in &self.tools {
            tool.validate()?;
        }
        if let Some(schema) = &self.response_schema {
            if schema.param_type != Some(ParameterType::Object) {
                return Err(SchemaError::InvalidParameter {
                    name: "response_schema".into(),
                    reason: "response schema must be object-typed".into(),
                });
            }
            schema.validate("response_schema")?;
        }
        Ok(())
    }
}

/// One tagged input to a session call.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Text(String),
    /// Result of a tool call the model requested last turn.  Exactly one of
    /// `data`/`error` is set.
    ToolResponse {
        tool_call_id: String,
        name: String,
        data: Option<ArgMap>,
        error: Option<String>,
    },
    /// Provider-specific binary content (e.g. an image).
    Binary { media_type: String, data: Vec<u8> },
}

impl Input {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn tool_ok(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        data: ArgMap,
    ) -> Self {
        Self::ToolResponse {
            tool_call_id: tool_call_id.into(),
            name: name.into(),
            data: Some(data),
            error: None,
        }
    }

    pub fn tool_err(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self::ToolResponse {
            tool_call_id: tool_call_id.into(),
            name: name.into(),
            data: None,
            error: Some(error.into()),
        }
    }
}

/// A completed tool-call request from the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: ArgMap,
}

/// One blocking model response: text segments plus requested tool calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    pub texts: Vec<String>,
    pub tool_calls: Vec<ToolCallRequest>,
}

impl Response {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Assemble a response from a finished event sequence.
    ///
    /// Text deltas concatenate into one segment; tool-call fragments are
    /// keyed by their parallel-call index and flushed in index order, the
    /// fragment rule every supported driver follows.
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a StreamEvent>) -> Self {
        let mut text = String::new();
        let mut pending: BTreeMap<u32, (String, String, String)> = BTreeMap::new();
        for event in events {
            match event {
                StreamEvent::TextDelta(t) => text.push_str(t),
                StreamEvent::ToolCallDelta {
                    index,
                    id,
                    name,
                    arguments,
                } => {
                    let slot = pending.entry(*index).or_default();
                    if !id.is_empty() {
                        slot.0 = id.clone();
                    }
                    if !name.is_empty() {
                        slot.1 = name.clone();
                    }
                    slot.2.push_str(arguments);
                }
                StreamEvent::Done | StreamEvent::Error(_) => {}
            }
        }
        let tool_calls = pending
            .into_values()
            .map(|(id, name, args)| ToolCallRequest {
                id,
                name,
                arguments: parse_fragment_args(&args),
            })
            .collect();
        let texts = if text.is_empty() { vec![] } else { vec![text] };
        Response { texts, tool_calls }
    }
}

fn parse_fragment_args(raw: &str) -> ArgMap {
    if raw.is_empty() {
        return ArgMap::new();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        _ => {
            let mut map = ArgMap::new();
            map.insert("arguments".into(), Value::String(raw.to_string()));
            map
        }
    }
}

/// One streamed event from the model.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    TextDelta(String),
    /// A tool-call fragment.  Drivers may split one call across several
    /// events; `index` keys parallel calls, continuation fragments carry
    /// empty `id`/`name`.
    ToolCallDelta {
        index: u32,
        id: String,
        name: String,
        arguments: String,
    },
    /// The stream finished normally.
    Done,
    /// A recoverable driver warning.
    Error(String),
}

pub type SessionStream = Pin<Box<dyn Stream<Item = anyhow::Result<StreamEvent>> + Send>>;

/// One open conversation with a provider.
///
/// The session is the provider's authoritative cursor for its lifetime; the
/// neutral history mirrors it and re-seeds a replacement session.
#[async_trait]
pub trait Session: Send {
    /// Blocking generation: send the inputs, return one response.
    async fn generate(&mut self, inputs: &[Input]) -> anyhow::Result<Response>;

    /// Streaming generation: send the inputs, return the event stream.
    /// The stream ends on provider end-of-turn or context cancellation.
    async fn generate_stream(&mut self, inputs: &[Input]) -> anyhow::Result<SessionStream>;

    /// Deep snapshot of the current cursor.
    fn history(&self) -> History;
}

// ─── Input/response ↔ history bridging ───────────────────────────────────────

/// Convert one batch of session inputs to neutral messages: text and binary
/// inputs fold into a single user message, each tool response becomes its
/// own tool message (in input order).
pub fn messages_from_inputs(inputs: &[Input]) -> Vec<Message> {
    let mut user_parts: Vec<Content> = Vec::new();
    let mut out: Vec<Message> = Vec::new();
    for input in inputs {
        match input {
            Input::Text(t) => user_parts.push(Content::text(t)),
            Input::Binary { media_type, data } => user_parts.push(Content::Image {
                media_type: media_type.clone(),
                data: data.clone(),
                url: String::new(),
                detail: None,
            }),
            Input::ToolResponse {
                tool_call_id,
                name,
                data,
                error,
            } => {
                let (response, is_error) = match (data, error) {
                    (Some(map), _) => (map.clone(), false),
                    (None, Some(e)) => {
                        let mut map = ArgMap::new();
                        map.insert("error".into(), Value::String(e.clone()));
                        (map, true)
                    }
                    (None, None) => (ArgMap::new(), false),
                };
                out.push(Message::new(
                    Role::Tool,
                    vec![Content::ToolResponse {
                        tool_call_id: tool_call_id.clone(),
                        name: name.clone(),
                        response,
                        is_error,
                    }],
                ));
            }
        }
    }
    if !user_parts.is_empty() {
        out.insert(0, Message::new(Role::User, user_parts));
    }
    out
}

/// Convert a model response to the assistant message recorded in history.
pub fn message_from_response(response: &Response) -> Message {
    let mut contents: Vec<Content> = response
        .texts
        .iter()
        .filter(|t| !t.is_empty())
        .map(Content::text)
        .collect();
    for tc in &response.tool_calls {
        contents.push(Content::ToolCall {
            id: tc.id.clone(),
            name: tc.name.clone(),
            arguments: tc.arguments.clone(),
        });
    }
    Message::new(Role::Assistant, contents)
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
