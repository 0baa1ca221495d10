// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Bidirectional converters between the neutral history and the three
//! supported provider dialects.
//!
//! Each submodule defines typed wire structs for its dialect plus
//! `History::from_<provider>` / `History::to_<provider>` implementations.
//! `ToX(FromY(m))` is the supported cross-provider migration path; the lossy
//! points are documented per converter.

pub mod claude;
pub mod gemini;
pub mod openai;

use serde_json::Value;

use crate::{Content, HistoryError, History, Message, Role};

/// Parse a data URL of the form `data:<mime>;base64,<b64>` into
/// `(mime_type, base64_payload)`.  Returns `Err` for anything else so
/// callers can fall back to treating the string as a plain URL.
pub(crate) fn parse_data_url(url: &str) -> Result<(String, String), &'static str> {
    let rest = url.strip_prefix("data:").ok_or("not a data URL")?;
    let (meta, b64) = rest.split_once(',').ok_or("malformed data URL")?;
    let mime = meta.strip_suffix(";base64").unwrap_or(meta).to_string();
    Ok((mime, b64.to_string()))
}

/// Parse a JSON string into an argument map.
///
/// Anything that is not a JSON object — including invalid JSON — is wrapped
/// into a single-key map under `key` rather than reported as an error, so a
/// sloppy provider payload never aborts a conversion.
pub(crate) fn parse_arg_map(raw: &str, key: &str) -> serde_json::Map<String, Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        _ => {
            let mut map = serde_json::Map::new();
            map.insert(key.to_string(), Value::String(raw.to_string()));
            map
        }
    }
}

/// Inverse of [`parse_arg_map`]: render an argument map back to the string
/// form a provider expects.  A single-key map whose only value is a string
/// under `key` unwraps to that raw string (the wrapped-unparseable case);
/// everything else serializes as JSON.
pub(crate) fn render_arg_map(map: &serde_json::Map<String, Value>, key: &str) -> String {
    if map.len() == 1 {
        if let Some(Value::String(raw)) = map.get(key) {
            return raw.clone();
        }
    }
    Value::Object(map.clone()).to_string()
}

/// Merge system messages into the following user message, per the dialects
/// that have no system slot in their content array (Claude, Gemini).
///
/// All pending system texts are concatenated with `\n\n` and prefixed — plus
/// a `\n\n` separator — onto the leading text of the next user message.
/// A system message followed by an assistant message before any user
/// message is a placement error, as is a trailing system message.
pub(crate) fn merge_system_messages(history: &History) -> Result<Vec<Message>, HistoryError> {
    let mut pending: Vec<&str> = Vec::new();
    let mut out: Vec<Message> = Vec::with_capacity(history.messages.len());

    for m in &history.messages {
        match m.role {
            Role::System => {
                for c in &m.contents {
                    if let Some(t) = c.as_text() {
                        pending.push(t);
                    }
                }
            }
            Role::User if !pending.is_empty() => {
                let prefix = format!("{}\n\n", pending.join("\n\n"));
                pending.clear();
                let mut merged = m.clone();
                match merged.contents.first_mut() {
                    Some(Content::Text { text }) => {
                        *text = format!("{prefix}{text}");
                    }
                    _ => merged.contents.insert(0, Content::text(prefix)),
                }
                out.push(merged);
            }
            Role::Assistant | Role::Model if !pending.is_empty() => {
                return Err(HistoryError::InvalidData(
                    "system message must precede a user message".into(),
                ));
            }
            _ => out.push(m.clone()),
        }
    }

    if !pending.is_empty() {
        return Err(HistoryError::InvalidData(
            "system message has no following user message to merge into".into(),
        ));
    }
    Ok(out)
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
