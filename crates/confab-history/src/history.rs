// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

use crate::error::HistoryError;
use crate::message::Message;

/// Current on-the-wire history format version.  Bumped on incompatible
/// schema changes; deserialization rejects anything else.
pub const HISTORY_VERSION: u32 = 1;

/// Which dialect a history was originally produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderTag {
    #[default]
    Neutral,
    OpenAi,
    Claude,
    Gemini,
}

/// Metadata left behind when a host compacted the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactionMeta {
    /// Message count before compaction.
    pub original_len: usize,
    /// The summary that replaced the dropped messages.
    pub summary: String,
}

/// An append-only, provider-neutral conversation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub version: u32,
    pub provider: ProviderTag,
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compaction: Option<CompactionMeta>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(ProviderTag::Neutral)
    }
}

impl History {
    pub fn new(provider: ProviderTag) -> Self {
        Self {
            version: HISTORY_VERSION,
            provider,
            messages: Vec::new(),
            compaction: None,
        }
    }

    /// Append one message.  This is the only mutation a history supports;
    /// the message count never decreases.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn append_many(&mut self, messages: impl IntoIterator<Item = Message>) {
        for m in messages {
            self.append(m);
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Character-based token estimate (chars ÷ 4) used as the fallback when
    /// no provider tokenizer is available.
    pub fn approx_tokens(&self) -> usize {
        let chars: usize = self.messages.iter().map(Message::approx_chars).sum();
        (chars / 4).max(if self.messages.is_empty() { 0 } else { 1 })
    }

    /// Produce a compacted copy: everything but the most recent
    /// `keep_recent` messages is replaced by one assistant message carrying
    /// `summary`, and the cut is recorded in the compaction metadata.
    ///
    /// Leading system messages are kept verbatim.  The split point moves
    /// backward past tool calls and tool responses so the kept tail never
    /// starts with a response whose originating call was summarized away —
    /// providers reject such orphans.
    ///
    /// The original history is untouched (histories are append-only); the
    /// host swaps in the returned copy when it wants the smaller cursor.
    pub fn compacted(&self, keep_recent: usize, summary: impl Into<String>) -> History {
        let summary = summary.into();
        let system_end = self
            .messages
            .iter()
            .position(|m| m.role != crate::Role::System)
            .unwrap_or(self.messages.len());
        let body = &self.messages[system_end..];
        if body.len() <= keep_recent {
            return self.clone();
        }

        let mut split = body.len() - keep_recent;
        while split > 0
            && (body[split].has_tool_responses() || body[split].has_tool_calls())
        {
            split -= 1;
        }

        let mut out = History::new(self.provider);
        out.messages.extend_from_slice(&self.messages[..system_end]);
        out.append(Message::assistant(&summary));
        out.messages.extend_from_slice(&body[split..]);
        out.compaction = Some(CompactionMeta {
            original_len: self.messages.len(),
            summary,
        });
        out
    }

    pub fn to_json(&self) -> Result<String, HistoryError> {
        serde_json::to_string(self).map_err(|e| HistoryError::InvalidData(e.to_string()))
    }

    /// Deserialize a history, failing fast on a version mismatch.
    pub fn from_json(data: &str) -> Result<Self, HistoryError> {
        let h: History =
            serde_json::from_str(data).map_err(|e| HistoryError::InvalidData(e.to_string()))?;
        if h.version != HISTORY_VERSION {
            return Err(HistoryError::VersionMismatch {
                found: h.version,
                expected: HISTORY_VERSION,
            });
        }
        Ok(h)
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_history_is_empty_and_versioned() {
        let h = History::new(ProviderTag::OpenAi);
        assert!(h.is_empty());
        assert_eq!(h.version, HISTORY_VERSION);
        assert_eq!(h.provider, ProviderTag::OpenAi);
    }

    #[test]
    fn append_grows_messages() {
        let mut h = History::default();
        h.append(Message::user("one"));
        h.append_many([Message::assistant("two"), Message::user("three")]);
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn json_round_trip() {
        let mut h = History::new(ProviderTag::Claude);
        h.append(Message::user("hello"));
        let s = h.to_json().unwrap();
        let back = History::from_json(&s).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn version_mismatch_fails_fast() {
        let mut h = History::default();
        h.append(Message::user("x"));
        let mut v: serde_json::Value = serde_json::from_str(&h.to_json().unwrap()).unwrap();
        v["version"] = serde_json::json!(99);
        let err = History::from_json(&v.to_string()).unwrap_err();
        assert!(matches!(
            err,
            HistoryError::VersionMismatch { found: 99, .. }
        ));
    }

    #[test]
    fn garbage_fails_with_invalid_data() {
        assert!(matches!(
            History::from_json("{not json"),
            Err(HistoryError::InvalidData(_))
        ));
    }

    #[test]
    fn approx_tokens_divides_chars_by_four() {
        let mut h = History::default();
        h.append(Message::user("12345678")); // 8 chars
        assert_eq!(h.approx_tokens(), 2);
    }

    // ── Compaction ────────────────────────────────────────────────────────────

    #[test]
    fn compacted_replaces_old_messages_with_a_summary() {
        let mut h = History::default();
        h.append(Message::system("rules"));
        for i in 0..6 {
            h.append(Message::user(format!("q{i}")));
            h.append(Message::assistant(format!("a{i}")));
        }
        let c = h.compacted(2, "earlier turns summarized");
        // system + summary + 2 recent
        assert_eq!(c.len(), 4);
        assert_eq!(c.messages[0].text(), "rules");
        assert_eq!(c.messages[1].text(), "earlier turns summarized");
        assert_eq!(c.messages[2].text(), "q5");
        let meta = c.compaction.unwrap();
        assert_eq!(meta.original_len, 13);
        // The original is untouched.
        assert_eq!(h.len(), 13);
    }

    #[test]
    fn compacted_is_a_noop_when_short_enough() {
        let mut h = History::default();
        h.append(Message::user("only"));
        let c = h.compacted(4, "unused");
        assert_eq!(c, h);
        assert!(c.compaction.is_none());
    }

    #[test]
    fn compacted_split_never_orphans_tool_responses() {
        use crate::Content;
        let mut h = History::default();
        h.append(Message::user("start"));
        h.append(Message::user("more context"));
        h.append(crate::Message::new(
            crate::Role::Assistant,
            vec![Content::tool_call("c1", "probe", Default::default())],
        ));
        h.append(Message::tool_response("c1", "probe", Default::default()));
        h.append(Message::assistant("finding"));
        // keep_recent = 2 would split at the tool response; the split must
        // move back to keep the whole call/response group.
        let c = h.compacted(2, "sum");
        assert_eq!(c.len(), 5); // summary + context + call + response + finding
        assert!(c.messages[2].has_tool_calls());
        assert!(c.messages[3].has_tool_responses());
    }
}
