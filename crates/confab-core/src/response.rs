// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use confab_history::History;

/// The outcome of one `execute` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecuteResponse {
    /// Every text segment the model produced, in order.
    pub texts: Vec<String>,
    /// Internal sub-turns a strategy ran on the caller's behalf (the plan
    /// strategy records its executor exchanges here) so the caller can fold
    /// them into its own history without duplicating the final texts.
    pub additional_history: Option<History>,
}

impl ExecuteResponse {
    pub fn from_texts(texts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            texts: texts.into_iter().map(Into::into).collect(),
            additional_history: None,
        }
    }

    /// True when every text segment is empty.
    pub fn is_empty(&self) -> bool {
        self.texts.iter().all(String::is_empty)
    }
}

impl std::fmt::Display for ExecuteResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.texts.join(" "))
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
