// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::sync::Arc;

use confab_history::History;
use confab_model::ContentType;
use confab_schema::Parameter;
use confab_tools::{Tool, ToolSet};

use crate::hooks::{DefaultHooks, Hooks};
use crate::strategy::{BasicStrategy, Strategy};

/// Default cap on loop turns per execute.
pub const DEFAULT_LOOP_LIMIT: u32 = 32;
/// Default cap on consecutive failures of one tool.
pub const DEFAULT_RETRY_LIMIT: u32 = 8;

/// Whether the loop calls the session blocking or streaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    #[default]
    Blocking,
    Streaming,
}

/// Agent configuration.
///
/// Cloned into an immutable snapshot at the start of every execute, so
/// concurrent executes against one agent never observe each other's state.
#[derive(Clone)]
pub struct AgentConfig {
    pub system_prompt: Option<String>,
    /// Prepended to the first input when the agent starts without history.
    pub init_prompt: Option<String>,
    /// Prior conversation to seed the session with.
    pub history: Option<History>,
    pub loop_limit: u32,
    pub retry_limit: u32,
    pub response_mode: ResponseMode,
    pub content_type: ContentType,
    pub response_schema: Option<Parameter>,
    pub tools: Vec<Arc<dyn Tool>>,
    pub tool_sets: Vec<Arc<dyn ToolSet>>,
    /// Sub-agents participate in the tool map like any tool; kept separate
    /// so conflicts can be reported against the right source.
    pub sub_agents: Vec<Arc<dyn Tool>>,
    pub hooks: Arc<dyn Hooks>,
    pub strategy: Arc<dyn Strategy>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: None,
            init_prompt: None,
            history: None,
            loop_limit: DEFAULT_LOOP_LIMIT,
            retry_limit: DEFAULT_RETRY_LIMIT,
            response_mode: ResponseMode::default(),
            content_type: ContentType::default(),
            response_schema: None,
            tools: Vec::new(),
            tool_sets: Vec::new(),
            sub_agents: Vec::new(),
            hooks: Arc::new(DefaultHooks),
            strategy: Arc::new(BasicStrategy),
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_limits() {
        let c = AgentConfig::default();
        assert_eq!(c.loop_limit, 32);
        assert_eq!(c.retry_limit, 8);
        assert_eq!(c.response_mode, ResponseMode::Blocking);
        assert!(c.tools.is_empty());
    }
}
