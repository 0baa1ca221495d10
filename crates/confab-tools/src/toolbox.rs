// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use confab_schema::{ArgMap, SchemaError, ToolSpec};

use crate::tool::{Tool, ToolSet};

/// Errors raised while assembling or dispatching a toolbox.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Duplicate name across tools, tool sets, and sub-agents.
    #[error("tool name conflict: `{name}` is registered more than once")]
    NameConflict { name: String },

    /// A tool spec failed static validation.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A tool set failed to enumerate its specs.
    #[error("tool set error: {0}")]
    Backend(String),
}

enum Handler {
    Tool(Arc<dyn Tool>),
    Set(Arc<dyn ToolSet>),
}

/// The effective name→handler map for one session.
///
/// Unlike a registry that lets a later registration shadow an earlier one,
/// assembly fails on the first duplicate name: the model sees exactly one
/// tool per name or the session never opens.
#[derive(Default)]
pub struct Toolbox {
    entries: BTreeMap<String, (ToolSpec, Handler)>,
}

impl Toolbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one tool.  Validates its spec and rejects duplicates.
    pub fn add_tool(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let spec = tool.spec();
        spec.validate()?;
        self.insert(spec, Handler::Tool(tool))
    }

    /// Register every tool a set enumerates, all dispatching to the set.
    pub async fn add_tool_set(&mut self, set: Arc<dyn ToolSet>) -> Result<(), ToolError> {
        let specs = set
            .specs()
            .await
            .map_err(|e| ToolError::Backend(e.to_string()))?;
        for spec in specs {
            spec.validate()?;
            self.insert(spec, Handler::Set(Arc::clone(&set)))?;
        }
        Ok(())
    }

    fn insert(&mut self, spec: ToolSpec, handler: Handler) -> Result<(), ToolError> {
        let name = spec.name.clone();
        if self.entries.contains_key(&name) {
            return Err(ToolError::NameConflict { name });
        }
        debug!(tool = %name, "registered tool");
        self.entries.insert(name, (spec, handler));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn spec(&self, name: &str) -> Option<&ToolSpec> {
        self.entries.get(name).map(|(spec, _)| spec)
    }

    /// All specs in name order (deterministic wire output).
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.entries.values().map(|(spec, _)| spec.clone()).collect()
    }

    /// Dispatch a call to the named tool.
    pub async fn run(&self, name: &str, args: ArgMap) -> anyhow::Result<ArgMap> {
        match self.entries.get(name) {
            Some((_, Handler::Tool(tool))) => tool.run(args).await,
            Some((_, Handler::Set(set))) => set.run(name, args).await,
            None => anyhow::bail!("unknown tool: {name}"),
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
