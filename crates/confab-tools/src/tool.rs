// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use thiserror::Error;

use confab_schema::{ArgMap, ToolSpec};

/// Sentinel error value a tool returns to terminate the surrounding
/// conversation successfully.  Detected by downcast, never displayed as a
/// failure.
#[derive(Debug, Clone, Copy, Default, Error)]
#[error("exit conversation")]
pub struct ExitConversation;

impl ExitConversation {
    /// True when `err` is (or wraps) the exit sentinel.
    pub fn is_exit(err: &anyhow::Error) -> bool {
        err.downcast_ref::<ExitConversation>().is_some()
    }
}

/// One executable tool.
///
/// `run` receives the validated argument map and returns a result map that
/// is relayed to the model.  Implementations must be re-entrant: tools
/// registered on one agent may run concurrently from parallel executes.
#[async_trait]
pub trait Tool: Send + Sync {
    fn spec(&self) -> ToolSpec;
    async fn run(&self, args: ArgMap) -> anyhow::Result<ArgMap>;
}

/// Several tools behind one backend.
///
/// Resources are opened lazily on the first `specs` call; the host releases
/// them by calling `close` when the set is retired.
#[async_trait]
pub trait ToolSet: Send + Sync {
    async fn specs(&self) -> anyhow::Result<Vec<ToolSpec>>;
    async fn run(&self, name: &str, args: ArgMap) -> anyhow::Result<ArgMap>;
    async fn close(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
