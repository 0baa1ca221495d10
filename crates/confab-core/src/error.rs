// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

use confab_history::History;
use confab_schema::SchemaError;
use confab_tools::ToolError;

/// Errors surfaced by [`crate::Agent::execute`].
#[derive(Debug, Error)]
pub enum AgentError {
    /// The hard cap on turns was reached.  The history includes the tool
    /// responses that were pending when the cap hit.
    #[error("loop limit of {limit} turns exceeded")]
    LoopLimitExceeded { limit: u32, history: Box<History> },

    /// Duplicate tool name across tools, tool sets, and sub-agents.
    #[error("tool name conflict: `{name}` is registered more than once")]
    ToolNameConflict { name: String },

    /// The same tool failed too many times in a row.
    #[error("tool `{name}` failed {limit} consecutive times")]
    ToolRetryLimitExceeded { name: String, limit: u32 },

    /// Static schema validation failed during setup.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A hook asked the execute to stop.
    #[error("hook `{hook}` aborted the execution: {source}")]
    HookAborted {
        hook: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// The caller cancelled.  The history covers every turn completed
    /// before the cancellation; the cancelled turn is discarded.
    #[error("execution cancelled")]
    Cancelled { history: Box<History> },

    /// Provider-layer and other host errors, surfaced unchanged.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ToolError> for AgentError {
    fn from(e: ToolError) -> Self {
        match e {
            ToolError::NameConflict { name } => AgentError::ToolNameConflict { name },
            ToolError::Schema(e) => AgentError::Schema(e),
            ToolError::Backend(msg) => AgentError::Other(anyhow::anyhow!(msg)),
        }
    }
}

/// Errors surfaced by the plan strategy.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The plan already ran to a terminal state.
    #[error("plan was already executed")]
    AlreadyExecuted,

    /// The plan has no runtime binding (deserialized but not re-bound).
    #[error("plan is not bound to an agent")]
    NotInitialized,

    /// Deserialization guard.
    #[error("plan version {found} is not supported (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },

    /// The planner session produced nothing usable.
    #[error("planner returned no usable plan: {0}")]
    InvalidPlannerResponse(String),

    /// Setup failures shared with the agent loop.
    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
