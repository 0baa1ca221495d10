// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use async_trait::async_trait;

use confab_model::ToolCallRequest;
use confab_schema::ArgMap;

use crate::plan::{PlanChange, SkipDecision, ToDo};

/// Host callbacks around the agent loop and the plan strategy.
///
/// Every method defaults to a no-op.  A hook that returns an error aborts
/// the execute — except `on_tool_error`, where returning `Ok` means "relay
/// the failure to the model and keep going" and returning an error aborts.
#[async_trait]
pub trait Hooks: Send + Sync {
    /// One text segment received from the model (per delta when streaming).
    async fn on_message(&self, _text: &str) -> anyhow::Result<()> {
        Ok(())
    }

    /// Before a tool runs.
    async fn on_tool_request(&self, _call: &ToolCallRequest) -> anyhow::Result<()> {
        Ok(())
    }

    /// After a successful tool run.
    async fn on_tool_response(
        &self,
        _call: &ToolCallRequest,
        _response: &ArgMap,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// After a failed tool run.  Returning an error aborts the execute;
    /// returning `Ok` relays the failure as a tool response.
    async fn on_tool_error(
        &self,
        _call: &ToolCallRequest,
        _error: &anyhow::Error,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// A plan was created.
    async fn on_plan_created(&self, _plan_id: &str, _todos: &[ToDo]) -> anyhow::Result<()> {
        Ok(())
    }

    /// A to-do is about to execute.
    async fn on_plan_todo_start(&self, _todo: &ToDo) -> anyhow::Result<()> {
        Ok(())
    }

    /// A to-do completed.
    async fn on_plan_todo_completed(&self, _todo: &ToDo) -> anyhow::Result<()> {
        Ok(())
    }

    /// A reflection produced changes to the to-do list.
    async fn on_plan_todo_updated(&self, _changes: &[PlanChange]) -> anyhow::Result<()> {
        Ok(())
    }

    /// A text message emitted inside plan execution.
    async fn on_plan_message(&self, _text: &str) -> anyhow::Result<()> {
        Ok(())
    }

    /// The plan reached its completed state.
    async fn on_plan_completed(&self, _plan_id: &str, _response: &str) -> anyhow::Result<()> {
        Ok(())
    }

    /// Balanced-mode skip confirmation for decisions that met the
    /// confidence threshold.  The default approves at confidence ≥ 0.8.
    async fn confirm_skip(&self, decision: &SkipDecision) -> anyhow::Result<bool> {
        Ok(decision.confidence >= 0.8)
    }
}

/// The all-defaults hook set.
pub struct DefaultHooks;

#[async_trait]
impl Hooks for DefaultHooks {}

// ─── Unit tests ──────────────────────────────────────────────────────────────
