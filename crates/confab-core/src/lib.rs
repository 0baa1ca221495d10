// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! The agent runtime: session lifecycle, turn scheduling, tool dispatch,
//! cancellation, retries, and termination.
//!
//! An [`Agent`] drives the model ↔ tool loop against a
//! [`confab_model::Provider`].  Between turns with no pending tool output,
//! the [`Facilitator`] decides whether to continue or end (the default one
//! is a pseudo-tool named `respond_to_user` plus a JSON side-session).
//! Three execution strategies are provided: the basic facilitator-driven
//! loop, the [`Plan`] state machine (planner → executor → reflector), and
//! the [`SubAgent`] adapter that wraps an agent as a tool of another.

mod agent;
mod config;
mod error;
mod facilitator;
mod hooks;
mod plan;
mod prompts;
mod response;
mod strategy;
mod subagent;
mod template;

pub use agent::Agent;
pub use config::{AgentConfig, ResponseMode, DEFAULT_LOOP_LIMIT, DEFAULT_RETRY_LIMIT};
pub use error::{AgentError, PlanError};
pub use facilitator::{
    DefaultFacilitator, Facilitator, FacilitatorAction, FacilitatorDecision, FACILITATOR_TOOL_NAME,
};
pub use hooks::{DefaultHooks, Hooks};
pub use plan::{
    ChangeKind, ExecutionMode, Plan, PlanChange, PlanConfig, PlanData, PlanState, RecordedToolCall,
    SkipDecision, ToDo, TodoResult, TodoStatus, PLAN_VERSION,
};
pub use response::ExecuteResponse;
pub use strategy::{BasicStrategy, StepDecision, Strategy, TurnState};
pub use subagent::{Middleware, Next, SubAgent};
pub use template::PromptTemplate;
