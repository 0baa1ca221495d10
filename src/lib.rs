// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Confab — a provider-agnostic runtime for iterative, tool-calling LLM
//! conversations.
//!
//! The runtime drives a loop in which a model emits text and tool-call
//! requests, local tools execute, and their results flow back until a
//! termination condition is met.  Conversations live in a portable,
//! lossless [`history::History`] that round-trips between the OpenAI,
//! Claude, and Gemini wire dialects.
//!
//! Three execution strategies ship with the runtime: the basic
//! facilitator-driven loop ([`Agent::execute`]), the adaptive
//! plan/execute/reflect strategy ([`Agent::plan`]), and the composable
//! [`SubAgent`] adapter that makes one agent appear as a tool of another.
//!
//! Provider HTTP drivers implement the [`model::Provider`] contract
//! outside this workspace; the deterministic [`model::mock`] providers
//! back the test suite.

pub use confab_core as core;
pub use confab_history as history;
pub use confab_model as model;
pub use confab_schema as schema;
pub use confab_tools as tools;

pub use confab_core::{
    Agent, AgentConfig, AgentError, BasicStrategy, ChangeKind, DefaultFacilitator, DefaultHooks,
    ExecuteResponse, ExecutionMode, Facilitator, FacilitatorAction, FacilitatorDecision, Hooks,
    Middleware, Next, Plan, PlanChange, PlanConfig, PlanData, PlanError, PlanState,
    PromptTemplate, RecordedToolCall, ResponseMode, SkipDecision, StepDecision, Strategy,
    SubAgent, ToDo, TodoResult, TodoStatus, TurnState, FACILITATOR_TOOL_NAME, PLAN_VERSION,
};
pub use confab_history::{Content, History, HistoryError, Message, ProviderTag, Role};
pub use confab_model::{
    ContentType, Input, Provider, Response, Session, SessionOptions, SessionStream, StreamEvent,
    ToolCallRequest,
};
pub use confab_schema::{ArgMap, Parameter, ParameterType, SchemaError, ToolSpec};
pub use confab_tools::{ExitConversation, Tool, ToolError, ToolSet, Toolbox};
