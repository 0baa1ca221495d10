// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! The plan strategy: a planner session turns a goal into an ordered to-do
//! list, an executor drives each step through the main session, and a
//! reflector session revises the remaining plan after every completed step
//! under confidence-gated skip rules.
//!
//! A plan serializes as `{version, id, input, todos, state}`.  Runtime
//! handles (provider, tool map, main session) are never serialized; a
//! deserialized plan is re-bound with [`Agent::plan_from_data`] before it
//! can execute again, and completed to-dos are not re-run.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use confab_history::History;
use confab_model::{
    message_from_response, messages_from_inputs, ContentType, Input, Provider, Session,
    SessionOptions,
};
use confab_schema::ArgMap;
use confab_tools::Toolbox;

use crate::agent::{build_toolbox, Agent};
use crate::error::{AgentError, PlanError};
use crate::hooks::Hooks;
use crate::prompts;
use crate::response::ExecuteResponse;

/// Current plan serialization version.
pub const PLAN_VERSION: u32 = 1;

// ─── Data types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanState {
    Created,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoStatus {
    Pending,
    Executing,
    Completed,
    Failed,
    Skipped,
}

/// One tool invocation recorded during a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedToolCall {
    pub name: String,
    pub arguments: ArgMap,
}

/// What a completed step produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TodoResult {
    /// Accumulated text output of the step.
    pub output: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<RecordedToolCall>,
    /// Tool outputs keyed by tool name; a later call overwrites an earlier
    /// one within the same step.
    #[serde(default, skip_serializing_if = "ArgMap::is_empty")]
    pub data: ArgMap,
    pub duration_ms: u64,
}

/// One step of a plan, independently executable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToDo {
    pub id: String,
    pub description: String,
    pub intent: String,
    pub status: TodoStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<TodoResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ToDo {
    fn new(id: String, description: String, intent: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            description,
            intent,
            status: TodoStatus::Pending,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A reflection's richer skip proposal, gated by execution mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkipDecision {
    pub todo_id: String,
    #[serde(default)]
    pub skip_reason: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub evidence: String,
}

/// How aggressively reflections may skip pending steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Never skip.
    Complete,
    /// Skip when confidence meets the threshold.
    Efficient,
    /// Meet the threshold, then ask the skip-confirmation hook.
    #[default]
    Balanced,
}

#[derive(Debug, Clone)]
pub struct PlanConfig {
    pub execution_mode: ExecutionMode,
    /// Confidence needed before a skip decision is considered.
    pub skip_threshold: f64,
    /// Deadline per executor and per reflector session call.
    pub step_timeout: Duration,
    /// Cap on model→tool rounds within one step.
    pub max_step_rounds: u32,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            execution_mode: ExecutionMode::default(),
            skip_threshold: 0.8,
            step_timeout: Duration::from_secs(30),
            max_step_rounds: 32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Updated,
    Removed,
}

/// One recorded mutation of the to-do list.
#[derive(Debug, Clone)]
pub struct PlanChange {
    pub kind: ChangeKind,
    pub todo_id: String,
    pub old: Option<ToDo>,
    pub new: Option<ToDo>,
    pub description: String,
}

/// Classification of a reflection, derived from its changes and the
/// remaining pending count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReflectionType {
    Refine,
    Expand,
    RefinedDone,
    Complete,
    Continue,
}

pub(crate) fn derive_reflection_type(changes: &[PlanChange], pending: usize) -> ReflectionType {
    let added = changes.iter().any(|c| c.kind == ChangeKind::Added);
    let revised = changes
        .iter()
        .any(|c| matches!(c.kind, ChangeKind::Updated | ChangeKind::Removed));
    if added {
        ReflectionType::Expand
    } else if revised && pending == 0 {
        ReflectionType::RefinedDone
    } else if revised {
        ReflectionType::Refine
    } else if pending == 0 {
        ReflectionType::Complete
    } else {
        ReflectionType::Continue
    }
}

/// The serialized form of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanData {
    pub version: u32,
    pub id: String,
    pub input: String,
    pub todos: Vec<ToDo>,
    pub state: PlanState,
}

// ─── Plan ────────────────────────────────────────────────────────────────────

/// Runtime handles, recreated on re-bind and never serialized.
struct PlanRuntime {
    provider: Arc<dyn Provider>,
    toolbox: Toolbox,
    session: Box<dyn Session>,
    hooks: Arc<dyn Hooks>,
    system_prompt: Option<String>,
    config: PlanConfig,
    /// Executor sub-turns, returned as `additional_history`.
    internal: History,
}

pub struct Plan {
    id: String,
    input: String,
    todos: Vec<ToDo>,
    state: PlanState,
    runtime: Option<PlanRuntime>,
}

impl Plan {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn state(&self) -> PlanState {
        self.state
    }

    pub fn todos(&self) -> &[ToDo] {
        &self.todos
    }

    pub fn to_data(&self) -> PlanData {
        PlanData {
            version: PLAN_VERSION,
            id: self.id.clone(),
            input: self.input.clone(),
            todos: self.todos.clone(),
            state: self.state,
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(&self.to_data())?)
    }

    /// Run the plan to a terminal state.
    ///
    /// Picks the first pending to-do, executes it through the main session
    /// (recursively resolving tool calls), reflects, applies the
    /// reflection, and repeats until nothing is pending.  Completed to-dos
    /// from a previous run are never re-executed.
    pub async fn execute(&mut self) -> Result<ExecuteResponse, PlanError> {
        match self.state {
            PlanState::Completed | PlanState::Failed => return Err(PlanError::AlreadyExecuted),
            PlanState::Created | PlanState::Running => {}
        }
        if self.runtime.is_none() {
            return Err(PlanError::NotInitialized);
        }
        self.state = PlanState::Running;

        let mut final_response = String::new();

        while let Some(idx) = self
            .todos
            .iter()
            .position(|t| t.status == TodoStatus::Pending)
        {
            {
                let todo = &mut self.todos[idx];
                todo.status = TodoStatus::Executing;
                todo.updated_at = Utc::now();
            }
            let runtime = self.runtime.as_mut().expect("runtime checked above");
            runtime
                .hooks
                .on_plan_todo_start(&self.todos[idx])
                .await
                .map_err(|e| hook_abort("plan_todo_start", e))?;

            let progress = progress_summary(&self.todos);
            let intent = effective_intent(&self.todos[idx]);
            match execute_step(runtime, &intent, &progress).await {
                Ok(result) => {
                    let todo = &mut self.todos[idx];
                    todo.result = Some(result);
                    todo.status = TodoStatus::Completed;
                    todo.updated_at = Utc::now();
                }
                Err(e) => {
                    let todo = &mut self.todos[idx];
                    todo.status = TodoStatus::Failed;
                    todo.error = Some(e.to_string());
                    todo.updated_at = Utc::now();
                    self.state = PlanState::Failed;
                    return Err(PlanError::Other(e));
                }
            }
            runtime
                .hooks
                .on_plan_todo_completed(&self.todos[idx])
                .await
                .map_err(|e| hook_abort("plan_todo_completed", e))?;

            let reflection = reflect(runtime, &self.input, &self.todos, idx).await?;
            let changes = apply_reflection(
                &mut self.todos,
                &reflection,
                &runtime.config,
                &runtime.hooks,
            )
            .await?;
            if let Some(response) = &reflection.response {
                if !response.is_empty() {
                    final_response = response.clone();
                }
            }
            let pending = self
                .todos
                .iter()
                .filter(|t| t.status == TodoStatus::Pending)
                .count();
            debug!(
                reflection = ?derive_reflection_type(&changes, pending),
                changes = changes.len(),
                pending,
                "applied reflection"
            );
            if !changes.is_empty() {
                runtime
                    .hooks
                    .on_plan_todo_updated(&changes)
                    .await
                    .map_err(|e| hook_abort("plan_todo_updated", e))?;
            }
        }

        self.state = PlanState::Completed;
        let runtime = self.runtime.as_ref().expect("runtime checked above");
        let done = self
            .todos
            .iter()
            .filter(|t| t.status == TodoStatus::Completed)
            .count();
        runtime
            .hooks
            .on_plan_message(&format!("Plan completed ({done} of {} steps).", self.todos.len()))
            .await
            .map_err(|e| hook_abort("plan_message", e))?;
        runtime
            .hooks
            .on_plan_completed(&self.id, &final_response)
            .await
            .map_err(|e| hook_abort("plan_completed", e))?;

        Ok(ExecuteResponse {
            texts: vec![final_response],
            additional_history: Some(runtime.internal.clone()),
        })
    }
}

fn hook_abort(hook: &'static str, source: anyhow::Error) -> PlanError {
    PlanError::Agent(AgentError::HookAborted { hook, source })
}

fn effective_intent(todo: &ToDo) -> String {
    if todo.intent.is_empty() {
        todo.description.clone()
    } else {
        todo.intent.clone()
    }
}

// ─── Plan creation and re-binding ────────────────────────────────────────────

impl Agent {
    /// Create a plan for `goal` with the default plan configuration.
    pub async fn plan(&self, goal: impl Into<String>) -> Result<Plan, PlanError> {
        self.plan_with_config(goal, PlanConfig::default()).await
    }

    /// Create a plan for `goal`.
    ///
    /// The planner session runs in JSON mode and sees tool capabilities by
    /// name and description only.  Steps with empty descriptions are
    /// dropped; the rest get ids `todo_1`, `todo_2`, … in order.
    pub async fn plan_with_config(
        &self,
        goal: impl Into<String>,
        config: PlanConfig,
    ) -> Result<Plan, PlanError> {
        let goal = goal.into();
        let agent_config = self.config().clone();
        let toolbox = build_toolbox(&agent_config).await?;

        let capabilities: Vec<(String, String)> = toolbox
            .specs()
            .into_iter()
            .map(|s| (s.name, s.description))
            .collect();

        let planner_options = SessionOptions::default()
            .with_content_type(ContentType::Json)
            .with_response_schema(prompts::planner_schema());
        let mut planner = self.provider().new_session(planner_options).await?;
        let response = planner
            .generate(&[Input::text(prompts::planner_prompt(&goal, &capabilities))])
            .await?;
        let todos = parse_planner_steps(&response.texts.concat())?;
        debug!(steps = todos.len(), "planner produced plan");

        let main_options = SessionOptions {
            system_prompt: agent_config.system_prompt.clone(),
            history: None,
            tools: toolbox.specs(),
            content_type: ContentType::Text,
            response_schema: None,
        };
        let session = self.provider().new_session(main_options).await?;

        let plan = Plan {
            id: uuid::Uuid::new_v4().to_string(),
            input: goal,
            todos,
            state: PlanState::Created,
            runtime: Some(PlanRuntime {
                provider: Arc::clone(self.provider()),
                toolbox,
                session,
                hooks: Arc::clone(&agent_config.hooks),
                system_prompt: agent_config.system_prompt.clone(),
                config,
                internal: History::default(),
            }),
        };
        plan.runtime
            .as_ref()
            .expect("just constructed")
            .hooks
            .on_plan_created(&plan.id, &plan.todos)
            .await
            .map_err(|e| hook_abort("plan_created", e))?;
        Ok(plan)
    }

    /// Re-bind a deserialized plan to this agent, rebuilding the tool map
    /// and a fresh main session.  Rejects unknown versions.
    pub async fn plan_from_data(&self, data: PlanData) -> Result<Plan, PlanError> {
        self.plan_from_data_with_config(data, PlanConfig::default())
            .await
    }

    pub async fn plan_from_data_with_config(
        &self,
        data: PlanData,
        config: PlanConfig,
    ) -> Result<Plan, PlanError> {
        if data.version != PLAN_VERSION {
            return Err(PlanError::VersionMismatch {
                found: data.version,
                expected: PLAN_VERSION,
            });
        }
        let agent_config = self.config().clone();
        let toolbox = build_toolbox(&agent_config).await?;
        let main_options = SessionOptions {
            system_prompt: agent_config.system_prompt.clone(),
            history: None,
            tools: toolbox.specs(),
            content_type: ContentType::Text,
            response_schema: None,
        };
        let session = self.provider().new_session(main_options).await?;
        Ok(Plan {
            id: data.id,
            input: data.input,
            todos: data.todos,
            state: data.state,
            runtime: Some(PlanRuntime {
                provider: Arc::clone(self.provider()),
                toolbox,
                session,
                hooks: Arc::clone(&agent_config.hooks),
                system_prompt: agent_config.system_prompt.clone(),
                config,
                internal: History::default(),
            }),
        })
    }

    /// [`plan_from_data`](Self::plan_from_data) from a JSON payload.
    pub async fn plan_from_json(&self, json: &str) -> Result<Plan, PlanError> {
        let data: PlanData = serde_json::from_str(json)
            .map_err(|e| PlanError::Other(anyhow::anyhow!("invalid plan data: {e}")))?;
        self.plan_from_data(data).await
    }
}

// ─── Planner parsing ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PlannerPayload {
    #[serde(default)]
    steps: Vec<PlannerStep>,
}

#[derive(Debug, Deserialize)]
struct PlannerStep {
    #[serde(default)]
    description: String,
    #[serde(default)]
    intent: String,
}

fn parse_planner_steps(raw: &str) -> Result<Vec<ToDo>, PlanError> {
    let payload: PlannerPayload = serde_json::from_str(raw.trim())
        .map_err(|e| PlanError::InvalidPlannerResponse(e.to_string()))?;
    let todos: Vec<ToDo> = payload
        .steps
        .into_iter()
        .filter(|s| !s.description.is_empty())
        .enumerate()
        .map(|(i, s)| ToDo::new(format!("todo_{}", i + 1), s.description, s.intent))
        .collect();
    Ok(todos)
}

// ─── Step execution ──────────────────────────────────────────────────────────

/// Drive one step to completion: prompt the main session, resolve tool
/// calls, and repeat until a response carries none.  Each session call
/// runs under the step timeout; the caller's earlier deadline still wins.
async fn execute_step(
    runtime: &mut PlanRuntime,
    intent: &str,
    progress: &str,
) -> anyhow::Result<TodoResult> {
    let started = Instant::now();
    let prompt = prompts::executor_prompt(intent, progress, runtime.system_prompt.as_deref());
    let mut inputs = vec![Input::text(prompt)];
    let mut output = String::new();
    let mut recorded: Vec<RecordedToolCall> = Vec::new();
    let mut data = ArgMap::new();
    let mut rounds = 0u32;

    loop {
        rounds += 1;
        if rounds > runtime.config.max_step_rounds {
            anyhow::bail!(
                "step exceeded {} model rounds without settling",
                runtime.config.max_step_rounds
            );
        }

        let response = tokio::time::timeout(
            runtime.config.step_timeout,
            runtime.session.generate(&inputs),
        )
        .await
        .map_err(|_| {
            anyhow::anyhow!(
                "executor call timed out after {:?}",
                runtime.config.step_timeout
            )
        })??;

        runtime.internal.append_many(messages_from_inputs(&inputs));
        runtime.internal.append(message_from_response(&response));

        for text in response.texts.iter().filter(|t| !t.is_empty()) {
            runtime.hooks.on_plan_message(text).await?;
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str(text);
        }

        if response.tool_calls.is_empty() {
            break;
        }
        inputs = Vec::new();
        for call in &response.tool_calls {
            recorded.push(RecordedToolCall {
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            });
            match runtime
                .toolbox
                .run(&call.name, call.arguments.clone())
                .await
            {
                Ok(map) => {
                    data.insert(call.name.clone(), Value::Object(map.clone()));
                    inputs.push(Input::tool_ok(&call.id, &call.name, map));
                }
                Err(e) => {
                    warn!(tool = %call.name, error = %e, "step tool failed; relaying");
                    inputs.push(Input::tool_err(&call.id, &call.name, e.to_string()));
                }
            }
        }
    }

    Ok(TodoResult {
        output,
        tool_calls: recorded,
        data,
        duration_ms: started.elapsed().as_millis() as u64,
    })
}

// ─── Reflection ──────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct ReflectionPayload {
    #[serde(rename = "type", default)]
    #[allow(dead_code)]
    kind: Option<String>,
    #[serde(default)]
    updated_todos: Vec<TodoPatch>,
    #[serde(default)]
    new_todos: Vec<TodoSeed>,
    #[serde(default)]
    skipped_todos: Vec<String>,
    #[serde(default)]
    skip_decisions: Vec<SkipDecision>,
    #[serde(default)]
    completion_reason: Option<String>,
    #[serde(default)]
    response: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TodoPatch {
    id: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    intent: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TodoSeed {
    #[serde(default)]
    description: String,
    #[serde(default)]
    intent: String,
}

/// Run one reflector session over the current plan state.
///
/// An unparseable reflection degrades to `{response: <raw>,
/// completion_reason: "reflection_fallback_used"}` so a sloppy model ends
/// the plan gracefully instead of failing it.
async fn reflect(
    runtime: &mut PlanRuntime,
    goal: &str,
    todos: &[ToDo],
    last_idx: usize,
) -> Result<ReflectionPayload, PlanError> {
    let options = SessionOptions::default().with_content_type(ContentType::Json);
    let mut session = runtime.provider.new_session(options).await?;

    let last_result = todos[last_idx]
        .result
        .as_ref()
        .map(|r| r.output.clone())
        .unwrap_or_default();
    let prompt = prompts::reflector_prompt(
        goal,
        &status_summary(todos),
        &plan_outline(todos),
        &completed_outline(todos),
        &last_result,
    );
    let response = tokio::time::timeout(
        runtime.config.step_timeout,
        session.generate(&[Input::text(prompt)]),
    )
    .await
    .map_err(|_| {
        PlanError::Other(anyhow::anyhow!(
            "reflector call timed out after {:?}",
            runtime.config.step_timeout
        ))
    })??;

    let raw = response.texts.concat();
    match serde_json::from_str::<ReflectionPayload>(raw.trim()) {
        Ok(payload) => Ok(payload),
        Err(e) => {
            warn!(error = %e, "reflection returned invalid JSON; using fallback");
            Ok(ReflectionPayload {
                response: Some(raw),
                completion_reason: Some("reflection_fallback_used".into()),
                ..ReflectionPayload::default()
            })
        }
    }
}

/// Apply a reflection to the to-do list and record the ordered change list.
async fn apply_reflection(
    todos: &mut Vec<ToDo>,
    payload: &ReflectionPayload,
    config: &PlanConfig,
    hooks: &Arc<dyn Hooks>,
) -> Result<Vec<PlanChange>, PlanError> {
    let mut changes: Vec<PlanChange> = Vec::new();

    for patch in &payload.updated_todos {
        if let Some(todo) = todos.iter_mut().find(|t| t.id == patch.id) {
            // Completed work is preserved verbatim.
            if todo.status == TodoStatus::Completed {
                continue;
            }
            let old = todo.clone();
            if let Some(description) = &patch.description {
                todo.description = description.clone();
            }
            if let Some(intent) = &patch.intent {
                todo.intent = intent.clone();
            }
            todo.updated_at = Utc::now();
            changes.push(PlanChange {
                kind: ChangeKind::Updated,
                todo_id: todo.id.clone(),
                old: Some(old),
                new: Some(todo.clone()),
                description: "revised by reflection".into(),
            });
        }
    }

    let mut max_index = todos
        .iter()
        .filter_map(|t| t.id.strip_prefix("todo_")?.parse::<usize>().ok())
        .max()
        .unwrap_or(todos.len());
    for seed in &payload.new_todos {
        if seed.description.is_empty() {
            continue;
        }
        max_index += 1;
        let todo = ToDo::new(
            format!("todo_{max_index}"),
            seed.description.clone(),
            seed.intent.clone(),
        );
        changes.push(PlanChange {
            kind: ChangeKind::Added,
            todo_id: todo.id.clone(),
            old: None,
            new: Some(todo.clone()),
            description: "added by reflection".into(),
        });
        todos.push(todo);
    }

    for id in &payload.skipped_todos {
        skip_todo(todos, id, "skipped by reflection", &mut changes);
    }

    for decision in &payload.skip_decisions {
        let allowed = match config.execution_mode {
            ExecutionMode::Complete => false,
            ExecutionMode::Efficient => decision.confidence >= config.skip_threshold,
            ExecutionMode::Balanced => {
                decision.confidence >= config.skip_threshold
                    && hooks
                        .confirm_skip(decision)
                        .await
                        .map_err(|e| hook_abort("skip_confirmation", e))?
            }
        };
        if !allowed {
            debug!(todo = %decision.todo_id, confidence = decision.confidence, "skip rejected");
            continue;
        }
        let reason = if decision.skip_reason.is_empty() {
            "skipped by reflection"
        } else {
            &decision.skip_reason
        };
        skip_todo(todos, &decision.todo_id, reason, &mut changes);
    }

    Ok(changes)
}

fn skip_todo(todos: &mut [ToDo], id: &str, reason: &str, changes: &mut Vec<PlanChange>) {
    if let Some(todo) = todos
        .iter_mut()
        .find(|t| t.id == id && t.status == TodoStatus::Pending)
    {
        let old = todo.clone();
        todo.status = TodoStatus::Skipped;
        todo.updated_at = Utc::now();
        changes.push(PlanChange {
            kind: ChangeKind::Removed,
            todo_id: todo.id.clone(),
            old: Some(old),
            new: Some(todo.clone()),
            description: reason.to_string(),
        });
    }
}

// ─── Summaries for prompts ───────────────────────────────────────────────────

fn status_summary(todos: &[ToDo]) -> String {
    let count = |status: TodoStatus| todos.iter().filter(|t| t.status == status).count();
    format!(
        "{} completed, {} pending, {} skipped, {} failed",
        count(TodoStatus::Completed),
        count(TodoStatus::Pending),
        count(TodoStatus::Skipped),
        count(TodoStatus::Failed),
    )
}

fn plan_outline(todos: &[ToDo]) -> String {
    todos
        .iter()
        .map(|t| format!("- {} [{:?}] {}", t.id, t.status, t.description))
        .collect::<Vec<_>>()
        .join("\n")
}

fn completed_outline(todos: &[ToDo]) -> String {
    todos
        .iter()
        .filter(|t| t.status == TodoStatus::Completed)
        .map(|t| {
            let output = t
                .result
                .as_ref()
                .map(|r| truncate(&r.output, 400))
                .unwrap_or_default();
            format!("- {}: {output}", t.id)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Progress summary rendered into the executor prompt: completed steps and
/// their outputs.
fn progress_summary(todos: &[ToDo]) -> String {
    completed_outline(todos)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{cut}…")
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
