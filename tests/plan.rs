// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! End-to-end plan-strategy scenarios: planner → executor → reflector with
//! scripted sessions, skip gating, serialization, and resume.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use confab::model::mock::ScriptedProvider;
use confab::{
    Agent, AgentConfig, ArgMap, ContentType, Hooks, PlanChange, PlanError, PlanState, ToDo,
    TodoStatus, Tool, ToolSpec, PLAN_VERSION,
};

fn planner_two_steps() -> Vec<confab::StreamEvent> {
    ScriptedProvider::text_script(
        r#"{"steps":[{"description":"search","intent":"find X"},{"description":"summarize","intent":"write X"}]}"#,
    )
}

// S4: two text-only steps, reflector closes the plan with a response.
#[tokio::test]
async fn two_step_plan_runs_to_completion() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        planner_two_steps(),
        ScriptedProvider::text_script("found stuff"),
        ScriptedProvider::text_script("{}"),
        ScriptedProvider::text_script("summary written"),
        ScriptedProvider::text_script(r#"{"completion_reason":"done","response":"All done"}"#),
    ]));
    let agent = Agent::new(provider.clone());

    let mut plan = agent.plan("research X").await.unwrap();
    assert_eq!(plan.state(), PlanState::Created);
    assert_eq!(plan.todos().len(), 2);
    assert_eq!(plan.todos()[0].id, "todo_1");

    let response = plan.execute().await.unwrap();
    assert_eq!(response.texts, vec!["All done"]);
    assert_eq!(plan.state(), PlanState::Completed);
    assert!(plan
        .todos()
        .iter()
        .all(|t| t.status == TodoStatus::Completed));
    // Executor sub-turns come back as additional history.
    let additional = response.additional_history.unwrap();
    assert!(!additional.is_empty());
    // The planner session ran in JSON mode.
    let opened = provider.opened.lock().unwrap();
    assert_eq!(opened[0].content_type, ContentType::Json);
}

// Property 9: empty step descriptions are dropped before ids are assigned.
#[tokio::test]
async fn planner_drops_empty_steps() {
    let provider = Arc::new(ScriptedProvider::new(vec![ScriptedProvider::text_script(
        r#"{"steps":[{"description":"A","intent":"a"},{"description":"","intent":""}]}"#,
    )]));
    let agent = Agent::new(provider);

    let plan = agent.plan("goal").await.unwrap();
    assert_eq!(plan.todos().len(), 1);
    assert_eq!(plan.todos()[0].id, "todo_1");
    assert_eq!(plan.todos()[0].description, "A");
}

#[tokio::test]
async fn planner_garbage_fails_creation() {
    let provider = Arc::new(ScriptedProvider::new(vec![ScriptedProvider::text_script(
        "no plan here",
    )]));
    let agent = Agent::new(provider);
    assert!(matches!(
        agent.plan("goal").await,
        Err(PlanError::InvalidPlannerResponse(_))
    ));
}

// S6: balanced mode with the default confirmation hook skips a high
// confidence step, and the plan completes once only completed and skipped
// steps remain.
#[tokio::test]
async fn balanced_mode_skips_confident_decisions() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptedProvider::text_script(
            r#"{"steps":[{"description":"one","intent":"1"},{"description":"two","intent":"2"},{"description":"three","intent":"3"}]}"#,
        ),
        ScriptedProvider::text_script("step one done"),
        ScriptedProvider::text_script(
            r#"{"skip_decisions":[{"todo_id":"todo_3","confidence":0.9,"skip_reason":"redundant"}]}"#,
        ),
        ScriptedProvider::text_script("step two done"),
        ScriptedProvider::text_script(r#"{"response":"wrapped up"}"#),
    ]));
    let agent = Agent::new(provider);

    let mut plan = agent.plan("goal").await.unwrap();
    plan.execute().await.unwrap();

    assert_eq!(plan.state(), PlanState::Completed);
    assert_eq!(plan.todos()[0].status, TodoStatus::Completed);
    assert_eq!(plan.todos()[1].status, TodoStatus::Completed);
    assert_eq!(plan.todos()[2].status, TodoStatus::Skipped);
}

// Property 10: efficient mode below the threshold never skips.
#[tokio::test]
async fn low_confidence_skip_is_ignored() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptedProvider::text_script(
            r#"{"steps":[{"description":"one","intent":"1"},{"description":"two","intent":"2"}]}"#,
        ),
        ScriptedProvider::text_script("one done"),
        ScriptedProvider::text_script(
            r#"{"skip_decisions":[{"todo_id":"todo_2","confidence":0.5}]}"#,
        ),
        // todo_2 still pending, so it executes.
        ScriptedProvider::text_script("two done"),
        ScriptedProvider::text_script(r#"{"response":"finished properly"}"#),
    ]));
    let agent = Agent::new(provider);
    let config = confab::PlanConfig {
        execution_mode: confab::ExecutionMode::Efficient,
        ..confab::PlanConfig::default()
    };

    let mut plan = agent.plan_with_config("goal", config).await.unwrap();
    let response = plan.execute().await.unwrap();
    assert_eq!(response.texts, vec!["finished properly"]);
    assert!(plan
        .todos()
        .iter()
        .all(|t| t.status == TodoStatus::Completed));
}

// Unparseable reflection output degrades to a final response instead of
// failing the plan.
#[tokio::test]
async fn reflection_fallback_closes_gracefully() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptedProvider::text_script(r#"{"steps":[{"description":"only","intent":"o"}]}"#),
        ScriptedProvider::text_script("did the only step"),
        ScriptedProvider::text_script("sorry, plain prose instead of JSON"),
    ]));
    let agent = Agent::new(provider);

    let mut plan = agent.plan("goal").await.unwrap();
    let response = plan.execute().await.unwrap();
    assert_eq!(response.texts, vec!["sorry, plain prose instead of JSON"]);
    assert_eq!(plan.state(), PlanState::Completed);
}

// Steps that call tools record their outputs keyed by tool name.
#[tokio::test]
async fn step_tool_outputs_are_recorded_by_name() {
    struct AddTool;
    #[async_trait]
    impl Tool for AddTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec::new("add", "adds numbers")
        }
        async fn run(&self, _args: ArgMap) -> anyhow::Result<ArgMap> {
            let mut out = ArgMap::new();
            out.insert("sum".into(), json!(4));
            Ok(out)
        }
    }

    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptedProvider::text_script(r#"{"steps":[{"description":"compute","intent":"add"}]}"#),
        ScriptedProvider::tool_call_script("c1", "add", r#"{"a":2,"b":2}"#),
        ScriptedProvider::text_script("the sum is 4"),
        ScriptedProvider::text_script(r#"{"response":"computed"}"#),
    ]));
    let mut config = AgentConfig::default();
    config.tools.push(Arc::new(AddTool));
    let agent = Agent::with_config(provider, config);

    let mut plan = agent.plan("compute").await.unwrap();
    plan.execute().await.unwrap();

    let result = plan.todos()[0].result.as_ref().unwrap();
    assert_eq!(result.output, "the sum is 4");
    assert_eq!(result.tool_calls.len(), 1);
    assert_eq!(result.tool_calls[0].name, "add");
    assert_eq!(result.data["add"]["sum"], json!(4));
}

// Property 11: a serialized plan re-binds and resumes without re-running
// completed steps.
#[tokio::test]
async fn deserialized_plan_resumes_without_rerunning_completed_steps() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptedProvider::text_script(
        r#"{"steps":[{"description":"first","intent":"1"},{"description":"second","intent":"2"}]}"#,
        ),
    ]));
    let agent = Agent::new(provider);

    let plan = agent.plan("resume me").await.unwrap();
    let json = plan.to_json().unwrap();
    drop(plan);

    // Simulate a snapshot taken after step one completed.
    let mut parsed: confab::PlanData = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.version, PLAN_VERSION);
    parsed.todos[0].status = TodoStatus::Completed;
    parsed.state = PlanState::Running;

    let provider2 = Arc::new(ScriptedProvider::new(vec![
        ScriptedProvider::text_script("second done"),
        ScriptedProvider::text_script(r#"{"response":"resumed fine"}"#),
    ]));
    let agent2 = Agent::new(provider2.clone());
    let mut restored = agent2.plan_from_data(parsed).await.unwrap();

    let response = restored.execute().await.unwrap();
    assert_eq!(response.texts, vec!["resumed fine"]);
    assert_eq!(restored.todos()[0].status, TodoStatus::Completed);
    assert_eq!(restored.todos()[1].status, TodoStatus::Completed);
    // Two scripts were consumed: one executor call, one reflection — the
    // completed step was not re-run.
    assert_eq!(provider2.remaining_scripts(), 0);
}

#[tokio::test]
async fn plan_version_mismatch_is_rejected() {
    let provider = Arc::new(ScriptedProvider::new(vec![]));
    let agent = Agent::new(provider);
    let json = format!(
        r#"{{"version":{},"id":"p","input":"g","todos":[],"state":"created"}}"#,
        PLAN_VERSION + 1
    );
    assert!(matches!(
        agent.plan_from_json(&json).await,
        Err(PlanError::VersionMismatch { .. })
    ));
}

#[tokio::test]
async fn completed_plan_refuses_to_execute_again() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptedProvider::text_script(r#"{"steps":[{"description":"one","intent":"1"}]}"#),
        ScriptedProvider::text_script("done"),
        ScriptedProvider::text_script(r#"{"response":"over"}"#),
    ]));
    let agent = Agent::new(provider);
    let mut plan = agent.plan("goal").await.unwrap();
    plan.execute().await.unwrap();
    assert!(matches!(
        plan.execute().await,
        Err(PlanError::AlreadyExecuted)
    ));
}

// The full hook sequence fires in order across a plan's life.
#[tokio::test]
async fn plan_hooks_fire_in_order() {
    #[derive(Default)]
    struct PlanHookLog {
        events: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Hooks for PlanHookLog {
        async fn on_plan_created(&self, _id: &str, todos: &[ToDo]) -> anyhow::Result<()> {
            self.events
                .lock()
                .unwrap()
                .push(format!("created:{}", todos.len()));
            Ok(())
        }
        async fn on_plan_todo_start(&self, todo: &ToDo) -> anyhow::Result<()> {
            self.events
                .lock()
                .unwrap()
                .push(format!("start:{}", todo.id));
            Ok(())
        }
        async fn on_plan_todo_completed(&self, todo: &ToDo) -> anyhow::Result<()> {
            self.events
                .lock()
                .unwrap()
                .push(format!("done:{}", todo.id));
            Ok(())
        }
        async fn on_plan_todo_updated(&self, changes: &[PlanChange]) -> anyhow::Result<()> {
            self.events
                .lock()
                .unwrap()
                .push(format!("updated:{}", changes.len()));
            Ok(())
        }
        async fn on_plan_message(&self, _text: &str) -> anyhow::Result<()> {
            self.events.lock().unwrap().push("message".into());
            Ok(())
        }
        async fn on_plan_completed(&self, _id: &str, response: &str) -> anyhow::Result<()> {
            self.events
                .lock()
                .unwrap()
                .push(format!("completed:{response}"));
            Ok(())
        }
    }

    let hooks = Arc::new(PlanHookLog::default());
    let provider = Arc::new(ScriptedProvider::new(vec![
        ScriptedProvider::text_script(r#"{"steps":[{"description":"only","intent":"o"}]}"#),
        ScriptedProvider::text_script("step output"),
        ScriptedProvider::text_script(r#"{"response":"finished"}"#),
    ]));
    let mut config = AgentConfig::default();
    config.hooks = hooks.clone();
    let agent = Agent::with_config(provider, config);

    let mut plan = agent.plan("goal").await.unwrap();
    plan.execute().await.unwrap();

    let events = hooks.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "created:1",
            "start:todo_1",
            "message", // executor text
            "done:todo_1",
            "message", // completion message
            "completed:finished",
        ]
    );
}
