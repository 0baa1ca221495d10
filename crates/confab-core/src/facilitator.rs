// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use confab_history::{History, Role};
use confab_model::{ContentType, Input, Provider, Session, SessionOptions};
use confab_schema::{ArgMap, Parameter, ToolSpec};
use confab_tools::Tool;

use crate::prompts;

/// Name of the pseudo-tool the default facilitator installs.  The model
/// "calls" it to deliver its final summary, which routes termination
/// through the ordinary tool dispatch path.
pub const FACILITATOR_TOOL_NAME: &str = "respond_to_user";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacilitatorAction {
    Continue,
    Complete,
}

/// The facilitator's continue/complete decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilitatorDecision {
    pub action: FacilitatorAction,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub next_step: Option<String>,
    #[serde(default)]
    pub completion: Option<String>,
}

/// Termination policy for the basic loop.
///
/// The facilitator is both a tool (`spec`/`run` — calling it marks the
/// conversation complete) and a judge: between turns with no pending tool
/// output, `facilitate` consults the model on whether to continue.
#[async_trait]
pub trait Facilitator: Send + Sync {
    fn spec(&self) -> ToolSpec;
    async fn run(&self, args: ArgMap) -> anyhow::Result<ArgMap>;
    fn is_completed(&self) -> bool;
    async fn facilitate(&self, history: &History) -> anyhow::Result<FacilitatorDecision>;
}

/// Default facilitator: a `respond_to_user` pseudo-tool plus its own
/// JSON-mode side-session (distinct from the main session) for decisions.
pub struct DefaultFacilitator {
    provider: Arc<dyn Provider>,
    completed: AtomicBool,
    session: Mutex<Option<Box<dyn Session>>>,
}

impl DefaultFacilitator {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            completed: AtomicBool::new(false),
            session: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Facilitator for DefaultFacilitator {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            FACILITATOR_TOOL_NAME,
            "Deliver the final response to the user and end the conversation. \
             Call this once the task is complete.",
        )
        .with_parameter(
            "summary",
            Parameter::required_string("summary of what was done and the outcome"),
        )
    }

    async fn run(&self, _args: ArgMap) -> anyhow::Result<ArgMap> {
        self.completed.store(true, Ordering::SeqCst);
        let mut out = ArgMap::new();
        out.insert("status".into(), json!("completed"));
        Ok(out)
    }

    fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    async fn facilitate(&self, history: &History) -> anyhow::Result<FacilitatorDecision> {
        let mut guard = self.session.lock().await;
        if guard.is_none() {
            let options = SessionOptions::default()
                .with_content_type(ContentType::Json)
                .with_response_schema(prompts::facilitator_schema());
            *guard = Some(self.provider.new_session(options).await?);
        }
        let session = guard.as_mut().expect("facilitator session just opened");

        let prompt = prompts::facilitator_prompt(&recent_transcript(history, 6));
        let response = session.generate(&[Input::text(prompt)]).await?;
        let text = response.texts.concat();

        match serde_json::from_str::<FacilitatorDecision>(text.trim()) {
            Ok(decision) => {
                debug!(action = ?decision.action, reason = %decision.reason, "facilitator decision");
                Ok(decision)
            }
            Err(e) => {
                // Malformed decision payloads degrade to "continue" rather
                // than killing the conversation.
                warn!(error = %e, "facilitator returned invalid JSON; continuing");
                Ok(FacilitatorDecision {
                    action: FacilitatorAction::Continue,
                    reason: "facilitator_fallback".into(),
                    next_step: Some("Please continue with the task.".into()),
                    completion: None,
                })
            }
        }
    }
}

/// Render the last `limit` messages as a compact `role: text` transcript
/// for the facilitator prompt.
fn recent_transcript(history: &History, limit: usize) -> String {
    let start = history.messages.len().saturating_sub(limit);
    history.messages[start..]
        .iter()
        .filter(|m| !matches!(m.role, Role::System))
        .map(|m| {
            let text = m.text();
            let body = if text.is_empty() {
                if m.has_tool_calls() {
                    "(tool call)".to_string()
                } else if m.has_tool_responses() {
                    "(tool result)".to_string()
                } else {
                    "(empty)".to_string()
                }
            } else {
                text
            };
            format!("{}: {body}", m.role)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Adapter that exposes a facilitator through the ordinary tool contract.
pub(crate) struct FacilitatorTool(pub(crate) Arc<dyn Facilitator>);

#[async_trait]
impl Tool for FacilitatorTool {
    fn spec(&self) -> ToolSpec {
        self.0.spec()
    }
    async fn run(&self, args: ArgMap) -> anyhow::Result<ArgMap> {
        self.0.run(args).await
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
