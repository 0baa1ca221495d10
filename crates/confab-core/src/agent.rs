// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use confab_model::{
    messages_from_inputs, Input, Provider, Response, Session, SessionOptions, StreamEvent,
};
use confab_tools::{ExitConversation, Toolbox};

use crate::config::{AgentConfig, ResponseMode};
use crate::error::AgentError;
use crate::facilitator::FacilitatorTool;
use crate::hooks::Hooks;
use crate::response::ExecuteResponse;
use crate::strategy::{StepDecision, TurnState};

/// The agent: owns a provider handle and a configuration, and drives one
/// model ↔ tool loop per `execute` call.
///
/// The configuration is cloned into an immutable snapshot at the start of
/// every execute and the session opened for that call is dropped when it
/// returns, so concurrent executes against one agent are safe.
pub struct Agent {
    provider: Arc<dyn Provider>,
    config: AgentConfig,
}

/// Cancellation channel used by [`Agent::execute_with_cancel`]: sending
/// `()` — or dropping the sender — interrupts the execute at the next
/// suspension point.
type CancelRx = oneshot::Receiver<()>;

impl Agent {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self::with_config(provider, AgentConfig::default())
    }

    pub fn with_config(provider: Arc<dyn Provider>, config: AgentConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut AgentConfig {
        &mut self.config
    }

    /// Run the agent loop until the strategy finishes, a limit trips, or a
    /// hook aborts.
    pub async fn execute(&self, inputs: Vec<Input>) -> Result<ExecuteResponse, AgentError> {
        self.run(inputs, None).await
    }

    /// Like [`execute`](Self::execute), interruptible through `cancel`.
    pub async fn execute_with_cancel(
        &self,
        inputs: Vec<Input>,
        cancel: CancelRx,
    ) -> Result<ExecuteResponse, AgentError> {
        self.run(inputs, Some(cancel)).await
    }

    async fn run(
        &self,
        initial: Vec<Input>,
        mut cancel: Option<CancelRx>,
    ) -> Result<ExecuteResponse, AgentError> {
        // Immutable per-call snapshot.
        let config = self.config.clone();
        let hooks = Arc::clone(&config.hooks);
        let strategy = Arc::clone(&config.strategy);

        let mut toolbox = build_toolbox(&config).await?;
        let facilitator = strategy.facilitator(&self.provider);
        if let Some(f) = &facilitator {
            toolbox.add_tool(Arc::new(FacilitatorTool(Arc::clone(f))))?;
        }

        let options = SessionOptions {
            system_prompt: config.system_prompt.clone(),
            history: config.history.clone(),
            tools: toolbox.specs(),
            content_type: config.content_type,
            response_schema: config.response_schema.clone(),
        };
        options.validate()?;
        let mut session = self.provider.new_session(options).await?;

        let mut inputs = initial;
        if config.history.is_none() {
            if let Some(init) = &config.init_prompt {
                inputs.insert(0, Input::text(init));
            }
        }

        let mut texts: Vec<String> = Vec::new();
        let mut iteration = 0u32;
        let mut consecutive_failures: HashMap<String, u32> = HashMap::new();

        loop {
            // Cancellation between turns is detected before the next call.
            if is_cancelled(&mut cancel) {
                return Err(AgentError::Cancelled {
                    history: Box::new(session.history()),
                });
            }

            let mut state = TurnState {
                iteration,
                inputs: std::mem::take(&mut inputs),
                texts: &texts,
                history: session.history(),
                facilitator: facilitator.as_deref(),
            };
            let send = match strategy.handle(&mut state).await? {
                StepDecision::Finish(response) => return Ok(response),
                StepDecision::Send(send) => send,
            };
            if send.is_empty() {
                return Ok(ExecuteResponse::from_texts(texts));
            }

            iteration += 1;
            if iteration > config.loop_limit {
                // The pending tool responses were produced but never sent;
                // fold them into the reported history so nothing is lost.
                let mut history = session.history();
                history.append_many(messages_from_inputs(&send));
                return Err(AgentError::LoopLimitExceeded {
                    limit: config.loop_limit,
                    history: Box::new(history),
                });
            }

            // Everything completed before this turn survives a cancellation
            // mid-turn; partial work inside the turn is discarded.
            let checkpoint = session.history();

            let response = match config.response_mode {
                ResponseMode::Blocking => {
                    let generated =
                        match with_cancel(&mut cancel, session.generate(&send)).await {
                            None => {
                                return Err(AgentError::Cancelled {
                                    history: Box::new(checkpoint),
                                })
                            }
                            Some(r) => r.map_err(AgentError::Other)?,
                        };
                    for text in generated.texts.iter().filter(|t| !t.is_empty()) {
                        hooks.on_message(text).await.map_err(|e| {
                            AgentError::HookAborted {
                                hook: "message",
                                source: e,
                            }
                        })?;
                    }
                    generated
                }
                ResponseMode::Streaming => {
                    match stream_turn(&mut session, &send, &hooks, &mut cancel).await? {
                        Some(r) => r,
                        None => {
                            return Err(AgentError::Cancelled {
                                history: Box::new(checkpoint),
                            })
                        }
                    }
                }
            };

            texts.extend(response.texts.iter().filter(|t| !t.is_empty()).cloned());

            for call in &response.tool_calls {
                hooks
                    .on_tool_request(call)
                    .await
                    .map_err(|e| AgentError::HookAborted {
                        hook: "tool_request",
                        source: e,
                    })?;

                if !toolbox.contains(&call.name) {
                    warn!(tool = %call.name, "model requested unknown tool");
                    inputs.push(Input::tool_err(
                        &call.id,
                        &call.name,
                        format!("unknown tool: {}", call.name),
                    ));
                    continue;
                }
                if let Some(spec) = toolbox.spec(&call.name) {
                    if let Err(e) = spec.validate_args(&call.arguments) {
                        inputs.push(Input::tool_err(
                            &call.id,
                            &call.name,
                            format!("invalid arguments: {e}"),
                        ));
                        continue;
                    }
                }

                let outcome =
                    match with_cancel(&mut cancel, toolbox.run(&call.name, call.arguments.clone()))
                        .await
                    {
                        None => {
                            return Err(AgentError::Cancelled {
                                history: Box::new(checkpoint),
                            })
                        }
                        Some(r) => r,
                    };

                match outcome {
                    Ok(result) => {
                        consecutive_failures.remove(&call.name);
                        hooks.on_tool_response(call, &result).await.map_err(|e| {
                            AgentError::HookAborted {
                                hook: "tool_response",
                                source: e,
                            }
                        })?;
                        inputs.push(Input::tool_ok(&call.id, &call.name, result));
                    }
                    Err(e) if ExitConversation::is_exit(&e) => {
                        debug!(tool = %call.name, "tool requested conversation exit");
                        return Ok(ExecuteResponse::from_texts(texts));
                    }
                    Err(e) => {
                        hooks.on_tool_error(call, &e).await.map_err(|he| {
                            AgentError::HookAborted {
                                hook: "tool_error",
                                source: he,
                            }
                        })?;
                        let count = consecutive_failures
                            .entry(call.name.clone())
                            .and_modify(|c| *c += 1)
                            .or_insert(1);
                        if *count >= config.retry_limit {
                            return Err(AgentError::ToolRetryLimitExceeded {
                                name: call.name.clone(),
                                limit: config.retry_limit,
                            });
                        }
                        warn!(tool = %call.name, error = %e, "tool failed; relaying to model");
                        inputs.push(Input::tool_err(&call.id, &call.name, e.to_string()));
                    }
                }
            }
        }
    }
}

/// Build the effective tool map from tools, tool sets, and sub-agents.
/// Fails on the first duplicate name.
pub(crate) async fn build_toolbox(config: &AgentConfig) -> Result<Toolbox, AgentError> {
    let mut toolbox = Toolbox::new();
    for tool in &config.tools {
        toolbox.add_tool(Arc::clone(tool))?;
    }
    for set in &config.tool_sets {
        toolbox.add_tool_set(Arc::clone(set)).await?;
    }
    for sub in &config.sub_agents {
        toolbox.add_tool(Arc::clone(sub))?;
    }
    Ok(toolbox)
}

/// Consume one streaming turn.  Returns `Ok(None)` when cancelled.
async fn stream_turn(
    session: &mut Box<dyn Session>,
    send: &[Input],
    hooks: &Arc<dyn Hooks>,
    cancel: &mut Option<CancelRx>,
) -> Result<Option<Response>, AgentError> {
    let mut stream = match with_cancel(cancel, session.generate_stream(send)).await {
        None => return Ok(None),
        Some(r) => r.map_err(AgentError::Other)?,
    };

    let mut events: Vec<StreamEvent> = Vec::new();
    loop {
        let item = match with_cancel(cancel, stream.next()).await {
            None => return Ok(None),
            Some(i) => i,
        };
        let Some(item) = item else { break };
        let event = item.map_err(AgentError::Other)?;
        match &event {
            StreamEvent::TextDelta(delta) if !delta.is_empty() => {
                hooks
                    .on_message(delta)
                    .await
                    .map_err(|e| AgentError::HookAborted {
                        hook: "message",
                        source: e,
                    })?;
            }
            StreamEvent::Error(e) => warn!("model stream error: {e}"),
            _ => {}
        }
        let done = matches!(event, StreamEvent::Done);
        events.push(event);
        if done {
            break;
        }
    }
    Ok(Some(Response::from_events(&events)))
}

/// True when the cancel channel fired or its sender was dropped.
fn is_cancelled(cancel: &mut Option<CancelRx>) -> bool {
    match cancel {
        None => false,
        Some(rx) => !matches!(rx.try_recv(), Err(oneshot::error::TryRecvError::Empty)),
    }
}

/// Await `fut`, racing it against the cancel channel.  `None` means the
/// cancellation won; both an explicit send and a dropped sender count.
async fn with_cancel<F, T>(cancel: &mut Option<CancelRx>, fut: F) -> Option<T>
where
    F: std::future::Future<Output = T>,
{
    match cancel {
        None => Some(fut.await),
        Some(rx) => {
            tokio::select! {
                biased;
                _ = &mut *rx => None,
                out = fut => Some(out),
            }
        }
    }
}
