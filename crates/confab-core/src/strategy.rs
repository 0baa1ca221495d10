// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::sync::Arc;

use async_trait::async_trait;

use confab_history::History;
use confab_model::{Input, Provider};

use crate::error::AgentError;
use crate::facilitator::{DefaultFacilitator, Facilitator, FacilitatorAction};
use crate::response::ExecuteResponse;

/// What the strategy wants the loop to do with this turn.
pub enum StepDecision {
    /// Send these inputs to the session.
    Send(Vec<Input>),
    /// Terminate successfully with this response.
    Finish(ExecuteResponse),
}

/// The loop state a strategy sees at the top of each turn.
pub struct TurnState<'a> {
    /// Turns completed so far (0 before the first session call).
    pub iteration: u32,
    /// Inputs queued for the next call: the initial inputs on turn zero,
    /// tool responses afterwards.  The strategy takes them to send them.
    pub inputs: Vec<Input>,
    /// Every text segment produced so far.
    pub texts: &'a [String],
    /// Snapshot of the session cursor.
    pub history: History,
    /// The installed facilitator, when the strategy uses one.
    pub facilitator: Option<&'a dyn Facilitator>,
}

/// Pluggable driver of the agent loop, consulted at the top of every turn.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    /// Facilitator to install for one execute.  Returning `Some` adds the
    /// facilitator's pseudo-tool to the session tool map.
    fn facilitator(&self, _provider: &Arc<dyn Provider>) -> Option<Arc<dyn Facilitator>> {
        None
    }

    /// Decide whether to keep going (and with what inputs) or finish.
    async fn handle(&self, state: &mut TurnState<'_>) -> Result<StepDecision, AgentError>;
}

/// The default one-shot loop: relay pending inputs, and between turns with
/// no pending tool output ask the facilitator whether to continue.
pub struct BasicStrategy;

#[async_trait]
impl Strategy for BasicStrategy {
    fn name(&self) -> &str {
        "basic"
    }

    fn facilitator(&self, provider: &Arc<dyn Provider>) -> Option<Arc<dyn Facilitator>> {
        Some(Arc::new(DefaultFacilitator::new(Arc::clone(provider))))
    }

    async fn handle(&self, state: &mut TurnState<'_>) -> Result<StepDecision, AgentError> {
        if let Some(facilitator) = state.facilitator {
            if facilitator.is_completed() {
                return Ok(StepDecision::Finish(ExecuteResponse::from_texts(
                    state.texts.to_vec(),
                )));
            }
        }

        if !state.inputs.is_empty() {
            return Ok(StepDecision::Send(std::mem::take(&mut state.inputs)));
        }

        // Nothing pending.  Before the first turn that simply means there is
        // nothing to do; afterwards the facilitator decides.
        if state.iteration == 0 {
            return Ok(StepDecision::Finish(ExecuteResponse::default()));
        }
        let Some(facilitator) = state.facilitator else {
            return Ok(StepDecision::Finish(ExecuteResponse::from_texts(
                state.texts.to_vec(),
            )));
        };

        let decision = facilitator.facilitate(&state.history).await?;
        match decision.action {
            FacilitatorAction::Complete => Ok(StepDecision::Finish(ExecuteResponse::from_texts(
                state.texts.to_vec(),
            ))),
            FacilitatorAction::Continue => {
                let next = decision
                    .next_step
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| "Please continue with the task.".into());
                Ok(StepDecision::Send(vec![Input::text(next)]))
            }
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use confab_model::mock::ScriptedProvider;

    use super::*;

    fn state<'a>(
        iteration: u32,
        inputs: Vec<Input>,
        texts: &'a [String],
        facilitator: Option<&'a dyn Facilitator>,
    ) -> TurnState<'a> {
        TurnState {
            iteration,
            inputs,
            texts,
            history: History::default(),
            facilitator,
        }
    }

    #[tokio::test]
    async fn pending_inputs_are_sent_through() {
        let mut s = state(0, vec![Input::text("go")], &[], None);
        match BasicStrategy.handle(&mut s).await.unwrap() {
            StepDecision::Send(inputs) => assert_eq!(inputs, vec![Input::text("go")]),
            StepDecision::Finish(_) => panic!("expected send"),
        }
    }

    #[tokio::test]
    async fn no_facilitator_finishes_when_nothing_pending() {
        let texts = vec!["answer".to_string()];
        let mut s = state(1, vec![], &texts, None);
        match BasicStrategy.handle(&mut s).await.unwrap() {
            StepDecision::Finish(r) => assert_eq!(r.texts, vec!["answer"]),
            StepDecision::Send(_) => panic!("expected finish"),
        }
    }

    #[tokio::test]
    async fn completed_facilitator_finishes_immediately() {
        let provider: Arc<dyn Provider> = Arc::new(ScriptedProvider::new(vec![]));
        let f = DefaultFacilitator::new(provider);
        f.run(Default::default()).await.unwrap();
        let texts = vec!["done".to_string()];
        let mut s = state(2, vec![Input::text("pending response")], &texts, Some(&f));
        match BasicStrategy.handle(&mut s).await.unwrap() {
            StepDecision::Finish(r) => assert_eq!(r.texts, vec!["done"]),
            StepDecision::Send(_) => panic!("expected finish"),
        }
    }

    #[tokio::test]
    async fn facilitator_continue_feeds_next_step() {
        let provider = Arc::new(ScriptedProvider::new(vec![ScriptedProvider::text_script(
            r#"{"action":"continue","reason":"more","next_step":"try again"}"#,
        )]));
        let f = DefaultFacilitator::new(provider);
        let texts = vec!["partial".to_string()];
        let mut s = state(1, vec![], &texts, Some(&f));
        match BasicStrategy.handle(&mut s).await.unwrap() {
            StepDecision::Send(inputs) => {
                assert_eq!(inputs, vec![Input::text("try again")]);
            }
            StepDecision::Finish(_) => panic!("expected send"),
        }
    }

    #[tokio::test]
    async fn facilitator_complete_finishes_with_accumulated_texts() {
        let provider = Arc::new(ScriptedProvider::new(vec![ScriptedProvider::text_script(
            r#"{"action":"complete","reason":"done","completion":"done"}"#,
        )]));
        let f = DefaultFacilitator::new(provider);
        let texts = vec!["Hi".to_string()];
        let mut s = state(1, vec![], &texts, Some(&f));
        match BasicStrategy.handle(&mut s).await.unwrap() {
            // The facilitator's own completion text is not re-emitted.
            StepDecision::Finish(r) => assert_eq!(r.texts, vec!["Hi"]),
            StepDecision::Send(_) => panic!("expected finish"),
        }
    }
}
