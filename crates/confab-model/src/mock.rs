// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Deterministic scripted providers for tests.
//!
//! A [`ScriptedProvider`] holds an ordered queue of response scripts; every
//! session it opens pops the next script on each generate call, so a test
//! can drive a whole multi-session exchange (main loop, facilitator,
//! planner, reflector) from one queue without network access.  Opened
//! sessions share their history cursors with the provider so tests can
//! inspect them after the fact.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;
use uuid::Uuid;

use confab_history::History;

use crate::session::{
    message_from_response, messages_from_inputs, Input, Response, Session, SessionOptions,
    SessionStream, StreamEvent,
};
use crate::Provider;

/// Script queue shared between a provider and its sessions.
type ScriptQueue = Arc<Mutex<Vec<Vec<StreamEvent>>>>;

pub struct ScriptedProvider {
    scripts: ScriptQueue,
    /// Options of every session opened, in order.
    pub opened: Arc<Mutex<Vec<SessionOptions>>>,
    /// History cursor of every session opened, in order.
    pub session_histories: Arc<Mutex<Vec<Arc<Mutex<History>>>>>,
}

impl ScriptedProvider {
    /// Build a provider from response scripts.  The outer `Vec` is the
    /// ordered list of generate calls (across all sessions); the inner
    /// `Vec` is the event sequence for that call.
    pub fn new(scripts: Vec<Vec<StreamEvent>>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts)),
            opened: Arc::new(Mutex::new(Vec::new())),
            session_histories: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Provider that always answers with one text reply per call.
    pub fn always_text(reply: impl Into<String>) -> Self {
        Self::new(vec![Self::text_script(reply)])
    }

    /// Event sequence for a plain text reply.
    pub fn text_script(text: impl Into<String>) -> Vec<StreamEvent> {
        vec![StreamEvent::TextDelta(text.into()), StreamEvent::Done]
    }

    /// Event sequence for one complete tool call.
    pub fn tool_call_script(
        id: impl Into<String>,
        name: impl Into<String>,
        args_json: impl Into<String>,
    ) -> Vec<StreamEvent> {
        vec![
            StreamEvent::ToolCallDelta {
                index: 0,
                id: id.into(),
                name: name.into(),
                arguments: args_json.into(),
            },
            StreamEvent::Done,
        ]
    }

    /// Append another script to the queue.
    pub fn push_script(&self, script: Vec<StreamEvent>) {
        self.scripts.lock().unwrap().push(script);
    }

    /// Number of scripts not yet consumed.
    pub fn remaining_scripts(&self) -> usize {
        self.scripts.lock().unwrap().len()
    }

    /// Snapshot of the n-th opened session's history.
    pub fn session_history(&self, index: usize) -> Option<History> {
        self.session_histories
            .lock()
            .unwrap()
            .get(index)
            .map(|h| h.lock().unwrap().clone())
    }

    pub fn sessions_opened(&self) -> usize {
        self.opened.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted-mock"
    }

    async fn new_session(&self, options: SessionOptions) -> anyhow::Result<Box<dyn Session>> {
        options.validate()?;
        let history = Arc::new(Mutex::new(
            options.history.clone().unwrap_or_default(),
        ));
        self.opened.lock().unwrap().push(options);
        self.session_histories
            .lock()
            .unwrap()
            .push(Arc::clone(&history));
        Ok(Box::new(ScriptedSession {
            id: Uuid::new_v4().to_string(),
            scripts: Arc::clone(&self.scripts),
            history,
        }))
    }
}

struct ScriptedSession {
    #[allow(dead_code)]
    id: String,
    scripts: ScriptQueue,
    history: Arc<Mutex<History>>,
}

impl ScriptedSession {
    fn pop_script(&self) -> Vec<StreamEvent> {
        let mut scripts = self.scripts.lock().unwrap();
        if scripts.is_empty() {
            // Fallback when all scripts are consumed, so a miscounted test
            // fails with a visible marker instead of hanging.
            vec![
                StreamEvent::TextDelta("[no more scripts]".into()),
                StreamEvent::Done,
            ]
        } else {
            scripts.remove(0)
        }
    }

    fn record_turn(&self, inputs: &[Input], response: &Response) {
        let mut history = self.history.lock().unwrap();
        history.append_many(messages_from_inputs(inputs));
        history.append(message_from_response(response));
    }
}

#[async_trait]
impl Session for ScriptedSession {
    async fn generate(&mut self, inputs: &[Input]) -> anyhow::Result<Response> {
        let events = self.pop_script();
        if let Some(StreamEvent::Error(e)) = events
            .iter()
            .find(|e| matches!(e, StreamEvent::Error(_)))
        {
            anyhow::bail!("scripted error: {e}");
        }
        let response = Response::from_events(&events);
        self.record_turn(inputs, &response);
        Ok(response)
    }

    async fn generate_stream(&mut self, inputs: &[Input]) -> anyhow::Result<SessionStream> {
        let events = self.pop_script();
        // The cursor records the whole turn up front; the scripted stream is
        // finite and always fully consumed by the loop.
        let response = Response::from_events(&events);
        self.record_turn(inputs, &response);
        let items: Vec<anyhow::Result<StreamEvent>> = events.into_iter().map(Ok).collect();
        Ok(Box::pin(stream::iter(items)))
    }

    fn history(&self) -> History {
        self.history.lock().unwrap().clone()
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
