// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! The sub-agent adapter: wrap an [`Agent`] as a [`Tool`] of another agent.
//!
//! The default surface is a single required `query` string passed verbatim
//! as the child's input.  With a prompt template, the tool takes the
//! template's parameter schema instead, runs the argument-transform
//! middleware chain, renders the template (strict: an unsupplied referenced
//! variable fails the call), and feeds the rendered text to the child.
//! Sub-agents nest freely — a wrapped agent may itself carry sub-agents,
//! and every nested execute gets its own session and loop limit.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use confab_model::Input;
use confab_schema::{ArgMap, Parameter, ToolSpec};
use confab_tools::Tool;

use crate::agent::Agent;
use crate::template::PromptTemplate;

/// Argument-transform middleware around a sub-agent's handler.
///
/// Middlewares compose in registration order with the leftmost outermost:
/// later middlewares execute inside earlier ones.  A middleware may mutate
/// the arguments before handing them to `next`, or short-circuit by
/// returning an error.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn call(&self, args: ArgMap, next: Next<'_>) -> anyhow::Result<ArgMap>;
}

/// Continuation into the remainder of a middleware chain.
pub struct Next<'a> {
    rest: &'a [Arc<dyn Middleware>],
}

impl<'a> Next<'a> {
    pub async fn run(self, args: ArgMap) -> anyhow::Result<ArgMap> {
        match self.rest.split_first() {
            None => Ok(args),
            Some((middleware, rest)) => middleware.call(args, Next { rest }).await,
        }
    }
}

/// An agent wrapped as a tool.
pub struct SubAgent {
    name: String,
    description: String,
    agent: Arc<Agent>,
    template: Option<PromptTemplate>,
    parameters: Option<BTreeMap<String, Parameter>>,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl SubAgent {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        agent: Arc<Agent>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            agent,
            template: None,
            parameters: None,
            middlewares: Vec::new(),
        }
    }

    /// Use a prompt template and its parameter schema instead of the
    /// default `query` surface.
    pub fn with_prompt_template(
        mut self,
        template: impl Into<String>,
        parameters: BTreeMap<String, Parameter>,
    ) -> Self {
        self.template = Some(PromptTemplate::parse(template));
        self.parameters = Some(parameters);
        self
    }

    /// Append a middleware to the chain (outermost first).
    pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Finish construction as a registrable tool handle.
    pub fn into_tool(self) -> Arc<dyn Tool> {
        Arc::new(self)
    }

    fn render_prompt(&self, args: &ArgMap) -> anyhow::Result<String> {
        match &self.template {
            Some(template) => template.render(args),
            None => args
                .get("query")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("missing required `query` argument")),
        }
    }
}

#[async_trait]
impl Tool for SubAgent {
    fn spec(&self) -> ToolSpec {
        let parameters = match &self.parameters {
            Some(p) => p.clone(),
            None => {
                let mut p = BTreeMap::new();
                p.insert(
                    "query".to_string(),
                    Parameter::required_string("the request to forward to this agent"),
                );
                p
            }
        };
        ToolSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters,
        }
    }

    async fn run(&self, args: ArgMap) -> anyhow::Result<ArgMap> {
        let args = Next {
            rest: &self.middlewares,
        }
        .run(args)
        .await?;

        let prompt = self.render_prompt(&args)?;
        debug!(sub_agent = %self.name, "running sub-agent");

        let response = self
            .agent
            .execute(vec![Input::text(prompt)])
            .await
            .map_err(anyhow::Error::new)?;

        let mut out = ArgMap::new();
        out.insert("response".into(), json!(response.texts.join("\n")));
        out.insert("status".into(), json!("success"));
        Ok(out)
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
