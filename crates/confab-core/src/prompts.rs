// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Prompt text and response schemas for the built-in side-sessions
//! (facilitator, planner, executor, reflector).

use std::collections::BTreeMap;

use confab_schema::{Parameter, ParameterType};

/// Prompt for the facilitator's decision session.
pub(crate) fn facilitator_prompt(transcript: &str) -> String {
    format!(
        "You are observing a conversation between a user and an assistant.\n\
         Decide whether the assistant has fully answered the user's request\n\
         or should keep working.\n\n\
         Recent conversation:\n{transcript}\n\n\
         Respond with a single JSON document and nothing else:\n\
         {{\"action\":\"continue\"|\"complete\",\"reason\":\"why\",\
         \"next_step\":\"instruction when continuing\",\
         \"completion\":\"closing summary when complete\"}}"
    )
}

/// Response schema for the facilitator session.
pub(crate) fn facilitator_schema() -> Parameter {
    let mut properties = BTreeMap::new();
    properties.insert(
        "action".to_string(),
        Parameter {
            enum_values: vec!["continue".into(), "complete".into()],
            required: true,
            ..Parameter::of_type(ParameterType::String)
        },
    );
    properties.insert(
        "reason".to_string(),
        Parameter::required_string("why this action was chosen"),
    );
    properties.insert(
        "next_step".to_string(),
        Parameter {
            description: Some("the next instruction, when continuing".into()),
            ..Parameter::of_type(ParameterType::String)
        },
    );
    properties.insert(
        "completion".to_string(),
        Parameter {
            description: Some("closing summary, when complete".into()),
            ..Parameter::of_type(ParameterType::String)
        },
    );
    Parameter {
        properties,
        ..Parameter::of_type(ParameterType::Object)
    }
}

/// Prompt for the planner session.  Tool capabilities are listed by name
/// and description only; argument schemas are deliberately not sent.
pub(crate) fn planner_prompt(goal: &str, tools: &[(String, String)]) -> String {
    let mut capabilities = String::new();
    for (name, description) in tools {
        capabilities.push_str(&format!("- {name}: {description}\n"));
    }
    if capabilities.is_empty() {
        capabilities.push_str("(no tools available)\n");
    }
    format!(
        "Break the user's goal into an ordered list of executable steps.\n\
         Each step needs a short description and the intent behind it.\n\
         Use only the capabilities listed below.\n\n\
         Available capabilities:\n{capabilities}\n\
         Goal: {goal}\n\n\
         Respond with a single JSON document and nothing else:\n\
         {{\"steps\":[{{\"description\":\"...\",\"intent\":\"...\"}}]}}"
    )
}

/// Response schema for the planner session.
pub(crate) fn planner_schema() -> Parameter {
    let mut step_props = BTreeMap::new();
    step_props.insert(
        "description".to_string(),
        Parameter::required_string("what this step does"),
    );
    step_props.insert(
        "intent".to_string(),
        Parameter {
            description: Some("why this step exists".into()),
            ..Parameter::of_type(ParameterType::String)
        },
    );
    let step = Parameter {
        properties: step_props,
        ..Parameter::of_type(ParameterType::Object)
    };
    let mut properties = BTreeMap::new();
    properties.insert(
        "steps".to_string(),
        Parameter {
            required: true,
            items: Some(Box::new(step)),
            ..Parameter::of_type(ParameterType::Array)
        },
    );
    Parameter {
        properties,
        ..Parameter::of_type(ParameterType::Object)
    }
}

/// Prompt for one executor turn inside plan execution.
pub(crate) fn executor_prompt(intent: &str, progress: &str, system: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(system) = system {
        out.push_str(system);
        out.push_str("\n\n");
    }
    if !progress.is_empty() {
        out.push_str("Progress so far:\n");
        out.push_str(progress);
        out.push_str("\n\n");
    }
    out.push_str(&format!(
        "Execute the next step now: {intent}\n\
         Use the available tools where they help and report what you did."
    ));
    out
}

/// Prompt for the reflector session run after each completed step.
pub(crate) fn reflector_prompt(
    goal: &str,
    status: &str,
    plan: &str,
    completed: &str,
    last_result: &str,
) -> String {
    format!(
        "You are reviewing an in-flight plan.\n\n\
         Original goal: {goal}\n\n\
         Current status:\n{status}\n\n\
         Plan:\n{plan}\n\
         Completed steps:\n{completed}\n\
         Result of the last step:\n{last_result}\n\n\
         Revise the remaining plan if needed. Respond with a single JSON\n\
         document and nothing else:\n\
         {{\"type\":\"refine|expand|continue|complete\",\
         \"updated_todos\":[{{\"id\":\"...\",\"description\":\"...\",\"intent\":\"...\"}}],\
         \"new_todos\":[{{\"description\":\"...\",\"intent\":\"...\"}}],\
         \"skipped_todos\":[\"todo_id\"],\
         \"skip_decisions\":[{{\"todo_id\":\"...\",\"skip_reason\":\"...\",\
         \"confidence\":0.0,\"evidence\":\"...\"}}],\
         \"completion_reason\":\"set when the goal is met\",\
         \"response\":\"final answer for the user when done\"}}"
    )
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
