// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use serde_json::Value;

use confab_schema::ArgMap;

/// A `{{key}}` prompt template, parsed once at construction.
///
/// Rendering is strict: every referenced key must be supplied or the render
/// fails.  Unreferenced argument keys are allowed.  String values insert
/// verbatim; other JSON values insert in their serialized form.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    template: String,
    keys: Vec<String>,
}

impl PromptTemplate {
    pub fn parse(template: impl Into<String>) -> Self {
        let template = template.into();
        let mut keys: Vec<String> = Vec::new();
        let mut rest = template.as_str();
        while let Some(start) = rest.find("{{") {
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let key = after[..end].trim();
                    if !key.is_empty() && !keys.iter().any(|k| k == key) {
                        keys.push(key.to_string());
                    }
                    rest = &after[end + 2..];
                }
                None => break,
            }
        }
        Self { template, keys }
    }

    /// Keys referenced by the template, in first-appearance order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Substitute every placeholder; fail on the first unsupplied key.
    pub fn render(&self, vars: &ArgMap) -> anyhow::Result<String> {
        let mut out = self.template.clone();
        for key in &self.keys {
            let value = vars
                .get(key)
                .ok_or_else(|| anyhow::anyhow!("missing template variable `{key}`"))?;
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            out = out.replace(&format!("{{{{{key}}}}}"), &rendered);
        }
        Ok(out)
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
