// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persona resolution: merge a project's role override over the
//! definition's defaults, optionally build a pool from the team roster
//! by tag, let `personaFrom` win over everything, and otherwise
//! round-robin a fixed pool.

use loom_core::{EngineError, EngineResult, FileScope, HistoryEntry, WorkflowDefinition};
use serde_json::Value;

use crate::config::ProjectConfig;

/// The role, fully resolved for one dispatch: which agent capability to
/// use, which persona (if any) to inject, and the tool/file-scope
/// restrictions to hand to the agent runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRole {
    pub agent: String,
    pub persona: Option<String>,
    pub tools: Vec<String>,
    pub file_scope: FileScope,
}

fn assigned_to_role(definition: &WorkflowDefinition, state_name: &str, role_name: &str) -> bool {
    matches!(
        definition.states.get(state_name),
        Some(loom_core::StateDefinition::Agent { assign, .. }) if assign == role_name
    )
}

pub fn resolve_role(
    definition: &WorkflowDefinition,
    role_name: &str,
    project_config: &ProjectConfig,
    params: &Value,
    history: &[HistoryEntry],
) -> EngineResult<ResolvedRole> {
    let base = definition
        .roles
        .get(role_name)
        .ok_or_else(|| EngineError::RoleUndefined(role_name.to_string()))?;

    let mut effective = base.clone();

    if let Some(over) = project_config.role_override(role_name) {
        effective = base.merged_with_override(over);

        if over.persona_tags.is_some() && !project_config.team().is_empty() {
            let tags = over.persona_tags.as_deref().unwrap_or(&[]);
            let pool: Vec<String> = project_config
                .team()
                .iter()
                .filter(|member| member.tags.iter().any(|t| tags.contains(t)))
                .map(|member| member.persona.clone())
                .collect();
            if !pool.is_empty() {
                effective.persona_pool = Some(pool);
                effective.persona = None;
            }
        }
    }

    if let Some(key) = effective.persona_from.clone() {
        if let Some(value) = params.get(&key).and_then(Value::as_str) {
            effective.persona = Some(value.to_string());
            effective.persona_pool = None;
        }
    }

    let persona = if let Some(fixed) = &effective.persona {
        Some(fixed.clone())
    } else if let Some(pool) = effective.persona_pool.filter(|p| !p.is_empty()) {
        // Prior entries for this role, excluding the one being set up
        // now (the last entry, already appended by `moveState`/`start`).
        let prior = history.len().saturating_sub(1);
        let k = history[..prior]
            .iter()
            .filter(|entry| assigned_to_role(definition, &entry.state, role_name))
            .count();
        Some(pool[k % pool.len()].clone())
    } else {
        None
    };

    Ok(ResolvedRole {
        agent: effective.agent,
        persona,
        tools: effective.tools,
        file_scope: effective.file_scope,
    })
}

#[cfg(test)]
#[path = "persona_tests.rs"]
mod tests;
