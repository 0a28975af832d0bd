// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent dispatcher: builds the three runtime artifacts an agent
//! process needs (`scope.json`, `prompt.md`, `initial-task.md`) under
//! `<root>/runtime/<agentId>/`.

use std::path::PathBuf;

use loom_core::{Gate, StateDefinition, WorkflowDefinition, WorkflowRuntimeState};
use loom_storage::StateStore;
use serde::{Deserialize, Serialize};

use crate::persona::ResolvedRole;

/// Everything the pane supervisor needs to launch one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentArtifacts {
    pub agent_id: String,
    pub scope_path: PathBuf,
    pub prompt_path: PathBuf,
    pub task_path: PathBuf,
    pub tools: Vec<String>,
}

/// `agentId = "<workflow_id>-<roleName>"` — deterministic, so agents for
/// the same role in the same workflow reuse the same directory.
pub fn agent_id(workflow_id: &str, role_name: &str) -> String {
    format!("{workflow_id}-{role_name}")
}

fn built_in_tools() -> Vec<String> {
    vec![
        "send_message".to_string(),
        "check_inbox".to_string(),
        "submit_evidence".to_string(),
    ]
}

fn gate_schema_lines(gate: Option<&Gate>) -> Vec<String> {
    match gate {
        Some(Gate::Evidence { schema, .. }) => schema
            .iter()
            .map(|(k, v)| format!("- `{k}`: {v}"))
            .collect(),
        Some(Gate::Verdict { options }) => {
            vec![format!("- result must be one of: {}", options.join(", "))]
        }
        Some(Gate::Command { verify }) => {
            vec![format!(
                "- verified by running `{}` (expect exit {})",
                verify.command, verify.expect_exit_code
            )]
        }
        None => vec!["- (no gate declared)".to_string()],
    }
}

fn example_evidence_json(gate: Option<&Gate>) -> String {
    match gate {
        Some(Gate::Evidence { schema, .. }) => {
            let mut obj = serde_json::Map::new();
            for (key, type_name) in schema {
                let placeholder = match type_name.as_str() {
                    "string" => serde_json::Value::String("...".to_string()),
                    "number" => serde_json::Value::Number(0.into()),
                    "boolean" => serde_json::Value::Bool(true),
                    "array" => serde_json::Value::Array(vec![]),
                    "object" => serde_json::Value::Object(Default::default()),
                    _ => serde_json::Value::Null,
                };
                obj.insert(key.clone(), placeholder);
            }
            serde_json::to_string_pretty(&serde_json::Value::Object(obj))
                .unwrap_or_else(|_| "{}".to_string())
        }
        _ => "{}".to_string(),
    }
}

/// Canned guidance keyed on a state name's conventional prefix
/// (RED/GREEN/REFACTOR/REVIEW/SETUP), so an agent's prompt carries a hint
/// even when the workflow author didn't write one.
fn state_guidance(state_name: &str) -> &'static str {
    let upper = state_name.to_uppercase();
    if upper.starts_with("RED") {
        "Write a failing test that captures the scenario. Do not implement the fix yet."
    } else if upper.starts_with("GREEN") {
        "Make the failing test pass with the smallest reasonable change."
    } else if upper.starts_with("REFACTOR") {
        "Clean up the implementation without changing observable behavior."
    } else if upper.starts_with("REVIEW") {
        "Evaluate the prior state's output and submit a verdict."
    } else if upper.starts_with("SETUP") {
        "Prepare the workspace and declare the scenario for downstream states."
    } else {
        "Complete the work this state requires, then submit evidence."
    }
}

fn persona_text(resolved: &ResolvedRole, prompt_root: &std::path::Path) -> String {
    match &resolved.persona {
        Some(name) => {
            let path = prompt_root.join("personas").join(name);
            std::fs::read_to_string(&path)
                .unwrap_or_else(|_| format!("(persona `{name}` not found on disk)"))
        }
        None => String::new(),
    }
}

fn agent_definition_text(resolved: &ResolvedRole, prompt_root: &std::path::Path) -> String {
    let project_path = prompt_root
        .join("agents.d")
        .join(format!("{}.md", resolved.agent));
    if let Ok(text) = std::fs::read_to_string(&project_path) {
        return text;
    }
    format!(
        "You are operating as a `{}` agent within a gated workflow.",
        resolved.agent
    )
}

fn build_prompt(
    definition: &WorkflowDefinition,
    state: &WorkflowRuntimeState,
    state_name: &str,
    resolved: &ResolvedRole,
    gate: Option<&Gate>,
    prompt_root: &std::path::Path,
) -> String {
    let persona = persona_text(resolved, prompt_root);
    let agent_def = agent_definition_text(resolved, prompt_root);
    let schema_lines = gate_schema_lines(gate).join("\n");
    let example = example_evidence_json(gate);

    let mut sections = Vec::new();
    if !persona.is_empty() {
        sections.push(format!("## Persona\n\n{persona}"));
    }
    sections.push(format!("## Role\n\n{agent_def}"));
    sections.push(format!(
        "## Workflow context\n\n- workflow: `{}` (`{}`)\n- current state: `{state_name}`\n- params: {}",
        definition.name,
        state.workflow_id,
        serde_json::to_string(&state.params).unwrap_or_else(|_| "{}".to_string())
    ));
    sections.push(format!("## Gate schema\n\n{schema_lines}"));
    sections.push(format!(
        "## Tool usage\n\nCall `submit_evidence(state, result, evidence)` when done, e.g.:\n\n```json\n{{\"state\": \"{state_name}\", \"result\": \"pass\", \"evidence\": {example}}}\n```"
    ));
    sections.join("\n\n")
}

fn build_task(
    state: &WorkflowRuntimeState,
    state_name: &str,
    gate: Option<&Gate>,
) -> String {
    let mut sections = vec![format!("# Task: {state_name}\n\n{}", state_guidance(state_name))];

    if state.retry_count > 0 {
        sections.push(format!(
            "## Retry context\n\nThis is attempt {} for this state.",
            state.retry_count + 1
        ));
        if let Some(entry) = state.history.last() {
            if let Some(failure) = &entry.last_failure {
                sections.push(format!("Last failure: {failure}"));
            }
        }
    }

    let prior_evidence: serde_json::Map<String, serde_json::Value> = state
        .evidence
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    sections.push(format!(
        "## Prior evidence\n\n```json\n{}\n```",
        serde_json::to_string_pretty(&serde_json::Value::Object(prior_evidence))
            .unwrap_or_else(|_| "{}".to_string())
    ));

    sections.push(format!(
        "## Gate schema\n\n{}\n\nExample evidence:\n\n```json\n{}\n```",
        gate_schema_lines(gate).join("\n"),
        example_evidence_json(gate)
    ));

    sections.push(format!(
        "## Workflow params\n\n```json\n{}\n```",
        serde_json::to_string_pretty(&state.params).unwrap_or_else(|_| "{}".to_string())
    ));

    sections.join("\n\n")
}

fn build_scope(resolved: &ResolvedRole) -> serde_json::Value {
    serde_json::json!({
        "writable": resolved.file_scope.writable,
        "readable": resolved.file_scope.readable,
        "tools": built_in_tools(),
    })
}

/// Write `scope.json`, `prompt.md`, and `initial-task.md` for one agent
/// dispatch, returning the paths and tool list the pane supervisor needs.
pub fn build_agent_artifacts(
    store: &StateStore,
    definition: &WorkflowDefinition,
    state: &WorkflowRuntimeState,
    state_name: &str,
    role_name: &str,
    state_def: &StateDefinition,
    resolved: &ResolvedRole,
    prompt_root: &std::path::Path,
) -> std::io::Result<AgentArtifacts> {
    let gate = state_def.gate();
    let id = agent_id(state.workflow_id.as_str(), role_name);
    let dir = store.runtime_dir(&id);
    std::fs::create_dir_all(&dir)?;

    let scope_path = dir.join("scope.json");
    std::fs::write(
        &scope_path,
        serde_json::to_string_pretty(&build_scope(resolved))?,
    )?;

    let prompt_path = dir.join("prompt.md");
    std::fs::write(
        &prompt_path,
        build_prompt(definition, state, state_name, resolved, gate, prompt_root),
    )?;

    let task_path = dir.join("initial-task.md");
    std::fs::write(&task_path, build_task(state, state_name, gate))?;

    Ok(AgentArtifacts {
        agent_id: id,
        scope_path,
        prompt_path,
        task_path,
        tools: built_in_tools(),
    })
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
