// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared `#[cfg(test)]` fixtures for the handler test modules: small,
//! hand-built workflow definitions exercising each gate kind plus an
//! engine wired to an in-memory-equivalent (tempdir-backed) store and a
//! fake pane supervisor.

use std::sync::Arc;

use indexmap::IndexMap;
use loom_adapters::FakePaneSupervisor;
use loom_core::{CommandSpec, FileScope, Gate, RoleDefinition, StateDefinition, WorkflowDefinition};
use loom_storage::StateStore;
use loom_workflows::WorkflowRegistry;

use crate::WorkflowEngine;

pub fn engine_with(registry: WorkflowRegistry) -> (WorkflowEngine, tempfile::TempDir, Arc<FakePaneSupervisor>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = StateStore::new(dir.path());
    store.ensure().expect("ensure store dirs");
    let pane = Arc::new(FakePaneSupervisor::default());
    let engine = WorkflowEngine::new(store, registry, pane.clone());
    (engine, dir, pane)
}

fn role(agent: &str) -> RoleDefinition {
    RoleDefinition {
        agent: agent.to_string(),
        persona: None,
        persona_pool: None,
        persona_from: None,
        persona_tags: None,
        tools: vec![],
        file_scope: FileScope::default(),
        fresh_per_state: false,
    }
}

fn transitions(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Scenario 1: a verdict gate with a direct happy path.
pub fn verdict_workflow() -> WorkflowDefinition {
    let mut states = IndexMap::new();
    states.insert(
        "REVIEW".to_string(),
        StateDefinition::Agent {
            assign: "reviewer".to_string(),
            gate: Some(Gate::Verdict {
                options: vec!["approved".to_string(), "flagged".to_string()],
            }),
            transitions: transitions(&[("approved", "DONE"), ("flagged", "ESC")]),
            max_retries: None,
            input_from: None,
        },
    );
    states.insert(
        "DONE".to_string(),
        StateDefinition::Terminal {
            result: "success".to_string(),
            action: None,
        },
    );
    states.insert(
        "ESC".to_string(),
        StateDefinition::Terminal {
            result: "failure".to_string(),
            action: None,
        },
    );
    let mut roles = IndexMap::new();
    roles.insert("reviewer".to_string(), role("claude"));
    WorkflowDefinition {
        name: "verdict-demo".to_string(),
        description: None,
        initial_state: Some("REVIEW".to_string()),
        params: IndexMap::new(),
        roles,
        states,
    }
}

/// Scenario 2/3: an evidence gate with a `verify` command, two allowed
/// attempts, escalating to `ESC` once both are exhausted.
pub fn evidence_retry_workflow(verify_command: &str) -> WorkflowDefinition {
    let mut schema = IndexMap::new();
    schema.insert("out".to_string(), "string".to_string());
    let mut states = IndexMap::new();
    states.insert(
        "RED".to_string(),
        StateDefinition::Agent {
            assign: "red".to_string(),
            gate: Some(Gate::Evidence {
                schema,
                verify: Some(CommandSpec {
                    command: verify_command.to_string(),
                    expect_exit_code: 0,
                }),
            }),
            transitions: transitions(&[("pass", "GREEN"), ("fail", "ESC")]),
            max_retries: Some(2),
            input_from: None,
        },
    );
    states.insert(
        "GREEN".to_string(),
        StateDefinition::Terminal {
            result: "success".to_string(),
            action: None,
        },
    );
    states.insert(
        "ESC".to_string(),
        StateDefinition::Terminal {
            result: "failure".to_string(),
            action: None,
        },
    );
    let mut roles = IndexMap::new();
    roles.insert("red".to_string(), role("claude"));
    WorkflowDefinition {
        name: "evidence-demo".to_string(),
        description: None,
        initial_state: Some("RED".to_string()),
        params: IndexMap::new(),
        roles,
        states,
    }
}

/// Scenario 3: schema validation failure, no `verify` command.
pub fn schema_reject_workflow() -> WorkflowDefinition {
    let mut schema = IndexMap::new();
    schema.insert("note".to_string(), "string".to_string());
    let mut states = IndexMap::new();
    states.insert(
        "RED".to_string(),
        StateDefinition::Agent {
            assign: "red".to_string(),
            gate: Some(Gate::Evidence {
                schema,
                verify: None,
            }),
            transitions: transitions(&[("pass", "GREEN")]),
            max_retries: Some(1),
            input_from: None,
        },
    );
    states.insert(
        "GREEN".to_string(),
        StateDefinition::Terminal {
            result: "success".to_string(),
            action: None,
        },
    );
    let mut roles = IndexMap::new();
    roles.insert("red".to_string(), role("claude"));
    WorkflowDefinition {
        name: "schema-demo".to_string(),
        description: None,
        initial_state: Some("RED".to_string()),
        params: IndexMap::new(),
        roles,
        states,
    }
}

/// Scenario 4: a subworkflow parent referencing a `$build` slot, plus
/// the child workflow it starts.
pub fn subworkflow_parent() -> WorkflowDefinition {
    let mut states = IndexMap::new();
    let mut input_map = IndexMap::new();
    input_map.insert("scenario".to_string(), "evidence.SETUP.slice".to_string());
    states.insert(
        "SETUP".to_string(),
        StateDefinition::Agent {
            assign: "setup".to_string(),
            gate: Some(Gate::Verdict {
                options: vec!["ready".to_string()],
            }),
            transitions: transitions(&[("ready", "BUILD")]),
            max_retries: None,
            input_from: None,
        },
    );
    states.insert(
        "BUILD".to_string(),
        StateDefinition::Subworkflow {
            workflow: "$build".to_string(),
            input_map: Some(input_map),
            transitions: transitions(&[("success", "REVIEW"), ("failure", "ESC")]),
            max_retries: None,
        },
    );
    states.insert(
        "REVIEW".to_string(),
        StateDefinition::Terminal {
            result: "success".to_string(),
            action: None,
        },
    );
    states.insert(
        "ESC".to_string(),
        StateDefinition::Terminal {
            result: "failure".to_string(),
            action: None,
        },
    );
    let mut roles = IndexMap::new();
    roles.insert("setup".to_string(), role("claude"));
    WorkflowDefinition {
        name: "parent-demo".to_string(),
        description: None,
        initial_state: Some("SETUP".to_string()),
        params: IndexMap::new(),
        roles,
        states,
    }
}

/// The child workflow a `subworkflow_parent` dispatch starts:
/// `tdd-ping-pong`, whose single state is terminal on entry.
pub fn subworkflow_child() -> WorkflowDefinition {
    let mut states = IndexMap::new();
    states.insert(
        "PLAY".to_string(),
        StateDefinition::Terminal {
            result: "success".to_string(),
            action: None,
        },
    );
    WorkflowDefinition {
        name: "tdd-ping-pong".to_string(),
        description: None,
        initial_state: Some("PLAY".to_string()),
        params: IndexMap::new(),
        roles: IndexMap::new(),
        states,
    }
}
