// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subworkflow composition: starting a child workflow from a parent's
//! `Subworkflow` state, and propagating a child's terminal result back
//! up to the parent when the child finishes.

use indexmap::IndexMap;
use loom_core::{EngineError, ParentLink, WorkflowId, WorkflowRuntimeState};
use serde_json::Value;

use crate::{HandlerResult, WorkflowEngine};

/// Navigate a JSON value through a sequence of object-key segments.
fn navigate(value: &Value, segments: &[&str]) -> Option<Value> {
    let mut current = value.clone();
    for segment in segments {
        current = current.get(segment)?.clone();
    }
    Some(current)
}

/// Extract a value from the parent's runtime state at a dotted path like
/// `params.scenario` or `evidence.SETUP.slice`. Only the `params.*` and
/// `evidence.*` roots are supported.
fn extract_dotted_path(state: &WorkflowRuntimeState, path: &str) -> Option<Value> {
    let mut parts = path.split('.');
    let root = parts.next()?;
    let rest: Vec<&str> = parts.collect();
    match root {
        "params" => navigate(&state.params, &rest),
        "evidence" => {
            let (state_key, tail) = rest.split_first()?;
            let base = state.evidence.get(*state_key)?;
            navigate(base, tail)
        }
        _ => None,
    }
}

/// Resolve a `Subworkflow` state's `workflow` field to a concrete
/// registry name: a literal, or a `$slot` looked up in `params.slots`.
fn resolve_child_workflow_name(
    state: &WorkflowRuntimeState,
    workflow_field: &str,
) -> HandlerResult<String> {
    match workflow_field.strip_prefix('$') {
        Some(slot) => state
            .params
            .get("slots")
            .and_then(|slots| slots.get(slot))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                EngineError::SubworkflowSlotMissing {
                    workflow: state.workflow_type.clone(),
                    state: state.current_state.clone(),
                }
                .into()
            }),
        None => Ok(workflow_field.to_string()),
    }
}

impl WorkflowEngine {
    /// Build child params from `inputMap`, start the child, and stamp
    /// the parent/child cross-links. Called with the parent's lock
    /// already held by the caller.
    pub(crate) async fn start_subworkflow(
        &self,
        parent: &mut WorkflowRuntimeState,
        state_name: &str,
        workflow_field: &str,
        input_map: Option<&IndexMap<String, String>>,
    ) -> HandlerResult<WorkflowId> {
        let child_workflow = resolve_child_workflow_name(parent, workflow_field)?;

        let mut child_params = serde_json::Map::new();
        if let Some(map) = input_map {
            for (child_param, dotted_path) in map {
                if let Some(value) = extract_dotted_path(parent, dotted_path) {
                    child_params.insert(child_param.clone(), value);
                }
            }
        }

        let mut child = self
            .start(&child_workflow, Value::Object(child_params))
            .await?;

        child.parent = Some(ParentLink {
            workflow_id: parent.workflow_id.clone(),
            state: parent.current_state.clone(),
        });
        self.store.save(&child)?;

        parent
            .children
            .insert(state_name.to_string(), child.workflow_id.clone());
        self.store.save(parent)?;

        Ok(child.workflow_id)
    }

    /// A terminal state with a `parent` link was reached: fold the
    /// child's result into the parent's evidence and transition the
    /// parent, then recursively dispatch its new state. Returns whether
    /// propagation actually happened (the parent's current state must
    /// still be the `Subworkflow` state that spawned this child).
    pub(crate) async fn propagate_subworkflow_completion(
        &self,
        child: &WorkflowRuntimeState,
    ) -> HandlerResult<bool> {
        let Some(link) = &child.parent else {
            return Ok(false);
        };

        let parent_lock = self.locks.lock_for(&link.workflow_id);
        let guard = parent_lock.lock_owned().await;

        let Some(mut parent) = self.store.load(&link.workflow_id)? else {
            return Ok(false);
        };
        if parent.current_state != link.state {
            return Ok(false);
        }

        let parent_definition = self
            .registry
            .get(&parent.workflow_type)
            .ok_or_else(|| EngineError::MissingDefinition(parent.workflow_type.clone()))?;
        let parent_state_def = parent_definition
            .states
            .get(&parent.current_state)
            .ok_or_else(|| EngineError::UnknownState {
                workflow: parent.workflow_type.clone(),
                workflow_id: parent.workflow_id.clone(),
                state: parent.current_state.clone(),
            })?;
        if !matches!(parent_state_def, loom_core::StateDefinition::Subworkflow { .. }) {
            return Ok(false);
        }

        let child_definition = self.registry.get(&child.workflow_type);
        let child_result = child_definition
            .and_then(|d| d.states.get(&child.current_state))
            .and_then(|s| s.result())
            .unwrap_or("failure")
            .to_string();

        let child_evidence: serde_json::Map<String, Value> = child
            .evidence
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut merged = match parent.evidence.get(&parent.current_state) {
            Some(Value::Object(map)) => map.clone(),
            _ => serde_json::Map::new(),
        };
        merged.insert(
            "child_workflow_id".to_string(),
            Value::String(child.workflow_id.to_string()),
        );
        merged.insert(
            "child_workflow_type".to_string(),
            Value::String(child.workflow_type.clone()),
        );
        merged.insert("child_result".to_string(), Value::String(child_result.clone()));
        merged.insert("child_evidence".to_string(), Value::Object(child_evidence));
        let parent_state_name = parent.current_state.clone();
        parent.evidence.insert(parent_state_name, Value::Object(merged));

        let transitions = parent_state_def.transitions().cloned().unwrap_or_default();
        let next = transitions
            .get(&child_result)
            .or_else(|| transitions.get("pass"))
            .cloned()
            .ok_or_else(|| EngineError::NoTransition {
                workflow: parent.workflow_type.clone(),
                state: parent.current_state.clone(),
                result: child_result.clone(),
            })?;

        let now = self.clock.now();
        parent.retry_count = 0;
        parent.move_state(next, child_result, now);
        self.store.save(&parent)?;

        // The parent is persisted; release its lock before recursing so
        // the parent's own dispatch (and any further cascade up its own
        // ancestors) doesn't re-acquire a lock this task already holds.
        let parent_workflow_id = parent.workflow_id.clone();
        drop(guard);

        self.dispatch_current_state(&parent_workflow_id).await?;
        Ok(true)
    }
}

#[cfg(test)]
#[path = "subworkflow_tests.rs"]
mod tests;
