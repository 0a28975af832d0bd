// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dispatchCurrentState`: act on whatever kind of state a workflow is
//! currently sitting in — launch an agent, run action commands,
//! propagate a terminal result to a parent, or spawn a child workflow.

use std::future::Future;
use std::pin::Pin;

use loom_core::{EngineError, Gate, StateDefinition, WorkflowId};

use crate::dispatch::build_agent_artifacts;
use crate::outcome::DispatchOutcome;
use crate::persona::resolve_role;
use crate::{HandlerError, HandlerResult, WorkflowEngine};

impl WorkflowEngine {
    /// Boxed because the Terminal and Subworkflow arms recursively
    /// dispatch a freshly-entered state, which an `async fn` cannot do
    /// without unbounded future size.
    pub fn dispatch_current_state<'a>(
        &'a self,
        workflow_id: &'a WorkflowId,
    ) -> Pin<Box<dyn Future<Output = HandlerResult<DispatchOutcome>> + Send + 'a>> {
        Box::pin(async move {
            let lock = self.locks.lock_for(workflow_id);
            let guard = lock.lock_owned().await;

            let mut state = self
                .store
                .load(workflow_id)?
                .ok_or_else(|| EngineError::UnknownInstance(workflow_id.clone()))?;

            let definition = self
                .registry
                .get(&state.workflow_type)
                .ok_or_else(|| EngineError::MissingDefinition(state.workflow_type.clone()))?;
            let state_name = state.current_state.clone();
            let state_def =
                definition
                    .states
                    .get(&state_name)
                    .ok_or_else(|| EngineError::UnknownState {
                        workflow: state.workflow_type.clone(),
                        workflow_id: workflow_id.clone(),
                        state: state_name.clone(),
                    })?;

            match state_def {
                StateDefinition::Agent { assign, .. } => {
                    let resolved = resolve_role(
                        definition,
                        assign,
                        &self.project_config,
                        &state.params,
                        &state.history,
                    )?;
                    let artifacts = build_agent_artifacts(
                        &self.store,
                        definition,
                        &state,
                        &state_name,
                        assign,
                        state_def,
                        &resolved,
                        &self.prompt_root,
                    )
                    .map_err(HandlerError::Artifact)?;

                    let cwd = std::env::current_dir().unwrap_or_else(|_| ".".into());
                    let spec = loom_adapters::PaneSpec {
                        agent_id: artifacts.agent_id.clone(),
                        cwd,
                        command: format!(
                            "{} --scope {} --prompt {} --task {}",
                            resolved.agent,
                            artifacts.scope_path.display(),
                            artifacts.prompt_path.display(),
                            artifacts.task_path.display(),
                        ),
                        env: Vec::new(),
                    };
                    let handle = self.pane_supervisor.spawn(spec).await?;
                    Ok(DispatchOutcome::AgentDispatched {
                        artifacts,
                        pane_id: handle.id,
                    })
                }
                StateDefinition::Action { commands, .. } => {
                    self.dispatch_action(&mut state, state_def, commands).await
                }
                StateDefinition::Terminal { .. } => {
                    let parent = state.parent.clone();
                    // Release this workflow's lock before propagating: the
                    // parent's terminal-cascade re-locks the parent id
                    // (possibly this same one, if this is a child racing
                    // back to its own ancestor), and a held guard here would
                    // deadlock against that re-entry.
                    drop(guard);
                    let mut cascaded = false;
                    if parent.is_some() {
                        cascaded = self.propagate_subworkflow_completion(&state).await?;
                    }
                    Ok(DispatchOutcome::TerminalReached { cascaded })
                }
                StateDefinition::Subworkflow {
                    workflow,
                    input_map,
                    ..
                } => {
                    let child_id = self
                        .start_subworkflow(&mut state, &state_name, workflow, input_map.as_ref())
                        .await?;
                    // The parent's record is already persisted; drop its
                    // lock before recursing into the child's dispatch so a
                    // child that completes immediately can propagate back
                    // up to this same parent without deadlocking on its
                    // own still-held guard.
                    drop(guard);
                    self.dispatch_current_state(&child_id).await?;
                    Ok(DispatchOutcome::SubworkflowStarted { child_id })
                }
            }
        })
    }

    async fn dispatch_action(
        &self,
        state: &mut loom_core::WorkflowRuntimeState,
        state_def: &StateDefinition,
        commands: &[String],
    ) -> HandlerResult<DispatchOutcome> {
        let mut all_succeeded = true;
        for command in commands {
            let outcome =
                loom_shell::run_with_timeout(command, None, self.command_timeout).await;
            if outcome.exit_code != 0 {
                all_succeeded = false;
            }
        }

        let verified = match state_def.gate() {
            Some(Gate::Command { verify }) => {
                let outcome =
                    loom_shell::run_with_timeout(&verify.command, None, self.command_timeout)
                        .await;
                outcome.succeeded(verify.expect_exit_code)
            }
            _ => all_succeeded,
        };

        let transitions = state_def.transitions().cloned().unwrap_or_default();
        let now = self.clock.now();
        let target = if verified {
            transitions.get("pass").cloned()
        } else {
            Some(
                transitions
                    .get("fail")
                    .cloned()
                    .unwrap_or_else(|| "ESCALATE".to_string()),
            )
        };

        if let Some(next) = target {
            let result = if verified { "pass" } else { "fail" };
            state.move_state(next, result, now);
            self.store.save(state)?;
        }

        Ok(DispatchOutcome::ActionCompleted)
    }
}

#[cfg(test)]
#[path = "dispatch_state_tests.rs"]
mod tests;
