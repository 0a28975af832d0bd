// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `submitEvidence`: validate an agent's submission against the current
//! state's gate, persist the outcome, and transition (or retry, or
//! escalate) accordingly.

use loom_core::{EngineError, Gate, StateDefinition, WorkflowId, WorkflowRuntimeState};
use serde_json::Value;

use crate::outcome::Outcome;
use crate::schema::validate_evidence;
use crate::{HandlerResult, WorkflowEngine};

use super::Submission;

/// What one gate evaluation produced, before the engine decides whether
/// to transition, retry, or escalate.
enum GateResult {
    /// Evidence failed structural validation before a verify command
    /// ever ran. No retry is consumed.
    SchemaRejected { errors: Vec<String> },
    Verified(bool),
}

async fn evaluate_gate(
    engine: &WorkflowEngine,
    gate: &Gate,
    submission: &Submission,
) -> GateResult {
    match gate {
        Gate::Evidence { schema, verify } => {
            let report = validate_evidence(&submission.state, schema, &submission.evidence);
            if !report.ok {
                return GateResult::SchemaRejected {
                    errors: report.errors,
                };
            }
            match verify {
                Some(spec) => {
                    let outcome = loom_shell::run_with_timeout(
                        &spec.command,
                        None,
                        engine.command_timeout,
                    )
                    .await;
                    GateResult::Verified(outcome.succeeded(spec.expect_exit_code))
                }
                None => GateResult::Verified(true),
            }
        }
        Gate::Command { verify } => {
            let outcome =
                loom_shell::run_with_timeout(&verify.command, None, engine.command_timeout).await;
            GateResult::Verified(outcome.succeeded(verify.expect_exit_code))
        }
        Gate::Verdict { options } => {
            GateResult::Verified(options.iter().any(|o| o == &submission.result))
        }
    }
}

/// Merge the submitted evidence fields with bookkeeping fields into one
/// JSON object, the shape persisted under `evidence[state]`.
fn merged_evidence(submission: &Submission, extra: Vec<(&str, Value)>) -> Value {
    let mut obj = match &submission.evidence {
        Value::Object(map) => map.clone(),
        _ => serde_json::Map::new(),
    };
    for (key, value) in extra {
        obj.insert(key.to_string(), value);
    }
    Value::Object(obj)
}

impl WorkflowEngine {
    pub async fn submit_evidence(
        &self,
        workflow_id: &WorkflowId,
        submission: Submission,
    ) -> HandlerResult<Outcome> {
        let lock = self.locks.lock_for(workflow_id);
        let _guard = lock.lock_owned().await;

        let mut state = self
            .store
            .load(workflow_id)?
            .ok_or_else(|| EngineError::UnknownInstance(workflow_id.clone()))?;

        if state.paused {
            return Ok(Outcome::Paused {
                workflow_id: workflow_id.clone(),
            });
        }

        if submission.state != state.current_state {
            return Ok(Outcome::Rejected {
                workflow_id: workflow_id.clone(),
                reason: format!(
                    "state mismatch: submission targets {:?}, workflow is at {:?}",
                    submission.state, state.current_state
                ),
                diagnostics: None,
            });
        }

        let definition = self
            .registry
            .get(&state.workflow_type)
            .ok_or_else(|| EngineError::MissingDefinition(state.workflow_type.clone()))?;
        let state_def = definition
            .states
            .get(&state.current_state)
            .ok_or_else(|| EngineError::UnknownState {
                workflow: state.workflow_type.clone(),
                workflow_id: workflow_id.clone(),
                state: state.current_state.clone(),
            })?;

        let Some(gate) = state_def.gate() else {
            return Ok(Outcome::Rejected {
                workflow_id: workflow_id.clone(),
                reason: "no gate".to_string(),
                diagnostics: None,
            });
        };

        match evaluate_gate(self, gate, &submission).await {
            GateResult::SchemaRejected { errors } => {
                let now = self.clock.now();
                let evidence = merged_evidence(
                    &submission,
                    vec![
                        ("verified", Value::Bool(false)),
                        (
                            "validation_errors",
                            Value::Array(errors.iter().cloned().map(Value::String).collect()),
                        ),
                    ],
                );
                state
                    .evidence
                    .insert(state.current_state.clone(), evidence);
                state.updated_at = now;
                self.store.save(&state)?;
                Ok(Outcome::Rejected {
                    workflow_id: workflow_id.clone(),
                    reason: "schema validation failed".to_string(),
                    diagnostics: Some(errors),
                })
            }
            GateResult::Verified(false) => {
                self.record_gate_failure(&mut state, state_def, workflow_id, &submission)
            }
            GateResult::Verified(true) => {
                self.record_gate_success(&mut state, definition, state_def, workflow_id, submission)
            }
        }
    }

    fn record_gate_failure(
        &self,
        state: &mut WorkflowRuntimeState,
        state_def: &StateDefinition,
        workflow_id: &WorkflowId,
        submission: &Submission,
    ) -> HandlerResult<Outcome> {
        let now = self.clock.now();
        let failure = format!("gate did not verify for result {:?}", submission.result);
        state.record_retry_failure(failure, now);

        let retries = state.retry_count;
        let evidence = merged_evidence(submission, vec![("verified", Value::Bool(false))]);
        state
            .evidence
            .insert(state.current_state.clone(), evidence);

        if retries >= state_def.max_retries() {
            let fail_target = state_def
                .transitions()
                .and_then(|t| t.get("fail"))
                .cloned()
                .unwrap_or_else(|| "ESCALATE".to_string());
            state.move_state(fail_target, "fail", now);
        }

        self.store.save(state)?;
        Ok(Outcome::Failed {
            workflow_id: workflow_id.clone(),
            state: state.current_state.clone(),
            retries,
        })
    }

    fn record_gate_success(
        &self,
        state: &mut WorkflowRuntimeState,
        definition: &loom_core::WorkflowDefinition,
        state_def: &StateDefinition,
        workflow_id: &WorkflowId,
        submission: Submission,
    ) -> HandlerResult<Outcome> {
        let now = self.clock.now();
        let transitions = state_def.transitions().cloned().unwrap_or_default();
        let to = transitions
            .get(&submission.result)
            .or_else(|| transitions.get("pass"))
            .cloned()
            .ok_or_else(|| EngineError::NoTransition {
                workflow: definition.name.clone(),
                state: state.current_state.clone(),
                result: submission.result.clone(),
            })?;

        let from = state.current_state.clone();
        let submitted_by = submission
            .submitted_by
            .clone()
            .map(Value::String)
            .unwrap_or(Value::Null);
        let evidence = merged_evidence(
            &submission,
            vec![
                ("result", Value::String(submission.result.clone())),
                ("verified", Value::Bool(true)),
                ("submitted_by", submitted_by),
                ("submitted_at", Value::String(now.to_rfc3339())),
            ],
        );
        state.evidence.insert(from.clone(), evidence);
        state.move_state(to.clone(), submission.result.clone(), now);
        self.store.save(state)?;

        Ok(Outcome::Advanced {
            workflow_id: workflow_id.clone(),
            from,
            to,
            result: submission.result,
        })
    }
}

#[cfg(test)]
#[path = "submit_evidence_tests.rs"]
mod tests;
