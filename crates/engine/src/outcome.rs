// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Result types returned from [`crate::handlers`]. [`Outcome`] is the
//! wire shape `submitEvidence`/`pause`/`resume`/`override` hand back to
//! the bus; [`DispatchOutcome`] is what dispatching the current state
//! produced; [`StateDiagnostic`] is the per-state gate-validation trail a
//! status query reports.

use chrono::{DateTime, Utc};
use loom_core::{WorkflowId, WorkflowRuntimeState};
use serde::{Deserialize, Serialize};

use crate::dispatch::AgentArtifacts;
use crate::schema::{build_diagnostics, ValidationReport};

/// What a lifecycle call did to a workflow instance. Tagged by `status`
/// on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    /// A successful state transition (`submitEvidence` success path, or
    /// `override`).
    Advanced {
        #[serde(rename = "workflowId")]
        workflow_id: WorkflowId,
        from: String,
        to: String,
        result: String,
    },
    /// The workflow is paused; the call made no mutation.
    Paused {
        #[serde(rename = "workflowId")]
        workflow_id: WorkflowId,
    },
    /// The workflow was resumed.
    Resumed {
        #[serde(rename = "workflowId")]
        workflow_id: WorkflowId,
    },
    /// The submission was not accepted as a gate outcome at all: state
    /// mismatch, no gate declared, or evidence schema validation
    /// failure. No retry is consumed.
    Rejected {
        #[serde(rename = "workflowId")]
        workflow_id: WorkflowId,
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        diagnostics: Option<Vec<String>>,
    },
    /// The gate ran and did not verify; a retry was consumed (and the
    /// workflow may have escalated — check the instance's
    /// `current_state` to tell which).
    Failed {
        #[serde(rename = "workflowId")]
        workflow_id: WorkflowId,
        state: String,
        retries: u32,
    },
}

impl Outcome {
    pub fn workflow_id(&self) -> &WorkflowId {
        match self {
            Outcome::Advanced { workflow_id, .. }
            | Outcome::Paused { workflow_id }
            | Outcome::Resumed { workflow_id }
            | Outcome::Rejected { workflow_id, .. }
            | Outcome::Failed { workflow_id, .. } => workflow_id,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Outcome::Advanced { .. } => "advanced",
            Outcome::Paused { .. } => "paused",
            Outcome::Resumed { .. } => "resumed",
            Outcome::Rejected { .. } => "rejected",
            Outcome::Failed { .. } => "failed",
        }
    }
}

/// What dispatching the current state produced. `start` and every
/// successful transition call into this; the caller (handlers, or the
/// daemon's autopilot loop) decides whether to keep advancing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum DispatchOutcome {
    /// An `Agent` state spawned a pane; `artifacts` is already written
    /// to disk under the store's runtime directory.
    AgentDispatched {
        artifacts: AgentArtifacts,
        pane_id: String,
    },
    /// An `Action` state ran its commands to completion.
    ActionCompleted,
    /// A `Terminal` state was reached; `cascaded` is set when reaching
    /// it also completed a parent subworkflow (and so recursively
    /// dispatched the parent's new state).
    TerminalReached { cascaded: bool },
    /// A `Subworkflow` state started a child instance and recursively
    /// dispatched its initial state.
    SubworkflowStarted { child_id: WorkflowId },
}

/// One state's gate-validation history, for a `status`/diagnostics query.
#[derive(Debug, Clone, PartialEq)]
pub struct StateDiagnostic {
    pub state: String,
    pub entered_at: DateTime<Utc>,
    pub exited_at: Option<DateTime<Utc>>,
    pub result: Option<String>,
    pub retries: u32,
    pub validation: ValidationReport,
}

/// Build the full per-state diagnostic trail for a workflow instance,
/// in history order.
pub fn state_diagnostics(state: &WorkflowRuntimeState) -> Vec<StateDiagnostic> {
    let reports = build_diagnostics(&state.history, &state.evidence);
    state
        .history
        .iter()
        .zip(reports)
        .map(|(entry, validation)| StateDiagnostic {
            state: entry.state.clone(),
            entered_at: entry.entered_at,
            exited_at: entry.exited_at,
            result: entry.result.clone(),
            retries: entry.retries,
            validation,
        })
        .collect()
}

#[cfg(test)]
#[path = "outcome_tests.rs"]
mod tests;
