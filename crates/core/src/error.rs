// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fatal error taxonomy shared by every crate that implements a piece of
//! the engine. These are programmer/operator errors: malformed
//! definitions, references to things that do not exist, requests against
//! workflows that never started. They are never retried.

use crate::id::WorkflowId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no workflow definition named {0:?}")]
    UnknownWorkflow(String),

    #[error("no running workflow instance {0}")]
    UnknownInstance(WorkflowId),

    #[error("workflow {workflow:?} instance {workflow_id} references undefined state {state:?}")]
    UnknownState {
        workflow: String,
        workflow_id: WorkflowId,
        state: String,
    },

    #[error("workflow definition {0:?} declares no states")]
    NoStates(String),

    #[error("state {state:?} in workflow {workflow:?} has no transition for result {result:?}")]
    NoTransition {
        workflow: String,
        state: String,
        result: String,
    },

    #[error("workflow {0:?} has no definition on disk or in the registry")]
    MissingDefinition(String),

    #[error("state {state:?} in workflow {workflow:?} has an unrecognized shape")]
    UnrecognizedStateKind { workflow: String, state: String },

    #[error("subworkflow state {state:?} in workflow {workflow:?} has no open child slot")]
    SubworkflowSlotMissing { workflow: String, state: String },

    #[error("role {0:?} is not defined for this workflow")]
    RoleUndefined(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
