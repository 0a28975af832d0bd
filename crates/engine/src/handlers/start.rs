// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `start`: mint a fresh workflow instance and persist it.

use loom_core::{EngineError, ShortId, WorkflowId, WorkflowRuntimeState};
use serde_json::Value;

use crate::{HandlerResult, WorkflowEngine};

impl WorkflowEngine {
    /// Start a new instance of `workflow_type`. Mints
    /// `workflow_id = "<type>-<8-char-random>"`, computes the initial
    /// state (`definition.initialState`, else the first state in
    /// declaration order), persists a fresh runtime record, and returns
    /// it. Does not dispatch the initial state — callers that want that
    /// should follow up with [`WorkflowEngine::dispatch_current_state`].
    pub async fn start(
        &self,
        workflow_type: &str,
        params: Value,
    ) -> HandlerResult<WorkflowRuntimeState> {
        let definition = self
            .registry
            .get(workflow_type)
            .ok_or_else(|| EngineError::UnknownWorkflow(workflow_type.to_string()))?;
        let initial = definition.initial_state()?.to_string();

        let suffix = uuid::Uuid::new_v4().to_string();
        let workflow_id = WorkflowId::new(format!("{workflow_type}-{}", suffix.short(8)));

        let now = self.clock.now();
        let state = WorkflowRuntimeState::new(workflow_id, workflow_type, initial, params, now);
        self.store.save(&state)?;
        Ok(state)
    }
}

#[cfg(test)]
#[path = "start_tests.rs"]
mod tests;
