// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pause`, `resume`, and `override`: the three operator-driven lifecycle
//! controls that sit outside the gate-driven `submitEvidence` flow.

use loom_core::{EngineError, WorkflowId};

use crate::outcome::Outcome;
use crate::{HandlerResult, WorkflowEngine};

impl WorkflowEngine {
    /// Flip `paused` to `true`. Future `submitEvidence` calls return
    /// `{status: "paused"}` with no mutation until [`WorkflowEngine::resume`].
    /// A second consecutive `pause` is idempotent: `updated_at` advances
    /// but no history entry is added.
    pub async fn pause(&self, workflow_id: &WorkflowId) -> HandlerResult<Outcome> {
        let lock = self.locks.lock_for(workflow_id);
        let _guard = lock.lock_owned().await;

        let mut state = self
            .store
            .load(workflow_id)?
            .ok_or_else(|| EngineError::UnknownInstance(workflow_id.clone()))?;
        state.paused = true;
        state.updated_at = self.clock.now();
        self.store.save(&state)?;
        Ok(Outcome::Paused {
            workflow_id: workflow_id.clone(),
        })
    }

    pub async fn resume(&self, workflow_id: &WorkflowId) -> HandlerResult<Outcome> {
        let lock = self.locks.lock_for(workflow_id);
        let _guard = lock.lock_owned().await;

        let mut state = self
            .store
            .load(workflow_id)?
            .ok_or_else(|| EngineError::UnknownInstance(workflow_id.clone()))?;
        state.paused = false;
        state.updated_at = self.clock.now();
        self.store.save(&state)?;
        Ok(Outcome::Resumed {
            workflow_id: workflow_id.clone(),
        })
    }

    /// Force a transition to `next_state`, bypassing gate evaluation
    /// entirely. Persists a history entry with `result =
    /// "override:<reason>"`; some consumers parse the `override:` prefix,
    /// so the literal format must be preserved.
    pub async fn override_state(
        &self,
        workflow_id: &WorkflowId,
        next_state: &str,
        reason: &str,
    ) -> HandlerResult<Outcome> {
        let lock = self.locks.lock_for(workflow_id);
        let _guard = lock.lock_owned().await;

        let mut state = self
            .store
            .load(workflow_id)?
            .ok_or_else(|| EngineError::UnknownInstance(workflow_id.clone()))?;

        let from = state.current_state.clone();
        let now = self.clock.now();
        state.move_state(next_state, format!("override:{reason}"), now);
        self.store.save(&state)?;

        Ok(Outcome::Advanced {
            workflow_id: workflow_id.clone(),
            from,
            to: next_state.to_string(),
            result: format!("override:{reason}"),
        })
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
