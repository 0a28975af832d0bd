// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Autopilot: an optional per-workflow loop that calls
//! `dispatchCurrentState` whenever a workflow's state has moved since
//! the loop last looked at it.
//!
//! The loop polls `StateStore::list` on an interval rather than holding
//! a timer per workflow; comparing a cheap fingerprint of each workflow
//! dispatches only on change, with one task for the whole daemon instead
//! of one per instance.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use loom_core::WorkflowId;
use loom_engine::WorkflowEngine;
use tracing::{debug, warn};

/// Default polling interval for the autopilot sweep.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// The `(current_state, entered_at, retries)` triple the design note
/// names. Two sweeps of the same workflow with an identical fingerprint
/// mean nothing has moved since the last dispatch, so it is skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fingerprint {
    state: String,
    entered_at: String,
    retries: u32,
}

impl Fingerprint {
    fn of(runtime: &loom_core::WorkflowRuntimeState) -> Option<Self> {
        let last = runtime.history.last()?;
        Some(Self {
            state: last.state.clone(),
            entered_at: last.entered_at.to_rfc3339(),
            retries: last.retries,
        })
    }
}

/// Runs [`sweep_once`] on `interval` until the returned handle is
/// dropped or the process exits. Terminal states stop moving once
/// reached, so they are dispatched exactly once (for the completion
/// propagation side effect) and never again.
pub fn spawn(engine: Arc<WorkflowEngine>, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut seen: HashMap<WorkflowId, Fingerprint> = HashMap::new();
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            sweep_once(&engine, &mut seen).await;
        }
    })
}

/// One pass over every known workflow: dispatch any whose fingerprint
/// changed (or that have never been seen) since the last pass, and is
/// not paused.
async fn sweep_once(engine: &WorkflowEngine, seen: &mut HashMap<WorkflowId, Fingerprint>) {
    let workflows = match engine.store().list() {
        Ok(workflows) => workflows,
        Err(e) => {
            warn!(error = %e, "autopilot: failed to list workflows");
            return;
        }
    };

    for runtime in &workflows {
        if runtime.paused {
            continue;
        }
        let Some(fingerprint) = Fingerprint::of(runtime) else {
            continue;
        };
        let changed = seen
            .get(&runtime.workflow_id)
            .is_none_or(|prev| prev != &fingerprint);
        if !changed {
            continue;
        }
        seen.insert(runtime.workflow_id.clone(), fingerprint);

        debug!(workflow_id = %runtime.workflow_id, state = %runtime.current_state, "autopilot dispatching");
        if let Err(e) = engine.dispatch_current_state(&runtime.workflow_id).await {
            warn!(workflow_id = %runtime.workflow_id, error = %e, "autopilot dispatch failed");
        }
    }
}

#[cfg(test)]
#[path = "autopilot_tests.rs"]
mod tests;
