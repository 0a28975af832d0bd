// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The mutable, persisted record of one workflow instance's progression.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::WorkflowId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentLink {
    pub workflow_id: WorkflowId,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub state: String,
    pub entered_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exited_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default)]
    pub retries: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_failure: Option<String>,
}

impl HistoryEntry {
    pub fn entering(state: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            state: state.into(),
            entered_at: now,
            exited_at: None,
            result: None,
            retries: 0,
            last_failure: None,
        }
    }
}

/// The mutable runtime record for one workflow instance. Owned by the
/// `StateStore` on disk; the engine leases a value during a single
/// operation and must re-load before any further mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRuntimeState {
    pub workflow_id: WorkflowId,
    pub workflow_type: String,
    pub current_state: String,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub evidence: HashMap<String, Value>,
    #[serde(default)]
    pub metrics: Value,
    pub history: Vec<HistoryEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentLink>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub children: HashMap<String, WorkflowId>,

    /// Fields present on disk that this build does not recognize.
    /// Preserved so round-tripping through `load`/`save` never drops
    /// data written by a newer or differently-configured engine.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl WorkflowRuntimeState {
    pub fn new(
        workflow_id: WorkflowId,
        workflow_type: impl Into<String>,
        initial_state: impl Into<String>,
        params: Value,
        now: DateTime<Utc>,
    ) -> Self {
        let initial_state = initial_state.into();
        Self {
            workflow_id,
            workflow_type: workflow_type.into(),
            current_state: initial_state.clone(),
            retry_count: 0,
            paused: false,
            params,
            evidence: HashMap::new(),
            metrics: Value::Object(Default::default()),
            history: vec![HistoryEntry::entering(initial_state, now)],
            created_at: now,
            updated_at: now,
            parent: None,
            children: HashMap::new(),
            extra: HashMap::new(),
        }
    }

    pub fn last_history_mut(&mut self) -> Option<&mut HistoryEntry> {
        self.history.last_mut()
    }

    /// Stamp the current history entry as exited and append a new one for
    /// `next`, resetting retry bookkeeping. The shared primitive behind
    /// every state change (`submitEvidence`, `override`, subworkflow
    /// completion propagation).
    pub fn move_state(&mut self, next: impl Into<String>, result: impl Into<String>, now: DateTime<Utc>) {
        let result = result.into();
        if let Some(entry) = self.last_history_mut() {
            entry.exited_at = Some(now);
            entry.result = Some(result.clone());
        }
        let next = next.into();
        self.current_state = next.clone();
        self.history.push(HistoryEntry::entering(next, now));
        self.retry_count = 0;
        self.updated_at = now;
    }

    pub fn record_retry_failure(&mut self, last_failure: impl Into<String>, now: DateTime<Utc>) {
        self.retry_count += 1;
        if let Some(entry) = self.last_history_mut() {
            entry.retries = self.retry_count;
            entry.last_failure = Some(last_failure.into());
        }
        self.updated_at = now;
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
