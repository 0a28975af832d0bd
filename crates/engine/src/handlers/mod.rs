// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The engine's operations, one `impl WorkflowEngine` block per file:
//! [`start`], [`submit_evidence`], [`dispatch_current_state`],
//! subworkflow completion propagation, and `pause`/`resume`/`override`.

mod dispatch_state;
#[cfg(test)]
mod fixtures;
mod lifecycle;
mod start;
mod submit_evidence;
mod subworkflow;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `submitEvidence`'s request body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Submission {
    pub state: String,
    pub result: String,
    #[serde(default)]
    pub evidence: Value,
    #[serde(default)]
    pub submitted_by: Option<String>,
}
