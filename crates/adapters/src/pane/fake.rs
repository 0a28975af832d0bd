// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test double that records every call instead of touching a real
//! terminal multiplexer. Used by engine-crate tests that exercise
//! dispatch without a tmux server available.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use super::{PaneError, PaneHandle, PaneInfo, PaneSpec, PaneSupervisor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaneCall {
    Spawn { agent_id: String, command: String },
    List,
    Focus { id: String },
    Close { id: String },
    Reconcile { expected: Vec<String> },
}

#[derive(Debug, Clone, Default)]
pub struct FakePaneSupervisor {
    calls: Arc<Mutex<Vec<PaneCall>>>,
    live: Arc<Mutex<Vec<PaneInfo>>>,
}

impl FakePaneSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<PaneCall> {
        self.calls.lock().clone()
    }

    pub fn spawn_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, PaneCall::Spawn { .. }))
            .count()
    }
}

#[async_trait]
impl PaneSupervisor for FakePaneSupervisor {
    async fn spawn(&self, spec: PaneSpec) -> Result<PaneHandle, PaneError> {
        self.calls.lock().push(PaneCall::Spawn {
            agent_id: spec.agent_id.clone(),
            command: spec.command.clone(),
        });
        self.live.lock().push(PaneInfo {
            id: spec.agent_id.clone(),
            agent_id: spec.agent_id.clone(),
        });
        Ok(PaneHandle { id: spec.agent_id })
    }

    async fn list(&self) -> Result<Vec<PaneInfo>, PaneError> {
        self.calls.lock().push(PaneCall::List);
        Ok(self.live.lock().clone())
    }

    async fn focus(&self, id: &str) -> Result<(), PaneError> {
        self.calls.lock().push(PaneCall::Focus { id: id.to_string() });
        Ok(())
    }

    async fn close(&self, id: &str) -> Result<(), PaneError> {
        self.calls
            .lock()
            .push(PaneCall::Close { id: id.to_string() });
        self.live.lock().retain(|p| p.id != id);
        Ok(())
    }

    async fn reconcile(&self, expected: &[String]) -> Result<(), PaneError> {
        self.calls.lock().push(PaneCall::Reconcile {
            expected: expected.to_vec(),
        });
        self.live
            .lock()
            .retain(|p| expected.iter().any(|id| id == &p.agent_id));
        Ok(())
    }
}
