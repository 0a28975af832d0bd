// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A pane supervisor that only logs. Useful when the engine runs
//! headless (no terminal multiplexer available) and dispatch should
//! still advance state without a real pane existing.

use async_trait::async_trait;

use super::{PaneError, PaneHandle, PaneInfo, PaneSpec, PaneSupervisor};

#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpPaneSupervisor;

#[async_trait]
impl PaneSupervisor for NoOpPaneSupervisor {
    async fn spawn(&self, spec: PaneSpec) -> Result<PaneHandle, PaneError> {
        tracing::info!(agent_id = %spec.agent_id, "no-op pane supervisor: not spawning a real pane");
        Ok(PaneHandle { id: spec.agent_id })
    }

    async fn list(&self) -> Result<Vec<PaneInfo>, PaneError> {
        Ok(Vec::new())
    }

    async fn focus(&self, _id: &str) -> Result<(), PaneError> {
        Ok(())
    }

    async fn close(&self, _id: &str) -> Result<(), PaneError> {
        Ok(())
    }

    async fn reconcile(&self, _expected: &[String]) -> Result<(), PaneError> {
        Ok(())
    }
}
