// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The pane-supervisor trait and its implementations.

mod noop;
mod tmux;

pub use noop::NoOpPaneSupervisor;
pub use tmux::TmuxPaneSupervisor;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakePaneSupervisor, PaneCall};

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaneError {
    #[error("pane not found: {0}")]
    NotFound(String),
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("command failed: {0}")]
    CommandFailed(String),
}

/// The launch specification the engine's agent dispatcher hands to the
/// supervisor for one agent. The supervisor does not
/// interpret `command` beyond running it; everything about prompts,
/// tool scope, and task framing is baked into the command's environment
/// and working directory before this point.
#[derive(Debug, Clone)]
pub struct PaneSpec {
    pub agent_id: String,
    pub cwd: PathBuf,
    pub command: String,
    pub env: Vec<(String, String)>,
}

/// A handle to a launched pane, returned from [`PaneSupervisor::spawn`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneHandle {
    pub id: String,
}

/// A snapshot of one pane's identity, as returned by
/// [`PaneSupervisor::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneInfo {
    pub id: String,
    pub agent_id: String,
}

/// Lifecycle operations against whatever terminal multiplexer backs
/// agent panes. The engine only ever calls through this trait — it
/// never inspects pane output or assumes a specific multiplexer.
#[async_trait]
pub trait PaneSupervisor: Send + Sync + 'static {
    async fn spawn(&self, spec: PaneSpec) -> Result<PaneHandle, PaneError>;
    async fn list(&self) -> Result<Vec<PaneInfo>, PaneError>;
    async fn focus(&self, id: &str) -> Result<(), PaneError>;
    async fn close(&self, id: &str) -> Result<(), PaneError>;
    /// Reconcile live panes against the set of agent ids the engine
    /// currently expects to have running panes. Implementations are
    /// free to close panes that are not in `expected`; panes for agents
    /// in `expected` that are not currently running are left for the
    /// caller to re-spawn.
    async fn reconcile(&self, expected: &[String]) -> Result<(), PaneError>;
}
