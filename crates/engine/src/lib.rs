// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The workflow engine: state-machine interpretation, gate evaluation,
//! retries, subworkflow composition, persona resolution, and the agent
//! dispatch artifacts that hand work off to the external pane
//! supervisor.

mod config;
mod dispatch;
mod error;
pub mod handlers;
mod locks;
mod outcome;
mod persona;
mod schema;

pub use config::{ProjectConfig, ProjectConfigError};
pub use dispatch::{build_agent_artifacts, AgentArtifacts};
pub use error::{HandlerError, HandlerResult};
pub use handlers::Submission;
pub use outcome::{state_diagnostics, DispatchOutcome, Outcome, StateDiagnostic};
pub use persona::{resolve_role, ResolvedRole};
pub use schema::{collect_schemas, validate_evidence, SchemaEntry, ValidationReport};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use loom_adapters::PaneSupervisor;
use loom_core::{Clock, SystemClock};
use loom_storage::StateStore;
use loom_workflows::WorkflowRegistry;

use locks::WorkflowLocks;

/// Default upper bound for gate-verify and action-state commands.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// The interpreter. Holds everything [`handlers`] needs: the durable
/// store, the read-only definition registry, the pane supervisor
/// collaborator, a clock (swappable in tests), per-workflow locks, and
/// optional project-level role overrides.
pub struct WorkflowEngine {
    pub(crate) store: StateStore,
    pub(crate) registry: WorkflowRegistry,
    pub(crate) pane_supervisor: Arc<dyn PaneSupervisor>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) locks: WorkflowLocks,
    pub(crate) project_config: ProjectConfig,
    pub(crate) command_timeout: Duration,
    pub(crate) prompt_root: PathBuf,
}

impl WorkflowEngine {
    pub fn new(
        store: StateStore,
        registry: WorkflowRegistry,
        pane_supervisor: Arc<dyn PaneSupervisor>,
    ) -> Self {
        Self {
            store,
            registry,
            pane_supervisor,
            clock: Arc::new(SystemClock),
            locks: WorkflowLocks::default(),
            project_config: ProjectConfig::default(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            prompt_root: PathBuf::from(".orchestra"),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_project_config(mut self, config: ProjectConfig) -> Self {
        self.project_config = config;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_prompt_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.prompt_root = root.into();
        self
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn registry(&self) -> &WorkflowRegistry {
        &self.registry
    }
}
