// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Crash-safe persistence of [`WorkflowRuntimeState`] under a root
//! directory. One JSON file per workflow instance, no in-memory cache —
//! every [`StateStore::load`] re-deserializes from disk.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use loom_core::{WorkflowId, WorkflowRuntimeState};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt state file at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Durable store of [`WorkflowRuntimeState`], laid out as:
///
/// ```text
/// <root>/workflows/<workflow_id>/state.json
/// <root>/runtime/                              (agent scratch space)
/// <root>/evidence/                             (reserved)
/// ```
#[derive(Debug, Clone)]
pub struct StateStore {
    root: PathBuf,
}

impl StateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create `workflows/`, `runtime/`, and `evidence/` under the root,
    /// idempotently. Safe to call on every startup.
    pub fn ensure(&self) -> Result<(), StorageError> {
        for dir in ["workflows", "runtime", "evidence"] {
            let path = self.root.join(dir);
            fs::create_dir_all(&path).map_err(|source| StorageError::Io {
                path: path.clone(),
                source,
            })?;
        }
        Ok(())
    }

    fn workflow_dir(&self, id: &WorkflowId) -> PathBuf {
        self.root.join("workflows").join(id.as_str())
    }

    fn state_path(&self, id: &WorkflowId) -> PathBuf {
        self.workflow_dir(id).join("state.json")
    }

    /// Runtime scratch directory for one agent, `<root>/runtime/<agentId>/`.
    pub fn runtime_dir(&self, agent_id: &str) -> PathBuf {
        self.root.join("runtime").join(agent_id)
    }

    /// Atomically persist `state`: write to `state.json.tmp` in the same
    /// directory, `fsync` it, rename over `state.json`, then `fsync` the
    /// containing directory so the rename itself survives a crash. A
    /// reader never observes a half-written file.
    pub fn save(&self, state: &WorkflowRuntimeState) -> Result<(), StorageError> {
        let dir = self.workflow_dir(&state.workflow_id);
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            path: dir.clone(),
            source,
        })?;

        let final_path = dir.join("state.json");
        let tmp_path = dir.join("state.json.tmp");

        {
            let file = File::create(&tmp_path).map_err(|source| StorageError::Io {
                path: tmp_path.clone(),
                source,
            })?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, state).map_err(|source| {
                StorageError::Json {
                    path: tmp_path.clone(),
                    source,
                }
            })?;
            let file = writer.into_inner().map_err(|e| StorageError::Io {
                path: tmp_path.clone(),
                source: e.into_error(),
            })?;
            file.sync_all().map_err(|source| StorageError::Io {
                path: tmp_path.clone(),
                source,
            })?;
        }

        fs::rename(&tmp_path, &final_path).map_err(|source| StorageError::Io {
            path: final_path.clone(),
            source,
        })?;

        if let Ok(dir_handle) = File::open(&dir) {
            let _ = dir_handle.sync_all();
        }

        Ok(())
    }

    /// Load one workflow's state, or `None` if its directory has no
    /// `state.json` (a partial create, tolerated per [`StateStore::list`]).
    pub fn load(&self, id: &WorkflowId) -> Result<Option<WorkflowRuntimeState>, StorageError> {
        let path = self.state_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let file = File::open(&path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        let state = serde_json::from_reader(BufReader::new(file)).map_err(|source| {
            StorageError::Json {
                path: path.clone(),
                source,
            }
        })?;
        Ok(Some(state))
    }

    /// Every saved workflow, sorted by `created_at` ascending. Workflow
    /// directories without a `state.json` (e.g. a crash between
    /// `create_dir_all` and the first `save`) are silently skipped.
    pub fn list(&self) -> Result<Vec<WorkflowRuntimeState>, StorageError> {
        let workflows_dir = self.root.join("workflows");
        if !workflows_dir.exists() {
            return Ok(Vec::new());
        }

        let mut states = Vec::new();
        for entry in fs::read_dir(&workflows_dir).map_err(|source| StorageError::Io {
            path: workflows_dir.clone(),
            source,
        })? {
            let entry = entry.map_err(|source| StorageError::Io {
                path: workflows_dir.clone(),
                source,
            })?;
            if !entry.path().is_dir() {
                continue;
            }
            let state_path = entry.path().join("state.json");
            if !state_path.exists() {
                continue;
            }
            let file = File::open(&state_path).map_err(|source| StorageError::Io {
                path: state_path.clone(),
                source,
            })?;
            let state: WorkflowRuntimeState = serde_json::from_reader(BufReader::new(file))
                .map_err(|source| StorageError::Json {
                    path: state_path.clone(),
                    source,
                })?;
            states.push(state);
        }

        states.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(states)
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
