// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project-level `loom.toml`: role overrides and the team roster used by
//! persona resolution.

use std::collections::HashMap;
use std::path::Path;

use loom_core::{RoleOverride, TeamMember};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawProjectConfig {
    #[serde(default)]
    roles: HashMap<String, RoleOverride>,
    #[serde(default)]
    team: Vec<TeamMember>,
}

/// Loaded, read-only view of a project's `loom.toml`. Absent file = empty
/// config (no overrides), not an error.
#[derive(Debug, Clone, Default)]
pub struct ProjectConfig {
    roles: HashMap<String, RoleOverride>,
    team: Vec<TeamMember>,
}

impl ProjectConfig {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load `<project_root>/loom.toml`. Returns an empty config if the
    /// file does not exist.
    pub fn load(project_root: &Path) -> Result<Self, ProjectConfigError> {
        let path = project_root.join("loom.toml");
        if !path.exists() {
            return Ok(Self::default());
        }
        let display = path.display().to_string();
        let content = std::fs::read_to_string(&path).map_err(|source| ProjectConfigError::Io {
            path: display.clone(),
            source,
        })?;
        let raw: RawProjectConfig =
            toml::from_str(&content).map_err(|source| ProjectConfigError::Toml {
                path: display,
                source,
            })?;
        Ok(Self {
            roles: raw.roles,
            team: raw.team,
        })
    }

    #[cfg(test)]
    pub(crate) fn from_parts(roles: HashMap<String, RoleOverride>, team: Vec<TeamMember>) -> Self {
        Self { roles, team }
    }

    pub fn role_override(&self, role_name: &str) -> Option<&RoleOverride> {
        self.roles.get(role_name)
    }

    pub fn team(&self) -> &[TeamMember] {
        &self.team
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
