// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Loads workflow definitions from an ordered list of search directories
//! and indexes them by name.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use loom_core::{EngineError, WorkflowDefinition};
use thiserror::Error;

use crate::format::Format;
use crate::parse::{parse_definition, ParseError};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse workflow definition at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    #[error("invalid workflow definition at {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: EngineError,
    },
}

/// The loaded, read-only set of workflow definitions, keyed by name.
/// When the same name is produced by more than one search directory the
/// later directory in `dirs` wins — this lets a project's own workflow
/// directory override a built-in catalog shipped alongside the binary.
#[derive(Debug, Default)]
pub struct WorkflowRegistry {
    definitions: IndexMap<String, WorkflowDefinition>,
}

impl WorkflowRegistry {
    pub fn empty() -> Self {
        Self {
            definitions: IndexMap::new(),
        }
    }

    /// Load every recognized definition file under each directory in
    /// `dirs`, in order. Directories are walked recursively. A directory
    /// that does not exist is skipped rather than treated as an error,
    /// so an optional project overrides directory need not be created
    /// up front.
    pub fn load_dirs(dirs: &[PathBuf]) -> Result<Self, RegistryError> {
        let mut registry = Self::empty();
        for dir in dirs {
            registry.load_dir(dir)?;
        }
        Ok(registry)
    }

    fn load_dir(&mut self, dir: &Path) -> Result<(), RegistryError> {
        if !dir.exists() {
            return Ok(());
        }
        for (path, format) in collect_definition_files(dir).map_err(|source| RegistryError::Io {
            path: dir.to_path_buf(),
            source,
        })? {
            let content = std::fs::read_to_string(&path).map_err(|source| RegistryError::Io {
                path: path.clone(),
                source,
            })?;
            let definition = parse_definition(&content, format)
                .map_err(|source| RegistryError::Parse {
                    path: path.clone(),
                    source,
                })?;
            definition
                .validate()
                .map_err(|source| RegistryError::Invalid {
                    path: path.clone(),
                    source,
                })?;
            if self.definitions.contains_key(&definition.name) {
                tracing::info!(
                    workflow = %definition.name,
                    path = %path.display(),
                    "workflow definition overrides an earlier search-path entry",
                );
            }
            self.definitions.insert(definition.name.clone(), definition);
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&WorkflowDefinition> {
        self.definitions.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &WorkflowDefinition)> {
        self.definitions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Directly register a definition, bypassing file loading. Used to
    /// install embedded default definitions packaged with the binary.
    pub fn insert(&mut self, definition: WorkflowDefinition) -> Result<(), EngineError> {
        definition.validate()?;
        self.definitions.insert(definition.name.clone(), definition);
        Ok(())
    }
}

fn collect_definition_files(dir: &Path) -> std::io::Result<Vec<(PathBuf, Format)>> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in std::fs::read_dir(&current)?.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if let Some(format) = Format::for_path(&path) {
                files.push((path, format));
            }
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
