// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The engine's own error type: folds [`EngineError`] (structural faults
//! in a definition or referenced id) together with the lower crates'
//! errors (store I/O, pane supervisor failures) into one `Result` that
//! [`crate::handlers`] can propagate with `?`.

use loom_adapters::PaneError;
use loom_core::EngineError;
use loom_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Pane(#[from] PaneError),
    #[error("failed to write agent artifacts: {0}")]
    Artifact(#[from] std::io::Error),
}

pub type HandlerResult<T> = Result<T, HandlerError>;
