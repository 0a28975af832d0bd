// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Format-dispatching parser for a single workflow definition document.

use loom_core::WorkflowDefinition;
use thiserror::Error;

use crate::format::Format;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("HCL parse error: {0}")]
    Hcl(#[from] hcl::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse one workflow definition document. All three formats deserialize
/// into the same [`WorkflowDefinition`] shape; only the wire syntax
/// differs.
pub fn parse_definition(content: &str, format: Format) -> Result<WorkflowDefinition, ParseError> {
    match format {
        Format::Hcl => Ok(hcl::from_str(content)?),
        Format::Toml => Ok(toml::from_str(content)?),
        Format::Json => Ok(serde_json::from_str(content)?),
    }
}
