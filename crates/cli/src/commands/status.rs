// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `loom status [id]` — list every known workflow, or show one instance
//! (including its per-state gate-diagnostics trail) in detail.

use anyhow::Result;
use clap::Args;
use loom_core::WorkflowId;
use loom_daemon::protocol::{Request, Response};
use loom_engine::state_diagnostics;

use crate::client::DaemonClient;
use crate::output::{emit, OutputFormat};

#[derive(Args)]
pub struct StatusArgs {
    /// Workflow instance id. Omit to list every known workflow.
    pub id: Option<String>,
}

pub async fn run(client: &DaemonClient, args: StatusArgs, format: OutputFormat) -> Result<()> {
    match args.id {
        None => {
            let response = client.send(&Request::Status).await?;
            match response {
                Response::Status { workflows } => emit(format, &workflows, |workflows| {
                    if workflows.is_empty() {
                        return "no workflows".to_string();
                    }
                    workflows
                        .iter()
                        .map(|w| {
                            format!(
                                "{}  {}  {}{}",
                                w.workflow_id,
                                w.workflow_type,
                                w.current_state,
                                if w.paused { "  (paused)" } else { "" }
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                }),
                Response::Error { error } => anyhow::bail!(error),
                other => anyhow::bail!("unexpected response: {other:?}"),
            }
        }
        Some(id) => {
            let response = client
                .send(&Request::GetWorkflow {
                    workflow_id: WorkflowId::new(id),
                })
                .await?;
            match response {
                Response::Workflow { state } => {
                    let diagnostics = state_diagnostics(&state);
                    emit(format, &state, |state| {
                        let mut lines = vec![format!(
                            "{}  {}  {}{}",
                            state.workflow_id,
                            state.workflow_type,
                            state.current_state,
                            if state.paused { "  (paused)" } else { "" }
                        )];
                        for d in &diagnostics {
                            lines.push(format!(
                                "  {} retries={} result={}",
                                d.state,
                                d.retries,
                                d.result.as_deref().unwrap_or("-")
                            ));
                            for err in &d.validation.errors {
                                lines.push(format!("    ! {err}"));
                            }
                        }
                        lines.join("\n")
                    })
                }
                Response::UnknownWorkflow { error } => anyhow::bail!(error),
                Response::Error { error } => anyhow::bail!(error),
                other => anyhow::bail!("unexpected response: {other:?}"),
            }
        }
    }
}
