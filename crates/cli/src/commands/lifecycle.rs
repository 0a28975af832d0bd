// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `loom pause|resume|override|dispatch <id>` — the operator-driven
//! lifecycle controls that sit outside the gate-driven evidence flow.

use anyhow::Result;
use clap::Args;
use loom_core::WorkflowId;
use loom_daemon::protocol::{Request, Response};

use crate::client::DaemonClient;
use crate::output::{emit, OutputFormat};

#[derive(Args)]
pub struct WorkflowIdArg {
    /// Workflow instance id.
    pub id: String,
}

#[derive(Args)]
pub struct OverrideArgs {
    /// Workflow instance id.
    pub id: String,
    /// State to force the workflow into, bypassing its gate.
    pub next_state: String,
    /// Reason, preserved verbatim in the `override:<reason>` result.
    #[arg(long, default_value = "manual")]
    pub reason: String,
}

fn render_lifecycle(response: Response) -> Result<Response> {
    match &response {
        Response::Lifecycle { .. } | Response::Error { .. } => Ok(response),
        other => anyhow::bail!("unexpected response: {other:?}"),
    }
}

pub async fn pause(client: &DaemonClient, args: WorkflowIdArg, format: OutputFormat) -> Result<()> {
    let response = client
        .send(&Request::Pause {
            workflow_id: WorkflowId::new(args.id),
        })
        .await?;
    match render_lifecycle(response)? {
        Response::Lifecycle { outcome } => {
            emit(format, &outcome, |o| format!("{} -> {}", o.workflow_id(), o.status()))
        }
        Response::Error { error } => anyhow::bail!(error),
        _ => unreachable!(),
    }
}

pub async fn resume(client: &DaemonClient, args: WorkflowIdArg, format: OutputFormat) -> Result<()> {
    let response = client
        .send(&Request::Resume {
            workflow_id: WorkflowId::new(args.id),
        })
        .await?;
    match render_lifecycle(response)? {
        Response::Lifecycle { outcome } => {
            emit(format, &outcome, |o| format!("{} -> {}", o.workflow_id(), o.status()))
        }
        Response::Error { error } => anyhow::bail!(error),
        _ => unreachable!(),
    }
}

pub async fn override_state(
    client: &DaemonClient,
    args: OverrideArgs,
    format: OutputFormat,
) -> Result<()> {
    let response = client
        .send(&Request::Override {
            workflow_id: WorkflowId::new(args.id),
            next_state: args.next_state,
            reason: args.reason,
        })
        .await?;
    match render_lifecycle(response)? {
        Response::Lifecycle { outcome } => {
            emit(format, &outcome, |o| format!("{} -> {}", o.workflow_id(), o.status()))
        }
        Response::Error { error } => anyhow::bail!(error),
        _ => unreachable!(),
    }
}

pub async fn dispatch(client: &DaemonClient, args: WorkflowIdArg, format: OutputFormat) -> Result<()> {
    let response = client
        .send(&Request::Dispatch {
            workflow_id: WorkflowId::new(args.id),
        })
        .await?;
    match response {
        Response::Dispatched { outcome } => emit(format, &outcome, |o| format!("{o:?}")),
        Response::Error { error } => anyhow::bail!(error),
        other => anyhow::bail!("unexpected response: {other:?}"),
    }
}
