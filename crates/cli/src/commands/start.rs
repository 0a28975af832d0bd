// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `loom start <type> [--param k=v]...` — start a fresh workflow instance.

use anyhow::Result;
use clap::Args;
use loom_daemon::protocol::{Request, Response};
use serde_json::Value;

use crate::client::DaemonClient;
use crate::output::{emit, OutputFormat};

use super::parse_key_value;

#[derive(Args)]
pub struct StartArgs {
    /// Name of the workflow definition to start (as loaded by the registry).
    pub workflow_type: String,

    /// Workflow param, repeatable: `--param key=value`. Values that parse
    /// as JSON (numbers, booleans, objects, arrays) are sent as such;
    /// everything else is sent as a string.
    #[arg(long = "param", value_parser = parse_key_value)]
    pub param: Vec<(String, String)>,
}

fn coerce(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

pub async fn run(client: &DaemonClient, args: StartArgs, format: OutputFormat) -> Result<()> {
    let mut params = serde_json::Map::new();
    for (key, value) in args.param {
        params.insert(key, coerce(&value));
    }

    let response = client
        .send(&Request::Start {
            workflow_type: args.workflow_type,
            params: Value::Object(params),
        })
        .await?;

    match response {
        Response::Started { state } => emit(format, &state, |state| {
            format!(
                "started {} ({}) at {}",
                state.workflow_id, state.workflow_type, state.current_state
            )
        }),
        Response::Error { error } => anyhow::bail!(error),
        other => anyhow::bail!("unexpected response: {other:?}"),
    }
}
