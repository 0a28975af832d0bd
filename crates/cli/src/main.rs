// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! loom — operator/agent-tool CLI for the workflow orchestration daemon.
//!
//! A thin client: every subcommand sends one request to `loomd` over its
//! Unix socket and renders the response. Verbs map one-to-one onto the
//! wire protocol's request variants.

mod client;
mod commands;
mod output;
mod root;

use anyhow::Result;
use clap::{Parser, Subcommand};

use client::DaemonClient;
use commands::{lifecycle, start, status};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "loom", version, about = "Workflow orchestration engine CLI")]
struct Cli {
    /// State-store root / bus socket directory. Defaults to
    /// `$LOOM_STATE_DIR`, then `~/.local/state/loom`.
    #[arg(long, global = true)]
    root: Option<std::path::PathBuf>,

    /// Output format.
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new workflow instance.
    Start(start::StartArgs),
    /// Show every known workflow, or one instance in detail.
    Status(status::StatusArgs),
    /// Pause a workflow: future evidence submissions are rejected until resumed.
    Pause(lifecycle::WorkflowIdArg),
    /// Resume a paused workflow.
    Resume(lifecycle::WorkflowIdArg),
    /// Force a workflow to a given state, bypassing its gate.
    Override(lifecycle::OverrideArgs),
    /// Act on a workflow's current state: launch an agent, run action
    /// commands, propagate a terminal result, or spawn a child workflow.
    Dispatch(lifecycle::WorkflowIdArg),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let root = root::resolve(cli.root);
    let client = DaemonClient::connect(root::socket_path(&root));

    match cli.command {
        Commands::Start(args) => start::run(&client, args, cli.output).await,
        Commands::Status(args) => status::run(&client, args, cli.output).await,
        Commands::Pause(args) => lifecycle::pause(&client, args, cli.output).await,
        Commands::Resume(args) => lifecycle::resume(&client, args, cli.output).await,
        Commands::Override(args) => lifecycle::override_state(&client, args, cli.output).await,
        Commands::Dispatch(args) => lifecycle::dispatch(&client, args, cli.output).await,
    }
}
