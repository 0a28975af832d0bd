// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! loomd — the workflow orchestration daemon.
//!
//! Owns the `StateStore`, the `WorkflowRegistry`, and the `MessageBus`;
//! accepts connections on a Unix socket at `<root>/bus.sock` and runs
//! the autopilot sweep alongside the listener.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use loom_adapters::{NoOpPaneSupervisor, PaneSupervisor, TmuxPaneSupervisor};
use loom_daemon::{autopilot, ListenCtx, Listener, MessageBus};
use loom_engine::{ProjectConfig, WorkflowEngine};
use loom_storage::StateStore;
use loom_workflows::WorkflowRegistry;
use tokio::net::UnixListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// The workflow orchestration daemon.
#[derive(Parser, Debug)]
#[command(name = "loomd", version, about = "Workflow orchestration daemon")]
struct Args {
    /// State-store root / bus socket directory. Defaults to
    /// `$LOOM_STATE_DIR`, then `~/.local/state/loom`.
    #[arg(long)]
    root: Option<PathBuf>,

    /// Workflow definition search directory; repeatable. Later
    /// directories win on a name collision.
    #[arg(long = "workflows")]
    workflows: Vec<PathBuf>,

    /// Project root to load `loom.toml` from. Defaults to the current
    /// directory.
    #[arg(long)]
    project: Option<PathBuf>,

    /// Use the no-op pane supervisor instead of tmux (for headless runs
    /// and integration tests).
    #[arg(long)]
    no_panes: bool,
}

fn default_root() -> PathBuf {
    if let Ok(dir) = std::env::var("LOOM_STATE_DIR") {
        return PathBuf::from(dir);
    }
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .map(|d| d.join("loom"))
        .unwrap_or_else(|| PathBuf::from(".loom"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let root = args.root.unwrap_or_else(default_root);
    let project_root = args.project.unwrap_or_else(|| {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    });

    let store = StateStore::new(&root);
    store.ensure()?;

    let registry = WorkflowRegistry::load_dirs(&args.workflows)?;
    info!(count = registry.len(), "loaded workflow definitions");

    let project_config = ProjectConfig::load(&project_root)?;

    let pane_supervisor: Arc<dyn PaneSupervisor> = if args.no_panes {
        Arc::new(NoOpPaneSupervisor)
    } else {
        Arc::new(TmuxPaneSupervisor::new())
    };

    let engine = Arc::new(
        WorkflowEngine::new(store, registry, pane_supervisor).with_project_config(project_config),
    );

    let wal_path = root.join("bus.wal");
    let bus = Arc::new(MessageBus::open(&wal_path, Arc::new(loom_core::SystemClock))?);

    let socket_path = root.join("bus.sock");
    if socket_path.exists() {
        std::fs::remove_file(&socket_path)?;
    }
    let unix_listener = UnixListener::bind(&socket_path)?;
    info!(socket = %socket_path.display(), "bound bus socket");

    let ctx = Arc::new(ListenCtx {
        engine: Arc::clone(&engine),
        bus,
    });
    let listener = Listener::new(unix_listener, ctx);

    let autopilot_handle = autopilot::spawn(Arc::clone(&engine), autopilot::DEFAULT_POLL_INTERVAL);

    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    tokio::select! {
        _ = listener.run() => {
            warn!("listener exited unexpectedly");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("received ctrl-c, shutting down");
        }
        _ = sigterm.recv() => {
            info!("received SIGTERM, shutting down");
        }
    }

    autopilot_handle.abort();
    let _ = std::fs::remove_file(&socket_path);
    Ok(())
}
