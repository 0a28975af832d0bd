// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tmux-backed pane supervisor: one tmux session per agent, named after
//! the agent id.

use async_trait::async_trait;
use tokio::process::Command;

use super::{PaneError, PaneHandle, PaneInfo, PaneSpec, PaneSupervisor};

fn session_name(agent_id: &str) -> String {
    format!("loom-{agent_id}")
}

#[derive(Debug, Clone, Default)]
pub struct TmuxPaneSupervisor;

impl TmuxPaneSupervisor {
    pub fn new() -> Self {
        Self
    }

    async fn session_exists(&self, session: &str) -> bool {
        Command::new("tmux")
            .args(["has-session", "-t", session])
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl PaneSupervisor for TmuxPaneSupervisor {
    async fn spawn(&self, spec: PaneSpec) -> Result<PaneHandle, PaneError> {
        if !spec.cwd.exists() {
            return Err(PaneError::SpawnFailed(format!(
                "working directory does not exist: {}",
                spec.cwd.display()
            )));
        }

        let session = session_name(&spec.agent_id);
        if self.session_exists(&session).await {
            tracing::warn!(session, "pane already exists, killing first");
            let _ = Command::new("tmux")
                .args(["kill-session", "-t", &session])
                .output()
                .await;
        }

        let mut cmd = Command::new("tmux");
        cmd.arg("new-session")
            .arg("-d")
            .arg("-s")
            .arg(&session)
            .arg("-c")
            .arg(&spec.cwd);
        for (key, value) in &spec.env {
            cmd.arg("-e").arg(format!("{key}={value}"));
        }
        cmd.arg(&spec.command);

        let output = cmd
            .output()
            .await
            .map_err(|e| PaneError::SpawnFailed(e.to_string()))?;
        if !output.status.success() {
            return Err(PaneError::SpawnFailed(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }

        Ok(PaneHandle { id: session })
    }

    async fn list(&self) -> Result<Vec<PaneInfo>, PaneError> {
        let output = Command::new("tmux")
            .args(["list-sessions", "-F", "#{session_name}"])
            .output()
            .await
            .map_err(|e| PaneError::CommandFailed(e.to_string()))?;
        if !output.status.success() {
            // No server running is not an error — it just means no panes.
            return Ok(Vec::new());
        }
        let panes = String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter_map(|line| {
                line.strip_prefix("loom-").map(|agent_id| PaneInfo {
                    id: line.to_string(),
                    agent_id: agent_id.to_string(),
                })
            })
            .collect();
        Ok(panes)
    }

    async fn focus(&self, id: &str) -> Result<(), PaneError> {
        let output = Command::new("tmux")
            .args(["switch-client", "-t", id])
            .output()
            .await
            .map_err(|e| PaneError::CommandFailed(e.to_string()))?;
        if !output.status.success() {
            return Err(PaneError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn close(&self, id: &str) -> Result<(), PaneError> {
        let output = Command::new("tmux")
            .args(["kill-session", "-t", id])
            .output()
            .await
            .map_err(|e| PaneError::CommandFailed(e.to_string()))?;
        if !output.status.success() {
            return Err(PaneError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn reconcile(&self, expected: &[String]) -> Result<(), PaneError> {
        let live = self.list().await?;
        for pane in live {
            if !expected.iter().any(|id| id == &pane.agent_id) {
                tracing::info!(agent_id = %pane.agent_id, "closing pane with no matching expected agent");
                let _ = self.close(&pane.id).await;
            }
        }
        Ok(())
    }
}
