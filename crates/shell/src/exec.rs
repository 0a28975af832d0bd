// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timeout-bounded subprocess execution via the platform shell.

use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;

/// Exit code synthesized when a command cannot be run at all: it timed
/// out, or the process-spawn facility itself is unavailable. Matches the
/// `CommandUnavailable` taxonomy entry, which folds into gate-verification
/// failure rather than a distinct engine-fatal error.
pub const UNAVAILABLE_EXIT_CODE: i32 = 127;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to spawn command: {0}")]
    Spawn(#[source] std::io::Error),
}

/// The outcome of running one command to completion (or to timeout).
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl CommandOutcome {
    pub fn succeeded(&self, expect_exit_code: i32) -> bool {
        self.exit_code == expect_exit_code
    }
}

/// Maximum bytes of stdout/stderr retained per stream, so a runaway
/// command can't balloon an evidence record or a history entry.
const OUTPUT_CAP: usize = 16 * 1024;

fn truncate(mut s: Vec<u8>) -> String {
    if s.len() > OUTPUT_CAP {
        s.truncate(OUTPUT_CAP);
    }
    String::from_utf8_lossy(&s).into_owned()
}

/// Run `command` through `sh -c`, bounded by `timeout`. A timeout or a
/// spawn failure is reported as [`CommandOutcome::timed_out`] /
/// exit code [`UNAVAILABLE_EXIT_CODE`] rather than an error, since every
/// caller (gate verification, action states) treats "could not run" the
/// same as "ran and failed".
pub async fn run_with_timeout(
    command: &str,
    cwd: Option<&Path>,
    timeout: Duration,
) -> CommandOutcome {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    if let Some(cwd) = cwd {
        cmd.current_dir(cwd);
    }
    cmd.kill_on_drop(true);

    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => CommandOutcome {
            exit_code: output.status.code().unwrap_or(UNAVAILABLE_EXIT_CODE),
            stdout: truncate(output.stdout),
            stderr: truncate(output.stderr),
            timed_out: false,
        },
        Ok(Err(err)) => {
            tracing::warn!(error = %err, command, "failed to spawn gate/action command");
            CommandOutcome {
                exit_code: UNAVAILABLE_EXIT_CODE,
                stdout: String::new(),
                stderr: err.to_string(),
                timed_out: false,
            }
        }
        Err(_elapsed) => CommandOutcome {
            exit_code: UNAVAILABLE_EXIT_CODE,
            stdout: String::new(),
            stderr: format!("command timed out after {}s", timeout.as_secs()),
            timed_out: true,
        },
    }
}
