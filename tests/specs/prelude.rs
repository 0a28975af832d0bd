//! Shared helpers for the cross-crate behavioral specs: hand-built
//! workflow definitions exercising each gate kind, an engine wired to a
//! tempdir-backed store and a fake pane supervisor, and a thin CLI/daemon
//! harness for the process-level specs.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output};
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use loom_adapters::FakePaneSupervisor;
use loom_core::{CommandSpec, FileScope, Gate, RoleDefinition, StateDefinition, WorkflowDefinition};
use loom_engine::WorkflowEngine;
use loom_storage::StateStore;
use loom_workflows::WorkflowRegistry;

// =============================================================================
// Engine fixtures
// =============================================================================

pub fn engine_with(
    registry: WorkflowRegistry,
) -> (WorkflowEngine, tempfile::TempDir, Arc<FakePaneSupervisor>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = StateStore::new(dir.path());
    store.ensure().expect("ensure store dirs");
    let pane = Arc::new(FakePaneSupervisor::default());
    let engine = WorkflowEngine::new(store, registry, pane.clone());
    (engine, dir, pane)
}

pub fn role(agent: &str) -> RoleDefinition {
    RoleDefinition {
        agent: agent.to_string(),
        persona: None,
        persona_pool: None,
        persona_from: None,
        persona_tags: None,
        tools: vec![],
        file_scope: FileScope::default(),
        fresh_per_state: false,
    }
}

pub fn role_with_pool(agent: &str, pool: &[&str]) -> RoleDefinition {
    let mut r = role(agent);
    r.persona_pool = Some(pool.iter().map(|p| p.to_string()).collect());
    r
}

pub fn transitions(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Scenario: a verdict gate with a direct happy path, and a flagged
/// escalation branch.
pub fn verdict_workflow() -> WorkflowDefinition {
    let mut states = IndexMap::new();
    states.insert(
        "REVIEW".to_string(),
        StateDefinition::Agent {
            assign: "reviewer".to_string(),
            gate: Some(Gate::Verdict {
                options: vec!["approved".to_string(), "flagged".to_string()],
            }),
            transitions: transitions(&[("approved", "DONE"), ("flagged", "ESC")]),
            max_retries: None,
            input_from: None,
        },
    );
    states.insert(
        "DONE".to_string(),
        StateDefinition::Terminal {
            result: "success".to_string(),
            action: None,
        },
    );
    states.insert(
        "ESC".to_string(),
        StateDefinition::Terminal {
            result: "failure".to_string(),
            action: None,
        },
    );
    let mut roles = IndexMap::new();
    roles.insert("reviewer".to_string(), role("claude"));
    WorkflowDefinition {
        name: "verdict-demo".to_string(),
        description: None,
        initial_state: Some("REVIEW".to_string()),
        params: IndexMap::new(),
        roles,
        states,
    }
}

/// An evidence gate with a `verify` shell command, escalating to `ESC`
/// once `max_retries` attempts are exhausted.
pub fn evidence_retry_workflow_with(verify_command: &str, max_retries: Option<u32>) -> WorkflowDefinition {
    let mut schema = IndexMap::new();
    schema.insert("out".to_string(), "string".to_string());
    let mut states = IndexMap::new();
    states.insert(
        "RED".to_string(),
        StateDefinition::Agent {
            assign: "red".to_string(),
            gate: Some(Gate::Evidence {
                schema,
                verify: Some(CommandSpec {
                    command: verify_command.to_string(),
                    expect_exit_code: 0,
                }),
            }),
            transitions: transitions(&[("pass", "GREEN"), ("fail", "ESC")]),
            max_retries,
            input_from: None,
        },
    );
    states.insert(
        "GREEN".to_string(),
        StateDefinition::Terminal {
            result: "success".to_string(),
            action: None,
        },
    );
    states.insert(
        "ESC".to_string(),
        StateDefinition::Terminal {
            result: "failure".to_string(),
            action: None,
        },
    );
    let mut roles = IndexMap::new();
    roles.insert("red".to_string(), role("claude"));
    WorkflowDefinition {
        name: "evidence-demo".to_string(),
        description: None,
        initial_state: Some("RED".to_string()),
        params: IndexMap::new(),
        roles,
        states,
    }
}

/// Scenario: evidence schema validation failure, no `verify` command —
/// rejection must not consume a retry.
pub fn schema_reject_workflow() -> WorkflowDefinition {
    let mut schema = IndexMap::new();
    schema.insert("note".to_string(), "string".to_string());
    let mut states = IndexMap::new();
    states.insert(
        "RED".to_string(),
        StateDefinition::Agent {
            assign: "red".to_string(),
            gate: Some(Gate::Evidence {
                schema,
                verify: None,
            }),
            transitions: transitions(&[("pass", "GREEN")]),
            max_retries: Some(1),
            input_from: None,
        },
    );
    states.insert(
        "GREEN".to_string(),
        StateDefinition::Terminal {
            result: "success".to_string(),
            action: None,
        },
    );
    let mut roles = IndexMap::new();
    roles.insert("red".to_string(), role("claude"));
    WorkflowDefinition {
        name: "schema-demo".to_string(),
        description: None,
        initial_state: Some("RED".to_string()),
        params: IndexMap::new(),
        roles,
        states,
    }
}

/// Scenario: a subworkflow parent referencing a `$build` slot, plus the
/// child workflow it starts.
pub fn subworkflow_parent() -> WorkflowDefinition {
    let mut states = IndexMap::new();
    let mut input_map = IndexMap::new();
    input_map.insert("scenario".to_string(), "evidence.SETUP.slice".to_string());
    states.insert(
        "SETUP".to_string(),
        StateDefinition::Agent {
            assign: "setup".to_string(),
            gate: Some(Gate::Verdict {
                options: vec!["ready".to_string()],
            }),
            transitions: transitions(&[("ready", "BUILD")]),
            max_retries: None,
            input_from: None,
        },
    );
    states.insert(
        "BUILD".to_string(),
        StateDefinition::Subworkflow {
            workflow: "$build".to_string(),
            input_map: Some(input_map),
            transitions: transitions(&[("success", "REVIEW"), ("failure", "ESC")]),
            max_retries: None,
        },
    );
    states.insert(
        "REVIEW".to_string(),
        StateDefinition::Terminal {
            result: "success".to_string(),
            action: None,
        },
    );
    states.insert(
        "ESC".to_string(),
        StateDefinition::Terminal {
            result: "failure".to_string(),
            action: None,
        },
    );
    let mut roles = IndexMap::new();
    roles.insert("setup".to_string(), role("claude"));
    WorkflowDefinition {
        name: "parent-demo".to_string(),
        description: None,
        initial_state: Some("SETUP".to_string()),
        params: IndexMap::new(),
        roles,
        states,
    }
}

/// The child workflow a `subworkflow_parent` `BUILD` dispatch starts:
/// terminal on entry, so dispatching it completes the subworkflow in
/// one step.
pub fn subworkflow_child() -> WorkflowDefinition {
    let mut states = IndexMap::new();
    states.insert(
        "PLAY".to_string(),
        StateDefinition::Terminal {
            result: "success".to_string(),
            action: None,
        },
    );
    WorkflowDefinition {
        name: "tdd-ping-pong".to_string(),
        description: None,
        initial_state: Some("PLAY".to_string()),
        params: IndexMap::new(),
        roles: IndexMap::new(),
        states,
    }
}

/// Scenario: a single `DRAFT` state assigned to a role with a fixed
/// `personaPool`, round-robin'd across repeated visits, interleaved
/// with a second role that must never advance the pool's cursor.
pub fn persona_round_robin_workflow() -> WorkflowDefinition {
    let mut states = IndexMap::new();
    states.insert(
        "DRAFT".to_string(),
        StateDefinition::Agent {
            assign: "writer".to_string(),
            gate: Some(Gate::Verdict {
                options: vec!["again".to_string(), "done".to_string()],
            }),
            transitions: transitions(&[("again", "DRAFT"), ("done", "FIN")]),
            max_retries: None,
            input_from: None,
        },
    );
    states.insert(
        "FIN".to_string(),
        StateDefinition::Terminal {
            result: "success".to_string(),
            action: None,
        },
    );
    let mut roles = IndexMap::new();
    roles.insert(
        "writer".to_string(),
        role_with_pool("claude", &["alex", "billie", "cori"]),
    );
    roles.insert("editor".to_string(), role("claude"));
    WorkflowDefinition {
        name: "round-robin-demo".to_string(),
        description: None,
        initial_state: Some("DRAFT".to_string()),
        params: IndexMap::new(),
        roles,
        states,
    }
}

// =============================================================================
// CLI / daemon process harness
// =============================================================================

/// Locate a workspace binary, checking llvm-cov's target directory first
/// (same layout convention as the debug build), falling back to the test
/// binary's own directory when `CARGO_MANIFEST_DIR` is stale.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

pub fn loom_binary() -> PathBuf {
    binary_path("loom")
}

pub fn loomd_binary() -> PathBuf {
    binary_path("loomd")
}

/// Poll a condition until it returns true or the timeout elapses.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = Duration::from_millis(timeout_ms);
    let poll_interval = Duration::from_millis(10);
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(poll_interval);
    }
    false
}

/// A daemon running against an isolated state root, killed on drop.
pub struct Daemon {
    child: Child,
    pub root: PathBuf,
    _root_dir: tempfile::TempDir,
    _workflows_dir: tempfile::TempDir,
}

impl Daemon {
    /// Start `loomd --no-panes` with a fresh state root and one JSON
    /// workflow definition file installed under its `--workflows` dir.
    pub fn spawn_with_definition(name: &str, definition_json: &str) -> Self {
        let root_dir = tempfile::tempdir().expect("tempdir");
        let workflows_dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            workflows_dir.path().join(format!("{name}.json")),
            definition_json,
        )
        .expect("write fixture definition");

        let root = root_dir.path().to_path_buf();
        let child = Command::new(loomd_binary())
            .arg("--root")
            .arg(&root)
            .arg("--workflows")
            .arg(workflows_dir.path())
            .arg("--no-panes")
            .env("RUST_LOG", "error")
            .spawn()
            .expect("spawn loomd");

        let daemon = Self {
            child,
            root,
            _root_dir: root_dir,
            _workflows_dir: workflows_dir,
        };
        assert!(
            wait_for(2000, || daemon.root.join("bus.sock").exists()),
            "daemon never bound its socket"
        );
        daemon
    }

    pub fn cli(&self) -> CliBuilder {
        CliBuilder::new(self.root.clone())
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Fluent builder for one `loom` CLI invocation against a given state root.
pub struct CliBuilder {
    root: PathBuf,
    args: Vec<String>,
}

impl CliBuilder {
    fn new(root: PathBuf) -> Self {
        Self {
            root,
            args: Vec::new(),
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    fn command(self) -> Command {
        let mut cmd = Command::new(loom_binary());
        cmd.arg("--root").arg(&self.root);
        cmd.args(&self.args);
        cmd
    }

    pub fn passes(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    pub fn fails(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout does not contain '{}'\nstdout: {}",
            expected,
            stdout
        );
        self
    }
}
