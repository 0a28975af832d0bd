//! Evidence gate retry and escalation: a `verify` command that fails
//! consumes a retry; reaching `maxRetries` failures escalates to the
//! declared `fail` transition.

use crate::prelude::*;
use loom_engine::Outcome;
use loom_workflows::WorkflowRegistry;
use serde_json::json;

fn submission(result: &str) -> loom_engine::Submission {
    loom_engine::Submission {
        state: "RED".to_string(),
        result: result.to_string(),
        evidence: json!({ "out": "x" }),
        submitted_by: None,
    }
}

#[tokio::test]
async fn max_retries_one_escalates_on_first_failure() {
    let mut registry = WorkflowRegistry::empty();
    registry
        .insert(evidence_retry_workflow_with("false", Some(1)))
        .unwrap();
    let (engine, _dir, _pane) = engine_with(registry);

    let state = engine.start("evidence-demo", json!({})).await.unwrap();
    let outcome = engine
        .submit_evidence(&state.workflow_id, submission("pass"))
        .await
        .unwrap();

    match outcome {
        Outcome::Failed { state, retries, .. } => {
            assert_eq!(retries, 1);
            assert_eq!(state, "ESC");
        }
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[tokio::test]
async fn max_retries_two_stays_put_once_then_escalates() {
    let mut registry = WorkflowRegistry::empty();
    registry
        .insert(evidence_retry_workflow_with("false", Some(2)))
        .unwrap();
    let (engine, _dir, _pane) = engine_with(registry);

    let state = engine.start("evidence-demo", json!({})).await.unwrap();

    let first = engine
        .submit_evidence(&state.workflow_id, submission("pass"))
        .await
        .unwrap();
    match first {
        Outcome::Failed { state, retries, .. } => {
            assert_eq!(state, "RED");
            assert_eq!(retries, 1);
        }
        other => panic!("expected Failed, got {other:?}"),
    }

    let second = engine
        .submit_evidence(&state.workflow_id, submission("pass"))
        .await
        .unwrap();
    match second {
        Outcome::Failed { state, .. } => assert_eq!(state, "ESC"),
        other => panic!("expected Failed, got {other:?}"),
    }

    let reloaded = engine.store().load(&state.workflow_id).unwrap().unwrap();
    assert_eq!(reloaded.current_state, "ESC");
    assert_eq!(reloaded.retry_count, 0, "escalation resets retry bookkeeping");
}

#[tokio::test]
async fn passing_verify_command_advances_immediately() {
    let mut registry = WorkflowRegistry::empty();
    registry
        .insert(evidence_retry_workflow_with("true", Some(1)))
        .unwrap();
    let (engine, _dir, _pane) = engine_with(registry);

    let state = engine.start("evidence-demo", json!({})).await.unwrap();
    let outcome = engine
        .submit_evidence(&state.workflow_id, submission("pass"))
        .await
        .unwrap();

    assert!(matches!(outcome, Outcome::Advanced { to, .. } if to == "GREEN"));
}
