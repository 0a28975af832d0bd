//! Verdict gate happy path, plus the state-mismatch rejection that
//! guards against a stale submission racing a transition.

use crate::prelude::*;
use loom_core::WorkflowId;
use loom_engine::{Outcome, Submission};
use loom_workflows::WorkflowRegistry;
use serde_json::json;

#[tokio::test]
async fn approved_verdict_advances_to_done() {
    let mut registry = WorkflowRegistry::empty();
    registry.insert(verdict_workflow()).unwrap();
    let (engine, _dir, pane) = engine_with(registry);

    let state = engine.start("verdict-demo", json!({})).await.unwrap();
    let dispatched = engine.dispatch_current_state(&state.workflow_id).await.unwrap();
    assert!(matches!(
        dispatched,
        loom_engine::DispatchOutcome::AgentDispatched { .. }
    ));
    assert_eq!(pane.spawn_count(), 1);

    let outcome = engine
        .submit_evidence(
            &state.workflow_id,
            Submission {
                state: "REVIEW".to_string(),
                result: "approved".to_string(),
                evidence: json!({}),
                submitted_by: Some("reviewer-agent".to_string()),
            },
        )
        .await
        .unwrap();

    match outcome {
        Outcome::Advanced { from, to, result, .. } => {
            assert_eq!(from, "REVIEW");
            assert_eq!(to, "DONE");
            assert_eq!(result, "approved");
        }
        other => panic!("expected Advanced, got {other:?}"),
    }

    let reloaded = engine.store().load(&state.workflow_id).unwrap().unwrap();
    assert_eq!(reloaded.current_state, "DONE");
    assert_eq!(reloaded.retry_count, 0);
}

#[tokio::test]
async fn flagged_verdict_escalates() {
    let mut registry = WorkflowRegistry::empty();
    registry.insert(verdict_workflow()).unwrap();
    let (engine, _dir, _pane) = engine_with(registry);

    let state = engine.start("verdict-demo", json!({})).await.unwrap();
    let outcome = engine
        .submit_evidence(
            &state.workflow_id,
            Submission {
                state: "REVIEW".to_string(),
                result: "flagged".to_string(),
                evidence: json!({}),
                submitted_by: None,
            },
        )
        .await
        .unwrap();

    assert!(matches!(outcome, Outcome::Advanced { to, .. } if to == "ESC"));
}

#[tokio::test]
async fn submission_targeting_a_stale_state_is_rejected_without_mutation() {
    let mut registry = WorkflowRegistry::empty();
    registry.insert(verdict_workflow()).unwrap();
    let (engine, _dir, _pane) = engine_with(registry);

    let state = engine.start("verdict-demo", json!({})).await.unwrap();
    // Advance once for real...
    engine
        .submit_evidence(
            &state.workflow_id,
            Submission {
                state: "REVIEW".to_string(),
                result: "approved".to_string(),
                evidence: json!({}),
                submitted_by: None,
            },
        )
        .await
        .unwrap();

    // ...then a late submission still targeting REVIEW must bounce.
    let outcome = engine
        .submit_evidence(
            &state.workflow_id,
            Submission {
                state: "REVIEW".to_string(),
                result: "approved".to_string(),
                evidence: json!({}),
                submitted_by: None,
            },
        )
        .await
        .unwrap();

    assert!(matches!(outcome, Outcome::Rejected { .. }));
    let reloaded = engine.store().load(&state.workflow_id).unwrap().unwrap();
    assert_eq!(reloaded.current_state, "DONE");
}

#[tokio::test]
async fn unknown_workflow_id_is_an_error() {
    let registry = WorkflowRegistry::empty();
    let (engine, _dir, _pane) = engine_with(registry);
    let result = engine
        .submit_evidence(
            &WorkflowId::new("does-not-exist"),
            Submission {
                state: "REVIEW".to_string(),
                result: "approved".to_string(),
                evidence: json!({}),
                submitted_by: None,
            },
        )
        .await;
    assert!(result.is_err());
}
