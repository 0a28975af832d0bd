//! Schema rejection: evidence that fails structural validation bounces
//! before a verify command ever runs, and never consumes a retry.

use crate::prelude::*;
use loom_engine::Outcome;
use loom_workflows::WorkflowRegistry;
use serde_json::json;

#[tokio::test]
async fn type_mismatch_is_rejected_without_consuming_a_retry() {
    let mut registry = WorkflowRegistry::empty();
    registry.insert(schema_reject_workflow()).unwrap();
    let (engine, _dir, _pane) = engine_with(registry);

    let state = engine.start("schema-demo", json!({})).await.unwrap();
    let outcome = engine
        .submit_evidence(
            &state.workflow_id,
            loom_engine::Submission {
                state: "RED".to_string(),
                result: "pass".to_string(),
                evidence: json!({ "note": 123 }),
                submitted_by: None,
            },
        )
        .await
        .unwrap();

    match outcome {
        Outcome::Rejected { reason, diagnostics, .. } => {
            assert!(reason.contains("schema validation"));
            let diagnostics = diagnostics.expect("diagnostics present");
            assert!(diagnostics
                .iter()
                .any(|d| d.contains("note") && d.contains("string") && d.contains("number")));
        }
        other => panic!("expected Rejected, got {other:?}"),
    }

    let reloaded = engine.store().load(&state.workflow_id).unwrap().unwrap();
    assert_eq!(reloaded.current_state, "RED");
    assert_eq!(reloaded.retry_count, 0);
    let evidence = reloaded.evidence.get("RED").unwrap();
    assert_eq!(evidence["verified"], json!(false));
    assert!(evidence["validation_errors"].is_array());
}

#[tokio::test]
async fn well_formed_evidence_is_accepted() {
    let mut registry = WorkflowRegistry::empty();
    registry.insert(schema_reject_workflow()).unwrap();
    let (engine, _dir, _pane) = engine_with(registry);

    let state = engine.start("schema-demo", json!({})).await.unwrap();
    let outcome = engine
        .submit_evidence(
            &state.workflow_id,
            loom_engine::Submission {
                state: "RED".to_string(),
                result: "pass".to_string(),
                evidence: json!({ "note": "looks good" }),
                submitted_by: None,
            },
        )
        .await
        .unwrap();

    assert!(matches!(outcome, Outcome::Advanced { to, .. } if to == "GREEN"));
}
