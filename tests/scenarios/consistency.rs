//! Test: Consistency - the merged model must agree with its inputs

use crate::helpers::*;
use reqmodel::{ErrorKind, PipelineFailure, StageName};
use serde_json::{json, Value};
use std::sync::Arc;

async fn run_with_merge(model: Value) -> PipelineFailure {
    let inference = Arc::new(ScriptedInference::happy_path().on(
        StageName::WorkflowOrchestrator,
        vec![reply(model.to_string())],
    ));
    coordinator(inference).run(REQUIREMENTS).await.unwrap_err()
}

/// A faithful copy of the fixtures passes
#[tokio::test]
async fn test_faithful_merge_accepted() {
    let inference = Arc::new(ScriptedInference::happy_path().on(
        StageName::WorkflowOrchestrator,
        vec![reply(merged_model().to_string())],
    ));
    assert!(coordinator(inference).run(REQUIREMENTS).await.is_ok());
}

/// A relationship to an undeclared actor is rejected
#[tokio::test]
async fn test_relationship_unknown_actor() {
    let mut model = merged_model();
    model["use_case_diagram"]["relationships"]
        .as_array_mut()
        .unwrap()
        .push(json!({"actor": "admin", "use_case": "Upload Design"}));

    let failure = run_with_merge(model).await;
    assert_eq!(failure.stage, StageName::WorkflowOrchestrator);
    assert_eq!(failure.kind, ErrorKind::ConsistencyViolation);
    assert!(failure.message.contains("admin"));
}

/// A relationship to an undeclared use case is rejected
#[tokio::test]
async fn test_relationship_unknown_use_case() {
    let mut model = merged_model();
    model["use_case_diagram"]["relationships"][0]["use_case"] = json!("Delete Design");

    let failure = run_with_merge(model).await;
    assert_eq!(failure.kind, ErrorKind::ConsistencyViolation);
    assert!(failure.message.contains("Delete Design"));
}

/// A sequence step between undeclared participants is rejected
#[tokio::test]
async fn test_sequence_unknown_participant() {
    let mut model = merged_model();
    model["sequence_diagrams"][0]["steps"][3]["to"] = json!("Storage");

    let failure = run_with_merge(model).await;
    assert_eq!(failure.kind, ErrorKind::ConsistencyViolation);
    assert!(failure.message.contains("Storage"));
}

/// Alternative flows of a sequence diagram are checked too
#[tokio::test]
async fn test_sequence_alt_flow_participant() {
    let mut model = merged_model();
    model["sequence_diagrams"][0]["alt_flows"][0]["steps"][0]["from"] = json!("Logger");

    let failure = run_with_merge(model).await;
    assert_eq!(failure.kind, ErrorKind::ConsistencyViolation);
    assert!(failure.message.contains("Logger"));
}

/// Dropped or rewritten user stories are rejected
#[tokio::test]
async fn test_user_stories_must_be_verbatim() {
    let mut dropped = merged_model();
    dropped["user_stories"].as_array_mut().unwrap().pop();
    let failure = run_with_merge(dropped).await;
    assert_eq!(failure.kind, ErrorKind::ConsistencyViolation);

    let mut paraphrased = merged_model();
    paraphrased["user_stories"][0]["basic_flow"][0]["action"] = json!("goes to the upload page");
    let failure = run_with_merge(paraphrased).await;
    assert_eq!(failure.kind, ErrorKind::ConsistencyViolation);
}

/// Alternative flows are a set: a merge that reorders them is accepted
#[tokio::test]
async fn test_alternative_flows_reordered() {
    let mut stories: Value = serde_json::from_str(STORIES).unwrap();
    stories[0]["alternative_flows"]
        .as_array_mut()
        .unwrap()
        .push(json!({
            "condition": "At any time, the file is too large",
            "steps": [{"step": "B1", "entity": "System", "action": "rejects the file"}]
        }));

    let mut model = merged_model();
    model["user_stories"] = stories.clone();
    model["user_stories"][0]["alternative_flows"]
        .as_array_mut()
        .unwrap()
        .reverse();

    let inference = Arc::new(
        ScriptedInference::happy_path()
            .on(StageName::RequirementParser, vec![reply(stories.to_string())])
            .on(StageName::WorkflowOrchestrator, vec![reply(model.to_string())]),
    );
    let merged = coordinator(inference).run(REQUIREMENTS).await.unwrap();
    assert_eq!(merged.user_stories[0].alternative_flows.len(), 2);
    assert_eq!(
        merged.user_stories[0].alternative_flows[0].condition,
        "At any time, the file is too large"
    );
}

/// A divergence names the story and the field
#[tokio::test]
async fn test_divergence_names_story_and_field() {
    let mut model = merged_model();
    model["user_stories"][1]["actor"] = json!("tester");

    let failure = run_with_merge(model).await;
    assert_eq!(failure.kind, ErrorKind::ConsistencyViolation);
    assert!(failure
        .message
        .contains("'As a developer, I want to download the generated code'"));
    assert!(failure.message.contains("actor"));
}
