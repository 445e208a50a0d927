//! Test: Concurrency - the two modelers overlap and fail fast

use crate::helpers::*;
use reqmodel::{ErrorKind, StageName};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Modeling takes as long as the slower modeler, not the sum of both
#[tokio::test]
async fn test_modelers_run_concurrently() {
    let inference = Arc::new(
        ScriptedInference::happy_path()
            .with_delay(StageName::UseCaseModeler, Duration::from_millis(400))
            .with_delay(StageName::ClassModeler, Duration::from_millis(300)),
    );

    let start = Instant::now();
    coordinator(inference).run(REQUIREMENTS).await.unwrap();
    let elapsed = start.elapsed();

    assert!(elapsed >= Duration::from_millis(400), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(650), "elapsed {:?}", elapsed);
}

/// A failing modeler cancels its sibling and the merge stage never runs
#[tokio::test]
async fn test_failure_cancels_sibling() {
    let inference = Arc::new(
        ScriptedInference::happy_path()
            .on(StageName::UseCaseModeler, vec![Scripted::Unavailable])
            .with_delay(StageName::ClassModeler, Duration::from_secs(5)),
    );

    let start = Instant::now();
    let failure = coordinator(inference.clone())
        .run(REQUIREMENTS)
        .await
        .unwrap_err();

    assert_eq!(failure.stage, StageName::UseCaseModeler);
    assert_eq!(failure.kind, ErrorKind::InferenceUnavailable);
    assert!(start.elapsed() < Duration::from_secs(2));

    // Give an aborted task the chance to finish if it were still running
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(inference.calls_for(StageName::ClassModeler) <= 1);
    assert!(!inference.completed(StageName::ClassModeler));
    assert_eq!(inference.calls_for(StageName::WorkflowOrchestrator), 0);
}

/// Dropping the run future stops both modelers
#[tokio::test]
async fn test_dropped_run_stops_stages() {
    let inference = Arc::new(
        ScriptedInference::happy_path()
            .with_delay(StageName::UseCaseModeler, Duration::from_secs(5))
            .with_delay(StageName::ClassModeler, Duration::from_secs(5)),
    );
    let coordinator = coordinator(inference.clone());

    let run = tokio::time::timeout(Duration::from_millis(100), coordinator.run(REQUIREMENTS)).await;
    assert!(run.is_err());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!inference.completed(StageName::UseCaseModeler));
    assert!(!inference.completed(StageName::ClassModeler));
}
