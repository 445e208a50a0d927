//! Pipeline coordinator - orchestrates the entire pipeline run

use crate::{
    core::{
        config::PipelineConfig,
        consistency,
        shape::MergeInput,
        ClassModel, ErrorKind, PipelineFailure, RequirementModel, RunPhase, RunState, StageError,
        StageName, StageOutput, UseCaseModel, UserStories, UserStory,
    },
    execution::{
        events::PipelineEvent,
        executor::{StageRunner, StageSpec},
        retry::RetryPolicy,
        ExecutionContext,
    },
};
use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Drives the four stages of a run
///
/// The requirement parser runs first. The use-case and class modelers then
/// run as two concurrent tasks over independent copies of the parsed
/// stories; the first failure cancels the sibling. The merge stage runs last
/// and its output is checked for consistency before it is returned.
pub struct PipelineCoordinator {
    runner: Arc<StageRunner>,
    ctx: ExecutionContext,
    parser: StageSpec,
    use_case: StageSpec,
    class: StageSpec,
    merge: StageSpec,
    run_timeout: Option<Duration>,
}

impl PipelineCoordinator {
    pub fn new(config: &PipelineConfig, ctx: ExecutionContext) -> anyhow::Result<Self> {
        config.validate()?;
        let spec = |name: StageName| {
            StageSpec::from_config(config, name)
                .with_context(|| format!("Missing stage definition: {}", name))
        };

        let runner = StageRunner::new(
            ctx.clone(),
            RetryPolicy::from(config.retry),
            config.max_tool_rounds,
        );

        Ok(Self {
            runner: Arc::new(runner),
            parser: spec(StageName::RequirementParser)?,
            use_case: spec(StageName::UseCaseModeler)?,
            class: spec(StageName::ClassModeler)?,
            merge: spec(StageName::WorkflowOrchestrator)?,
            run_timeout: config.run_timeout(),
            ctx,
        })
    }

    /// Add an event handler
    pub async fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(PipelineEvent) + Send + Sync + 'static,
    {
        self.ctx.events.subscribe(handler).await;
    }

    /// Turn requirements text into a requirements model
    ///
    /// Returns either a complete, consistent model or the single failure that
    /// stopped the run. Dropping the returned future cancels all in-flight
    /// stages.
    pub async fn run(&self, requirements: &str) -> Result<RequirementModel, PipelineFailure> {
        let mut state = RunState::new();
        let run_id = state.run_id;

        info!("Starting pipeline run {}", run_id);
        self.emit(PipelineEvent::RunStarted { run_id }).await;

        let outcome = match self.run_timeout {
            Some(limit) => {
                let timed = tokio::time::timeout(limit, self.drive(requirements, &mut state)).await;
                timed.unwrap_or_else(|_| {
                    let stage = state
                        .phase
                        .active_stage()
                        .unwrap_or(StageName::RequirementParser);
                    Err(StageError::new(
                        ErrorKind::Timeout,
                        format!("run exceeded {} seconds", limit.as_secs()),
                    )
                    .at(stage))
                })
            }
            None => self.drive(requirements, &mut state).await,
        };

        if let Err(failure) = &outcome {
            error!("Pipeline run {} failed: {}", run_id, failure);
            state.fail(failure.stage, failure.kind);
            self.emit(PipelineEvent::StageFailed {
                stage: failure.stage,
                kind: failure.kind,
                message: failure.message.clone(),
            })
            .await;
        }

        info!("Pipeline run {} finished: {:?}", run_id, state.phase);
        self.emit(PipelineEvent::RunFinished {
            run_id,
            phase: state.phase,
        })
        .await;

        outcome
    }

    async fn drive(
        &self,
        requirements: &str,
        state: &mut RunState,
    ) -> Result<RequirementModel, PipelineFailure> {
        self.enter(state, RunPhase::ParsingRequirements).await;
        self.emit(PipelineEvent::StageStarted {
            stage: StageName::RequirementParser,
        })
        .await;
        let stories: UserStories = self
            .runner
            .run(&self.parser, requirements.to_string())
            .await
            .map_err(|e| e.at(StageName::RequirementParser))?;
        info!("Parsed {} user stories", stories.0.len());
        self.stage_completed(StageName::RequirementParser).await;

        self.enter(state, RunPhase::ModelingConcurrent).await;
        let (use_case_model, class_model) = self.model_concurrently(&stories.0).await?;

        self.enter(state, RunPhase::Merging).await;
        self.emit(PipelineEvent::StageStarted {
            stage: StageName::WorkflowOrchestrator,
        })
        .await;
        let merge_input = serialize(
            &MergeInput {
                user_stories: &stories.0,
                use_case_model: &use_case_model,
                class_model: &class_model,
            },
            StageName::WorkflowOrchestrator,
        )?;
        let model: RequirementModel = self
            .runner
            .run(&self.merge, merge_input)
            .await
            .map_err(|e| e.at(StageName::WorkflowOrchestrator))?;
        consistency::check_model(&model, &stories.0)
            .map_err(|e| e.at(StageName::WorkflowOrchestrator))?;
        self.stage_completed(StageName::WorkflowOrchestrator).await;

        self.enter(state, RunPhase::Completed).await;
        Ok(model)
    }

    /// Run both modelers concurrently, failing on the first error
    async fn model_concurrently(
        &self,
        stories: &[UserStory],
    ) -> Result<(UseCaseModel, ClassModel), PipelineFailure> {
        // Each modeler gets its own serialized copy of the stories
        let use_case_input = serialize(stories, StageName::UseCaseModeler)?;
        let class_input = serialize(stories, StageName::ClassModeler)?;

        for stage in [StageName::UseCaseModeler, StageName::ClassModeler] {
            self.emit(PipelineEvent::StageStarted { stage }).await;
        }

        let mut use_case_task = StageTask::<UseCaseModel>::spawn(
            self.runner.clone(),
            self.use_case.clone(),
            use_case_input,
        );
        let mut class_task =
            StageTask::<ClassModel>::spawn(self.runner.clone(), self.class.clone(), class_input);

        let joined = tokio::try_join!(use_case_task.join(), class_task.join());
        let (use_case_model, class_model) = match joined {
            Ok(models) => models,
            Err(failure) => {
                warn!(
                    "{} failed, cancelling the other modeling stage",
                    failure.stage
                );
                use_case_task.abort();
                class_task.abort();
                return Err(failure);
            }
        };

        self.stage_completed(StageName::UseCaseModeler).await;
        self.stage_completed(StageName::ClassModeler).await;
        Ok((use_case_model, class_model))
    }

    async fn enter(&self, state: &mut RunState, phase: RunPhase) {
        if let Err(e) = state.advance(phase) {
            error!("Run {}: {}", state.run_id, e);
            return;
        }
        self.emit(PipelineEvent::PhaseChanged {
            run_id: state.run_id,
            phase,
        })
        .await;
    }

    async fn stage_completed(&self, stage: StageName) {
        info!("Stage {} completed", stage);
        self.emit(PipelineEvent::StageCompleted { stage }).await;
    }

    async fn emit(&self, event: PipelineEvent) {
        self.ctx.events.emit(event).await;
    }
}

/// Serialize upstream data for the next stage
fn serialize<T: Serialize + ?Sized>(
    value: &T,
    consumer: StageName,
) -> Result<String, PipelineFailure> {
    serde_json::to_string(value).map_err(|e| {
        StageError::new(
            ErrorKind::SchemaMismatch,
            format!("could not serialize input: {}", e),
        )
        .at(consumer)
    })
}

/// A stage running on its own task; aborted when dropped
struct StageTask<T> {
    stage: StageName,
    handle: JoinHandle<Result<T, StageError>>,
}

impl<T: StageOutput> StageTask<T> {
    fn spawn(runner: Arc<StageRunner>, spec: StageSpec, input: String) -> Self {
        let stage = spec.name;
        let handle = tokio::spawn(async move { runner.run::<T>(&spec, input).await });
        Self { stage, handle }
    }

    async fn join(&mut self) -> Result<T, PipelineFailure> {
        match (&mut self.handle).await {
            Ok(result) => result.map_err(|e| e.at(self.stage)),
            Err(e) if e.is_cancelled() => Err(StageError::new(
                ErrorKind::InferenceUnavailable,
                "stage task was cancelled",
            )
            .at(self.stage)),
            Err(e) => Err(StageError::new(
                ErrorKind::InferenceUnavailable,
                format!("stage task panicked: {}", e),
            )
            .at(self.stage)),
        }
    }

    fn abort(&self) {
        self.handle.abort();
    }
}

impl<T> Drop for StageTask<T> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
