//! Stage runner - executes one stage against the inference service

use crate::{
    agent::{InferenceError, InferenceRequest, InferenceResponse},
    capability::{CapabilityKind, Toolbox},
    core::{
        config::PipelineConfig,
        shape::{decode, StageOutput},
        ErrorKind, StageError, StageName,
    },
    execution::{events::PipelineEvent, retry::RetryPolicy, ExecutionContext},
};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Everything needed to run one stage
#[derive(Debug, Clone)]
pub struct StageSpec {
    pub name: StageName,
    pub instructions: String,
    pub capabilities: Vec<CapabilityKind>,
    /// Deadline for one inference attempt
    pub timeout: Duration,
}

impl StageSpec {
    /// Build a stage spec from configuration
    pub fn from_config(config: &PipelineConfig, name: StageName) -> Option<Self> {
        let stage = config.stage(name)?;
        Some(Self {
            name,
            instructions: stage.instructions.clone(),
            capabilities: stage.capabilities.clone(),
            timeout: config.stage_timeout(name),
        })
    }
}

/// Executes stages: inference call, tool rounds, retries and decoding
pub struct StageRunner {
    ctx: ExecutionContext,
    retry: RetryPolicy,
    max_tool_rounds: usize,
}

impl StageRunner {
    pub fn new(ctx: ExecutionContext, retry: RetryPolicy, max_tool_rounds: usize) -> Self {
        Self {
            ctx,
            retry,
            max_tool_rounds,
        }
    }

    /// Run a stage and decode its output into `T`
    pub async fn run<T: StageOutput>(&self, spec: &StageSpec, input: String) -> Result<T, StageError> {
        info!("Running stage: {}", spec.name);
        debug!("Input for {} is {} bytes", spec.name, input.len());

        let mut request = InferenceRequest {
            stage: spec.name,
            instructions: spec.instructions.clone(),
            input,
            capabilities: Toolbox::describe(&spec.capabilities),
            expected_shape: T::SHAPE,
            tool_results: Vec::new(),
        };

        let mut rounds = 0;
        loop {
            let response = self.invoke_with_retry(spec, &request).await?;

            if !response.has_tool_calls() {
                debug!("Output for {}: {}", spec.name, response.content);
                return decode::<T>(&response.content);
            }

            if rounds == self.max_tool_rounds {
                let raw = serde_json::to_string(&response.tool_calls).unwrap_or_default();
                return Err(StageError::schema_mismatch(
                    format!(
                        "no output after {} tool rounds; stage kept calling tools",
                        self.max_tool_rounds
                    ),
                    raw,
                ));
            }
            rounds += 1;

            for call in &response.tool_calls {
                let result = self
                    .ctx
                    .toolbox
                    .dispatch(&spec.capabilities, call)
                    .await
                    .map_err(|e| StageError::new(ErrorKind::CapabilityUnavailable, e.to_string()))?;

                self.ctx
                    .events
                    .emit(PipelineEvent::ToolInvoked {
                        stage: spec.name,
                        capability: call.name.clone(),
                        ok: result.ok,
                    })
                    .await;
                request.tool_results.push(result);
            }
        }
    }

    /// One inference call, retried on transient failure
    ///
    /// Each error kind has its own attempt budget, so an unavailable service
    /// followed by a deadline overrun counts once against each.
    async fn invoke_with_retry(
        &self,
        spec: &StageSpec,
        request: &InferenceRequest,
    ) -> Result<InferenceResponse, StageError> {
        let mut failures: HashMap<ErrorKind, usize> = HashMap::new();
        let mut attempt = 1;
        loop {
            let error = match timeout(spec.timeout, self.ctx.inference.invoke(request)).await {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(InferenceError::Unavailable(msg))) => {
                    StageError::new(ErrorKind::InferenceUnavailable, msg)
                }
                Ok(Err(InferenceError::Timeout(secs))) => StageError::new(
                    ErrorKind::Timeout,
                    format!("inference call timed out after {} seconds", secs),
                ),
                Err(_) => StageError::new(
                    ErrorKind::Timeout,
                    format!("attempt exceeded {} seconds", spec.timeout.as_secs()),
                ),
            };

            let seen = failures.entry(error.kind).or_insert(0);
            *seen += 1;
            if !self.retry.should_retry(error.kind, *seen) {
                warn!(
                    "Stage {} giving up after {} attempt(s): {}",
                    spec.name, attempt, error
                );
                return Err(StageError {
                    message: format!("{} (after {} attempt(s))", error.message, attempt),
                    ..error
                });
            }

            let delay = self.retry.delay(attempt);
            warn!(
                "Stage {} attempt {} failed ({}), retrying in {:?}",
                spec.name, attempt, error, delay
            );
            attempt += 1;
            self.ctx
                .events
                .emit(PipelineEvent::StageRetrying {
                    stage: spec.name,
                    attempt,
                    kind: error.kind,
                    delay_ms: delay.as_millis() as u64,
                })
                .await;
            tokio::time::sleep(delay).await;
        }
    }
}
