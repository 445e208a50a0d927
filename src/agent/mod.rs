//! Inference service boundary

pub mod client;
pub mod prompt;
pub mod response;
pub mod subprocess_client;

use crate::capability::CapabilityDescriptor;
use crate::core::{OutputShape, StageName};
use async_trait::async_trait;
use serde::Serialize;

pub use client::AgentClientConfig;
pub use response::{InferenceError, InferenceResponse, ToolCall, ToolResult};
pub use subprocess_client::PiSubprocessClient;

/// One call to the inference service
#[derive(Debug, Clone, Serialize)]
pub struct InferenceRequest {
    /// Stage issuing the call
    pub stage: StageName,

    /// Stage instructions from configuration
    pub instructions: String,

    /// Serialized upstream data or raw requirements text
    pub input: String,

    /// Tools the stage may call
    pub capabilities: Vec<CapabilityDescriptor>,

    /// Shape the final output must have
    pub expected_shape: OutputShape,

    /// Results of tool calls from earlier rounds of this stage
    pub tool_results: Vec<ToolResult>,
}

/// Trait for inference backends - allows for different implementations
///
/// A single client may serve concurrent stages.
#[async_trait]
pub trait InferenceService: Send + Sync {
    async fn invoke(&self, request: &InferenceRequest) -> Result<InferenceResponse, InferenceError>;
}

/// Pi agent client that calls pi CLI as a subprocess
#[derive(Debug, Clone)]
pub struct PiInferenceClient {
    subprocess_client: PiSubprocessClient,
}

impl PiInferenceClient {
    /// Create a new Pi inference client
    ///
    /// The `config.endpoint` field is used as the path to the pi executable.
    /// If not provided, defaults to "pi" (assuming it's on PATH).
    pub fn new(config: AgentClientConfig) -> Self {
        let pi_path = config.endpoint.unwrap_or_else(|| "pi".to_string());
        Self {
            subprocess_client: PiSubprocessClient::new(pi_path, config.timeout_secs),
        }
    }
}

#[async_trait]
impl InferenceService for PiInferenceClient {
    async fn invoke(&self, request: &InferenceRequest) -> Result<InferenceResponse, InferenceError> {
        let prompt = prompt::compose(request);
        let raw = self
            .subprocess_client
            .execute(request.stage.as_str(), &prompt)
            .await?;
        Ok(InferenceResponse::from_raw(&raw))
    }
}
