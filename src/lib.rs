//! reqmodel - turns natural-language requirements into a structured
//! requirements model through a four-stage inference pipeline

pub mod agent;
pub mod capability;
pub mod core;
pub mod execution;

// Re-export commonly used types
pub use agent::{
    AgentClientConfig, InferenceError, InferenceRequest, InferenceResponse, InferenceService,
    PiInferenceClient, ToolCall, ToolResult,
};
pub use capability::{CapabilityKind, DesignConverter, Notifier, Toolbox};
pub use core::config::PipelineConfig;
pub use core::{
    ErrorKind, PipelineFailure, RequirementModel, RunPhase, RunState, StageError, StageName,
    UserStory,
};
pub use execution::{ExecutionContext, PipelineCoordinator, PipelineEvent, RetryPolicy};
