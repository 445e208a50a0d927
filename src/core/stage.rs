//! Stage identity and the pipeline error taxonomy

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The four stages of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageName {
    RequirementParser,
    UseCaseModeler,
    ClassModeler,
    WorkflowOrchestrator,
}

impl StageName {
    pub const ALL: [StageName; 4] = [
        StageName::RequirementParser,
        StageName::UseCaseModeler,
        StageName::ClassModeler,
        StageName::WorkflowOrchestrator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::RequirementParser => "RequirementParser",
            StageName::UseCaseModeler => "UseCaseModeler",
            StageName::ClassModeler => "ClassModeler",
            StageName::WorkflowOrchestrator => "WorkflowOrchestrator",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a stage failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Output does not conform to the expected shape
    SchemaMismatch,
    /// Transient failure of the inference service
    InferenceUnavailable,
    /// A stage attempt exceeded its deadline
    Timeout,
    /// The merged model references something it does not define
    ConsistencyViolation,
    /// A capability adapter whose result the stage needs has failed
    CapabilityUnavailable,
}

impl ErrorKind {
    /// Whether the stage runner may retry after this error
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::InferenceUnavailable | ErrorKind::Timeout)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::SchemaMismatch => "SchemaMismatch",
            ErrorKind::InferenceUnavailable => "InferenceUnavailable",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::ConsistencyViolation => "ConsistencyViolation",
            ErrorKind::CapabilityUnavailable => "CapabilityUnavailable",
        };
        f.write_str(name)
    }
}

/// Error raised inside a single stage
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct StageError {
    pub kind: ErrorKind,
    pub message: String,
    /// The payload that failed to decode, when there is one
    pub raw_payload: Option<String>,
}

impl StageError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            raw_payload: None,
        }
    }

    pub fn schema_mismatch(message: impl Into<String>, raw_payload: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::SchemaMismatch,
            message: message.into(),
            raw_payload: Some(raw_payload.into()),
        }
    }

    pub fn consistency(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConsistencyViolation, message)
    }

    /// Attach the stage that raised this error
    pub fn at(self, stage: StageName) -> PipelineFailure {
        PipelineFailure {
            stage,
            kind: self.kind,
            message: self.message,
            raw_payload: self.raw_payload,
        }
    }
}

/// The single terminal failure of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Failed({stage}, {kind}): {message}")]
pub struct PipelineFailure {
    pub stage: StageName,
    pub kind: ErrorKind,
    pub message: String,
    pub raw_payload: Option<String>,
}
