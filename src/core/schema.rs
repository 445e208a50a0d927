//! Requirements model entities
//!
//! These records are the contract between stages. Every value is produced by
//! decoding one stage's output and is never mutated afterwards.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier of a flow step, e.g. `"1"` or `"A1"`
///
/// Agents emit numeric steps as JSON integers, so both integers and strings
/// are accepted and normalized to text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for StepId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(StepId(n.to_string())),
            Raw::Text(s) if !s.trim().is_empty() => Ok(StepId(s)),
            Raw::Text(_) => Err(serde::de::Error::custom("step identifier must not be empty")),
        }
    }
}

/// Who performs a flow step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Entity {
    User,
    System,
}

/// One atomic action in a flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlowStep {
    pub step: StepId,
    pub entity: Entity,
    pub action: String,
}

/// Branch triggered by a named condition at any time during the basic flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlternativeFlow {
    pub condition: String,
    pub steps: Vec<FlowStep>,
}

/// A user story with its basic and alternative flows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserStory {
    /// "As a ... I want to ..."
    pub title: String,
    pub actor: String,
    pub basic_flow: Vec<FlowStep>,
    /// Order carries no meaning
    #[serde(default)]
    pub alternative_flows: Vec<AlternativeFlow>,
}

/// An actor participating in a use case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Relationship {
    pub actor: String,
    pub use_case: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UseCaseDiagram {
    pub actors: Vec<String>,
    pub use_cases: Vec<String>,
    pub relationships: Vec<Relationship>,
}

/// A message between two participants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SequenceStep {
    pub seq: i64,
    pub from: String,
    pub to: String,
    pub message: String,
}

/// Conditional message sequence attached to a diagram
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SequenceAltFlow {
    pub condition: String,
    pub steps: Vec<SequenceStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SequenceDiagram {
    pub title: String,
    pub participants: Vec<String>,
    pub steps: Vec<SequenceStep>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alt_flows: Vec<SequenceAltFlow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassAttribute {
    pub name: String,
    #[serde(rename = "type")]
    pub attr_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassMethod {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<String>,
}

/// A conceptual class; attribute and method names are unique within it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassDefinition {
    pub name: String,
    pub attributes: Vec<ClassAttribute>,
    pub methods: Vec<ClassMethod>,
}

/// Pre/postconditions attached to an operation context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OclContract {
    /// Operation, e.g. `DesignImage::upload()`
    pub context: String,
    pub preconditions: Vec<String>,
    pub postconditions: Vec<String>,
}

/// The terminal artifact of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequirementModel {
    pub user_stories: Vec<UserStory>,
    pub use_case_diagram: UseCaseDiagram,
    pub sequence_diagrams: Vec<SequenceDiagram>,
    pub class_diagram: Vec<ClassDefinition>,
    pub ocl_contracts: Vec<OclContract>,
}
