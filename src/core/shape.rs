//! Declared output shapes and strict decoding at the stage boundary
//!
//! Every stage output is decoded into a typed record immediately after the
//! inference call. Malformed JSON, missing or unknown fields, values outside
//! a closed enum and violated structural invariants all surface as a
//! `SchemaMismatch` carrying the raw payload.

use crate::core::schema::{
    ClassDefinition, OclContract, RequirementModel, SequenceDiagram, SequenceStep, UseCaseDiagram,
    UserStory,
};
use crate::core::stage::StageError;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

/// Output shape a stage is expected to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputShape {
    UserStories,
    UseCaseModel,
    ClassModel,
    RequirementModel,
}

impl OutputShape {
    /// JSON skeleton of the shape, used when composing prompts
    pub fn skeleton(&self) -> &'static str {
        match self {
            OutputShape::UserStories => USER_STORIES_SKELETON,
            OutputShape::UseCaseModel => USE_CASE_SKELETON,
            OutputShape::ClassModel => CLASS_SKELETON,
            OutputShape::RequirementModel => REQUIREMENT_MODEL_SKELETON,
        }
    }
}

const USER_STORIES_SKELETON: &str = r#"{"user_stories": [{"title": "As a ...", "actor": "", "basic_flow": [{"step": "1", "entity": "User|System", "action": ""}], "alternative_flows": [{"condition": "", "steps": [{"step": "A1", "entity": "User|System", "action": ""}]}]}]}"#;

const USE_CASE_SKELETON: &str = r#"{"use_case_diagram": {"actors": [""], "use_cases": [""], "relationships": [{"actor": "", "use_case": ""}]}, "sequence_diagrams": [{"title": "", "participants": [""], "steps": [{"seq": 1, "from": "", "to": "", "message": ""}], "alt_flows": [{"condition": "", "steps": [{"seq": 1, "from": "", "to": "", "message": ""}]}]}]}"#;

const CLASS_SKELETON: &str = r#"{"class_diagram": [{"name": "", "attributes": [{"name": "", "type": ""}], "methods": [{"name": "", "parameters": [""]}]}], "ocl_contracts": [{"context": "Class::operation()", "preconditions": [""], "postconditions": [""]}]}"#;

const REQUIREMENT_MODEL_SKELETON: &str = r#"{"user_stories": [...], "use_case_diagram": {...}, "sequence_diagrams": [...], "class_diagram": [...], "ocl_contracts": [...]}"#;

/// A typed stage output with a declared shape and structural checks
pub trait StageOutput: DeserializeOwned + Serialize + Send + 'static {
    const SHAPE: OutputShape;

    /// Check invariants that the type system cannot express
    fn check(&self) -> Result<(), String>;
}

/// Decode a raw JSON payload into a stage output
pub fn decode<T: StageOutput>(raw: &str) -> Result<T, StageError> {
    let value: T = serde_json::from_str(raw).map_err(|e| {
        StageError::schema_mismatch(format!("output is not a valid {:?}: {}", T::SHAPE, e), raw)
    })?;
    value
        .check()
        .map_err(|reason| StageError::schema_mismatch(reason, raw))?;
    Ok(value)
}

/// Output of the requirement parser
///
/// Accepts either a bare list or an object with a single `user_stories` key.
/// Always serializes as a bare list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UserStories(pub Vec<UserStory>);

impl<'de> Deserialize<'de> for UserStories {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct Wrapped {
            user_stories: Vec<UserStory>,
        }

        // Pick the form first so the inner decode error reaches the caller
        let stories = match serde_json::Value::deserialize(deserializer)? {
            value @ serde_json::Value::Array(_) => serde_json::from_value(value),
            value @ serde_json::Value::Object(_) => {
                serde_json::from_value::<Wrapped>(value).map(|w| w.user_stories)
            }
            _ => {
                return Err(de::Error::custom(
                    "expected a list of user stories or an object with `user_stories`",
                ))
            }
        };
        stories.map(UserStories).map_err(de::Error::custom)
    }
}

impl StageOutput for UserStories {
    const SHAPE: OutputShape = OutputShape::UserStories;

    fn check(&self) -> Result<(), String> {
        check_stories(&self.0)
    }
}

/// Output of the use-case modeler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UseCaseModel {
    pub use_case_diagram: UseCaseDiagram,
    pub sequence_diagrams: Vec<SequenceDiagram>,
}

impl StageOutput for UseCaseModel {
    const SHAPE: OutputShape = OutputShape::UseCaseModel;

    fn check(&self) -> Result<(), String> {
        check_sequences(&self.sequence_diagrams)
    }
}

/// Output of the class modeler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassModel {
    pub class_diagram: Vec<ClassDefinition>,
    pub ocl_contracts: Vec<OclContract>,
}

impl StageOutput for ClassModel {
    const SHAPE: OutputShape = OutputShape::ClassModel;

    fn check(&self) -> Result<(), String> {
        check_classes(&self.class_diagram)
    }
}

impl StageOutput for RequirementModel {
    const SHAPE: OutputShape = OutputShape::RequirementModel;

    fn check(&self) -> Result<(), String> {
        check_stories(&self.user_stories)?;
        check_sequences(&self.sequence_diagrams)?;
        check_classes(&self.class_diagram)
    }
}

/// Input threaded into the merge stage
#[derive(Debug, Clone, Serialize)]
pub struct MergeInput<'a> {
    pub user_stories: &'a [UserStory],
    pub use_case_model: &'a UseCaseModel,
    pub class_model: &'a ClassModel,
}

fn check_stories(stories: &[UserStory]) -> Result<(), String> {
    for story in stories {
        if story.basic_flow.is_empty() {
            return Err(format!("user story '{}' has an empty basic_flow", story.title));
        }
    }
    Ok(())
}

fn check_sequences(diagrams: &[SequenceDiagram]) -> Result<(), String> {
    for diagram in diagrams {
        check_increasing(&diagram.title, &diagram.steps)?;
        for alt in &diagram.alt_flows {
            check_increasing(&format!("{} / {}", diagram.title, alt.condition), &alt.steps)?;
        }
    }
    Ok(())
}

fn check_increasing(title: &str, steps: &[SequenceStep]) -> Result<(), String> {
    for pair in steps.windows(2) {
        if pair[0].seq >= pair[1].seq {
            return Err(format!(
                "sequence diagram '{}' is not strictly increasing: seq {} followed by {}",
                title, pair[0].seq, pair[1].seq
            ));
        }
    }
    Ok(())
}

fn check_classes(classes: &[ClassDefinition]) -> Result<(), String> {
    for class in classes {
        let mut attrs = HashSet::new();
        for attr in &class.attributes {
            if !attrs.insert(attr.name.as_str()) {
                return Err(format!(
                    "class '{}' declares attribute '{}' more than once",
                    class.name, attr.name
                ));
            }
        }

        let mut methods = HashSet::new();
        for method in &class.methods {
            if !methods.insert(method.name.as_str()) {
                return Err(format!(
                    "class '{}' declares method '{}' more than once",
                    class.name, method.name
                ));
            }
        }
    }
    Ok(())
}
