//! Referential consistency checks for the merged model

use crate::core::schema::{RequirementModel, SequenceDiagram, SequenceStep, UseCaseDiagram, UserStory};
use crate::core::stage::StageError;
use std::collections::HashSet;

/// Verify a merged model against the user stories it was built from
///
/// Returns the first offending reference as a `ConsistencyViolation`.
pub fn check_model(model: &RequirementModel, parsed: &[UserStory]) -> Result<(), StageError> {
    check_stories(&model.user_stories, parsed)?;
    check_use_cases(&model.use_case_diagram)?;
    for diagram in &model.sequence_diagrams {
        check_participants(diagram)?;
    }
    Ok(())
}

/// Merged stories must reproduce the parsed ones
///
/// Order matters for stories and basic flows; alternative flows form a set.
pub fn check_stories(merged: &[UserStory], parsed: &[UserStory]) -> Result<(), StageError> {
    if merged.len() != parsed.len() {
        return Err(StageError::consistency(format!(
            "merged model has {} user stories, the parser produced {}",
            merged.len(),
            parsed.len()
        )));
    }

    for (merged, parsed) in merged.iter().zip(parsed) {
        if let Some(field) = diverging_field(merged, parsed) {
            return Err(StageError::consistency(format!(
                "user story '{}' diverges from the parsed requirements in {}",
                parsed.title, field
            )));
        }
    }
    Ok(())
}

fn diverging_field(merged: &UserStory, parsed: &UserStory) -> Option<&'static str> {
    if merged.title != parsed.title {
        return Some("title");
    }
    if merged.actor != parsed.actor {
        return Some("actor");
    }
    if merged.basic_flow != parsed.basic_flow {
        return Some("basic_flow");
    }
    let same_flows = merged.alternative_flows.len() == parsed.alternative_flows.len()
        && parsed
            .alternative_flows
            .iter()
            .all(|flow| merged.alternative_flows.contains(flow));
    if !same_flows {
        return Some("alternative_flows");
    }
    None
}

/// Every relationship must reference a declared actor and use case
pub fn check_use_cases(diagram: &UseCaseDiagram) -> Result<(), StageError> {
    let actors: HashSet<&str> = diagram.actors.iter().map(String::as_str).collect();
    let use_cases: HashSet<&str> = diagram.use_cases.iter().map(String::as_str).collect();

    for rel in &diagram.relationships {
        if !actors.contains(rel.actor.as_str()) {
            return Err(StageError::consistency(format!(
                "relationship ({}, {}) references unknown actor '{}'",
                rel.actor, rel.use_case, rel.actor
            )));
        }
        if !use_cases.contains(rel.use_case.as_str()) {
            return Err(StageError::consistency(format!(
                "relationship ({}, {}) references unknown use case '{}'",
                rel.actor, rel.use_case, rel.use_case
            )));
        }
    }
    Ok(())
}

/// Every message must travel between declared participants
pub fn check_participants(diagram: &SequenceDiagram) -> Result<(), StageError> {
    let participants: HashSet<&str> = diagram.participants.iter().map(String::as_str).collect();

    let steps = diagram
        .steps
        .iter()
        .chain(diagram.alt_flows.iter().flat_map(|alt| alt.steps.iter()));

    for step in steps {
        if let Some(unknown) = unknown_endpoint(step, &participants) {
            return Err(StageError::consistency(format!(
                "sequence diagram '{}' step {} references unknown participant '{}'",
                diagram.title, step.seq, unknown
            )));
        }
    }
    Ok(())
}

fn unknown_endpoint<'a>(step: &'a SequenceStep, participants: &HashSet<&str>) -> Option<&'a str> {
    [step.from.as_str(), step.to.as_str()]
        .into_iter()
        .find(|name| !participants.contains(name))
}
