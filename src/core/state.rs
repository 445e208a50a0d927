//! Run state machine

use crate::core::stage::{ErrorKind, StageName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Phase of a pipeline run
///
/// `Idle -> ParsingRequirements -> ModelingConcurrent -> Merging -> Completed`,
/// with `Failed` reachable from every non-terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    Idle,
    ParsingRequirements,
    ModelingConcurrent,
    Merging,
    Completed,
    Failed { stage: StageName, kind: ErrorKind },
}

impl RunPhase {
    /// Check if the phase is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Completed | RunPhase::Failed { .. })
    }

    /// Whether `next` is a legal successor of this phase
    pub fn can_transition_to(&self, next: &RunPhase) -> bool {
        match (self, next) {
            (RunPhase::Idle, RunPhase::ParsingRequirements)
            | (RunPhase::ParsingRequirements, RunPhase::ModelingConcurrent)
            | (RunPhase::ModelingConcurrent, RunPhase::Merging)
            | (RunPhase::Merging, RunPhase::Completed) => true,
            (current, RunPhase::Failed { .. }) => !current.is_terminal(),
            _ => false,
        }
    }

    /// Stage whose work this phase is waiting on, if any
    ///
    /// `ModelingConcurrent` runs two stages; the use-case modeler is reported
    /// for it when the whole run is cut short.
    pub fn active_stage(&self) -> Option<StageName> {
        match self {
            RunPhase::ParsingRequirements => Some(StageName::RequirementParser),
            RunPhase::ModelingConcurrent => Some(StageName::UseCaseModeler),
            RunPhase::Merging => Some(StageName::WorkflowOrchestrator),
            RunPhase::Failed { stage, .. } => Some(*stage),
            RunPhase::Idle | RunPhase::Completed => None,
        }
    }
}

/// Error for an illegal phase change
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("illegal transition from {from:?} to {to:?}")]
pub struct InvalidTransition {
    pub from: RunPhase,
    pub to: RunPhase,
}

/// State of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    /// Unique run ID
    pub run_id: Uuid,

    /// Current phase
    pub phase: RunPhase,

    /// When the run left `Idle`
    pub started_at: Option<DateTime<Utc>>,

    /// When the run reached a terminal phase
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            phase: RunPhase::Idle,
            started_at: None,
            finished_at: None,
        }
    }

    /// Move to the next phase
    pub fn advance(&mut self, next: RunPhase) -> Result<(), InvalidTransition> {
        if !self.phase.can_transition_to(&next) {
            return Err(InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        if self.phase == RunPhase::Idle {
            self.started_at = Some(Utc::now());
        }
        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        self.phase = next;
        Ok(())
    }

    /// Mark the run as failed; a no-op once terminal
    pub fn fail(&mut self, stage: StageName, kind: ErrorKind) {
        let _ = self.advance(RunPhase::Failed { stage, kind });
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}
