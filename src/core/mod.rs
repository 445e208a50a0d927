//! Core domain models for the requirements pipeline
//!
//! This module defines the schema shared across stages, the declared output
//! shapes, stage identity and errors, and the run state machine.

pub mod config;
pub mod consistency;
pub mod schema;
pub mod shape;
pub mod stage;
pub mod state;

pub use schema::*;
pub use shape::{ClassModel, OutputShape, StageOutput, UseCaseModel, UserStories};
pub use stage::*;
pub use state::*;
