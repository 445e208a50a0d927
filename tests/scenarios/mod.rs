//! Scenario-based tests for reqmodel

mod concurrency;
mod consistency;
