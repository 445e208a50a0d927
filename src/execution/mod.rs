//! Pipeline execution engine

pub mod context;
pub mod engine;
pub mod events;
pub mod executor;
pub mod retry;

pub use context::ExecutionContext;
pub use engine::PipelineCoordinator;
pub use events::{EventHandler, EventSink, PipelineEvent};
pub use executor::{StageRunner, StageSpec};
pub use retry::RetryPolicy;
