//! Execution context threaded through every stage call

use crate::agent::InferenceService;
use crate::capability::Toolbox;
use crate::execution::events::EventSink;
use std::sync::Arc;

/// Handles a run needs: the inference client, capability adapters and the
/// event sink
///
/// Cloning is cheap; clones share the same client and adapters.
#[derive(Clone)]
pub struct ExecutionContext {
    pub inference: Arc<dyn InferenceService>,
    pub toolbox: Toolbox,
    pub events: EventSink,
}

impl ExecutionContext {
    pub fn new(inference: Arc<dyn InferenceService>, toolbox: Toolbox) -> Self {
        Self {
            inference,
            toolbox,
            events: EventSink::new(),
        }
    }
}
