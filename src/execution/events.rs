//! Events emitted while a pipeline runs

use crate::core::{ErrorKind, RunPhase, StageName};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Events that can occur during a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PipelineEvent {
    RunStarted {
        run_id: Uuid,
    },
    PhaseChanged {
        run_id: Uuid,
        phase: RunPhase,
    },
    StageStarted {
        stage: StageName,
    },
    StageRetrying {
        stage: StageName,
        /// The attempt about to start
        attempt: usize,
        kind: ErrorKind,
        delay_ms: u64,
    },
    ToolInvoked {
        stage: StageName,
        capability: String,
        ok: bool,
    },
    StageCompleted {
        stage: StageName,
    },
    StageFailed {
        stage: StageName,
        kind: ErrorKind,
        message: String,
    },
    RunFinished {
        run_id: Uuid,
        phase: RunPhase,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(PipelineEvent) + Send + Sync>;

/// Fan-out of events to registered handlers
#[derive(Clone, Default)]
pub struct EventSink {
    handlers: Arc<Mutex<Vec<EventHandler>>>,
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event handler
    pub async fn subscribe<F>(&self, handler: F)
    where
        F: Fn(PipelineEvent) + Send + Sync + 'static,
    {
        self.handlers.lock().await.push(Arc::new(handler));
    }

    /// Emit an event to all handlers
    pub async fn emit(&self, event: PipelineEvent) {
        let handlers = self.handlers.lock().await;
        for handler in handlers.iter() {
            handler(event.clone());
        }
    }
}
