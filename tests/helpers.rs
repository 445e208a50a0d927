//! Test utility functions for reqmodel

#![allow(dead_code)]

use async_trait::async_trait;
use reqmodel::capability::{
    CapabilityError, CapabilityKind, ConversionResult, DesignConverter, NotificationType,
    Notifier, SimulatedDesignConverter, Toolbox,
};
use reqmodel::{
    ExecutionContext, InferenceError, InferenceRequest, InferenceResponse, InferenceService,
    PipelineConfig, PipelineCoordinator, PipelineEvent, StageName, ToolCall,
};
use serde_json::{json, Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted answer of the mock inference service
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Raw text, parsed the way the real client parses agent output
    Reply(String),
    /// A tool-call round
    Tools(Vec<ToolCall>),
    /// A transient failure
    Unavailable,
    /// Build the merged model from the merge stage's own input
    EchoMerge,
}

/// Mock inference service with a response queue per stage
///
/// The last entry of a queue repeats forever, so a single `Unavailable`
/// fails every attempt. Every request is recorded.
pub struct ScriptedInference {
    scripts: Mutex<HashMap<StageName, VecDeque<Scripted>>>,
    delays: HashMap<StageName, Duration>,
    requests: Mutex<Vec<InferenceRequest>>,
    completed: Mutex<Vec<StageName>>,
}

impl ScriptedInference {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            delays: HashMap::new(),
            requests: Mutex::new(Vec::new()),
            completed: Mutex::new(Vec::new()),
        }
    }

    /// Every stage answers with the designer fixtures
    pub fn happy_path() -> Self {
        Self::new()
            .on(StageName::RequirementParser, vec![reply(STORIES)])
            .on(StageName::UseCaseModeler, vec![reply(USE_CASE_MODEL)])
            .on(StageName::ClassModeler, vec![reply(CLASS_MODEL)])
            .on(StageName::WorkflowOrchestrator, vec![Scripted::EchoMerge])
    }

    /// Replace the script of one stage
    pub fn on(self, stage: StageName, script: Vec<Scripted>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(stage, script.into_iter().collect());
        self
    }

    /// Delay every call of one stage
    pub fn with_delay(mut self, stage: StageName, delay: Duration) -> Self {
        self.delays.insert(stage, delay);
        self
    }

    pub fn requests_for(&self, stage: StageName) -> Vec<InferenceRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.stage == stage)
            .cloned()
            .collect()
    }

    pub fn calls_for(&self, stage: StageName) -> usize {
        self.requests_for(stage).len()
    }

    pub fn inputs_for(&self, stage: StageName) -> Vec<String> {
        self.requests_for(stage).into_iter().map(|r| r.input).collect()
    }

    /// Whether any call of this stage ran to completion
    pub fn completed(&self, stage: StageName) -> bool {
        self.completed.lock().unwrap().contains(&stage)
    }

    fn next(&self, stage: StageName) -> Option<Scripted> {
        let mut scripts = self.scripts.lock().unwrap();
        let queue = scripts.get_mut(&stage)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl InferenceService for ScriptedInference {
    async fn invoke(&self, request: &InferenceRequest) -> Result<InferenceResponse, InferenceError> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(delay) = self.delays.get(&request.stage) {
            tokio::time::sleep(*delay).await;
        }

        let result = match self.next(request.stage) {
            Some(Scripted::Reply(text)) => Ok(InferenceResponse::from_raw(&text)),
            Some(Scripted::Tools(calls)) => Ok(InferenceResponse::with_tool_calls(calls)),
            Some(Scripted::EchoMerge) => Ok(InferenceResponse::new(echo_merge(&request.input))),
            Some(Scripted::Unavailable) => {
                Err(InferenceError::Unavailable("503 service unavailable".to_string()))
            }
            None => Err(InferenceError::Unavailable(format!(
                "ScriptedInference: no script for {}",
                request.stage
            ))),
        };

        self.completed.lock().unwrap().push(request.stage);
        result
    }
}

pub fn reply(text: impl Into<String>) -> Scripted {
    Scripted::Reply(text.into())
}

pub fn notify_call(message: &str) -> ToolCall {
    ToolCall {
        name: CapabilityKind::Notification.as_str().to_string(),
        arguments: json!({"user_id": "modeling-team", "message": message, "notification_type": "info"}),
    }
}

pub fn design_call(design_image_id: &str) -> ToolCall {
    ToolCall {
        name: CapabilityKind::DesignConversion.as_str().to_string(),
        arguments: json!({"design_image_id": design_image_id, "preferences": {"framework": "css"}}),
    }
}

/// The model a faithful merge stage produces from its input
pub fn echo_merge(input: &str) -> String {
    let input: Value = serde_json::from_str(input).unwrap();
    json!({
        "user_stories": input["user_stories"],
        "use_case_diagram": input["use_case_model"]["use_case_diagram"],
        "sequence_diagrams": input["use_case_model"]["sequence_diagrams"],
        "class_diagram": input["class_model"]["class_diagram"],
        "ocl_contracts": input["class_model"]["ocl_contracts"],
    })
    .to_string()
}

/// Merged model of the designer fixtures, for tests that alter it
pub fn merged_model() -> Value {
    let use_case: Value = serde_json::from_str(USE_CASE_MODEL).unwrap();
    let class: Value = serde_json::from_str(CLASS_MODEL).unwrap();
    json!({
        "user_stories": serde_json::from_str::<Value>(STORIES).unwrap(),
        "use_case_diagram": use_case["use_case_diagram"],
        "sequence_diagrams": use_case["sequence_diagrams"],
        "class_diagram": class["class_diagram"],
        "ocl_contracts": class["ocl_contracts"],
    })
}

/// Notifier that records every notification and answers with a fixed outcome
pub struct RecordingNotifier {
    delivered: bool,
    sent: Mutex<Vec<(String, String, NotificationType)>>,
}

impl RecordingNotifier {
    pub fn delivering() -> Self {
        Self {
            delivered: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            delivered: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<(String, String, NotificationType)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        user_id: &str,
        message: &str,
        notification_type: NotificationType,
    ) -> Result<bool, CapabilityError> {
        self.sent
            .lock()
            .unwrap()
            .push((user_id.to_string(), message.to_string(), notification_type));
        Ok(self.delivered)
    }
}

/// Notifier whose delivery channel is down
pub struct UnreachableNotifier;

#[async_trait]
impl Notifier for UnreachableNotifier {
    async fn notify(
        &self,
        _user_id: &str,
        _message: &str,
        _notification_type: NotificationType,
    ) -> Result<bool, CapabilityError> {
        Err(CapabilityError::Unavailable {
            capability: CapabilityKind::Notification,
            reason: "notification gateway unreachable".to_string(),
        })
    }
}

/// Design converter whose service is down
pub struct OfflineConverter;

#[async_trait]
impl DesignConverter for OfflineConverter {
    async fn convert(
        &self,
        _design_image_id: &str,
        _preferences: &Map<String, Value>,
    ) -> Result<ConversionResult, CapabilityError> {
        Err(CapabilityError::Unavailable {
            capability: CapabilityKind::DesignConversion,
            reason: "conversion service offline".to_string(),
        })
    }
}

/// Built-in stages with millisecond retry delays
pub fn fast_config() -> PipelineConfig {
    let mut config = PipelineConfig::builtin().unwrap();
    config.retry.base_delay_ms = 1;
    config
}

/// Toolbox with an instant simulated converter
pub fn quiet_toolbox(notifier: Arc<RecordingNotifier>) -> Toolbox {
    Toolbox::new(
        Arc::new(SimulatedDesignConverter::new().with_latency(Duration::ZERO)),
        notifier,
    )
}

pub fn coordinator(inference: Arc<ScriptedInference>) -> PipelineCoordinator {
    coordinator_with(
        &fast_config(),
        inference,
        quiet_toolbox(Arc::new(RecordingNotifier::delivering())),
    )
}

pub fn coordinator_with(
    config: &PipelineConfig,
    inference: Arc<ScriptedInference>,
    toolbox: Toolbox,
) -> PipelineCoordinator {
    PipelineCoordinator::new(config, ExecutionContext::new(inference, toolbox)).unwrap()
}

/// Record every event the coordinator emits
pub async fn record_events(coordinator: &PipelineCoordinator) -> Arc<Mutex<Vec<PipelineEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    coordinator
        .add_event_handler(move |event| sink.lock().unwrap().push(event))
        .await;
    events
}

pub const REQUIREMENTS: &str = "\
As a designer, I want to upload a design so that it is converted into code.
1. The designer opens the upload page.
2. The system shows the file picker.
3. The designer selects a design image.
4. The system converts the design and shows the generated code.
At any time, if the upload fails, the system shows an error message.

As a developer, I want to download the generated code.
1. The developer clicks download.
2. The system sends the code archive.
";

pub const STORIES: &str = r#"[
  {
    "title": "As a designer, I want to upload a design so that it is converted into code",
    "actor": "designer",
    "basic_flow": [
      {"step": 1, "entity": "User", "action": "opens the upload page"},
      {"step": 2, "entity": "System", "action": "shows the file picker"},
      {"step": 3, "entity": "User", "action": "selects a design image"},
      {"step": 4, "entity": "System", "action": "converts the design and shows the generated code"}
    ],
    "alternative_flows": [
      {
        "condition": "At any time, the upload fails",
        "steps": [{"step": "A1", "entity": "System", "action": "shows an error message"}]
      }
    ]
  },
  {
    "title": "As a developer, I want to download the generated code",
    "actor": "developer",
    "basic_flow": [
      {"step": "1", "entity": "User", "action": "clicks download"},
      {"step": "2", "entity": "System", "action": "sends the code archive"}
    ],
    "alternative_flows": []
  }
]"#;

pub const USE_CASE_MODEL: &str = r#"{
  "use_case_diagram": {
    "actors": ["designer", "developer"],
    "use_cases": ["Upload Design", "Download Code"],
    "relationships": [
      {"actor": "designer", "use_case": "Upload Design"},
      {"actor": "developer", "use_case": "Download Code"}
    ]
  },
  "sequence_diagrams": [
    {
      "title": "Upload Design",
      "participants": ["designer", "UploadPage", "Converter"],
      "steps": [
        {"seq": 1, "from": "designer", "to": "UploadPage", "message": "open"},
        {"seq": 2, "from": "UploadPage", "to": "designer", "message": "show file picker"},
        {"seq": 3, "from": "designer", "to": "UploadPage", "message": "select image"},
        {"seq": 4, "from": "UploadPage", "to": "Converter", "message": "convert(image)"}
      ],
      "alt_flows": [
        {
          "condition": "upload fails",
          "steps": [{"seq": 1, "from": "UploadPage", "to": "designer", "message": "show error"}]
        }
      ]
    }
  ]
}"#;

pub const CLASS_MODEL: &str = r#"{
  "class_diagram": [
    {
      "name": "Design",
      "attributes": [{"name": "id", "type": "String"}, {"name": "image", "type": "Bytes"}],
      "methods": [{"name": "upload", "parameters": ["file"]}, {"name": "convert", "parameters": []}]
    },
    {
      "name": "CodeArchive",
      "attributes": [{"name": "content", "type": "String"}],
      "methods": [{"name": "download", "parameters": []}]
    }
  ],
  "ocl_contracts": [
    {
      "context": "Design::convert()",
      "preconditions": ["self.image <> null"],
      "postconditions": ["result.code <> ''"]
    }
  ]
}"#;
