//! External capabilities exposed to stages as callable tools

pub mod design_to_code;
pub mod notification;

use crate::agent::{ToolCall, ToolResult};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub use design_to_code::{
    ConversionResult, ConversionStatus, DesignConverter, SimulatedDesignConverter,
};
pub use notification::{LogNotifier, NotificationType, Notifier};

use design_to_code::DesignConversionRequest;
use notification::NotificationRequest;

/// Error types for capability adapters
#[derive(Debug, Clone, Error)]
pub enum CapabilityError {
    #[error("{capability} unavailable: {reason}")]
    Unavailable {
        capability: CapabilityKind,
        reason: String,
    },
}

/// The capabilities a stage can be granted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    DesignConversion,
    Notification,
}

impl CapabilityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityKind::DesignConversion => "design_conversion",
            CapabilityKind::Notification => "notification",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "design_conversion" => Some(CapabilityKind::DesignConversion),
            "notification" => Some(CapabilityKind::Notification),
            _ => None,
        }
    }

    /// Describe the tool for the inference service
    pub fn descriptor(&self) -> CapabilityDescriptor {
        match self {
            CapabilityKind::DesignConversion => CapabilityDescriptor {
                name: self.as_str(),
                description: "Convert a design image into style code. Returns status \
                              (success|warning|error), code, confidence_score and warnings.",
                arguments: r#"{"design_image_id": "", "preferences": {}}"#,
            },
            CapabilityKind::Notification => CapabilityDescriptor {
                name: self.as_str(),
                description: "Send a progress notification to a user. Returns whether it \
                              was delivered.",
                arguments: r#"{"user_id": "", "message": "", "notification_type": "info|success|warning|error"}"#,
            },
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tool description handed to the inference service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    /// JSON skeleton of the arguments
    pub arguments: &'static str,
}

/// The capability adapters available to a run
#[derive(Clone)]
pub struct Toolbox {
    design: Arc<dyn DesignConverter>,
    notifier: Arc<dyn Notifier>,
}

impl Toolbox {
    pub fn new(design: Arc<dyn DesignConverter>, notifier: Arc<dyn Notifier>) -> Self {
        Self { design, notifier }
    }

    /// Simulated converter and log notifier
    pub fn simulated() -> Self {
        Self::new(
            Arc::new(SimulatedDesignConverter::new()),
            Arc::new(LogNotifier),
        )
    }

    /// Descriptors for the granted capabilities
    pub fn describe(granted: &[CapabilityKind]) -> Vec<CapabilityDescriptor> {
        granted.iter().map(CapabilityKind::descriptor).collect()
    }

    /// Execute one tool call on behalf of a stage
    ///
    /// Calls to capabilities the stage was not granted, and calls with
    /// malformed arguments, are answered with an error result. Notification
    /// failures are logged and reported back. Only a failing design
    /// conversion is returned as an error.
    pub async fn dispatch(
        &self,
        granted: &[CapabilityKind],
        call: &ToolCall,
    ) -> Result<ToolResult, CapabilityError> {
        let kind = match CapabilityKind::from_name(&call.name) {
            Some(kind) if granted.contains(&kind) => kind,
            _ => {
                warn!("Refusing call to capability '{}' not granted to stage", call.name);
                return Ok(ToolResult::error(
                    &call.name,
                    format!("capability '{}' is not available to this stage", call.name),
                ));
            }
        };

        match kind {
            CapabilityKind::Notification => Ok(self.notify(call).await),
            CapabilityKind::DesignConversion => self.convert(call).await,
        }
    }

    async fn notify(&self, call: &ToolCall) -> ToolResult {
        let req: NotificationRequest = match serde_json::from_value(call.arguments.clone()) {
            Ok(req) => req,
            Err(e) => return ToolResult::error(&call.name, format!("invalid arguments: {}", e)),
        };

        match self
            .notifier
            .notify(&req.user_id, &req.message, req.notification_type)
            .await
        {
            Ok(true) => ToolResult::ok(&call.name, json!(true)),
            Ok(false) => {
                warn!("Notification to {} was not delivered", req.user_id);
                ToolResult {
                    name: call.name.clone(),
                    ok: false,
                    output: json!(false),
                }
            }
            Err(e) => {
                warn!("Notification to {} failed: {}", req.user_id, e);
                ToolResult::error(&call.name, e.to_string())
            }
        }
    }

    async fn convert(&self, call: &ToolCall) -> Result<ToolResult, CapabilityError> {
        let req: DesignConversionRequest = match serde_json::from_value(call.arguments.clone()) {
            Ok(req) => req,
            Err(e) => {
                return Ok(ToolResult::error(&call.name, format!("invalid arguments: {}", e)))
            }
        };

        let result = self.design.convert(&req.design_image_id, &req.preferences).await?;
        info!(
            "Design {} converted with status {:?} (confidence {})",
            req.design_image_id, result.status, result.confidence_score
        );

        let output = serde_json::to_value(&result).map_err(|e| CapabilityError::Unavailable {
            capability: CapabilityKind::DesignConversion,
            reason: e.to_string(),
        })?;
        Ok(ToolResult::ok(&call.name, output))
    }
}
