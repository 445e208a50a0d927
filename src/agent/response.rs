//! Inference response types

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

/// Error types for inference calls
#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    /// Transient failure reaching or running the service
    #[error("inference service unavailable: {0}")]
    Unavailable(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),
}

/// A capability invocation requested by the inference service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// Outcome of a tool call, fed back on the next round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub name: String,
    pub ok: bool,
    pub output: serde_json::Value,
}

impl ToolResult {
    pub fn ok(name: &str, output: serde_json::Value) -> Self {
        Self {
            name: name.to_string(),
            ok: true,
            output,
        }
    }

    pub fn error(name: &str, message: String) -> Self {
        Self {
            name: name.to_string(),
            ok: false,
            output: serde_json::Value::String(message),
        }
    }
}

/// Response from the inference service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResponse {
    /// The output payload (JSON text for structured stages)
    pub content: String,

    /// Tool calls to run before the stage can finish
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ToolCallEnvelope {
    tool_calls: Vec<ToolCall>,
}

impl InferenceResponse {
    /// Create a final response
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// Create a tool-call round
    pub fn with_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: String::new(),
            tool_calls,
        }
    }

    /// Interpret raw agent text
    ///
    /// The JSON document is extracted from the text. A document consisting
    /// only of `tool_calls` is a tool-call round; anything else is content.
    pub fn from_raw(text: &str) -> Self {
        let json = extract_json(text);
        match serde_json::from_str::<ToolCallEnvelope>(json) {
            Ok(envelope) if !envelope.tool_calls.is_empty() => {
                Self::with_tool_calls(envelope.tool_calls)
            }
            _ => Self::new(json),
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

fn fence_regex() -> &'static regex::Regex {
    static FENCE: OnceLock<regex::Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        regex::Regex::new(r"(?s)```(?:json)?[ \t]*\r?\n(.*?)```").expect("static regex")
    })
}

/// Locate the JSON document in agent output
///
/// Prefers the first fenced code block; otherwise takes the span from the
/// first opening bracket to the last closing one. Falls back to the trimmed
/// text so the decoder reports what was actually received.
pub fn extract_json(text: &str) -> &str {
    if let Some(body) = fence_regex().captures(text).and_then(|c| c.get(1)) {
        return body.as_str().trim();
    }

    let trimmed = text.trim();
    let start = trimmed.find(|c: char| c == '{' || c == '[');
    let end = trimmed.rfind(|c: char| c == '}' || c == ']');
    match (start, end) {
        (Some(s), Some(e)) if s < e => &trimmed[s..=e],
        _ => trimmed,
    }
}
