//! Stage configuration from YAML
//!
//! Stage instructions are configuration, not code. A default document with
//! all four stages ships with the crate; callers may load their own.

use crate::capability::CapabilityKind;
use crate::core::shape::OutputShape;
use crate::core::stage::StageName;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

const BUILTIN_STAGES: &str = include_str!("../../config/stages.yaml");

/// Top-level pipeline configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name
    pub name: String,

    /// Retry policy for transient stage failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Default deadline for one stage attempt (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,

    /// Deadline for a whole run (in seconds)
    #[serde(default)]
    pub run_timeout_secs: Option<u64>,

    /// Maximum tool-call rounds per stage
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,

    /// Stage definitions
    pub stages: Vec<StageConfig>,
}

/// One stage as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Which stage this configures
    pub name: StageName,

    /// Instructions handed to the inference service
    pub instructions: String,

    /// Capabilities the stage may call
    #[serde(default)]
    pub capabilities: Vec<CapabilityKind>,

    /// Declared output shape
    pub expected_output: OutputShape,

    /// Deadline for one attempt (overrides global)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Retry settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts for `InferenceUnavailable`, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Delay before the first retry; doubles on each further retry
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Attempts for `Timeout`, including the first
    #[serde(default = "default_timeout_attempts")]
    pub timeout_attempts: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            timeout_attempts: default_timeout_attempts(),
        }
    }
}

fn default_max_attempts() -> usize {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_timeout_attempts() -> usize {
    2
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_max_tool_rounds() -> usize {
    4
}

/// The shape the coordinator threads out of each stage
pub fn expected_shape(stage: StageName) -> OutputShape {
    match stage {
        StageName::RequirementParser => OutputShape::UserStories,
        StageName::UseCaseModeler => OutputShape::UseCaseModel,
        StageName::ClassModeler => OutputShape::ClassModel,
        StageName::WorkflowOrchestrator => OutputShape::RequirementModel,
    }
}

impl PipelineConfig {
    /// The stage definitions compiled into the crate
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_STAGES)
    }

    /// Load pipeline configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse pipeline configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the pipeline configuration
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 || self.retry.timeout_attempts == 0 {
            anyhow::bail!("Retry attempts must be at least 1");
        }

        let mut seen = HashSet::new();
        for stage in &self.stages {
            if !seen.insert(stage.name) {
                anyhow::bail!("Duplicate stage: {}", stage.name);
            }

            if stage.instructions.trim().is_empty() {
                anyhow::bail!("Stage '{}' has empty instructions", stage.name);
            }

            let shape = expected_shape(stage.name);
            if stage.expected_output != shape {
                anyhow::bail!(
                    "Stage '{}' must declare expected_output {:?}, found {:?}",
                    stage.name,
                    shape,
                    stage.expected_output
                );
            }

            let mut caps = HashSet::new();
            for cap in &stage.capabilities {
                if !caps.insert(cap) {
                    anyhow::bail!("Stage '{}' lists capability '{}' twice", stage.name, cap);
                }
            }
        }

        for name in StageName::ALL {
            if !seen.contains(&name) {
                anyhow::bail!("Missing stage definition: {}", name);
            }
        }

        Ok(())
    }

    /// Look up a stage definition
    pub fn stage(&self, name: StageName) -> Option<&StageConfig> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Deadline for one attempt of a stage
    pub fn stage_timeout(&self, name: StageName) -> Duration {
        let secs = self
            .stage(name)
            .and_then(|s| s.timeout_secs)
            .unwrap_or(self.default_timeout_secs);
        Duration::from_secs(secs)
    }

    /// Deadline for a whole run, if one is configured
    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs.map(Duration::from_secs)
    }
}
