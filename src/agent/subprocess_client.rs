//! Pi CLI subprocess client - calls pi in print mode

use crate::agent::InferenceError;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Client for executing Pi CLI as a subprocess
#[derive(Debug, Clone)]
pub struct PiSubprocessClient {
    /// Path to pi executable
    pi_path: String,

    /// Timeout for command execution in seconds
    timeout_secs: u64,
}

impl PiSubprocessClient {
    /// Create a new subprocess client
    ///
    /// # Arguments
    /// * `pi_path` - Path to pi executable (e.g., "pi", "/usr/local/bin/pi")
    /// * `timeout_secs` - Timeout for command execution in seconds
    pub fn new(pi_path: String, timeout_secs: u64) -> Self {
        Self {
            pi_path,
            timeout_secs,
        }
    }

    /// Get the pi executable path
    pub fn pi_path(&self) -> &str {
        &self.pi_path
    }

    /// Execute a prompt through pi CLI subprocess
    ///
    /// Calls `pi --mode text --print --no-session <prompt>` and captures stdout.
    /// The child is killed if the returned future is dropped.
    ///
    /// # Errors
    /// - `InferenceError::Unavailable` if pi cannot be spawned, exits with a
    ///   non-zero status, or prints invalid UTF-8
    /// - `InferenceError::Timeout` if the command exceeds its deadline
    pub async fn execute(&self, stage: &str, prompt: &str) -> Result<String, InferenceError> {
        debug!(
            "Spawning pi subprocess for {} with prompt length: {}",
            stage,
            prompt.len()
        );

        let result = timeout(
            Duration::from_secs(self.timeout_secs),
            Command::new(&self.pi_path)
                .args(["--mode", "text", "--print", "--no-session"])
                .arg(prompt)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| InferenceError::Timeout(self.timeout_secs))?;

        let output = result.map_err(|e| {
            InferenceError::Unavailable(format!("failed to execute {}: {}", self.pi_path, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let exit_code = output.status.code().unwrap_or(-1);
            warn!("pi exited with code {} during {}: {}", exit_code, stage, stderr.trim());
            return Err(InferenceError::Unavailable(format!(
                "pi exited with code {}: {}",
                exit_code,
                stderr.trim()
            )));
        }

        let content = String::from_utf8(output.stdout).map_err(|e| {
            InferenceError::Unavailable(format!("failed to decode pi output: {}", e))
        })?;

        debug!("pi returned {} bytes for {}", content.len(), stage);

        Ok(content)
    }
}
