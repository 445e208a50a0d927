//! Agent client configuration

/// Configuration for the inference client
#[derive(Debug, Clone)]
pub struct AgentClientConfig {
    /// Path to the pi executable
    ///
    /// If not provided, defaults to "pi" (assumes it's on PATH).
    pub endpoint: Option<String>,

    /// Client-side deadline for one call in seconds
    pub timeout_secs: u64,
}

impl Default for AgentClientConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 900,
        }
    }
}

impl AgentClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}
