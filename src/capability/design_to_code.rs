//! Design-image-to-code conversion capability

use crate::capability::CapabilityError;
use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::info;

/// Outcome reported by the conversion service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionStatus {
    Success,
    Warning,
    Error,
}

/// Result of one design conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub status: ConversionStatus,
    /// Generated code, embedded verbatim by the caller
    pub code: String,
    /// Between 0.0 and 1.0
    pub confidence_score: f64,
    pub warnings: Vec<String>,
}

/// Arguments of a `design_conversion` tool call
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DesignConversionRequest {
    pub design_image_id: String,
    #[serde(default)]
    pub preferences: Map<String, Value>,
}

/// Converts a design image into style code
///
/// Implementations must be idempotent per call; retries belong to the
/// implementation's own client.
#[async_trait]
pub trait DesignConverter: Send + Sync {
    async fn convert(
        &self,
        design_image_id: &str,
        preferences: &Map<String, Value>,
    ) -> Result<ConversionResult, CapabilityError>;
}

/// Stand-in converter that fabricates results with a random confidence score
#[derive(Debug, Clone)]
pub struct SimulatedDesignConverter {
    /// Probability of returning a low-confidence warning
    low_confidence_rate: f64,
    /// Simulated processing time
    latency: Duration,
}

impl Default for SimulatedDesignConverter {
    fn default() -> Self {
        Self {
            low_confidence_rate: 0.2,
            latency: Duration::from_secs(1),
        }
    }
}

impl SimulatedDesignConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_low_confidence_rate(mut self, rate: f64) -> Self {
        self.low_confidence_rate = rate.clamp(0.0, 1.0);
        self
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[async_trait]
impl DesignConverter for SimulatedDesignConverter {
    async fn convert(
        &self,
        design_image_id: &str,
        preferences: &Map<String, Value>,
    ) -> Result<ConversionResult, CapabilityError> {
        info!(
            "Converting design {} with preferences {}",
            design_image_id,
            serde_json::to_string(preferences).unwrap_or_default()
        );

        tokio::time::sleep(self.latency).await;

        let mut rng = rand::rng();
        if rng.random_bool(self.low_confidence_rate) {
            let confidence = round2(rng.random_range(0.70..0.89));
            return Ok(ConversionResult {
                status: ConversionStatus::Warning,
                code: format!("/* generated code (confidence: {}) */", confidence),
                confidence_score: confidence,
                warnings: vec![
                    "confidence below 90%, manual adjustment may be required".to_string(),
                ],
            });
        }

        let confidence = round2(rng.random_range(0.85..0.98));
        Ok(ConversionResult {
            status: ConversionStatus::Success,
            code: format!("/* high-quality generated code (confidence: {}) */", confidence),
            confidence_score: confidence,
            warnings: vec![],
        })
    }
}
