//! User notification capability

use crate::capability::CapabilityError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Severity of a notification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NotificationType::Info => "info",
            NotificationType::Success => "success",
            NotificationType::Warning => "warning",
            NotificationType::Error => "error",
        };
        f.write_str(name)
    }
}

/// Arguments of a `notification` tool call
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationRequest {
    pub user_id: String,
    pub message: String,
    #[serde(default)]
    pub notification_type: NotificationType,
}

/// Delivers notifications to users
///
/// Returns whether delivery succeeded. Callers never abort on `false`.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        user_id: &str,
        message: &str,
        notification_type: NotificationType,
    ) -> Result<bool, CapabilityError>;
}

/// Notifier that writes each notification to the log
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        user_id: &str,
        message: &str,
        notification_type: NotificationType,
    ) -> Result<bool, CapabilityError> {
        info!("Notify {}: [{}] {}", user_id, notification_type, message);
        Ok(true)
    }
}
