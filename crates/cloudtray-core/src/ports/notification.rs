//! Notification service port (driven/secondary port)
//!
//! This module defines the interface for showing transient feedback to the
//! user: the toast under the drop area after an upload, or an error message
//! when a file fails.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because notification delivery is adapter-specific.
//! - Notifications are fire-and-forget and dismiss themselves; the use cases
//!   keep the current message in their view state and clear it on a timer.
//! - Every `notify` call is one toast.

use serde::{Deserialize, Serialize};

/// Visual category of a feedback message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
            NotificationKind::Info => "info",
        };
        write!(f, "{}", s)
    }
}

/// A transient feedback message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, message)
    }

    pub fn is_error(&self) -> bool {
        self.kind == NotificationKind::Error
    }
}

/// Port trait for user-visible feedback
///
/// Implementations should swallow presentation failures where possible;
/// the use cases only log an error returned from here.
#[async_trait::async_trait]
pub trait INotificationService: Send + Sync {
    /// Shows one transient message
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()>;
}
