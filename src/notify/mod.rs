//! Transient user-facing notifications.

mod center;

pub use center::NotificationCenter;

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationSeverity {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub message: String,
    pub severity: NotificationSeverity,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub deadline: Instant,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: NotificationSeverity, ttl: Duration) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            message: message.into(),
            severity,
            created_at: Utc::now(),
            deadline: Instant::now() + ttl,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}

/// Anything that can show a notification. Implementations must not block.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, message: &str, severity: NotificationSeverity);
}

/// Mirrors notifications into the log.
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, message: &str, severity: NotificationSeverity) {
        match severity {
            NotificationSeverity::Success | NotificationSeverity::Info => {
                log::info!("[notice] {message}")
            }
            NotificationSeverity::Warning => log::warn!("[notice] {message}"),
            NotificationSeverity::Error => log::error!("[notice] {message}"),
        }
    }
}
