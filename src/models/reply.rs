use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::dashboard::parse_server_time;

/// `status` field carried by every server reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Success,
    Info,
    Error,
    Skipped,
    #[serde(other)]
    Unknown,
}

impl ReplyStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ReplyStatus::Success)
    }

    /// `start_monitoring` treats `info` ("already active") as an acknowledgement too.
    pub fn is_acknowledged(&self) -> bool {
        matches!(self, ReplyStatus::Success | ReplyStatus::Info)
    }
}

/// Reply shape shared by the command endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandReply {
    pub status: ReplyStatus,
    #[serde(default)]
    pub message: Option<String>,
}

impl CommandReply {
    pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.message.as_deref().unwrap_or(fallback)
    }
}

/// Reply of `GET /monitoring_status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringStatus {
    pub active: bool,
    /// Kept as sent: the server writes naive UTC ISO-8601.
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl MonitoringStatus {
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_deref().and_then(parse_server_time)
    }
}
