use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ReplyStatus;

/// Alert severity. The server stores it as free text, so unknown values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Other(String),
}

impl From<String> for Severity {
    fn from(value: String) -> Self {
        Severity::parse(&value)
    }
}

impl From<Severity> for String {
    fn from(value: Severity) -> Self {
        value.as_str().to_string()
    }
}

impl Severity {
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "critical" => Severity::Critical,
            "high" => Severity::High,
            "medium" => Severity::Medium,
            "low" => Severity::Low,
            _ => Severity::Other(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Other(value) => value,
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Medium
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentEntry {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub student_id: Option<i64>,
    #[serde(default = "unknown_student")]
    pub student_name: String,
    #[serde(default)]
    pub entry_time: Option<String>,
    #[serde(default)]
    pub is_recognized: bool,
    #[serde(default)]
    pub confidence_score: Option<f64>,
}

impl RecentEntry {
    pub fn entry_time_utc(&self) -> Option<DateTime<Utc>> {
        self.entry_time.as_deref().and_then(parse_server_time)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveAlert {
    pub id: i64,
    #[serde(default)]
    pub alert_type: Option<String>,
    pub message: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub is_resolved: bool,
}

impl ActiveAlert {
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_server_time)
    }
}

/// Point-in-time copy of the server-aggregated dashboard state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    #[serde(default)]
    pub total_students: u64,
    #[serde(default)]
    pub today_entries: u64,
    #[serde(default)]
    pub active_alerts_count: u64,
    #[serde(default)]
    pub monitoring_active: bool,
    #[serde(default)]
    pub recent_entries: Vec<RecentEntry>,
    #[serde(default)]
    pub active_alerts: Vec<ActiveAlert>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStatsResponse {
    pub status: ReplyStatus,
    #[serde(default)]
    pub data: Option<DashboardSnapshot>,
    #[serde(default)]
    pub message: Option<String>,
}

impl DashboardStatsResponse {
    pub fn into_snapshot(self) -> Option<DashboardSnapshot> {
        if self.status.is_success() {
            self.data
        } else {
            None
        }
    }
}

fn unknown_student() -> String {
    "Unknown".to_string()
}

/// The server emits naive UTC ISO-8601 timestamps; RFC 3339 is accepted as well.
pub fn parse_server_time(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
