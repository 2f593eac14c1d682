//! Pure rendering of a [`DashboardSnapshot`] into what the dashboard shows.

use std::fmt;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::models::{ActiveAlert, DashboardSnapshot, RecentEntry, Severity};

pub const EMPTY_ENTRIES_MESSAGE: &str = "No entries yet";
pub const EMPTY_ALERTS_MESSAGE: &str = "No active alerts - all clear!";

/// Icon for an alert severity; unknown severities fall back to the medium icon.
pub fn severity_icon(severity: &str) -> &'static str {
    match Severity::parse(severity) {
        Severity::Critical | Severity::High => "exclamation-triangle",
        Severity::Medium => "exclamation-circle",
        Severity::Low => "info-circle",
        Severity::Other(_) => "exclamation-circle",
    }
}

/// Badge colour for an alert severity; unknown severities are grey.
pub fn severity_badge(severity: &str) -> &'static str {
    match Severity::parse(severity) {
        Severity::Critical | Severity::High => "red",
        Severity::Medium => "yellow",
        Severity::Low => "blue",
        Severity::Other(_) => "grey",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatCounters {
    pub total_students: u64,
    pub today_entries: u64,
    pub active_alerts: u64,
    pub monitoring_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRow {
    pub time: String,
    pub student: String,
    pub status: &'static str,
    pub confidence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum EntryTable {
    Rows(Vec<EntryRow>),
    /// Single explanatory row shown instead of an empty table.
    Empty(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertItem {
    pub id: i64,
    pub message: String,
    pub severity: String,
    pub icon: &'static str,
    pub color: &'static str,
    pub created: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum AlertList {
    Items(Vec<AlertItem>),
    Empty(&'static str),
}

impl AlertList {
    pub fn items(&self) -> &[AlertItem] {
        match self {
            AlertList::Items(items) => items,
            AlertList::Empty(_) => &[],
        }
    }
}

/// Everything derived from one snapshot; replaced wholesale on each successful poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedDashboard {
    pub stats: StatCounters,
    pub entries: EntryTable,
    pub alerts: AlertList,
    pub rendered_at: DateTime<Utc>,
}

pub fn render_snapshot(snapshot: &DashboardSnapshot) -> RenderedDashboard {
    let entries = if snapshot.recent_entries.is_empty() {
        EntryTable::Empty(EMPTY_ENTRIES_MESSAGE)
    } else {
        EntryTable::Rows(snapshot.recent_entries.iter().map(entry_row).collect())
    };

    let alerts = if snapshot.active_alerts.is_empty() {
        AlertList::Empty(EMPTY_ALERTS_MESSAGE)
    } else {
        AlertList::Items(snapshot.active_alerts.iter().map(alert_item).collect())
    };

    RenderedDashboard {
        stats: StatCounters {
            total_students: snapshot.total_students,
            today_entries: snapshot.today_entries,
            active_alerts: snapshot.active_alerts_count,
            monitoring_active: snapshot.monitoring_active,
        },
        entries,
        alerts,
        rendered_at: Utc::now(),
    }
}

fn entry_row(entry: &RecentEntry) -> EntryRow {
    EntryRow {
        time: local_clock(entry.entry_time_utc()),
        student: entry.student_name.clone(),
        status: if entry.is_recognized {
            "Recognized"
        } else {
            "Unknown"
        },
        confidence: entry
            .confidence_score
            .map(|score| format!("{:.1}%", score * 100.0))
            .unwrap_or_else(|| "N/A".to_string()),
    }
}

fn alert_item(alert: &ActiveAlert) -> AlertItem {
    let severity = alert.severity.as_str();
    AlertItem {
        id: alert.id,
        message: alert.message.clone(),
        severity: severity.to_string(),
        icon: severity_icon(severity),
        color: severity_badge(severity),
        created: alert
            .created_at_utc()
            .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string()),
    }
}

fn local_clock(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

impl fmt::Display for RenderedDashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = &self.stats;
        writeln!(
            f,
            "Students: {}  |  Entries today: {}  |  Active alerts: {}  |  Monitoring: {}",
            stats.total_students,
            stats.today_entries,
            stats.active_alerts,
            if stats.monitoring_active { "ON" } else { "OFF" }
        )?;

        writeln!(f, "\nRecent entries")?;
        match &self.entries {
            EntryTable::Empty(message) => writeln!(f, "  {message}")?,
            EntryTable::Rows(rows) => {
                for row in rows {
                    writeln!(
                        f,
                        "  {:<8}  {:<24}  {:<10}  {}",
                        row.time, row.student, row.status, row.confidence
                    )?;
                }
            }
        }

        writeln!(f, "\nActive alerts")?;
        match &self.alerts {
            AlertList::Empty(message) => writeln!(f, "  {message}")?,
            AlertList::Items(items) => {
                for item in items {
                    writeln!(
                        f,
                        "  #{:<4} [{}/{}] {}  ({})",
                        item.id, item.color, item.icon, item.message, item.created
                    )?;
                }
            }
        }
        Ok(())
    }
}
