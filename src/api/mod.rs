//! Client side of the recognition server's HTTP/JSON interface.

mod http;

pub use http::HttpMonitorApi;

use async_trait::async_trait;

use crate::models::{AnalyzeResponse, CommandReply, DashboardStatsResponse, MonitoringStatus};

/// Errors from the HTTP layer, flattened to strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request itself failed (connect, DNS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The server answered with a non-2xx status code.
    #[error("server error ({status}): {body}")]
    Status { status: u16, body: String },

    /// The body was not the JSON shape we expected.
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Request(err.to_string())
        }
    }
}

/// The recognition server as seen by the monitor. Every call is a single
/// request with no retry; callers decide how failures surface.
#[async_trait]
pub trait MonitorApi: Send + Sync {
    async fn start_monitoring(&self) -> Result<CommandReply, ApiError>;

    async fn stop_monitoring(&self) -> Result<CommandReply, ApiError>;

    /// Submit one base64 JPEG frame for face recognition.
    async fn analyze_frame(&self, frame_b64: &str) -> Result<AnalyzeResponse, ApiError>;

    async fn dashboard_stats(&self) -> Result<DashboardStatsResponse, ApiError>;

    async fn monitoring_status(&self) -> Result<MonitoringStatus, ApiError>;

    async fn resolve_alert(&self, alert_id: i64) -> Result<CommandReply, ApiError>;

    async fn stop_alarm(&self) -> Result<CommandReply, ApiError>;

    async fn clear_all_data(&self) -> Result<CommandReply, ApiError>;

    /// Delete alerts that were already resolved.
    async fn clear_alerts(&self) -> Result<CommandReply, ApiError>;

    async fn system_reset(&self) -> Result<CommandReply, ApiError>;
}
