use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::{ApiError, MonitorApi};
use crate::models::{
    AnalyzeRequest, AnalyzeResponse, CommandReply, DashboardStatsResponse, MonitoringStatus,
};

/// [`MonitorApi`] over plain JSON-over-HTTP using [`reqwest`].
pub struct HttpMonitorApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMonitorApi {
    /// * `base_url` - server root, e.g. `http://127.0.0.1:5000`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.client.post(self.url(path)).send().await?;
        Self::parse_response(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.client.get(self.url(path)).send().await?;
        Self::parse_response(response).await
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode(err.to_string()))
    }
}

#[async_trait]
impl MonitorApi for HttpMonitorApi {
    async fn start_monitoring(&self) -> Result<CommandReply, ApiError> {
        self.post_empty("/start_monitoring").await
    }

    async fn stop_monitoring(&self) -> Result<CommandReply, ApiError> {
        self.post_empty("/stop_monitoring").await
    }

    async fn analyze_frame(&self, frame_b64: &str) -> Result<AnalyzeResponse, ApiError> {
        let response = self
            .client
            .post(self.url("/analyze_frame"))
            .json(&AnalyzeRequest { frame: frame_b64 })
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn dashboard_stats(&self) -> Result<DashboardStatsResponse, ApiError> {
        self.get("/dashboard_stats").await
    }

    async fn monitoring_status(&self) -> Result<MonitoringStatus, ApiError> {
        self.get("/monitoring_status").await
    }

    async fn resolve_alert(&self, alert_id: i64) -> Result<CommandReply, ApiError> {
        self.post_empty(&format!("/resolve_alert/{alert_id}")).await
    }

    async fn stop_alarm(&self) -> Result<CommandReply, ApiError> {
        self.post_empty("/stop_alarm").await
    }

    async fn clear_all_data(&self) -> Result<CommandReply, ApiError> {
        self.post_empty("/clear_all_data").await
    }

    async fn clear_alerts(&self) -> Result<CommandReply, ApiError> {
        self.post_empty("/clear_alerts").await
    }

    async fn system_reset(&self) -> Result<CommandReply, ApiError> {
        self.post_empty("/system_reset").await
    }
}
