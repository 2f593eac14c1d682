use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::camera::CameraStream;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    #[default]
    Idle,
    Starting,
    Live,
    /// Held only while resources are being released; `stop()` never returns in this state.
    Stopping,
}

/// Read-only view of the session handed to callers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub generation: u64,
    pub session_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub device: Option<String>,
    pub preview_visible: bool,
    pub capture_active: bool,
    pub in_flight: usize,
}

/// The monitoring session. Owns the camera stream and the capture ticker;
/// both are `Some` only while the session is starting or live.
#[derive(Default)]
pub struct SessionState {
    pub status: SessionStatus,
    /// Bumped on every start attempt so late work can tell it belongs to an old session.
    pub generation: u64,
    pub session_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub preview_visible: bool,
    stream: Option<Box<dyn CameraStream>>,
    cancel_token: Option<CancellationToken>,
    ticker: Option<JoinHandle<()>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter `Starting` for a fresh session; returns its generation and cancellation scope.
    pub fn begin_start(&mut self) -> (u64, CancellationToken) {
        let token = CancellationToken::new();
        self.generation = self.generation.wrapping_add(1);
        self.status = SessionStatus::Starting;
        self.session_id = Some(Uuid::new_v4().to_string());
        self.started_at = None;
        self.preview_visible = false;
        self.cancel_token = Some(token.clone());
        (self.generation, token)
    }

    pub fn is_current(&self, generation: u64, status: SessionStatus) -> bool {
        self.generation == generation && self.status == status
    }

    /// Bind the acquired stream and show the preview.
    pub fn attach_stream(&mut self, stream: Box<dyn CameraStream>) {
        self.stream = Some(stream);
        self.preview_visible = true;
    }

    pub fn go_live(&mut self, ticker: JoinHandle<()>, started_at: DateTime<Utc>) {
        self.status = SessionStatus::Live;
        self.started_at = Some(started_at);
        self.ticker = Some(ticker);
    }

    pub fn stream_mut(&mut self) -> Option<&mut Box<dyn CameraStream>> {
        self.stream.as_mut()
    }

    pub fn cancel_token(&self) -> Option<CancellationToken> {
        self.cancel_token.clone()
    }

    #[cfg(test)]
    pub(crate) fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    #[cfg(test)]
    pub(crate) fn has_ticker(&self) -> bool {
        self.ticker.is_some()
    }

    /// Tear down everything the session owns and return to `Idle`.
    /// Safe to call from any state.
    pub fn release(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
        }
        self.preview_visible = false;
        self.status = SessionStatus::Idle;
        self.session_id = None;
        self.started_at = None;
    }

    pub fn snapshot(&self, in_flight: usize) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            generation: self.generation,
            session_id: self.session_id.clone(),
            started_at: self.started_at,
            device: self.stream.as_ref().map(|s| s.label().to_string()),
            preview_visible: self.preview_visible,
            capture_active: self.ticker.is_some(),
            in_flight,
        }
    }
}
