//! Error taxonomy shared by the session controller and the dashboard poller.

use thiserror::Error;

use crate::{api::ApiError, camera::CameraError};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MonitorError {
    #[error("camera access was denied")]
    PermissionDenied,

    #[error("no camera device found")]
    DeviceNotFound,

    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("server rejected request: {0}")]
    ServerRejected(String),

    #[error("could not parse server response: {0}")]
    ParseFailure(String),

    #[error("{0}")]
    Other(String),
}

impl MonitorError {
    /// Text shown to the user when a session fails to start.
    pub fn user_message(&self) -> String {
        match self {
            MonitorError::PermissionDenied => {
                "Camera permission denied. Allow camera access and try again.".to_string()
            }
            MonitorError::DeviceNotFound => "No camera found on this device.".to_string(),
            MonitorError::NetworkFailure(_) => "Could not reach the monitoring server.".to_string(),
            MonitorError::ServerRejected(message) => message.clone(),
            MonitorError::ParseFailure(_) => "Unexpected response from the server.".to_string(),
            MonitorError::Other(message) => format!("Camera error: {message}"),
        }
    }
}

impl From<CameraError> for MonitorError {
    fn from(err: CameraError) -> Self {
        match err {
            CameraError::PermissionDenied => MonitorError::PermissionDenied,
            CameraError::DeviceNotFound => MonitorError::DeviceNotFound,
            other => MonitorError::Other(other.to_string()),
        }
    }
}

impl From<ApiError> for MonitorError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Request(message) => MonitorError::NetworkFailure(message),
            ApiError::Status { status, body } => {
                MonitorError::NetworkFailure(format!("HTTP {status}: {body}"))
            }
            ApiError::Decode(message) => MonitorError::ParseFailure(message),
        }
    }
}
