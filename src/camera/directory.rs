use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;

use super::{Camera, CameraError, CameraStream, CaptureConstraints, RawFrame};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// A camera backed by a directory of still images, replayed in name order.
///
/// Lets the monitor run headless: point it at a folder a capture daemon writes
/// into, or at a fixed set of test pictures.
pub struct ImageDirectoryCamera {
    dir: PathBuf,
}

impl ImageDirectoryCamera {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl Camera for ImageDirectoryCamera {
    async fn acquire(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<Box<dyn CameraStream>, CameraError> {
        if constraints.audio {
            log_warn!("audio capture requested from an image directory; ignoring");
        }

        let dir = self.dir.clone();
        let stream = tokio::task::spawn_blocking(move || DirectoryStream::open(dir))
            .await
            .map_err(|err| CameraError::Other(format!("camera worker join failed: {err}")))??;

        log_info!(
            "camera acquired: {} ({} frames)",
            stream.label,
            stream.frames.len()
        );
        Ok(Box::new(stream))
    }
}

struct DirectoryStream {
    label: String,
    frames: Vec<PathBuf>,
    cursor: usize,
    delivered: u64,
    stopped: bool,
}

impl DirectoryStream {
    fn open(dir: PathBuf) -> Result<Self, CameraError> {
        let entries = std::fs::read_dir(&dir).map_err(map_io_error)?;

        let mut frames: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_image(path))
            .collect();
        frames.sort();

        if frames.is_empty() {
            return Err(CameraError::DeviceNotFound);
        }

        // Prime the device so readiness reflects a frame that actually decoded.
        // Runs on the blocking pool with the rest of `open`.
        RawFrame::File(frames[0].clone()).decode()?;

        Ok(Self {
            label: dir.display().to_string(),
            frames,
            cursor: 0,
            delivered: 1,
            stopped: false,
        })
    }
}

impl CameraStream for DirectoryStream {
    fn is_ready(&self) -> bool {
        !self.stopped && self.delivered > 0
    }

    fn grab_frame(&mut self) -> Result<RawFrame, CameraError> {
        if self.stopped {
            return Err(CameraError::Capture("stream stopped".into()));
        }

        let path = self.frames[self.cursor % self.frames.len()].clone();
        self.cursor = (self.cursor + 1) % self.frames.len();
        self.delivered += 1;
        Ok(RawFrame::File(path))
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            log_info!("camera released: {} ({} frames delivered)", self.label, self.delivered);
        }
    }

    fn label(&self) -> &str {
        &self.label
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "jpg" | "jpeg" | "png"))
        .unwrap_or(false)
}

fn map_io_error(err: std::io::Error) -> CameraError {
    match err.kind() {
        ErrorKind::NotFound => CameraError::DeviceNotFound,
        ErrorKind::PermissionDenied => CameraError::PermissionDenied,
        _ => CameraError::Other(err.to_string()),
    }
}
