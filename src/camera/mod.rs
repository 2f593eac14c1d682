//! Camera acquisition and frame encoding.

mod directory;
pub mod frame;

pub use directory::ImageDirectoryCamera;
pub use frame::{encode_frame, EncodedFrame};

use std::path::PathBuf;

use async_trait::async_trait;
use image::DynamicImage;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CameraError {
    #[error("camera access denied")]
    PermissionDenied,

    #[error("camera device not found")]
    DeviceNotFound,

    #[error("frame capture failed: {0}")]
    Capture(String),

    #[error("frame encoding failed: {0}")]
    Encode(String),

    #[error("{0}")]
    Other(String),
}

/// Requested capture format. Devices may deliver other sizes; frames are
/// rescaled into `width × height` before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub width: u32,
    pub height: u32,
    pub audio: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            audio: false,
        }
    }
}

/// A grabbed frame, possibly still in its stored form.
///
/// Grabbing happens under the session lock, so streams hand back whatever is
/// cheapest and leave decoding to [`RawFrame::decode`] on a blocking worker.
#[derive(Debug, Clone)]
pub enum RawFrame {
    Image(DynamicImage),
    File(PathBuf),
}

impl RawFrame {
    /// Blocking: may read and decode a file.
    pub fn decode(self) -> Result<DynamicImage, CameraError> {
        match self {
            RawFrame::Image(image) => Ok(image),
            RawFrame::File(path) => image::open(&path)
                .map_err(|err| CameraError::Capture(format!("{}: {err}", path.display()))),
        }
    }
}

/// Something that can hand out an exclusive capture stream.
#[async_trait]
pub trait Camera: Send + Sync {
    async fn acquire(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<Box<dyn CameraStream>, CameraError>;
}

/// An open capture device. Dropping a stream without calling [`CameraStream::stop`]
/// leaks nothing, but owners are expected to stop it on every exit path.
pub trait CameraStream: Send {
    /// True once the device has delivered at least one frame.
    fn is_ready(&self) -> bool;

    /// Must not block: no file reads or decoding here.
    fn grab_frame(&mut self) -> Result<RawFrame, CameraError>;

    fn stop(&mut self);

    fn label(&self) -> &str;
}
