use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use tokio::{sync::Mutex, task::JoinHandle, time::Instant};
use tokio_util::sync::CancellationToken;

use crate::{
    api::MonitorApi,
    camera::{encode_frame, RawFrame},
    models::Detection,
    notify::{NotificationSeverity, NotificationSink},
};

use super::{controller::CaptureConfig, state::SessionState, SessionStatus};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotLive,
    DeviceNotReady,
    /// The previous frame is still waiting on the server.
    InFlight,
    CaptureFailed,
}

/// Result of one capture tick.
#[derive(Debug)]
pub enum TickOutcome {
    Skipped(SkipReason),
    Submitted(SubmissionHandle),
}

/// The spawned analyze request of one tick.
#[derive(Debug)]
pub struct SubmissionHandle {
    handle: JoinHandle<()>,
}

impl SubmissionHandle {
    /// Wait until the request has completed (or been dropped with its session).
    pub async fn finished(self) {
        let _ = self.handle.await;
    }
}

/// Counts submissions that have not finished yet; decremented on drop so an
/// aborted task still releases its slot.
pub(super) struct InFlightGuard {
    counter: Arc<AtomicUsize>,
}

impl InFlightGuard {
    pub(super) fn acquire(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Everything a submission needs, detached from the controller so the task
/// does not keep the session borrowed.
pub(super) struct Submission {
    pub generation: u64,
    pub cancel_token: CancellationToken,
    pub state: Arc<Mutex<SessionState>>,
    pub api: Arc<dyn MonitorApi>,
    pub notifier: Arc<dyn NotificationSink>,
    pub config: CaptureConfig,
    pub _guard: InFlightGuard,
}

impl Submission {
    pub(super) fn spawn(self, frame: RawFrame) -> SubmissionHandle {
        SubmissionHandle {
            handle: tokio::spawn(self.run(frame)),
        }
    }

    async fn run(self, frame: RawFrame) {
        let started = Instant::now();
        let width = self.config.constraints.width;
        let height = self.config.constraints.height;
        let quality = self.config.jpeg_quality;

        let encoded = match tokio::task::spawn_blocking(move || {
            let image = frame.decode()?;
            encode_frame(&image, width, height, quality)
        })
        .await
        {
            Ok(Ok(encoded)) => encoded,
            Ok(Err(err)) => {
                log_warn!("frame dropped: {err}");
                return;
            }
            Err(err) => {
                log_error!("frame encoder worker failed: {err}");
                return;
            }
        };

        let response = tokio::select! {
            biased;
            _ = self.cancel_token.cancelled() => {
                log_debug!("analyze request abandoned: session {} ended", self.generation);
                return;
            }
            result = self.api.analyze_frame(&encoded.base64) => result,
        };

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                log_warn!("frame analysis failed: {err}");
                return;
            }
        };

        if self.cancel_token.is_cancelled() || !self.is_current().await {
            log_debug!("discarding analysis result for ended session {}", self.generation);
            return;
        }

        log_debug!(
            "frame analysed in {}ms ({} bytes, {} faces)",
            started.elapsed().as_millis(),
            encoded.jpeg_len,
            response.faces_detected
        );

        for detection in response.reportable() {
            let (message, severity) = detection_notice(detection);
            self.notifier.notify(&message, severity);
        }
    }

    async fn is_current(&self) -> bool {
        self.state
            .lock()
            .await
            .is_current(self.generation, SessionStatus::Live)
    }
}

/// Notification text for one detection. Unknown faces never carry a name.
pub fn detection_notice(detection: &Detection) -> (String, NotificationSeverity) {
    if detection.recognized {
        let name = detection.name.as_deref().unwrap_or("student");
        (
            format!(
                "Recognized: {} ({}%)",
                name,
                detection.confidence_percent()
            ),
            NotificationSeverity::Success,
        )
    } else {
        (
            "Unknown person detected!".to_string(),
            NotificationSeverity::Error,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_notice_names_the_student() {
        let (message, severity) = detection_notice(&Detection {
            recognized: true,
            name: Some("Ana".into()),
            confidence: Some(0.83),
        });
        assert!(message.contains("Ana"));
        assert!(message.contains("83%"));
        assert_eq!(severity, NotificationSeverity::Success);
    }

    #[test]
    fn unknown_notice_is_an_error_without_a_name() {
        let (message, severity) = detection_notice(&Detection {
            recognized: false,
            name: Some("Ana".into()),
            confidence: Some(0.41),
        });
        assert_eq!(severity, NotificationSeverity::Error);
        assert!(!message.contains("Ana"));
        assert!(!message.contains('%'));
        assert_eq!(message, "Unknown person detected!");
    }

    #[test]
    fn guard_releases_its_slot_on_drop() {
        let counter = Arc::new(AtomicUsize::new(0));
        let guard = InFlightGuard::acquire(counter.clone());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        drop(guard);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
