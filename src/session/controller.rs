use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    api::MonitorApi,
    camera::{Camera, CaptureConstraints},
    error::MonitorError,
    models::CommandReply,
    notify::{NotificationSeverity, NotificationSink},
    settings::Settings,
};

use super::{
    capture::{InFlightGuard, SkipReason, Submission, TickOutcome},
    state::SessionState,
    SessionSnapshot, SessionStatus,
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

#[derive(Debug, Clone, Copy)]
pub struct CaptureConfig {
    pub constraints: CaptureConstraints,
    pub interval: Duration,
    pub jpeg_quality: u8,
    pub allow_overlap: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            constraints: CaptureConstraints::default(),
            interval: Duration::from_millis(3000),
            jpeg_quality: 70,
            allow_overlap: false,
        }
    }
}

impl From<&Settings> for CaptureConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            constraints: CaptureConstraints {
                width: settings.frame_width,
                height: settings.frame_height,
                audio: false,
            },
            interval: settings.capture_interval(),
            jpeg_quality: settings.jpeg_quality,
            allow_overlap: settings.allow_overlapping_submissions,
        }
    }
}

/// What the rest of the app may do with a monitoring session.
#[async_trait]
pub trait SessionControl: Send + Sync {
    async fn start(&self) -> Result<SessionSnapshot, MonitorError>;

    async fn stop(&self) -> SessionSnapshot;

    async fn snapshot(&self) -> SessionSnapshot;
}

/// Drives one monitoring session at a time: camera lifecycle, the recurring
/// capture tick, and reconciliation with the server's start/stop replies.
#[derive(Clone)]
pub struct MonitorController {
    state: Arc<Mutex<SessionState>>,
    api: Arc<dyn MonitorApi>,
    camera: Arc<dyn Camera>,
    notifier: Arc<dyn NotificationSink>,
    config: CaptureConfig,
    in_flight: Arc<AtomicUsize>,
}

impl MonitorController {
    pub fn new(
        api: Arc<dyn MonitorApi>,
        camera: Arc<dyn Camera>,
        notifier: Arc<dyn NotificationSink>,
        config: CaptureConfig,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::new())),
            api,
            camera,
            notifier,
            config,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn status(&self) -> SessionStatus {
        self.state.lock().await.status
    }

    pub async fn get_snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().await;
        state.snapshot(self.in_flight.load(Ordering::SeqCst))
    }

    pub async fn start_session(&self) -> Result<SessionSnapshot, MonitorError> {
        let (generation, cancel_token) = {
            let mut state = self.state.lock().await;
            if state.status != SessionStatus::Idle {
                log_debug!("start ignored: session already {:?}", state.status);
                return Ok(state.snapshot(self.in_flight.load(Ordering::SeqCst)));
            }
            state.begin_start()
        };

        let stream = match self.camera.acquire(&self.config.constraints).await {
            Ok(stream) => stream,
            Err(err) => {
                let err = MonitorError::from(err);
                log_warn!("camera acquisition failed: {err}");
                self.abort_start(generation).await;
                self.notifier
                    .notify(&err.user_message(), NotificationSeverity::Error);
                return Err(err);
            }
        };

        {
            let mut state = self.state.lock().await;
            if !state.is_current(generation, SessionStatus::Starting) {
                let mut stream = stream;
                stream.stop();
                log_info!("start of session {generation} interrupted before camera bind");
                return Ok(state.snapshot(self.in_flight.load(Ordering::SeqCst)));
            }
            state.attach_stream(stream);
        }

        let err = match self.api.start_monitoring().await {
            Ok(reply) if reply.status.is_acknowledged() => {
                return self.finish_start(generation, cancel_token, &reply).await;
            }
            Ok(reply) => MonitorError::ServerRejected(
                reply.message_or("Failed to start monitoring").to_string(),
            ),
            Err(err) => MonitorError::from(err),
        };

        log_warn!("server did not acknowledge start: {err}");
        self.abort_start(generation).await;
        self.notifier
            .notify(&err.user_message(), NotificationSeverity::Error);
        Err(err)
    }

    async fn finish_start(
        &self,
        generation: u64,
        cancel_token: CancellationToken,
        reply: &CommandReply,
    ) -> Result<SessionSnapshot, MonitorError> {
        {
            let mut state = self.state.lock().await;
            if state.is_current(generation, SessionStatus::Starting) {
                let ticker = self.spawn_ticker(cancel_token);
                state.go_live(ticker, Utc::now());
                log_info!(
                    "monitoring session {} live",
                    state.session_id.as_deref().unwrap_or("-")
                );

                let severity = if reply.status.is_success() {
                    NotificationSeverity::Success
                } else {
                    NotificationSeverity::Info
                };
                self.notifier
                    .notify(reply.message_or("Monitoring started"), severity);
                return Ok(state.snapshot(self.in_flight.load(Ordering::SeqCst)));
            }
        }

        // Stopped while the server was acknowledging. Undo the server side only
        // if no later session has started since; that one owns the server now.
        let withdraw = {
            let state = self.state.lock().await;
            state.is_current(generation, SessionStatus::Idle)
        };
        if withdraw {
            log_info!("start of session {generation} interrupted after acknowledgement");
            if let Err(err) = self.api.stop_monitoring().await {
                log_warn!("failed to withdraw interrupted start: {err}");
            }
        } else {
            log_info!("late acknowledgement for session {generation} ignored; a newer session exists");
        }
        Ok(self.get_snapshot().await)
    }

    /// Release everything and return to `Idle`. The server is told afterwards,
    /// and its answer never changes the local outcome.
    pub async fn stop_session(&self) -> SessionSnapshot {
        {
            let mut state = self.state.lock().await;
            if state.status == SessionStatus::Idle {
                return state.snapshot(self.in_flight.load(Ordering::SeqCst));
            }
            state.status = SessionStatus::Stopping;
            state.release();
            log_info!("monitoring session {} stopped locally", state.generation);
        }

        match self.api.stop_monitoring().await {
            Ok(reply) if reply.status.is_success() => {
                self.notifier.notify(
                    reply.message_or("Monitoring stopped"),
                    NotificationSeverity::Info,
                );
            }
            Ok(reply) => log_warn!(
                "server did not confirm stop: {}",
                reply.message_or("no message")
            ),
            Err(err) => log_warn!("stop_monitoring failed: {err}"),
        }

        self.get_snapshot().await
    }

    /// Reconcile with the server after a restart: resume a live session when
    /// the server still reports monitoring as active.
    pub async fn resume_if_active(
        &self,
        server_active: bool,
    ) -> Result<Option<SessionSnapshot>, MonitorError> {
        if !server_active || self.status().await != SessionStatus::Idle {
            return Ok(None);
        }
        log_info!("server reports monitoring active; resuming session");
        self.start_session().await.map(Some)
    }

    /// Ask the server whether monitoring is active and resume locally if so.
    pub async fn reconcile_with_server(&self) -> Result<Option<SessionSnapshot>, MonitorError> {
        let status = self.api.monitoring_status().await?;
        log_debug!(
            "server monitoring flag: {} (as of {:?})",
            status.active,
            status.observed_at()
        );
        self.resume_if_active(status.active).await
    }

    /// One capture/analyze cycle. Called by the ticker; public so callers can force a frame.
    pub async fn capture_tick(&self) -> TickOutcome {
        let (generation, cancel_token, frame) = {
            let mut state = self.state.lock().await;
            if state.status != SessionStatus::Live {
                return TickOutcome::Skipped(SkipReason::NotLive);
            }
            if !self.config.allow_overlap && self.in_flight.load(Ordering::SeqCst) > 0 {
                log_debug!("tick skipped: previous frame still in flight");
                return TickOutcome::Skipped(SkipReason::InFlight);
            }

            let Some(cancel_token) = state.cancel_token() else {
                return TickOutcome::Skipped(SkipReason::NotLive);
            };
            let generation = state.generation;

            let Some(stream) = state.stream_mut() else {
                return TickOutcome::Skipped(SkipReason::NotLive);
            };
            if !stream.is_ready() {
                return TickOutcome::Skipped(SkipReason::DeviceNotReady);
            }

            match stream.grab_frame() {
                Ok(frame) => (generation, cancel_token, frame),
                Err(err) => {
                    log_warn!("frame capture failed: {err}");
                    return TickOutcome::Skipped(SkipReason::CaptureFailed);
                }
            }
        };

        let submission = Submission {
            generation,
            cancel_token,
            state: self.state.clone(),
            api: self.api.clone(),
            notifier: self.notifier.clone(),
            config: self.config,
            _guard: InFlightGuard::acquire(self.in_flight.clone()),
        };

        TickOutcome::Submitted(submission.spawn(frame))
    }

    async fn abort_start(&self, generation: u64) {
        let mut state = self.state.lock().await;
        if state.is_current(generation, SessionStatus::Starting) {
            state.release();
        }
    }

    fn spawn_ticker(&self, cancel_token: CancellationToken) -> JoinHandle<()> {
        let controller = self.clone();
        let period = self.config.interval;

        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let TickOutcome::Skipped(reason) = controller.capture_tick().await {
                            log_debug!("capture tick skipped: {reason:?}");
                        }
                    }
                    _ = cancel_token.cancelled() => {
                        log_debug!("capture ticker shutting down");
                        break;
                    }
                }
            }
        })
    }
}

#[async_trait]
impl SessionControl for MonitorController {
    async fn start(&self) -> Result<SessionSnapshot, MonitorError> {
        self.start_session().await
    }

    async fn stop(&self) -> SessionSnapshot {
        self.stop_session().await
    }

    async fn snapshot(&self) -> SessionSnapshot {
        self.get_snapshot().await
    }
}
