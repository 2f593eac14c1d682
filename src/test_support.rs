//! In-crate fakes for the server, the camera and the notification surface.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};
use tokio::sync::Semaphore;

use crate::{
    api::{ApiError, MonitorApi},
    camera::{Camera, CameraError, CameraStream, CaptureConstraints, RawFrame},
    models::{
        AnalyzeResponse, CommandReply, DashboardStatsResponse, MonitoringStatus, ReplyStatus,
    },
    notify::{NotificationSeverity, NotificationSink},
};

fn ok_reply(message: &str) -> Result<CommandReply, ApiError> {
    Ok(CommandReply {
        status: ReplyStatus::Success,
        message: Some(message.to_string()),
    })
}

/// Scriptable [`MonitorApi`]. Every call is recorded by name before any gate is awaited.
pub struct FakeApi {
    calls: Mutex<Vec<String>>,
    frames: Mutex<Vec<String>>,
    start_reply: Mutex<Result<CommandReply, ApiError>>,
    stop_reply: Mutex<Result<CommandReply, ApiError>>,
    analyze_reply: Mutex<Result<AnalyzeResponse, ApiError>>,
    stats_reply: Mutex<Result<DashboardStatsResponse, ApiError>>,
    status_reply: Mutex<Result<MonitoringStatus, ApiError>>,
    command_reply: Mutex<Result<CommandReply, ApiError>>,
    start_gate: Mutex<Option<Arc<Semaphore>>>,
    analyze_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            frames: Mutex::new(Vec::new()),
            start_reply: Mutex::new(ok_reply("Monitoring started")),
            stop_reply: Mutex::new(ok_reply("Monitoring stopped")),
            analyze_reply: Mutex::new(Ok(AnalyzeResponse {
                status: ReplyStatus::Success,
                faces_detected: 0,
                results: Vec::new(),
                message: None,
            })),
            stats_reply: Mutex::new(Err(ApiError::Request("no stats scripted".into()))),
            status_reply: Mutex::new(Ok(MonitoringStatus {
                active: false,
                timestamp: None,
            })),
            command_reply: Mutex::new(ok_reply("Done")),
            start_gate: Mutex::new(None),
            analyze_gate: Mutex::new(None),
        }
    }

    pub fn set_start_reply(&self, reply: Result<CommandReply, ApiError>) {
        *self.start_reply.lock().unwrap() = reply;
    }

    pub fn set_stop_reply(&self, reply: Result<CommandReply, ApiError>) {
        *self.stop_reply.lock().unwrap() = reply;
    }

    pub fn set_analyze_reply(&self, reply: Result<AnalyzeResponse, ApiError>) {
        *self.analyze_reply.lock().unwrap() = reply;
    }

    pub fn set_stats_reply(&self, reply: Result<DashboardStatsResponse, ApiError>) {
        *self.stats_reply.lock().unwrap() = reply;
    }

    pub fn set_status_reply(&self, reply: Result<MonitoringStatus, ApiError>) {
        *self.status_reply.lock().unwrap() = reply;
    }

    pub fn set_command_reply(&self, reply: Result<CommandReply, ApiError>) {
        *self.command_reply.lock().unwrap() = reply;
    }

    /// Hold `start_monitoring` until the returned semaphore gets a permit.
    pub fn gate_start(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.start_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Hold every `analyze_frame` until the returned semaphore gets a permit.
    pub fn gate_analyze(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.analyze_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == name).count()
    }

    pub fn last_frame(&self) -> Option<String> {
        self.frames.lock().unwrap().last().cloned()
    }

    pub async fn wait_for_call(&self, name: &str) {
        while self.calls_to(name) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn record(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_string());
    }

    async fn pass(gate: &Mutex<Option<Arc<Semaphore>>>) {
        let gate = gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
    }
}

#[async_trait]
impl MonitorApi for FakeApi {
    async fn start_monitoring(&self) -> Result<CommandReply, ApiError> {
        self.record("start_monitoring");
        Self::pass(&self.start_gate).await;
        self.start_reply.lock().unwrap().clone()
    }

    async fn stop_monitoring(&self) -> Result<CommandReply, ApiError> {
        self.record("stop_monitoring");
        self.stop_reply.lock().unwrap().clone()
    }

    async fn analyze_frame(&self, frame_b64: &str) -> Result<AnalyzeResponse, ApiError> {
        self.record("analyze_frame");
        self.frames.lock().unwrap().push(frame_b64.to_string());
        Self::pass(&self.analyze_gate).await;
        self.analyze_reply.lock().unwrap().clone()
    }

    async fn dashboard_stats(&self) -> Result<DashboardStatsResponse, ApiError> {
        self.record("dashboard_stats");
        self.stats_reply.lock().unwrap().clone()
    }

    async fn monitoring_status(&self) -> Result<MonitoringStatus, ApiError> {
        self.record("monitoring_status");
        self.status_reply.lock().unwrap().clone()
    }

    async fn resolve_alert(&self, alert_id: i64) -> Result<CommandReply, ApiError> {
        self.record(&format!("resolve_alert/{alert_id}"));
        self.command_reply.lock().unwrap().clone()
    }

    async fn stop_alarm(&self) -> Result<CommandReply, ApiError> {
        self.record("stop_alarm");
        self.command_reply.lock().unwrap().clone()
    }

    async fn clear_all_data(&self) -> Result<CommandReply, ApiError> {
        self.record("clear_all_data");
        self.command_reply.lock().unwrap().clone()
    }

    async fn clear_alerts(&self) -> Result<CommandReply, ApiError> {
        self.record("clear_alerts");
        self.command_reply.lock().unwrap().clone()
    }

    async fn system_reset(&self) -> Result<CommandReply, ApiError> {
        self.record("system_reset");
        self.command_reply.lock().unwrap().clone()
    }
}

/// Camera whose streams report into shared counters so tests can check release.
pub struct FakeCamera {
    failure: Mutex<Option<CameraError>>,
    ready: Arc<AtomicBool>,
    open: Arc<AtomicUsize>,
    acquisitions: AtomicUsize,
    last_constraints: Mutex<Option<CaptureConstraints>>,
    frame: Arc<Mutex<Option<RawFrame>>>,
}

impl FakeCamera {
    pub fn ready() -> Self {
        Self {
            failure: Mutex::new(None),
            ready: Arc::new(AtomicBool::new(true)),
            open: Arc::new(AtomicUsize::new(0)),
            acquisitions: AtomicUsize::new(0),
            last_constraints: Mutex::new(None),
            frame: Arc::new(Mutex::new(None)),
        }
    }

    /// Serve `frame` on every grab instead of the default solid image.
    pub fn set_frame(&self, frame: RawFrame) {
        *self.frame.lock().unwrap() = Some(frame);
    }

    pub fn fail_with(&self, err: CameraError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Streams acquired and not yet stopped.
    pub fn open_streams(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    pub fn last_constraints(&self) -> Option<CaptureConstraints> {
        *self.last_constraints.lock().unwrap()
    }

    pub fn open_stream(&self) -> Box<dyn CameraStream> {
        self.open.fetch_add(1, Ordering::SeqCst);
        Box::new(FakeStream {
            ready: self.ready.clone(),
            open: self.open.clone(),
            frame: self.frame.clone(),
            stopped: false,
        })
    }
}

#[async_trait]
impl Camera for FakeCamera {
    async fn acquire(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<Box<dyn CameraStream>, CameraError> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        *self.last_constraints.lock().unwrap() = Some(*constraints);
        if let Some(err) = self.failure.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.open_stream())
    }
}

struct FakeStream {
    ready: Arc<AtomicBool>,
    open: Arc<AtomicUsize>,
    frame: Arc<Mutex<Option<RawFrame>>>,
    stopped: bool,
}

impl CameraStream for FakeStream {
    fn is_ready(&self) -> bool {
        !self.stopped && self.ready.load(Ordering::SeqCst)
    }

    fn grab_frame(&mut self) -> Result<RawFrame, CameraError> {
        if let Some(frame) = self.frame.lock().unwrap().clone() {
            return Ok(frame);
        }
        Ok(RawFrame::Image(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            64,
            48,
            Rgb([120, 80, 40]),
        ))))
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.open.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn label(&self) -> &str {
        "fake camera"
    }
}

/// Sink that remembers every notification in order.
#[derive(Default)]
pub struct RecordingSink {
    seen: Mutex<Vec<(String, NotificationSeverity)>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<(String, NotificationSeverity)> {
        self.seen.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<(String, NotificationSeverity)> {
        self.seen.lock().unwrap().last().cloned()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, message: &str, severity: NotificationSeverity) {
        self.seen
            .lock()
            .unwrap()
            .push((message.to_string(), severity));
    }
}
