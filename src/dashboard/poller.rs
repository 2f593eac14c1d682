use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{api::MonitorApi, notify::NotificationSink};

use super::render::{render_snapshot, RenderedDashboard};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Updated,
    /// Fetch or parse failed; the previous board stays on screen.
    Skipped,
}

/// Periodically fetches `/dashboard_stats` and keeps the latest rendered board.
///
/// Only successful polls touch the board. A failed poll leaves the last good
/// render in place with no staleness marker.
#[derive(Clone)]
pub struct DashboardPoller {
    pub(super) api: Arc<dyn MonitorApi>,
    pub(super) notifier: Arc<dyn NotificationSink>,
    board: Arc<watch::Sender<Option<RenderedDashboard>>>,
    interval: Duration,
}

impl DashboardPoller {
    pub fn new(
        api: Arc<dyn MonitorApi>,
        notifier: Arc<dyn NotificationSink>,
        interval: Duration,
    ) -> Self {
        let (board, _) = watch::channel(None);
        Self {
            api,
            notifier,
            board: Arc::new(board),
            interval,
        }
    }

    /// The most recent successful render, if any poll has succeeded yet.
    pub fn board(&self) -> Option<RenderedDashboard> {
        self.board.borrow().clone()
    }

    /// Receiver that wakes on every board replacement.
    pub fn subscribe(&self) -> watch::Receiver<Option<RenderedDashboard>> {
        self.board.subscribe()
    }

    pub async fn poll_once(&self) -> PollOutcome {
        let response = match self.api.dashboard_stats().await {
            Ok(response) => response,
            Err(err) => {
                log_debug!("dashboard poll failed: {err}");
                return PollOutcome::Skipped;
            }
        };

        let Some(snapshot) = response.into_snapshot() else {
            log_debug!("dashboard poll returned no data");
            return PollOutcome::Skipped;
        };

        self.board.send_replace(Some(render_snapshot(&snapshot)));
        PollOutcome::Updated
    }

    /// Poll now and then every interval until `cancel` fires.
    pub fn spawn(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let poller = self.clone();

        tokio::spawn(async move {
            let mut ticker = time::interval(poller.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        poller.poll_once().await;
                    }
                    _ = cancel.cancelled() => {
                        log_info!("dashboard poller shutting down");
                        break;
                    }
                }
            }
        })
    }
}
