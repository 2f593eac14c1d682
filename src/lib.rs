pub mod api;
pub mod camera;
pub mod cli;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod notify;
pub mod session;
pub mod settings;
mod utils;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use api::{HttpMonitorApi, MonitorApi};
use camera::{Camera, ImageDirectoryCamera};
use cli::{Cli, Commands, StdinConfirm};
use dashboard::{
    CommandOutcome, Confirm, DashboardPoller, PollOutcome, RenderedDashboard, CLEAR_ALL_PROMPT,
    RESET_PROMPT,
};
use notify::{LogSink, Notification, NotificationCenter};
use session::{CaptureConfig, MonitorController, SessionControl, SessionSnapshot};
use settings::{Settings, SettingsStore};

/// The wired-up client: one controller, one poller, one notification surface.
pub struct AppState {
    pub settings: Settings,
    pub api: Arc<dyn MonitorApi>,
    pub notifications: NotificationCenter,
    pub controller: MonitorController,
    pub poller: DashboardPoller,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self> {
        let api = HttpMonitorApi::new(settings.server_url.clone(), settings.request_timeout())
            .context("failed to build HTTP client")?;
        let camera = ImageDirectoryCamera::new(settings.camera_dir.clone());
        Ok(Self::with_parts(settings, Arc::new(api), Arc::new(camera)))
    }

    pub fn with_parts(
        settings: Settings,
        api: Arc<dyn MonitorApi>,
        camera: Arc<dyn Camera>,
    ) -> Self {
        let notifications =
            NotificationCenter::new(settings.notification_ttl()).with_forward(Arc::new(LogSink));
        let sink = Arc::new(notifications.clone());

        let controller = MonitorController::new(
            api.clone(),
            camera,
            sink.clone(),
            CaptureConfig::from(&settings),
        );
        let poller = DashboardPoller::new(api.clone(), sink, settings.poll_interval());

        Self {
            settings,
            api,
            notifications,
            controller,
            poller,
        }
    }
}

pub async fn dispatch(command: &Commands, state: &AppState, store: &SettingsStore) -> Result<()> {
    match command {
        Commands::Watch { start, .. } => watch(state, *start).await,
        Commands::Stats { json } => stats(state, *json).await,
        Commands::ResolveAlert { id } => finish(state.poller.resolve_alert(*id).await),
        Commands::StopAlarm => finish(state.poller.stop_alarm().await),
        Commands::ClearAll { yes } => {
            let answer = ask(*yes, CLEAR_ALL_PROMPT).await?;
            finish(state.poller.clear_all_data(&answer).await)
        }
        Commands::ClearAlerts => finish(state.poller.clear_resolved_alerts().await),
        Commands::Reset { yes } => {
            let answer = ask(*yes, RESET_PROMPT).await?;
            finish(state.poller.system_reset(&answer).await)
        }
        Commands::Config { write } => {
            println!("{}", serde_json::to_string_pretty(&state.settings)?);
            if *write {
                store.persist()?;
                println!("Settings written to {}", store.path().display());
            }
            Ok(())
        }
    }
}

/// Answer recorded before the command runs.
struct Answered(bool);

impl Confirm for Answered {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

/// Ask on stdin from the blocking pool unless `--yes` already answered.
async fn ask(assume_yes: bool, prompt: &'static str) -> Result<Answered> {
    if assume_yes {
        return Ok(Answered(true));
    }
    let answer = tokio::task::spawn_blocking(move || StdinConfirm.confirm(prompt))
        .await
        .context("confirmation prompt failed")?;
    Ok(Answered(answer))
}

fn finish(outcome: CommandOutcome) -> Result<()> {
    match outcome {
        CommandOutcome::Completed(message) => {
            println!("{message}");
            Ok(())
        }
        CommandOutcome::Declined => {
            println!("Aborted.");
            Ok(())
        }
        CommandOutcome::Failed => bail!("command failed"),
    }
}

async fn stats(state: &AppState, json: bool) -> Result<()> {
    if state.poller.poll_once().await == PollOutcome::Skipped {
        bail!(
            "could not fetch dashboard stats from {}",
            state.settings.server_url
        );
    }
    let Some(board) = state.poller.board() else {
        bail!("dashboard stats unavailable");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&board)?);
    } else {
        print!("{board}");
    }
    Ok(())
}

async fn watch(state: &AppState, start_now: bool) -> Result<()> {
    let cancel = CancellationToken::new();
    let poll_task = state.poller.spawn(cancel.clone());
    let mut updates = state.poller.subscribe();

    if start_now {
        // Failures are already surfaced as notifications.
        let _ = state.controller.start().await;
    } else if state.settings.auto_resume {
        if let Err(err) = state.controller.reconcile_with_server().await {
            warn!("could not resume monitoring: {err}");
        }
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let board = updates.borrow_and_update().clone();
                if let Some(board) = board {
                    let session = state.controller.snapshot().await;
                    print_board(&board, &session, &state.notifications.active());
                }
            }
            _ = &mut shutdown => {
                info!("interrupt received, shutting down");
                break;
            }
        }
    }

    cancel.cancel();
    state.controller.stop().await;
    if let Err(err) = poll_task.await {
        warn!("dashboard poller ended abnormally: {err}");
    }
    Ok(())
}

fn print_board(board: &RenderedDashboard, session: &SessionSnapshot, notices: &[Notification]) {
    println!("\n==== {} ====", board.rendered_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!(
        "Session: {:?}{}",
        session.status,
        session
            .device
            .as_deref()
            .map(|device| format!(" ({device})"))
            .unwrap_or_default()
    );
    print!("{board}");
    if !notices.is_empty() {
        println!("\nNotifications");
        for notice in notices {
            println!("  [{:?}] {}", notice.severity, notice.message);
        }
    }
}

pub fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    // RUST_LOG, when set, wins over the default level
    let level = if settings::debug_enabled() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    let store = SettingsStore::new(cli.config.clone())?;
    store.update(|settings| settings.apply_env(|key| std::env::var(key).ok()));
    if let Some(server) = &cli.server {
        store.update(|settings| settings.server_url = server.clone());
    }
    if let Commands::Watch {
        camera_dir: Some(dir),
        ..
    } = &cli.command
    {
        store.update(|settings| settings.camera_dir = dir.clone());
    }

    let state = AppState::new(store.settings())?;
    info!("classroom monitor using server {}", state.settings.server_url);

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(dispatch(&cli.command, &state, &store))
}
