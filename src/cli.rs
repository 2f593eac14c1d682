use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use clap::{Parser, Subcommand};

use crate::dashboard::Confirm;

/// Classroom entry monitor: feeds camera frames to the recognition server
/// and shows live entries and alerts.
#[derive(Parser)]
#[command(
    name = "classroom-monitor",
    version = env!("CARGO_PKG_VERSION"),
    about = "Classroom entry monitor client",
    long_about = None
)]
pub struct Cli {
    /// Settings file (JSON). Missing fields use defaults.
    #[arg(global = true, long = "config", default_value = "classroom-monitor.json")]
    pub config: PathBuf,

    /// Override the recognition server URL
    #[arg(global = true, long = "server")]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the live dashboard; resumes monitoring if the server says it is active
    Watch {
        /// Start a monitoring session immediately
        #[arg(long = "start")]
        start: bool,

        /// Image directory used as the camera
        #[arg(long = "camera-dir")]
        camera_dir: Option<PathBuf>,
    },

    /// Fetch the dashboard once and print it
    Stats {
        /// Print the rendered dashboard as JSON
        #[arg(long = "json")]
        json: bool,
    },

    /// Mark an alert as resolved (also stops the alarm)
    ResolveAlert {
        /// Alert id as shown by `stats`
        id: i64,
    },

    /// Silence the security alarm
    StopAlarm,

    /// Delete all entry logs and alerts
    ClearAll {
        /// Do not ask for confirmation
        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },

    /// Delete alerts that were already resolved
    ClearAlerts,

    /// Reset the system to a clean state, keeping students
    Reset {
        /// Do not ask for confirmation
        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },

    /// Print the effective settings
    Config {
        /// Write the effective settings back to the settings file
        #[arg(long = "write")]
        write: bool,
    },
}

/// Yes/no prompt on stdin; anything but `y`/`yes` declines. Blocks the
/// calling thread, so async callers run it on the blocking pool.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "classroom-monitor",
            "resolve-alert",
            "17",
            "--server",
            "http://10.1.1.1:5000",
        ])
        .unwrap();

        assert_eq!(cli.server.as_deref(), Some("http://10.1.1.1:5000"));
        assert!(matches!(cli.command, Commands::ResolveAlert { id: 17 }));
    }

    #[test]
    fn clear_all_requires_no_arguments() {
        let cli = Cli::try_parse_from(["classroom-monitor", "clear-all", "-y"]).unwrap();
        assert!(matches!(cli.command, Commands::ClearAll { yes: true }));
    }
}
