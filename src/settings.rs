use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock, time::Duration};

pub const ENV_SERVER: &str = "CLASSROOM_MONITOR_SERVER";
pub const ENV_CAMERA_DIR: &str = "CLASSROOM_MONITOR_CAMERA_DIR";
pub const ENV_DEBUG: &str = "CLASSROOM_MONITOR_DEBUG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server_url: String,
    pub capture_interval_ms: u64,
    pub poll_interval_ms: u64,
    pub frame_width: u32,
    pub frame_height: u32,
    pub jpeg_quality: u8,
    pub notification_ttl_ms: u64,
    pub request_timeout_ms: u64,
    pub camera_dir: PathBuf,
    /// Resume a live session on startup when the server reports monitoring as active.
    pub auto_resume: bool,
    /// Fire a new analyze request every tick even if the previous one has not answered.
    pub allow_overlapping_submissions: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            capture_interval_ms: 3000,
            poll_interval_ms: 3000,
            frame_width: 640,
            frame_height: 480,
            jpeg_quality: 70,
            notification_ttl_ms: 5000,
            request_timeout_ms: 10_000,
            camera_dir: PathBuf::from("captures"),
            auto_resume: true,
            allow_overlapping_submissions: false,
        }
    }
}

impl Settings {
    pub fn capture_interval(&self) -> Duration {
        Duration::from_millis(self.capture_interval_ms.max(1))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }

    /// Apply overrides from an environment lookup (normally `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(server) = lookup(ENV_SERVER).filter(|v| !v.trim().is_empty()) {
            self.server_url = server.trim().to_string();
        }
        if let Some(dir) = lookup(ENV_CAMERA_DIR).filter(|v| !v.trim().is_empty()) {
            self.camera_dir = PathBuf::from(dir.trim());
        }
    }
}

/// Whether `CLASSROOM_MONITOR_DEBUG` asks for verbose logging.
pub fn debug_enabled() -> bool {
    std::env::var(ENV_DEBUG)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<Settings>,
}

impl SettingsStore {
    /// Load settings from `path` if it exists; missing or unknown fields fall back to defaults.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Invalid settings file {}", path.display()))?
        } else {
            Settings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn settings(&self) -> Settings {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update<F>(&self, apply: F)
    where
        F: FnOnce(&mut Settings),
    {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        apply(&mut guard);
    }

    pub fn persist(&self) -> Result<()> {
        let serialized = serde_json::to_string_pretty(&self.settings())?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
