#![allow(dead_code)]
use assert_cmd::{cargo_bin_cmd, Command};
use std::path::PathBuf;

/// An address nothing listens on; requests fail fast with a connection error.
pub const DEAD_SERVER: &str = "http://127.0.0.1:9";

pub fn monitor() -> Command {
    let mut cmd = cargo_bin_cmd!("classroom-monitor");
    cmd.env_remove("CLASSROOM_MONITOR_SERVER")
        .env_remove("CLASSROOM_MONITOR_CAMERA_DIR")
        .env_remove("CLASSROOM_MONITOR_DEBUG")
        .env("RUST_LOG", "off");
    cmd
}

/// Settings path inside `dir` that does not exist yet.
pub fn config_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("classroom-monitor.json")
}
