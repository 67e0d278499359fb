//! # chatrs CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Shared helpers for the integration tests in `cli/tests/`. Every test runs
//! the compiled `chatrs` binary inside its own temporary workspace so that
//! databases, config files and prompt history never touch the real user
//! directories.
//!

// Different test files use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// # Get chatrs Command (`chatrs_cmd`)
///
/// Creates an `assert_cmd::Command` for the compiled `chatrs` binary.
///
/// ## Panics
/// Panics if the binary cannot be found via `Command::cargo_bin`.
pub fn chatrs_cmd() -> Command {
    Command::cargo_bin("chatrs").expect("Failed to find chatrs binary for testing")
}

/// # Isolated Workspace (`workspace`)
///
/// A temporary directory holding a `.git` marker (which stops the project
/// config search) plus separate home, config and data directories.
pub fn workspace() -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp workspace");
    for sub in [".git", "home", "config", "data"] {
        fs::create_dir(dir.path().join(sub)).expect("Failed to create workspace dir");
    }
    dir
}

/// # Chat Command in Workspace (`chat_in`)
///
/// `chatrs chat` running in `dir` with all user directories redirected into it.
pub fn chat_in(dir: &Path) -> Command {
    let mut cmd = chatrs_cmd();
    cmd.current_dir(dir)
        .env("HOME", dir.join("home"))
        .env("XDG_CONFIG_HOME", dir.join("config"))
        .env("XDG_DATA_HOME", dir.join("data"))
        .env_remove("RUST_LOG")
        .arg("chat");
    cmd
}

/// Writes a project `.chatrs.toml` into `dir`.
pub fn write_project_config(dir: &Path, content: &str) {
    fs::write(dir.join(".chatrs.toml"), content).expect("Failed to write project config");
}

/// Writes the user `config.toml` under the workspace's redirected config dir.
pub fn write_user_config(dir: &Path, content: &str) {
    let config_dir = dir.join("config").join("chatrs");
    fs::create_dir_all(&config_dir).expect("Failed to create user config dir");
    fs::write(config_dir.join("config.toml"), content).expect("Failed to write user config");
}
