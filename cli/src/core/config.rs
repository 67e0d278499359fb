//! # chatrs Configuration System
//!
//! File: cli/src/core/config.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module implements the file configuration for chatrs: where the engine
//! keeps its statement database, how the best-match adapter is tuned, which
//! corpus seeds the bot, and whether prompt history is persisted.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence):
//! 1. Project-specific `.chatrs.toml` in current directory or ancestors
//! 2. User-specific `config.toml` in the platform config dir (`~/.config/chatrs/` on Linux)
//! 3. Default values defined in the code
//!
//! Paths are tilde-expanded and the merged result is validated before use.
//!
//! ## Examples
//!
//! ```toml
//! [storage]
//! database = "~/.local/share/chatrs/chatbot_db.sqlite3"
//!
//! [matching]
//! similarity_threshold = 0.8
//! selection = "first"
//!
//! [training]
//! corpus = "~/corpora/support.toml"
//! ```
//!
//! ```rust
//! let cfg = config::load_config()?;
//! let db = &cfg.storage.database;
//! ```
//!
use crate::core::error::{ChatError, Result};
use crate::engine::selection::ResponseSelection;
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// The effective configuration: defaults overlaid by the user file, then the
/// project file.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Config {
    pub storage: StorageConfig,
    pub matching: MatchingConfig,
    pub training: TrainingConfig,
    pub history: HistoryConfig,
}

/// Where the response engine persists its statements.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    /// Path of the SQLite database file (can use ~). Relative paths resolve
    /// against the working directory.
    pub database: String,
}

/// Tuning of the best-match logic adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchingConfig {
    /// Matches scoring below this similarity are not used.
    pub similarity_threshold: f64,
    /// Reply given when nothing clears the threshold.
    pub default_response: String,
    /// How to pick among several known responses to the matched prompt.
    pub selection: ResponseSelection,
}

/// Startup training.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    /// Train from the corpus at startup.
    pub enabled: bool,
    /// Replacement corpus file (can use ~). The embedded corpus is used when unset.
    pub corpus: Option<String>,
}

/// Prompt history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryConfig {
    /// Persist prompt history across sessions.
    pub enabled: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: "chatbot_db.sqlite3".to_string(),
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.70,
            default_response: "I understand! What would you like to chat about?".to_string(),
            selection: ResponseSelection::default(),
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            corpus: None,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// One configuration file as written. Only the keys present in the file are
/// `Some`, so a layer overrides exactly what it sets.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    #[serde(default)]
    pub storage: StorageLayer,
    #[serde(default)]
    pub matching: MatchingLayer,
    #[serde(default)]
    pub training: TrainingLayer,
    #[serde(default)]
    pub history: HistoryLayer,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StorageLayer {
    pub database: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MatchingLayer {
    pub similarity_threshold: Option<f64>,
    pub default_response: Option<String>,
    pub selection: Option<ResponseSelection>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TrainingLayer {
    pub enabled: Option<bool>,
    pub corpus: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HistoryLayer {
    pub enabled: Option<bool>,
}

impl ConfigLayer {
    /// Overwrites every value of `config` that this layer sets.
    fn apply_to(self, config: &mut Config) {
        if let Some(database) = self.storage.database {
            config.storage.database = database;
        }
        if let Some(threshold) = self.matching.similarity_threshold {
            config.matching.similarity_threshold = threshold;
        }
        if let Some(response) = self.matching.default_response {
            config.matching.default_response = response;
        }
        if let Some(selection) = self.matching.selection {
            config.matching.selection = selection;
        }
        if let Some(enabled) = self.training.enabled {
            config.training.enabled = enabled;
        }
        if let Some(corpus) = self.training.corpus {
            config.training.corpus = Some(corpus);
        }
        if let Some(enabled) = self.history.enabled {
            config.history.enabled = enabled;
        }
    }
}

const PROJECT_CONFIG_FILENAME: &str = ".chatrs.toml";

/// Loads, merges, expands and validates the configuration.
pub fn load_config() -> Result<Config> {
    let user_config = load_user_config()?;
    let project_config = load_project_config()?;
    let mut merged_config = merge_configs(user_config, project_config);
    expand_config_paths(&mut merged_config);
    validate_config(&merged_config).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", merged_config);
    Ok(merged_config)
}

/// Platform directories for chatrs, if a home directory can be determined.
pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "ChatRS", "chatrs")
}

fn load_user_config() -> Result<Option<ConfigLayer>> {
    if let Some(proj_dirs) = project_dirs() {
        let config_path = proj_dirs.config_dir().join("config.toml");
        if config_path.exists() {
            info!("Loading user configuration from: {}", config_path.display());
            load_config_from_path(&config_path).map(Some)
        } else {
            debug!(
                "User configuration file not found at {}",
                config_path.display()
            );
            Ok(None)
        }
    } else {
        warn!("Could not determine user config directory.");
        Ok(None)
    }
}

fn load_project_config() -> Result<Option<ConfigLayer>> {
    if let Some(project_config_path) = find_project_config_path()? {
        info!(
            "Loading project configuration from: {}",
            project_config_path.display()
        );
        load_config_from_path(&project_config_path).map(Some)
    } else {
        debug!("No project configuration file (.chatrs.toml) found in current directory or ancestors.");
        Ok(None)
    }
}

fn find_project_config_path() -> Result<Option<PathBuf>> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    let mut path: &Path = &current_dir;
    loop {
        let project_config = path.join(PROJECT_CONFIG_FILENAME);
        if project_config.is_file() {
            return Ok(Some(project_config));
        }
        if path.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                path.display()
            );
            return Ok(None);
        }
        match path.parent() {
            Some(parent) => path = parent,
            None => break,
        }
    }
    Ok(None)
}

fn load_config_from_path(path: &Path) -> Result<ConfigLayer> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

/// Defaults, then the user layer, then the project layer. Any value a later
/// layer sets wins, even when it equals the default.
fn merge_configs(user: Option<ConfigLayer>, project: Option<ConfigLayer>) -> Config {
    let mut merged = Config::default();
    for layer in [user, project].into_iter().flatten() {
        layer.apply_to(&mut merged);
    }
    merged
}

fn expand_config_paths(config: &mut Config) {
    config.storage.database = shellexpand::tilde(&config.storage.database).into_owned();
    debug!("Expanded database path: {}", config.storage.database);
    if let Some(corpus) = config.training.corpus.as_mut() {
        *corpus = shellexpand::tilde(corpus).into_owned();
        debug!("Expanded corpus path: {}", corpus);
    }
}

fn validate_config(config: &Config) -> Result<()> {
    debug!("Validating final configuration...");
    let threshold = config.matching.similarity_threshold;
    if !(0.0..=1.0).contains(&threshold) {
        return Err(anyhow!(ChatError::Config(format!(
            "similarity_threshold must be between 0.0 and 1.0, got {}.",
            threshold
        ))));
    }
    if config.matching.default_response.trim().is_empty() {
        return Err(anyhow!(ChatError::Config(
            "default_response cannot be empty.".to_string()
        )));
    }
    if config.storage.database.trim().is_empty() {
        return Err(anyhow!(ChatError::Config(
            "storage.database cannot be empty.".to_string()
        )));
    }
    if let Some(corpus) = &config.training.corpus {
        if !Path::new(corpus).exists() {
            // Not fatal: training is best-effort and reports the failure itself.
            warn!("Configured corpus file '{}' does not exist.", corpus);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.storage.database, "chatbot_db.sqlite3");
        assert_eq!(config.matching.similarity_threshold, 0.70);
        assert_eq!(
            config.matching.default_response,
            "I understand! What would you like to chat about?"
        );
        assert_eq!(config.matching.selection, ResponseSelection::MostFrequent);
        assert!(config.training.enabled);
        assert!(config.training.corpus.is_none());
        assert!(config.history.enabled);
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let toml_content = r#"
            [storage]
            database = "~/bots/chat.sqlite3"

            [matching]
            selection = "first"

            [training]
            corpus = "/etc/chatrs/corpus.toml"
        "#;

        let layer: ConfigLayer = toml::from_str(toml_content).expect("Failed to parse TOML");
        let config = merge_configs(Some(layer), None);

        assert_eq!(config.storage.database, "~/bots/chat.sqlite3"); // Not yet expanded
        assert_eq!(config.matching.selection, ResponseSelection::First);
        assert_eq!(config.matching.similarity_threshold, 0.70); // Default
        assert_eq!(
            config.training.corpus.as_deref(),
            Some("/etc/chatrs/corpus.toml")
        );
        assert!(config.training.enabled); // Default
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: std::result::Result<ConfigLayer, _> =
            toml::from_str("[storage]\nuri = \"x\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_path_expansion() {
        let mut config = Config {
            storage: StorageConfig {
                database: "~/chat.sqlite3".to_string(),
            },
            training: TrainingConfig {
                enabled: true,
                corpus: Some("/absolute/corpus.toml".to_string()),
            },
            ..Default::default()
        };

        expand_config_paths(&mut config);

        let home_dir = dirs::home_dir().unwrap();
        assert_eq!(
            config.storage.database,
            home_dir.join("chat.sqlite3").to_string_lossy()
        );
        assert_eq!(
            config.training.corpus.as_deref(),
            Some("/absolute/corpus.toml")
        );
    }

    #[test]
    fn test_merge_prefers_project_values() {
        let user: ConfigLayer = toml::from_str(
            r#"
            [storage]
            database = "/user/db.sqlite3"
            [matching]
            similarity_threshold = 0.5
            [training]
            corpus = "/user/corpus.toml"
            "#,
        )
        .unwrap();
        let project: ConfigLayer = toml::from_str(
            r#"
            [matching]
            similarity_threshold = 0.9
            [history]
            enabled = false
            "#,
        )
        .unwrap();

        let merged = merge_configs(Some(user), Some(project));
        assert_eq!(merged.storage.database, "/user/db.sqlite3");
        assert_eq!(merged.matching.similarity_threshold, 0.9);
        assert_eq!(merged.training.corpus.as_deref(), Some("/user/corpus.toml"));
        assert!(!merged.history.enabled);
    }

    #[test]
    fn test_merge_project_values_equal_to_defaults_still_win() {
        let user: ConfigLayer = toml::from_str(
            r#"
            [matching]
            similarity_threshold = 0.5
            selection = "first"
            [training]
            enabled = false
            [history]
            enabled = false
            "#,
        )
        .unwrap();
        let project: ConfigLayer = toml::from_str(
            r#"
            [matching]
            similarity_threshold = 0.70
            selection = "most_frequent"
            [training]
            enabled = true
            "#,
        )
        .unwrap();

        let merged = merge_configs(Some(user), Some(project));
        assert_eq!(merged.matching.similarity_threshold, 0.70);
        assert_eq!(merged.matching.selection, ResponseSelection::MostFrequent);
        assert!(merged.training.enabled);
        // Not set by the project, so the user value stays.
        assert!(!merged.history.enabled);
    }

    #[test]
    fn test_merge_without_files_is_default() {
        assert_eq!(merge_configs(None, None), Config::default());
    }

    #[test]
    fn test_validate_config_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_config_invalid_threshold() {
        let config = Config {
            matching: MatchingConfig {
                similarity_threshold: 1.5,
                ..Default::default()
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("similarity_threshold must be between"));
    }

    #[test]
    fn test_validate_config_empty_default_response() {
        let config = Config {
            matching: MatchingConfig {
                default_response: "   ".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_config_from_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[history]\nenabled = false\n").unwrap();

        let layer = load_config_from_path(&path).unwrap();
        assert_eq!(layer.history.enabled, Some(false));
        assert_eq!(layer.training.enabled, None);

        fs::write(&path, "not = [valid").unwrap();
        let err = load_config_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML"));
    }
}
