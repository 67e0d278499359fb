//! # chatrs Training Corpus
//!
//! File: cli/src/core/corpus.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! The corpus is a flat, ordered list of statements stored as a TOML resource
//! (`statements = [...]`). It is consumed two statements at a time: the first
//! of each pair is a prompt, the second the reply the bot learns for it.
//!
//! The default corpus (`cli/resources/corpus.toml`) is embedded in the binary.
//! A replacement file can be configured with `training.corpus`.
//!
use crate::core::config::TrainingConfig;
use crate::core::error::{ChatError, Result};
use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::{fs, path::Path};
use tracing::{debug, info};

const EMBEDDED_CORPUS: &str = include_str!("../../resources/corpus.toml");

/// An ordered (prompt, response) example used to seed the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingPair {
    pub prompt: String,
    pub response: String,
}

impl TrainingPair {
    pub fn new(prompt: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response: response.into(),
        }
    }
}

/// A flat statement sequence, as read from a corpus file.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Corpus {
    pub statements: Vec<String>,
}

impl Corpus {
    /// The corpus compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::parse(EMBEDDED_CORPUS).context("Failed to parse the embedded corpus")
    }

    /// Reads a corpus file from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read corpus file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse corpus file: {}", path.display()))
    }

    /// Resolves the corpus named by the training configuration.
    pub fn load(config: &TrainingConfig) -> Result<Self> {
        match &config.corpus {
            Some(path) => {
                info!("Loading training corpus from: {}", path);
                Self::from_path(Path::new(path))
            }
            None => {
                debug!("Using embedded training corpus.");
                Self::embedded()
            }
        }
    }

    fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| anyhow!(ChatError::Corpus(e.to_string())))
    }

    /// Consecutive (prompt, response) pairs of this corpus.
    pub fn pairs(&self) -> Vec<TrainingPair> {
        into_pairs(&self.statements)
    }
}

/// Splits statements into pairs 0-1, 2-3, ...; an odd trailing statement is dropped.
pub fn into_pairs(statements: &[String]) -> Vec<TrainingPair> {
    statements
        .chunks_exact(2)
        .map(|pair| TrainingPair::new(pair[0].clone(), pair[1].clone()))
        .collect()
}
