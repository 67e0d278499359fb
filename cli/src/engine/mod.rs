//! # chatrs Response Engine
//!
//! File: cli/src/engine/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! The response engine is the collaborator the chat session talks to. The
//! session only sees the [`ResponseEngine`] trait: train on a pair, respond to
//! an utterance, close storage.
//!
//! [`BestMatchEngine`] is the shipped implementation:
//! - statements persist in a SQLite file (`storage`), namespaced by bot name
//! - input is compared against every known prompt with a normalized
//!   Levenshtein similarity (`similarity`)
//! - the best prompt is used only if it clears the similarity threshold,
//!   otherwise the configured default reply is returned
//! - among the replies stored for that prompt, one is chosen by the
//!   configured policy (`selection`)
//! - unless read-only, every exchange is stored so the bot learns from it
//!
//! `compat` patches statement tables written by older builds.
//!
use crate::core::config::MatchingConfig;
use crate::core::corpus::TrainingPair;
use crate::core::error::{ChatError, Result};
use anyhow::anyhow;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

pub mod compat;
pub mod selection;
pub mod similarity;
pub mod storage;

use storage::{NewStatement, SqliteStorage};

const TRAINING_CONVERSATION: &str = "training";

/// Operations the chat session needs from a response engine.
pub trait ResponseEngine: Send + 'static {
    /// Learn `pair.response` as a reply to `pair.prompt`.
    fn train(&mut self, pair: &TrainingPair) -> Result<()>;
    /// Produce a reply to `utterance`. Once `cancelled` is set the caller has
    /// stopped waiting: give up early and store nothing.
    fn respond(&mut self, utterance: &str, cancelled: &AtomicBool) -> Result<String>;
    /// Release the storage session.
    fn close_storage(&mut self) -> Result<()>;
}

/// Fixed construction parameters of a [`BestMatchEngine`].
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Bot identity and storage namespace.
    pub name: String,
    /// Disables learning from live conversation.
    pub read_only: bool,
    /// SQLite database file.
    pub database: PathBuf,
    pub matching: MatchingConfig,
}

/// Best-match engine over a SQLite statement store.
pub struct BestMatchEngine {
    settings: EngineSettings,
    storage: SqliteStorage,
    conversation: String,
    previous_reply: Option<String>,
}

impl BestMatchEngine {
    /// Opens the configured database and prepares the engine.
    pub fn open(settings: EngineSettings) -> Result<Self> {
        let storage = SqliteStorage::open(&settings.database)?;
        let engine = Self::with_storage(settings, storage);
        info!(
            "Response engine '{}' ready ({} statements in {}, read-only: {})",
            engine.settings.name,
            engine.statement_count()?,
            engine.settings.database.display(),
            engine.settings.read_only
        );
        Ok(engine)
    }

    /// Builds an engine over an already opened store.
    pub fn with_storage(settings: EngineSettings, storage: SqliteStorage) -> Self {
        let conversation = format!("chat-{}", chrono::Utc::now().format("%Y%m%dT%H%M%S%.3f"));
        Self {
            settings,
            storage,
            conversation,
            previous_reply: None,
        }
    }

    /// Number of statements stored for this bot.
    pub fn statement_count(&self) -> Result<usize> {
        self.storage.count(&self.settings.name)
    }

    /// The known prompt closest to `utterance`, with its similarity.
    fn best_match(
        &self,
        utterance: &str,
        cancelled: &AtomicBool,
    ) -> Result<Option<(String, f64)>> {
        let mut best: Option<(String, f64)> = None;
        for prompt in self.storage.prompts(&self.settings.name)? {
            if cancelled.load(Ordering::SeqCst) {
                return Err(cancelled_error());
            }
            let confidence = similarity::levenshtein_ratio(utterance, &prompt);
            if best.as_ref().map_or(true, |(_, c)| confidence > *c) {
                let exact = confidence >= 1.0;
                best = Some((prompt, confidence));
                if exact {
                    break;
                }
            }
        }
        Ok(best)
    }

    fn learn(&self, utterance: &str, reply: &str) -> Result<()> {
        let name = &self.settings.name;
        self.storage.insert(&NewStatement {
            bot: name,
            text: utterance,
            in_response_to: self.previous_reply.as_deref(),
            conversation: &self.conversation,
            persona: "",
        })?;
        let persona = format!("bot:{}", name);
        self.storage.insert(&NewStatement {
            bot: name,
            text: reply,
            in_response_to: Some(utterance),
            conversation: &self.conversation,
            persona: &persona,
        })
    }
}

fn cancelled_error() -> anyhow::Error {
    anyhow!(ChatError::Response("cancelled".to_string()))
}

impl ResponseEngine for BestMatchEngine {
    /// Pairs already trained into this bot are skipped, so repeated startups
    /// do not grow the table.
    fn train(&mut self, pair: &TrainingPair) -> Result<()> {
        let name = &self.settings.name;
        if self
            .storage
            .has_exchange(name, TRAINING_CONVERSATION, &pair.prompt, &pair.response)?
        {
            return Ok(());
        }
        self.storage.insert(&NewStatement {
            bot: name,
            text: &pair.prompt,
            in_response_to: None,
            conversation: TRAINING_CONVERSATION,
            persona: "",
        })?;
        self.storage.insert(&NewStatement {
            bot: name,
            text: &pair.response,
            in_response_to: Some(&pair.prompt),
            conversation: TRAINING_CONVERSATION,
            persona: "",
        })
    }

    fn respond(&mut self, utterance: &str, cancelled: &AtomicBool) -> Result<String> {
        let matching = &self.settings.matching;
        let reply = match self.best_match(utterance, cancelled)? {
            Some((prompt, confidence)) if confidence >= matching.similarity_threshold => {
                debug!("Matched '{}' with confidence {:.2}", prompt, confidence);
                let candidates = self.storage.responses_to(&self.settings.name, &prompt)?;
                matching
                    .selection
                    .select(&candidates)
                    .map(str::to_owned)
                    .unwrap_or_else(|| matching.default_response.clone())
            }
            closest => {
                debug!(
                    "No match above {:.2} (closest: {:?}); using default response",
                    matching.similarity_threshold, closest
                );
                matching.default_response.clone()
            }
        };

        if cancelled.load(Ordering::SeqCst) {
            debug!("Reply to '{}' abandoned; not learning it", utterance);
            return Err(cancelled_error());
        }
        if !self.settings.read_only {
            self.learn(utterance, &reply)?;
        }
        self.previous_reply = Some(reply.clone());
        Ok(reply)
    }

    fn close_storage(&mut self) -> Result<()> {
        self.storage.close()
    }
}
