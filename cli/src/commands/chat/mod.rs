//! # chatrs Chat Command
//!
//! File: cli/src/commands/chat/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Entry point for `chatrs chat`: an interactive terminal conversation with
//! a best-match response engine that is seeded from a training corpus and,
//! unless `--read-only` is given, keeps learning from what it is told.
//!
//! ## Architecture
//!
//! - `input.rs`: Line sources (the `rustyline` terminal, scripted input in tests)
//!   and the thread that reads from them
//! - `interrupt.rs`: Ctrl-C delivery to the session
//! - `session.rs`: The session controller (construct, train, loop, teardown)
//!
//! `handle_chat` wires the pieces together: configuration, engine factory,
//! corpus, terminal input, and the Ctrl-C listener.
//!
//! ## Examples
//!
//! ```bash
//! # Chat with the default bot
//! chatrs chat
//!
//! # A separately named bot that does not learn from the conversation
//! chatrs chat --name Rusty --read-only
//! ```
//!
//! Session flow:
//! 1. Load configuration (`.chatrs.toml`, user config, defaults)
//! 2. Open the engine's database (fatal on failure)
//! 3. Train from the corpus (best-effort)
//! 4. Loop until an exit command, end of input, or Ctrl-C
//! 5. Close the database
//!
use crate::core::config::{self, Config};
use crate::core::corpus::Corpus;
use crate::core::error::Result;
use crate::engine::{BestMatchEngine, EngineSettings};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Reads terminal input for the chat loop.
pub mod input;
/// Ctrl-C handling.
pub mod interrupt;
/// Drives a single chat session.
pub mod session;

use input::{InputThread, TerminalInput};
use interrupt::Interrupt;
use session::{ChatSettings, Session, SessionIo};

/// # Chat Command Arguments (`ChatArgs`)
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Bot name (storage identification).
    #[arg(long, default_value = "ChatBot")]
    pub name: String,

    /// Disable learning from conversation.
    #[arg(long)]
    pub read_only: bool,
}

impl From<ChatArgs> for ChatSettings {
    fn from(args: ChatArgs) -> Self {
        Self {
            name: args.name,
            read_only: args.read_only,
        }
    }
}

/// # Handle Chat Command (`handle_chat`)
///
/// Runs one chat session in the terminal.
///
/// ## Returns
///
/// * `Result<()>`: `Err` if configuration is invalid or the engine cannot be
///   constructed. Training, reply and input failures are reported in the
///   session itself and do not fail the command.
pub async fn handle_chat(args: ChatArgs) -> Result<()> {
    info!("Handling chat command with args: {:?}", args);
    let config = config::load_config()?;

    let interrupt = Arc::new(Interrupt::default());
    let listener = interrupt::spawn_listener(Arc::clone(&interrupt));

    let mut session = Session::start(
        ChatSettings::from(args),
        |settings| BestMatchEngine::open(engine_settings(settings, &config)),
        SessionIo::stdio(),
        interrupt,
    )?;

    if config.training.enabled {
        session.train(Corpus::load(&config.training).map(|corpus| corpus.pairs()));
    } else {
        info!("Startup training disabled by configuration.");
    }

    let history = if config.history.enabled {
        history_path()
    } else {
        None
    };
    let mut input = InputThread::spawn(move || TerminalInput::new(history))?;
    let exit = session.run(&mut input).await;
    input.finish();
    listener.abort();

    debug!("Chat session finished: {:?} ({:?})", exit, session.state());
    Ok(())
}

/// Engine parameters for `settings` under the loaded configuration.
fn engine_settings(settings: &ChatSettings, config: &Config) -> EngineSettings {
    EngineSettings {
        name: settings.name.clone(),
        read_only: settings.read_only,
        database: PathBuf::from(&config.storage.database),
        matching: config.matching.clone(),
    }
}

/// Prompt history file in the user data directory.
fn history_path() -> Option<PathBuf> {
    config::project_dirs().map(|dirs| dirs.data_dir().join("history"))
}
