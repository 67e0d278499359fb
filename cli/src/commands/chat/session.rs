//! # Chat Session Controller
//!
//! File: cli/src/commands/chat/session.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Drives one terminal chat session end to end:
//!
//! `Configuring → EngineReady → (Training →) Looping → Closed`
//!
//! - Construction failure is fatal and reported as a configuration error.
//! - Training is best-effort: the first failing pair abandons the rest of the
//!   pass, a warning is printed and the session carries on.
//! - Each loop turn is isolated: a failed reply is reported and the loop
//!   re-prompts. End of input and Ctrl-C at the prompt act as `exit`; Ctrl-C
//!   while a reply is generated ends the session at once.
//! - Storage is closed exactly once, whichever way the loop ends.
//!
//! The engine call runs on a blocking task so the interrupt can end the wait.
//! An abandoned call sees the interrupt flag and stores nothing; if it still
//! holds the engine when the session closes, storage is closed as soon as it
//! lets go.
//!
use crate::commands::chat::input::{InputThread, ReadOutcome};
use crate::commands::chat::interrupt::Interrupt;
use crate::core::corpus::TrainingPair;
use crate::core::error::{ChatError, Result};
use crate::engine::ResponseEngine;
use anyhow::{anyhow, Context};
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError, TryLockError};
use tracing::{debug, info, warn};

pub const PROMPT: &str = "You: ";
const REPLY_PREFIX: &str = "ChatBot: ";
const EXIT_SENTINEL: &str = "exit";
const EXIT_COMMANDS: [&str; 4] = ["exit", "quit", "bye", "goodbye"];
const FAREWELL: &str = "ChatBot: Goodbye! It was nice chatting with you!";
const INTERRUPTED_FAREWELL: &str = "\nChatBot: Goodbye!";

/// Identity and learning mode, fixed for the whole session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSettings {
    pub name: String,
    pub read_only: bool,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            name: "ChatBot".to_string(),
            read_only: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    EngineReady,
    Training,
    Looping,
    Closed,
}

/// Why the interactive loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// An exit command, end of input, or Ctrl-C at the prompt.
    Farewell,
    /// Ctrl-C while a reply was being generated.
    Interrupted,
    /// Reading input failed.
    InputError,
}

/// Output streams of a session.
pub struct SessionIo {
    pub out: Box<dyn Write + Send>,
    pub err: Box<dyn Write + Send>,
}

impl SessionIo {
    pub fn stdio() -> Self {
        Self {
            out: Box::new(std::io::stdout()),
            err: Box::new(std::io::stderr()),
        }
    }
}

enum Turn {
    Reply(String),
    Failed(anyhow::Error),
    Interrupted,
}

/// True if `text` (already trimmed) ends the session.
pub fn is_exit_command(text: &str) -> bool {
    let lowered = text.to_lowercase();
    EXIT_COMMANDS.contains(&lowered.as_str())
}

pub struct Session<E: ResponseEngine> {
    settings: ChatSettings,
    engine: Arc<Mutex<E>>,
    state: SessionState,
    io: SessionIo,
    interrupt: Arc<Interrupt>,
}

impl<E: ResponseEngine> Session<E> {
    /// Constructs the engine. A construction failure aborts the session.
    pub fn start<F>(
        settings: ChatSettings,
        construct: F,
        io: SessionIo,
        interrupt: Arc<Interrupt>,
    ) -> Result<Self>
    where
        F: FnOnce(&ChatSettings) -> Result<E>,
    {
        debug!("Constructing response engine for '{}'", settings.name);
        let engine = construct(&settings).map_err(|e| {
            anyhow!(ChatError::Config(format!(
                "Failed to initialize {}: {:#}",
                settings.name, e
            )))
        })?;
        Ok(Self {
            settings,
            engine: Arc::new(Mutex::new(engine)),
            state: SessionState::EngineReady,
            io,
            interrupt,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Trains on `pairs` in order. Any failure, including a corpus that could
    /// not be loaded, is printed as a warning and the session continues.
    /// Returns whether the whole pass succeeded.
    pub fn train(&mut self, pairs: Result<Vec<TrainingPair>>) -> bool {
        self.state = SessionState::Training;
        let outcome = pairs.and_then(|pairs| self.train_pairs(&pairs));
        self.state = SessionState::EngineReady;

        match outcome {
            Ok(count) => {
                info!("Trained {} pairs", count);
                let line = format!("{} has been trained and is ready to chat!", self.settings.name);
                self.say(&line);
                true
            }
            Err(e) => {
                warn!("Training aborted: {:#}", e);
                let err = ChatError::Training(format!("{:#}", e));
                self.say(&err.to_string());
                self.say("Continuing without additional training...");
                false
            }
        }
    }

    fn train_pairs(&self, pairs: &[TrainingPair]) -> Result<usize> {
        let mut engine = self.engine.lock().unwrap_or_else(PoisonError::into_inner);
        for (index, pair) in pairs.iter().enumerate() {
            if self.interrupt.is_raised() {
                return Err(anyhow!("interrupted after {} of {} pairs", index, pairs.len()));
            }
            engine
                .train(pair)
                .with_context(|| format!("pair {} ('{}')", index + 1, pair.prompt))?;
        }
        Ok(pairs.len())
    }

    /// Runs the interactive loop until it ends, then closes storage.
    pub async fn run(&mut self, input: &mut InputThread) -> LoopExit {
        self.state = SessionState::Looping;
        self.say("Chat started! Type 'exit', 'quit', or 'bye' to end the conversation.");
        self.say("Try saying: 'Good morning! How are you doing?'");
        self.say(&"=".repeat(50));

        let exit = loop {
            let _ = self.io.out.flush();
            let read = tokio::select! {
                biased;
                _ = self.interrupt.raised() => Ok(ReadOutcome::Interrupted),
                read = input.read_line(PROMPT) => read,
            };
            let line = match read {
                Ok(ReadOutcome::Line(line)) => line,
                Ok(ReadOutcome::EndOfInput) => EXIT_SENTINEL.to_string(),
                Ok(ReadOutcome::Interrupted) => {
                    self.say("^C");
                    EXIT_SENTINEL.to_string()
                }
                Err(e) => {
                    self.diagnose(&format!("{:#}", e));
                    break LoopExit::InputError;
                }
            };

            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            if is_exit_command(text) {
                self.say(FAREWELL);
                break LoopExit::Farewell;
            }

            match self.respond(text).await {
                Turn::Reply(reply) => self.say(&format!("{}{}", REPLY_PREFIX, reply)),
                Turn::Failed(e) => {
                    let err = ChatError::Response(format!("{:#}", e));
                    self.diagnose(&err.to_string());
                }
                Turn::Interrupted => {
                    self.say(INTERRUPTED_FAREWELL);
                    break LoopExit::Interrupted;
                }
            }
        };

        debug!("Chat loop ended: {:?}", exit);
        self.close();
        exit
    }

    async fn respond(&self, text: &str) -> Turn {
        let engine = Arc::clone(&self.engine);
        let interrupt = Arc::clone(&self.interrupt);
        let utterance = text.to_owned();
        // A panic in an earlier turn poisons the lock; the engine is still usable.
        let task = tokio::task::spawn_blocking(move || {
            let mut engine = engine.lock().unwrap_or_else(PoisonError::into_inner);
            engine.respond(&utterance, interrupt.flag())
        });

        tokio::select! {
            biased;
            _ = self.interrupt.raised() => Turn::Interrupted,
            joined = task => match joined {
                Ok(Ok(reply)) => Turn::Reply(reply),
                Ok(Err(e)) => Turn::Failed(e),
                Err(e) if e.is_panic() => Turn::Failed(anyhow!("response engine panicked")),
                Err(e) => Turn::Failed(anyhow!(e)),
            },
        }
    }

    /// Releases the storage session once; failures are ignored. Never waits
    /// for an abandoned reply: if one still holds the engine, closing is
    /// handed to a background task that runs once it is done.
    fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;
        match self.engine.try_lock() {
            Ok(mut engine) => close_storage(&mut *engine),
            Err(TryLockError::Poisoned(poisoned)) => close_storage(&mut *poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => {
                debug!("A reply is still running; closing storage once it finishes.");
                let engine = Arc::clone(&self.engine);
                let deferred = move || {
                    let mut engine = engine.lock().unwrap_or_else(PoisonError::into_inner);
                    close_storage(&mut *engine);
                };
                match tokio::runtime::Handle::try_current() {
                    Ok(runtime) => {
                        runtime.spawn_blocking(deferred);
                    }
                    Err(_) => {
                        std::thread::spawn(deferred);
                    }
                }
            }
        }
    }

    fn say(&mut self, line: &str) {
        let _ = writeln!(self.io.out, "{}", line);
    }

    fn diagnose(&mut self, line: &str) {
        let _ = writeln!(self.io.err, "{}", line);
    }
}

impl<E: ResponseEngine> Drop for Session<E> {
    fn drop(&mut self) {
        self.close();
    }
}

fn close_storage<E: ResponseEngine>(engine: &mut E) {
    if let Err(e) = engine.close_storage() {
        debug!("Ignoring storage close failure: {:#}", e);
    }
}
