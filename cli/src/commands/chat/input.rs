//! # Chat Input Sources
//!
//! File: cli/src/commands/chat/input.rs
//! Author: Christi Mahu
//!
//! The session loop reads one line per turn through [`LineSource`]. The
//! terminal implementation wraps `rustyline` and keeps a history file.
//!
//! Reads block, so the source lives on its own thread behind an
//! [`InputThread`]. The session awaits each line and can stop waiting when
//! Ctrl-C arrives, even if the read itself never returns (piped stdin).
//!
use crate::core::error::{ChatError, Result};
use anyhow::anyhow;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use tokio::sync::mpsc as async_mpsc;
use tracing::debug;

/// Result of one read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// Input stream ended (Ctrl-D or closed stdin).
    EndOfInput,
    /// Ctrl-C at the prompt.
    Interrupted,
}

/// Source of user input lines.
pub trait LineSource {
    /// Shows `prompt` and reads one line.
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome>;

    /// Called once after the last read.
    fn finish(&mut self) {}
}

/// Interactive terminal input with line editing and optional persistent history.
pub struct TerminalInput {
    editor: DefaultEditor,
    history_path: Option<PathBuf>,
}

impl TerminalInput {
    pub fn new(history_path: Option<PathBuf>) -> Result<Self> {
        let mut editor = DefaultEditor::new()
            .map_err(|e| anyhow!(ChatError::Input(format!("failed to set up line editor: {}", e))))?;
        if let Some(ref path) = history_path {
            if editor.load_history(path).is_err() {
                debug!("No prompt history loaded from {}", path.display());
            }
        }
        Ok(Self {
            editor,
            history_path,
        })
    }

    /// Writes history to disk. Failures are only logged.
    pub fn save_history(&mut self) {
        if let Some(ref path) = self.history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Err(e) = self.editor.save_history(path) {
                debug!("Failed to save prompt history to {}: {}", path.display(), e);
            }
        }
    }
}

impl LineSource for TerminalInput {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(ReadOutcome::Line(line))
            }
            Err(ReadlineError::Eof) => Ok(ReadOutcome::EndOfInput),
            Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Interrupted),
            Err(e) => Err(anyhow!(ChatError::Input(e.to_string()))),
        }
    }

    fn finish(&mut self) {
        self.save_history();
    }
}

/// A [`LineSource`] running on a dedicated thread.
pub struct InputThread {
    prompts: mpsc::Sender<String>,
    lines: async_mpsc::UnboundedReceiver<Result<ReadOutcome>>,
    worker: thread::JoinHandle<()>,
    pending: bool,
}

impl InputThread {
    /// Starts the thread and opens the source on it with `open`.
    pub fn spawn<L, F>(open: F) -> Result<Self>
    where
        L: LineSource + 'static,
        F: FnOnce() -> Result<L> + Send + 'static,
    {
        let (prompt_tx, prompt_rx) = mpsc::channel::<String>();
        let (line_tx, line_rx) = async_mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();

        let worker = thread::Builder::new()
            .name("chat-input".to_string())
            .spawn(move || {
                let mut source = match open() {
                    Ok(source) => {
                        let _ = ready_tx.send(Ok(()));
                        source
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                while let Ok(prompt) = prompt_rx.recv() {
                    if line_tx.send(source.read_line(&prompt)).is_err() {
                        break;
                    }
                }
                source.finish();
            })
            .map_err(|e| anyhow!(ChatError::Input(format!("failed to start input thread: {}", e))))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                prompts: prompt_tx,
                lines: line_rx,
                worker,
                pending: false,
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(anyhow!(ChatError::Input(
                "input thread exited during setup".to_string()
            ))),
        }
    }

    /// Reads one line. If this future is dropped before it completes, the
    /// read stays pending and the next call returns its result.
    pub async fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome> {
        if !self.pending {
            self.prompts
                .send(prompt.to_string())
                .map_err(|_| stopped())?;
            self.pending = true;
        }
        let outcome = self.lines.recv().await.unwrap_or_else(|| Err(stopped()));
        self.pending = false;
        outcome
    }

    /// Ends input and waits for the source to finish, unless a read is still
    /// blocked. A blocked thread is left behind.
    pub fn finish(self) {
        let InputThread {
            prompts,
            worker,
            pending,
            ..
        } = self;
        drop(prompts);
        if pending {
            debug!("Input thread is still blocked in a read; not waiting for it.");
            return;
        }
        if worker.join().is_err() {
            debug!("Input thread panicked.");
        }
    }
}

fn stopped() -> anyhow::Error {
    anyhow!(ChatError::Input("input thread stopped".to_string()))
}

/// Replays a fixed script of reads, for tests.
#[cfg(test)]
pub struct ScriptedInput {
    reads: std::collections::VecDeque<Result<ReadOutcome>>,
    prompts: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
    stall: Option<std::time::Duration>,
    finished: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

#[cfg(test)]
impl ScriptedInput {
    pub fn new(reads: Vec<Result<ReadOutcome>>) -> Self {
        Self {
            reads: reads.into(),
            prompts: Default::default(),
            stall: None,
            finished: Default::default(),
        }
    }

    pub fn lines(lines: &[&str]) -> Self {
        Self::new(
            lines
                .iter()
                .map(|l| Ok(ReadOutcome::Line(l.to_string())))
                .collect(),
        )
    }

    /// Once the script runs out, block for `duration` before reporting end of input.
    pub fn stalling(mut self, duration: std::time::Duration) -> Self {
        self.stall = Some(duration);
        self
    }

    /// Every prompt shown so far.
    pub fn prompts(&self) -> std::sync::Arc<std::sync::Mutex<Vec<String>>> {
        std::sync::Arc::clone(&self.prompts)
    }

    pub fn finished(&self) -> std::sync::Arc<std::sync::atomic::AtomicBool> {
        std::sync::Arc::clone(&self.finished)
    }
}

#[cfg(test)]
impl LineSource for ScriptedInput {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.reads.pop_front() {
            Some(read) => read,
            None => {
                if let Some(stall) = self.stall {
                    thread::sleep(stall);
                }
                Ok(ReadOutcome::EndOfInput)
            }
        }
    }

    fn finish(&mut self) {
        self.finished
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }
}
