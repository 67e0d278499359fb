//! # chatrs Error Types
//!
//! File: cli/src/core/error.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module defines the error types used throughout chatrs. Each variant
//! corresponds to one class of failure in a chat session, and the session
//! controller decides per class whether it is fatal, downgraded, or isolated
//! to a single turn.
//!
//! ## Architecture
//!
//! The error system consists of two main components:
//! - `ChatError`: A custom error enum using `thiserror` for specific error types
//! - `Result<T>`: A type alias for `anyhow::Result<T>` for flexible error handling
//!
//! The error types cover:
//! - Configuration errors (engine cannot be constructed, invalid config files)
//! - Training errors (downgraded to a warning by the session)
//! - Response errors (isolated to one conversation turn)
//! - Storage errors (SQLite failures, closed sessions)
//! - Corpus and input errors
//!
//! ## Examples
//!
//! ```rust
//! // Return a specific error type
//! if threshold > 1.0 {
//!     return Err(ChatError::Config(format!("Invalid threshold: {}", threshold)))?;
//! }
//!
//! // Add context to errors using anyhow
//! let content = fs::read_to_string(&path)
//!     .with_context(|| format!("Failed to read corpus file: {}", path.display()))?;
//! ```
//!
use thiserror::Error;

/// Custom error type for chatrs.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Training failed: {0}")]
    Training(String),

    #[error("Error generating response: {0}")]
    Response(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Storage backend failed: {source}")]
    Sqlite {
        #[from]
        source: rusqlite::Error,
    },

    #[error("Corpus error: {0}")]
    Corpus(String),

    #[error("Input error: {0}")]
    Input(String),
}

/// Type alias for Result using anyhow::Error for broad compatibility.
pub type Result<T> = anyhow::Result<T>;
