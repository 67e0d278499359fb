//! # chatrs Command Modules
//!
//! File: cli/src/commands/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module aggregates the top-level commands of the chatrs CLI so that
//! `main.rs` can route to them. Each command defines its own arguments struct
//! and handler function.
//!
//! ## Commands
//!
//! - `chat`: Interactive terminal chat session
//!

/// Interactive chat with the trainable response engine.
pub mod chat;
