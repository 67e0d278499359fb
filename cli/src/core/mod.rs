//! # chatrs Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module aggregates the core infrastructure shared by the chat command
//! and the response engine.
//!
//! ## Architecture
//!
//! - `config`: Configuration loading, merging, and validation
//! - `corpus`: The training corpus resource and its pairing rule
//! - `error`: Error types and error handling utilities
//!
//! ## Usage
//!
//! ```rust
//! use crate::core::config; // For loading configuration
//! use crate::core::corpus::{Corpus, TrainingPair}; // For seeding the engine
//! use crate::core::error::{ChatError, Result}; // For error handling
//! ```
//!
pub mod config;
pub mod corpus;
pub mod error;
