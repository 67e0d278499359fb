//! # chatrs CLI Main Integration Tests
//!
//! File: cli/tests/main_tests.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Verifies the top-level behavior of the `chatrs` command-line interface:
//! standard flags and argument errors.
//!

mod common;
use common::*;
use predicates::prelude::*;

#[test]
fn test_help_lists_chat() {
    chatrs_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chat"));
}

#[test]
fn test_chat_help_lists_options() {
    chatrs_cmd()
        .args(["chat", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--name"))
        .stdout(predicate::str::contains("--read-only"));
}

#[test]
fn test_unknown_subcommand_fails() {
    chatrs_cmd().arg("serve").assert().failure();
}
