//! Library target for the `modpipe` package.
//!
//! The primary deliverable of this package is the `modpipe` CLI binary
//! (`src/main.rs`). The command plumbing lives here so it can be tested
//! without spawning the binary.

pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
