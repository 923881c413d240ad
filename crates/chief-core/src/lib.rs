//! # chief-core
//!
//! Core types, configuration, and session state for chief.
//!
//! This crate provides shared functionality used across all chief crates:
//!
//! - **Configuration**: Loading, validation, and persistence of `chief.json5`
//! - **Session**: The explicit "current shell" context (home, cwd, active venv,
//!   secrets file) threaded through every operation
//! - **Utilities**: Path resolution, environment lookups, and confirmation prompts

pub mod config;
pub mod env;
pub mod error;
pub mod paths;
pub mod prompt;
pub mod session;

// Re-exports for convenience
pub use config::Config;
pub use error::ConfigError;
pub use prompt::{Prompter, ScriptedPrompter};
pub use session::Session;
