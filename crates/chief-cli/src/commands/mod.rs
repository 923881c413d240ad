//! CLI command implementations.

pub mod aws;
pub mod config;
pub mod doctor;
pub mod shell;
pub mod ssh;
pub mod vault;
pub mod venv;
