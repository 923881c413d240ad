//! Exec error types.

use std::io;
use thiserror::Error;

/// Errors that can occur while invoking an external command.
#[derive(Debug, Error)]
pub enum ExecError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The program could not be found on PATH.
    #[error("'{0}' is not installed or not on PATH")]
    NotInstalled(String),

    /// The process could not be spawned or awaited.
    #[error("Failed to run {program}: {reason}")]
    SpawnFailed { program: String, reason: String },

    /// Captured output went over the runner's size limit.
    #[error("Output of {program} exceeded {limit} bytes")]
    OutputTooLarge { program: String, limit: usize },

    /// Captured output was not valid UTF-8.
    #[error("Output of {program} is not valid UTF-8")]
    InvalidOutput { program: String },
}

impl ExecError {
    /// Create a new spawn failure.
    pub fn spawn_failed(program: impl Into<String>, reason: impl ToString) -> Self {
        Self::SpawnFailed {
            program: program.into(),
            reason: reason.to_string(),
        }
    }
}
