//! Plugin error types.

use chief_core::ConfigError;
use chief_exec::{CommandSpec, ExecError, ExecutionOutput};
use std::path::PathBuf;
use thiserror::Error;

/// Result type for plugin operations.
pub type Result<T> = std::result::Result<T, PluginError>;

/// Errors surfaced by plugin operations.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("{0} is not an ansible-vault encrypted file")]
    NotEncrypted(PathBuf),

    #[error("Activation script not found: {0}")]
    ActivationScriptMissing(PathBuf),

    #[error("{program} failed with exit code {code}")]
    ExternalCommandFailed { program: String, code: i32 },

    #[error("Failed to decrypt {path} (exit code {code})")]
    DecryptionFailed { path: PathBuf, code: i32 },

    #[error("Virtual environment '{name}' not found")]
    VenvNotFound { name: String, searched: Vec<PathBuf> },

    #[error("No virtual environment is active")]
    NoActiveVenv,

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl PluginError {
    /// Create a new invalid argument error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Process exit status for this error.
    ///
    /// Child failures pass the child's code through; everything else is 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ExternalCommandFailed { code, .. } | Self::DecryptionFailed { code, .. } => {
                u8::try_from(*code).ok().filter(|c| *c != 0).unwrap_or(1)
            }
            _ => 1,
        }
    }
}

/// Turn a non-zero exit into [`PluginError::ExternalCommandFailed`].
pub(crate) fn ensure_success(spec: &CommandSpec, output: ExecutionOutput) -> Result<ExecutionOutput> {
    if output.success() {
        Ok(output)
    } else {
        Err(PluginError::ExternalCommandFailed {
            program: spec.program.clone(),
            code: output.exit_code,
        })
    }
}
