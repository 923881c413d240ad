//! External command invocation for chief.
//!
//! Every heavy operation chief performs (key generation, encryption, venv
//! creation) is delegated to an external program. This crate provides the
//! [`CommandRunner`] seam those calls go through:
//! - [`ProcessRunner`] spawns real processes on the tokio runtime
//! - [`RecordingRunner`] records invocations and replays scripted results

pub mod error;
pub mod executor;
pub mod recording;

pub use error::ExecError;
pub use executor::{CommandRunner, CommandSpec, ExecutionOutput, OutputMode, ProcessRunner};
pub use recording::RecordingRunner;

/// Result type for exec operations.
pub type Result<T> = std::result::Result<T, ExecError>;
