//! Shell-session helpers for chief.
//!
//! Each module wraps one family of external tools:
//! - [`venv`]: locate, create, activate and deactivate Python virtual environments
//! - [`ssh`]: generate key pairs, extract public keys, prune `known_hosts`
//! - [`vault`]: edit and load `ansible-vault` encrypted secret files
//! - [`aws`]: switch the default role in `~/.aws/credentials`
//!
//! All operations take an explicit [`chief_core::Session`] and run external
//! programs through a [`chief_exec::CommandRunner`].

pub mod aws;
pub mod error;
pub mod ssh;
pub mod vault;
pub mod venv;

pub use error::{PluginError, Result};
