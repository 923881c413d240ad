//! Shell session context.
//!
//! A [`Session`] stands in for "the current shell": where home is, which
//! directory commands run from, which environment variables are visible,
//! which virtual environment is active and which vault file was last loaded.
//! Operations take it by reference instead of reading and mutating process
//! globals, so the CLI builds one from the process and tests build one over
//! temporary directories.

use crate::env::{self, vars};
use crate::error::ConfigError;
use crate::paths;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The current shell session.
#[derive(Debug, Clone)]
pub struct Session {
    home: PathBuf,
    cwd: PathBuf,
    vars: HashMap<String, String>,
    active_venv: Option<PathBuf>,
    secrets_file: Option<PathBuf>,
}

impl Session {
    /// Create a session rooted at `home` and `cwd` with an empty environment.
    pub fn new(home: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            cwd: cwd.into(),
            vars: HashMap::new(),
            active_venv: None,
            secrets_file: None,
        }
    }

    /// Build a session from the running process.
    ///
    /// `VIRTUAL_ENV` seeds the active venv and `CHIEF_SECRETS_FILE` the
    /// current vault file.
    pub fn from_process() -> Result<Self, ConfigError> {
        let home = paths::home_dir()?;
        let cwd = std::env::current_dir()?;
        Ok(Self::new(home, cwd).with_vars(env::snapshot()))
    }

    /// Replace the environment snapshot, re-deriving session markers from it.
    pub fn with_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.vars = vars;
        self.active_venv = self.var(vars::VIRTUAL_ENV).map(PathBuf::from);
        self.secrets_file = self.var(vars::CHIEF_SECRETS_FILE).map(PathBuf::from);
        self
    }

    /// Set a single environment variable.
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut vars = std::mem::take(&mut self.vars);
        vars.insert(key.into(), value.into());
        self.with_vars(vars)
    }

    /// Home directory.
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Look up an environment variable, treating empty values as unset.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Resolve a user-supplied path: expand `~`, anchor relative paths at
    /// the working directory and fold `.`/`..`.
    pub fn resolve_path(&self, raw: &str) -> PathBuf {
        let expanded = paths::expand_tilde(raw, &self.home);
        paths::absolutize(&expanded, &self.cwd)
    }

    /// Currently active virtual environment.
    pub fn active_venv(&self) -> Option<&Path> {
        self.active_venv.as_deref()
    }

    /// Mark a virtual environment as active.
    pub fn set_active_venv(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.vars.insert(
            vars::VIRTUAL_ENV.to_string(),
            path.to_string_lossy().into_owned(),
        );
        self.active_venv = Some(path);
    }

    /// Clear the active virtual environment, returning it.
    pub fn clear_active_venv(&mut self) -> Option<PathBuf> {
        self.vars.remove(vars::VIRTUAL_ENV);
        self.active_venv.take()
    }

    /// Vault file loaded into this session, if any.
    pub fn secrets_file(&self) -> Option<&Path> {
        self.secrets_file.as_deref()
    }

    /// Record the vault file loaded into this session.
    pub fn set_secrets_file(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.vars.insert(
            vars::CHIEF_SECRETS_FILE.to_string(),
            path.to_string_lossy().into_owned(),
        );
        self.secrets_file = Some(path);
    }
}
