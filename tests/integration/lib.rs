//! Shared fixtures for chief integration tests.

use chief_core::Session;
use chief_exec::{CommandSpec, ExecutionOutput, RecordingRunner};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A home and a working directory, both temporary.
pub struct Workspace {
    pub home: TempDir,
    pub cwd: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            home: TempDir::new().unwrap(),
            cwd: TempDir::new().unwrap(),
        }
    }

    /// A fresh session over this workspace.
    pub fn session(&self) -> Session {
        Session::new(self.home.path(), self.cwd.path())
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Last argument of a command, as a path.
pub fn target_of(spec: &CommandSpec) -> PathBuf {
    PathBuf::from(spec.args.last().cloned().unwrap_or_default())
}

/// Runner whose `program` behaves like `python -m venv`: the target
/// directory gets `bin/activate` and `bin/python`.
pub fn venv_runner(program: &str) -> RecordingRunner {
    RecordingRunner::new().on(program, |spec| {
        let bin = target_of(spec).join("bin");
        fs::create_dir_all(&bin)?;
        fs::write(bin.join("activate"), "# activate\n")?;
        fs::write(bin.join("python"), "")?;
        Ok(ExecutionOutput::ok(""))
    })
}
