//! In-memory command runner.
//!
//! Records every [`CommandSpec`] it receives and answers with scripted
//! results. Handlers may also touch the filesystem to simulate a tool's side
//! effects (for example `python -m venv` creating a directory).

use crate::executor::{CommandRunner, CommandSpec, ExecutionOutput};
use crate::Result;
use async_trait::async_trait;
use std::sync::Mutex;

type Handler = Box<dyn Fn(&CommandSpec) -> Result<ExecutionOutput> + Send + Sync>;

/// Command runner that records calls instead of spawning processes.
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<CommandSpec>>,
    handlers: Vec<(String, Handler)>,
}

impl RecordingRunner {
    /// Create a runner where every command succeeds with empty output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands whose program is `program` (or a path ending in
    /// `/program`) with `handler`. Earlier registrations win.
    pub fn on<F>(mut self, program: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&CommandSpec) -> Result<ExecutionOutput> + Send + Sync + 'static,
    {
        self.handlers.push((program.into(), Box::new(handler)));
        self
    }

    /// Answer `program` with a fixed exit code.
    pub fn fail(self, program: impl Into<String>, exit_code: i32) -> Self {
        self.on(program, move |_| Ok(ExecutionOutput::failed(exit_code)))
    }

    /// Answer `program` with fixed stdout.
    pub fn stdout(self, program: impl Into<String>, stdout: impl Into<String>) -> Self {
        let stdout = stdout.into();
        self.on(program, move |_| Ok(ExecutionOutput::ok(stdout.clone())))
    }

    /// Every command received so far, in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Commands whose program matches `program`.
    pub fn calls_to(&self, program: &str) -> Vec<CommandSpec> {
        self.calls()
            .into_iter()
            .filter(|c| matches_program(&c.program, program))
            .collect()
    }
}

fn matches_program(actual: &str, wanted: &str) -> bool {
    actual == wanted
        || actual.ends_with(&format!("/{wanted}"))
        || actual.ends_with(&format!("\\{wanted}"))
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<ExecutionOutput> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(spec.clone());
        }

        for (program, handler) in &self.handlers {
            if matches_program(&spec.program, program) {
                return handler(spec);
            }
        }
        Ok(ExecutionOutput::ok(""))
    }
}
