//! Command execution.

use crate::error::ExecError;
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

/// How the child's stdout is handled. Stdin and stderr always stay attached
/// to the terminal so interactive tools (editors, password prompts) work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Child writes straight to the terminal.
    #[default]
    Inherit,
    /// Child's stdout is captured into [`ExecutionOutput::stdout`].
    Capture,
}

/// A single external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program name or path.
    pub program: String,

    /// Arguments.
    pub args: Vec<String>,

    /// Working directory (inherits the parent's when unset).
    pub cwd: Option<PathBuf>,

    /// Extra environment variables.
    pub env: HashMap<String, String>,

    /// Stdout handling.
    pub output: OutputMode,
}

impl CommandSpec {
    /// Create a new command for `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: HashMap::new(),
            output: OutputMode::Inherit,
        }
    }

    /// Append an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a path argument.
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory.
    pub fn current_dir(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Set an environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Capture stdout instead of passing it through.
    pub fn capture(mut self) -> Self {
        self.output = OutputMode::Capture;
        self
    }

    /// Whether any argument equals `arg`.
    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Output from command execution.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOutput {
    /// Exit code (0 for success, -1 when killed by a signal).
    pub exit_code: i32,

    /// Captured standard output (empty unless [`OutputMode::Capture`]).
    pub stdout: String,

    /// Execution duration in milliseconds.
    pub duration_ms: u64,

    /// Signal that killed the process (if any).
    pub signal: Option<i32>,
}

impl ExecutionOutput {
    /// A successful run with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Default::default()
        }
    }

    /// A failed run with the given exit code.
    pub fn failed(exit_code: i32) -> Self {
        Self {
            exit_code,
            ..Default::default()
        }
    }

    /// Check if execution was successful.
    pub fn success(&self) -> bool {
        self.exit_code == 0 && self.signal.is_none()
    }
}

/// Runs external commands.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `spec` to completion.
    ///
    /// A non-zero exit is reported through [`ExecutionOutput`], not as an
    /// error; errors mean the command could not be run at all.
    async fn run(&self, spec: &CommandSpec) -> Result<ExecutionOutput>;
}

/// Runs commands as real child processes.
pub struct ProcessRunner {
    /// Maximum captured output size.
    max_output_size: usize,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner {
    /// Create a new process runner.
    pub fn new() -> Self {
        Self {
            max_output_size: 10 * 1024 * 1024, // 10 MB default
        }
    }

    /// Set maximum captured output size.
    pub fn with_max_output_size(mut self, size: usize) -> Self {
        self.max_output_size = size;
        self
    }

    /// Check that `program` can be found, either as a path or on PATH.
    pub fn locate(program: &str) -> Result<PathBuf> {
        if program.contains('/') || program.contains('\\') {
            let path = PathBuf::from(program);
            if path.exists() {
                return Ok(path);
            }
            return Err(ExecError::NotInstalled(program.to_string()));
        }
        which::which(program).map_err(|_| ExecError::NotInstalled(program.to_string()))
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<ExecutionOutput> {
        debug!("Executing command: {}", spec);
        let program = Self::locate(&spec.program)?;
        let start = Instant::now();

        let mut cmd = Command::new(&program);
        cmd.args(&spec.args)
            .envs(&spec.env)
            .stdin(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }
        cmd.stdout(match spec.output {
            OutputMode::Inherit => Stdio::inherit(),
            OutputMode::Capture => Stdio::piped(),
        });

        let mut child = cmd
            .spawn()
            .map_err(|e| ExecError::spawn_failed(&spec.program, e))?;

        let captured = match child.stdout.take() {
            Some(handle) => match read_capped(handle, self.max_output_size).await {
                Ok(bytes) if bytes.len() <= self.max_output_size => Some(bytes),
                Ok(_) => {
                    warn!("{} exceeded {} bytes of output", spec.program, self.max_output_size);
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                    return Err(ExecError::OutputTooLarge {
                        program: spec.program.clone(),
                        limit: self.max_output_size,
                    });
                }
                Err(e) => {
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                    return Err(e.into());
                }
            },
            None => None,
        };

        let status = child
            .wait()
            .await
            .map_err(|e| ExecError::spawn_failed(&spec.program, e))?;

        let exit_code = status.code().unwrap_or(-1);
        let signal = if !status.success() && status.code().is_none() {
            #[cfg(unix)]
            {
                use std::os::unix::process::ExitStatusExt;
                status.signal()
            }
            #[cfg(not(unix))]
            {
                None
            }
        } else {
            None
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        debug!(exit_code, duration_ms, "{} finished", spec.program);

        let stdout = match captured {
            Some(bytes) => String::from_utf8(bytes).map_err(|_| ExecError::InvalidOutput {
                program: spec.program.clone(),
            })?,
            None => String::new(),
        };

        Ok(ExecutionOutput {
            exit_code,
            stdout,
            duration_ms,
            signal,
        })
    }
}

/// Read a stream to the end, stopping one byte past `max_size` so an
/// oversized stream is detectable without buffering all of it.
async fn read_capped(handle: impl AsyncRead + Unpin, max_size: usize) -> std::io::Result<Vec<u8>> {
    let mut output = Vec::new();
    handle
        .take(max_size as u64 + 1)
        .read_to_end(&mut output)
        .await?;
    Ok(output)
}
