//! Per-invocation command context.

use crate::render::StdinPrompter;
use chief_core::{paths, Config, Session};
use chief_exec::ProcessRunner;
use console::Term;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Everything a command needs: session, config and the external seams.
pub struct Context {
    pub session: Session,
    pub config: Config,
    pub runner: ProcessRunner,
    pub prompter: StdinPrompter,
    config_path: Option<PathBuf>,
    eval_file: Option<PathBuf>,
}

impl Context {
    /// Build a context for the running process.
    pub fn from_process(config_path: Option<&Path>, eval_file: Option<PathBuf>) -> anyhow::Result<Self> {
        let config = Config::load_or_default(config_path)?;
        let session = Session::from_process()?;
        debug!(
            "Session home={} cwd={} venv={:?}",
            session.home().display(),
            session.cwd().display(),
            session.active_venv()
        );
        let mut ctx = Self::new(session, config, eval_file);
        ctx.config_path = match config_path {
            Some(p) => Some(p.to_path_buf()),
            None => paths::config_file().ok(),
        };
        Ok(ctx)
    }

    /// Build a context from parts.
    pub fn new(session: Session, config: Config, eval_file: Option<PathBuf>) -> Self {
        Self {
            session,
            config,
            runner: ProcessRunner::new(),
            prompter: StdinPrompter,
            config_path: None,
            eval_file,
        }
    }

    /// Config file the configuration was read from, if known.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Whether shell code reaches a wrapper that will evaluate it.
    pub fn has_eval_target(&self) -> bool {
        self.eval_file.is_some()
    }

    /// Refuse to emit `what` when it would only be echoed to a terminal.
    pub fn ensure_eval_target(&self, what: &str) -> anyhow::Result<()> {
        if !self.has_eval_target() && Term::stdout().is_term() {
            anyhow::bail!(
                "refusing to print {what} to the terminal; \
                 add `eval \"$(chief shell-init)\"` to your shell rc file"
            );
        }
        Ok(())
    }

    /// Hand shell code to the calling shell.
    ///
    /// With an eval file (set by the `chief` shell function) the code is
    /// appended there; otherwise it goes to stdout for `eval "$(...)"`.
    pub fn emit_shell(&self, code: &str) -> anyhow::Result<()> {
        match &self.eval_file {
            Some(path) => {
                let mut file = OpenOptions::new().create(true).append(true).open(path)?;
                file.write_all(code.as_bytes())?;
            }
            None => print!("{code}"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_emit_shell_appends_to_eval_file() {
        let dir = TempDir::new().unwrap();
        let eval = dir.path().join("eval.sh");
        let ctx = Context::new(
            Session::new(dir.path(), dir.path()),
            Config::default(),
            Some(eval.clone()),
        );

        ctx.emit_shell("deactivate\n").unwrap();
        ctx.emit_shell(". '/x/bin/activate'\n").unwrap();

        assert!(ctx.has_eval_target());
        assert!(ctx.ensure_eval_target("secrets").is_ok());
        assert_eq!(
            std::fs::read_to_string(eval).unwrap(),
            "deactivate\n. '/x/bin/activate'\n"
        );
    }
}
