//! Virtual environment lifecycle: create, start, stop, dependencies.

use super::resolver::{
    activation_script, is_explicit_path, python_bin, resolve, validate_name, VenvDescriptor,
};
use crate::error::{ensure_success, PluginError, Result};
use chief_core::env::shell_quote;
use chief_core::{Prompter, Session};
use chief_exec::{CommandRunner, CommandSpec};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Options for [`create`].
#[derive(Debug, Clone)]
pub struct CreateOptions {
    /// Interpreter to create the environment with.
    pub python: String,

    /// Create `./.name` instead of `~/.name`.
    pub local: bool,

    /// Record local environments in `./.gitignore`.
    pub gitignore: bool,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            local: false,
            gitignore: true,
        }
    }
}

/// Result of [`create`].
#[derive(Debug, Clone)]
pub struct CreatedVenv {
    /// The new environment.
    pub venv: VenvDescriptor,

    /// A `.gitignore` line was written for it.
    pub ignored: bool,

    /// An existing environment was cleared and rebuilt.
    pub recreated: bool,
}

/// Result of [`start`].
#[derive(Debug, Clone)]
pub struct Activation {
    /// The activated environment.
    pub venv: VenvDescriptor,

    /// Script the shell must source.
    pub script: PathBuf,

    /// Environment deactivated to make room for this one.
    pub replaced: Option<PathBuf>,
}

impl Activation {
    /// Shell code that performs the activation in the calling shell.
    pub fn shell_code(&self) -> String {
        let mut code = String::new();
        if self.replaced.is_some() {
            code.push_str("deactivate\n");
        }
        code.push_str(&format!(
            ". {}\n",
            shell_quote(&self.script.to_string_lossy())
        ));
        code
    }
}

/// Directory a new environment is created in.
///
/// - explicit path: that path
/// - `name`: `~/.name`, or `./.name` when `local`
/// - no name: `./.venv`
pub fn creation_target(session: &Session, name: Option<&str>, local: bool) -> Result<PathBuf> {
    validate_name(name)?;
    Ok(match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) if is_explicit_path(n) => session.resolve_path(n),
        Some(n) if local => session.cwd().join(format!(".{n}")),
        Some(n) => session.home().join(format!(".{n}")),
        None => session.cwd().join(".venv"),
    })
}

/// Create a virtual environment and upgrade its pip.
///
/// An existing target is only rebuilt (`venv --clear`) after the user
/// confirms; otherwise [`PluginError::AlreadyExists`] is returned.
pub async fn create(
    session: &Session,
    runner: &dyn CommandRunner,
    prompter: &dyn Prompter,
    name: Option<&str>,
    options: &CreateOptions,
) -> Result<CreatedVenv> {
    let target = creation_target(session, name, options.local)?;
    let existed = target.exists();

    if existed {
        let question = format!("{} already exists. Recreate it?", target.display());
        if !prompter.confirm(&question, false)? {
            return Err(PluginError::AlreadyExists(target));
        }
    }

    let mut spec = CommandSpec::new(&options.python).args(["-m", "venv"]);
    if existed {
        spec = spec.arg("--clear");
    }
    let spec = spec.path_arg(&target);

    let output = runner.run(&spec).await?;
    if let Err(e) = ensure_success(&spec, output) {
        if !existed && target.exists() {
            warn!("Removing partial environment at {}", target.display());
            fs::remove_dir_all(&target)?;
        }
        return Err(e);
    }

    let pip = CommandSpec::new(python_bin(&target).to_string_lossy())
        .args(["-m", "pip", "install", "--upgrade", "pip"]);
    let output = runner.run(&pip).await?;
    ensure_success(&pip, output)?;

    let venv = VenvDescriptor::at(session, target, options.python.clone());
    let ignored = if venv.is_local && options.gitignore {
        add_to_gitignore(session.cwd(), &venv.path)?
    } else {
        false
    };

    info!("Created virtual environment {}", venv.path.display());
    Ok(CreatedVenv {
        venv,
        ignored,
        recreated: existed,
    })
}

/// Append `venv` (relative to `cwd`) to `cwd/.gitignore` unless listed.
fn add_to_gitignore(cwd: &Path, venv: &Path) -> Result<bool> {
    let relative = venv.strip_prefix(cwd).unwrap_or(venv);
    let entry = relative.to_string_lossy().replace('\\', "/");
    let entry = entry.trim_end_matches('/');

    let path = cwd.join(".gitignore");
    let existing = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    let listed = existing.lines().any(|line| {
        let line = line.trim().trim_start_matches('/').trim_end_matches('/');
        line == entry
    });
    if listed {
        debug!("{} already lists {}", path.display(), entry);
        return Ok(false);
    }

    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if !existing.is_empty() && !existing.ends_with('\n') {
        writeln!(file)?;
    }
    writeln!(file, "{}/", entry)?;
    Ok(true)
}

/// Activate an environment in `session`.
///
/// Only one environment is active at a time: if another one is, the user
/// must confirm deactivating it, otherwise [`PluginError::Cancelled`].
pub fn start(
    session: &mut Session,
    prompter: &dyn Prompter,
    name: Option<&str>,
) -> Result<Activation> {
    let venv = resolve(session, name)?;

    let script = activation_script(&venv.path);
    if !script.is_file() {
        return Err(PluginError::ActivationScriptMissing(script));
    }

    let replaced = match session.active_venv() {
        Some(active) => {
            let question = format!(
                "{} is active. Deactivate it and activate {}?",
                active.display(),
                venv.path.display()
            );
            if !prompter.confirm(&question, true)? {
                return Err(PluginError::Cancelled(format!(
                    "{} is still active",
                    active.display()
                )));
            }
            session.clear_active_venv()
        }
        None => None,
    };

    session.set_active_venv(&venv.path);
    info!("Activated {}", venv.path.display());
    Ok(Activation {
        venv,
        script,
        replaced,
    })
}

/// Deactivate the active environment, returning its path.
pub fn stop(session: &mut Session) -> Result<PathBuf> {
    let previous = session.clear_active_venv().ok_or(PluginError::NoActiveVenv)?;
    info!("Deactivated {}", previous.display());
    Ok(previous)
}

/// Install a requirements file into the active environment.
pub async fn install_requirements(
    session: &Session,
    runner: &dyn CommandRunner,
    file: Option<&str>,
) -> Result<PathBuf> {
    let venv = session.active_venv().ok_or(PluginError::NoActiveVenv)?;
    let requirements = session.resolve_path(file.unwrap_or("requirements.txt"));
    if !requirements.is_file() {
        return Err(PluginError::FileNotFound(requirements));
    }

    let spec = CommandSpec::new(python_bin(venv).to_string_lossy())
        .args(["-m", "pip", "install", "-r"])
        .path_arg(&requirements)
        .current_dir(session.cwd());
    let output = runner.run(&spec).await?;
    ensure_success(&spec, output)?;
    Ok(requirements)
}

/// Write the active environment's installed packages to a requirements file.
///
/// Returns the file written and the number of packages listed.
pub async fn freeze(
    session: &Session,
    runner: &dyn CommandRunner,
    file: Option<&str>,
) -> Result<(PathBuf, usize)> {
    let venv = session.active_venv().ok_or(PluginError::NoActiveVenv)?;
    let target = session.resolve_path(file.unwrap_or("requirements.txt"));

    let spec = CommandSpec::new(python_bin(venv).to_string_lossy())
        .args(["-m", "pip", "freeze"])
        .capture();
    let output = runner.run(&spec).await?;
    let output = ensure_success(&spec, output)?;

    let count = output
        .stdout
        .lines()
        .filter(|l| !l.trim().is_empty() && !l.trim_start().starts_with('#'))
        .count();
    fs::write(&target, &output.stdout)?;
    Ok((target, count))
}
