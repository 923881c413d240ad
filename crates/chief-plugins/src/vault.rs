//! ansible-vault secret files.
//!
//! A vault file is a shell script of `export NAME=value` lines kept
//! encrypted on disk. Loading captures the decrypted script and returns it
//! as shell code; the CLI writes that code to the shell function's private
//! eval file, which the shell sources and deletes. The vault itself is
//! never rewritten in plaintext.

use crate::error::{ensure_success, PluginError, Result};
use chief_core::config::VaultConfig;
use chief_core::env::{shell_quote, vars};
use chief_core::{paths, Session};
use chief_exec::{CommandRunner, CommandSpec};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// First-line prefix of every ansible-vault encrypted file.
pub const VAULT_MARKER: &str = "$ANSIBLE_VAULT;";

/// Editor used when neither config nor `$EDITOR` name one.
pub const FALLBACK_EDITOR: &str = "vi";

/// Whether a file's first line marks it as vault-encrypted.
pub fn is_encrypted_header(first_line: &str) -> bool {
    first_line.trim_start_matches('\u{feff}').starts_with(VAULT_MARKER)
}

/// A vault file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultFileReference {
    pub path: PathBuf,
    pub encrypted: bool,
}

impl VaultFileReference {
    /// Inspect `path`, reading only its first line.
    pub fn inspect(path: &Path) -> Result<Self> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PluginError::FileNotFound(path.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };

        let mut first_line = String::new();
        BufReader::new(file).read_line(&mut first_line)?;

        Ok(Self {
            path: path.to_path_buf(),
            encrypted: is_encrypted_header(&first_line),
        })
    }

    /// Inspect `path` and require it to be encrypted.
    pub fn require_encrypted(path: &Path) -> Result<Self> {
        let reference = Self::inspect(path)?;
        if !reference.encrypted {
            return Err(PluginError::NotEncrypted(reference.path));
        }
        Ok(reference)
    }
}

/// What [`Vault::edit`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// A new vault file was written and encrypted.
    Created,
    /// An existing vault file was edited in place.
    Edited,
}

/// Vault operations bound to a session's settings.
#[derive(Debug, Clone)]
pub struct Vault {
    program: String,
    editor: String,
    default_file: PathBuf,
}

impl Vault {
    /// Resolve settings for `session`.
    ///
    /// The default file is the session's loaded vault (`CHIEF_SECRETS_FILE`),
    /// then `vault.secrets_file`, then `~/.chief_secrets.sh`. The editor is
    /// `vault.editor`, then `$EDITOR`, then `vi`.
    pub fn from_config(session: &Session, config: &VaultConfig) -> Self {
        let default_file = session
            .secrets_file()
            .map(Path::to_path_buf)
            .or_else(|| {
                config
                    .secrets_file
                    .as_ref()
                    .map(|p| session.resolve_path(&p.to_string_lossy()))
            })
            .unwrap_or_else(|| paths::secrets_file(session.home()));

        let editor = config
            .editor
            .clone()
            .or_else(|| session.var(vars::EDITOR).map(str::to_string))
            .unwrap_or_else(|| FALLBACK_EDITOR.to_string());

        Self {
            program: config.program.clone(),
            editor,
            default_file,
        }
    }

    /// File an operation targets.
    pub fn resolve_file(&self, session: &Session, path: Option<&str>) -> PathBuf {
        match path.map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => session.resolve_path(p),
            None => self.default_file.clone(),
        }
    }

    /// Editor command line.
    pub fn editor(&self) -> &str {
        &self.editor
    }

    /// Edit a vault file, creating and encrypting it if it does not exist.
    ///
    /// An existing file must already be encrypted; otherwise
    /// [`PluginError::NotEncrypted`] is returned and nothing is touched.
    pub async fn edit(
        &self,
        session: &Session,
        runner: &dyn CommandRunner,
        path: Option<&str>,
    ) -> Result<(PathBuf, EditOutcome)> {
        let file = self.resolve_file(session, path);

        if file.exists() {
            VaultFileReference::require_encrypted(&file)?;
            let spec = CommandSpec::new(&self.program).arg("edit").path_arg(&file);
            let output = runner.run(&spec).await?;
            ensure_success(&spec, output)?;
            info!("Edited {}", file.display());
            return Ok((file, EditOutcome::Edited));
        }

        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut words = self.editor.split_whitespace();
        let program = words.next().unwrap_or(FALLBACK_EDITOR);
        let spec = CommandSpec::new(program).args(words).path_arg(&file);
        let output = runner.run(&spec).await?;
        ensure_success(&spec, output)?;

        if !file.is_file() {
            return Err(PluginError::FileNotFound(file));
        }

        let spec = CommandSpec::new(&self.program).arg("encrypt").path_arg(&file);
        let output = runner.run(&spec).await?;
        if let Err(e) = ensure_success(&spec, output) {
            warn!("Encryption failed, removing plaintext {}", file.display());
            fs::remove_file(&file)?;
            return Err(e);
        }

        info!("Created encrypted vault {}", file.display());
        Ok((file, EditOutcome::Created))
    }

    /// Decrypt a vault file, returning shell code that loads its variables.
    ///
    /// On success the session records the file as its current vault and the
    /// returned code also exports `CHIEF_SECRETS_FILE`.
    pub async fn load(
        &self,
        session: &mut Session,
        runner: &dyn CommandRunner,
        path: Option<&str>,
    ) -> Result<String> {
        let file = self.resolve_file(session, path);
        VaultFileReference::require_encrypted(&file)?;

        let spec = CommandSpec::new(&self.program)
            .arg("view")
            .path_arg(&file)
            .capture();
        let output = runner.run(&spec).await?;
        if !output.success() {
            return Err(PluginError::DecryptionFailed {
                path: file,
                code: output.exit_code,
            });
        }

        let mut script = output.stdout;
        if !script.is_empty() && !script.ends_with('\n') {
            script.push('\n');
        }
        script.push_str(&format!(
            "export {}={}\n",
            vars::CHIEF_SECRETS_FILE,
            shell_quote(&file.to_string_lossy())
        ));

        session.set_secrets_file(&file);
        info!("Loaded secrets from {}", file.display());
        Ok(script)
    }
}
