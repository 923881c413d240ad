//! SSH key utilities.
//!
//! Key generation and public key extraction go through `ssh-keygen`, key
//! loading through `ssh-add`. `known_hosts` pruning is done in place.

use crate::error::{ensure_success, PluginError, Result};
use chief_core::config::{KeyType, SshConfig};
use chief_core::env::vars;
use chief_core::{paths, Prompter, Session};
use chief_exec::{CommandRunner, CommandSpec};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Key length requested for RSA keys.
pub const RSA_BITS: u32 = 4096;

/// Mode of the key directory.
pub const DIR_MODE: u32 = 0o700;

/// Mode of private key files.
pub const PRIVATE_KEY_MODE: u32 = 0o600;

/// Mode of public key files.
pub const PUBLIC_KEY_MODE: u32 = 0o644;

/// Everything needed for one `ssh-keygen` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPairSpec {
    pub name: String,
    pub algorithm: KeyType,
    /// Fixed by algorithm: 4096 for RSA, unset for Ed25519.
    pub bits: Option<u32>,
    pub comment: String,
    pub private_path: PathBuf,
    pub public_path: PathBuf,
}

impl KeyPairSpec {
    /// Plan a key pair in `dir`.
    ///
    /// Without a name the standard `id_<type>` files are used; a custom
    /// name becomes `<name>.key` / `<name>.key.pub`.
    pub fn new(dir: &Path, name: Option<&str>, algorithm: KeyType, comment: &str) -> Result<Self> {
        let file_name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) if n.contains('/') || n.contains('\\') || n.starts_with('.') => {
                return Err(PluginError::invalid(format!(
                    "key name '{n}' must be a plain file name"
                )));
            }
            Some(n) => format!("{n}.key"),
            None => format!("id_{}", algorithm.as_str()),
        };

        let private_path = dir.join(&file_name);
        let public_path = dir.join(format!("{file_name}.pub"));
        let bits = match algorithm {
            KeyType::Rsa => Some(RSA_BITS),
            KeyType::Ed25519 => None,
        };

        Ok(Self {
            name: file_name,
            algorithm,
            bits,
            comment: comment.to_string(),
            private_path,
            public_path,
        })
    }

    /// The `ssh-keygen` invocation for this key pair.
    pub fn command(&self) -> CommandSpec {
        let mut spec = CommandSpec::new("ssh-keygen").args(["-t", self.algorithm.as_str()]);
        if let Some(bits) = self.bits {
            spec = spec.arg("-b").arg(bits.to_string());
        }
        spec.arg("-C")
            .arg(self.comment.clone())
            .arg("-f")
            .path_arg(&self.private_path)
    }

    fn remove_files(&self) -> Result<()> {
        for path in [&self.private_path, &self.public_path] {
            match fs::remove_file(path) {
                Ok(()) => debug!("Removed {}", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

/// A private key with a matching `.pub` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPairEntry {
    pub name: String,
    pub private_path: PathBuf,
    pub public_path: PathBuf,
}

/// The SSH key directory.
#[derive(Debug, Clone)]
pub struct SshDir {
    path: PathBuf,
}

impl SshDir {
    /// Use `path` as the key directory.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Key directory from config, defaulting to `~/.ssh`.
    pub fn from_config(session: &Session, config: &SshConfig) -> Self {
        match &config.dir {
            Some(dir) => Self::new(session.resolve_path(&dir.to_string_lossy())),
            None => Self::new(paths::ssh_dir(session.home())),
        }
    }

    /// Directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The `known_hosts` file.
    pub fn known_hosts(&self) -> PathBuf {
        self.path.join("known_hosts")
    }

    /// Generate a key pair.
    ///
    /// Existing target files are only replaced after confirmation. If
    /// `ssh-keygen` fails, whatever it left behind is removed.
    pub async fn create_key_pair(
        &self,
        session: &Session,
        runner: &dyn CommandRunner,
        prompter: &dyn Prompter,
        name: Option<&str>,
        algorithm: KeyType,
        email: Option<&str>,
    ) -> Result<KeyPairSpec> {
        let comment = email
            .map(str::to_string)
            .or_else(|| session.var(vars::USER).map(str::to_string))
            .unwrap_or_else(|| "chief".to_string());
        let key = KeyPairSpec::new(&self.path, name, algorithm, &comment)?;

        self.ensure_dir()?;

        if key.private_path.exists() || key.public_path.exists() {
            let question = format!("{} already exists. Overwrite it?", key.private_path.display());
            if !prompter.confirm(&question, false)? {
                return Err(PluginError::AlreadyExists(key.private_path));
            }
            key.remove_files()?;
        }

        let spec = key.command();
        let outcome = match runner.run(&spec).await {
            Ok(output) => ensure_success(&spec, output).map(|_| ()),
            Err(e) => Err(e.into()),
        };
        if let Err(e) = outcome {
            warn!("ssh-keygen failed, removing partial key files");
            key.remove_files()?;
            return Err(e);
        }

        set_mode(&key.private_path, PRIVATE_KEY_MODE)?;
        set_mode(&key.public_path, PUBLIC_KEY_MODE)?;

        info!("Created {} key pair {}", key.algorithm, key.private_path.display());
        Ok(key)
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.path.is_dir() {
            fs::create_dir_all(&self.path)?;
            set_mode(&self.path, DIR_MODE)?;
        }
        Ok(())
    }

    /// Key pairs in the directory, sorted by name.
    pub fn list_keys(&self) -> Result<Vec<KeyPairEntry>> {
        let entries = match fs::read_dir(&self.path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let private_path = entry?.path();
            let Some(name) = private_path.file_name().map(|n| n.to_string_lossy().into_owned())
            else {
                continue;
            };
            if name.ends_with(".pub") || !private_path.is_file() {
                continue;
            }
            let public_path = self.path.join(format!("{name}.pub"));
            if public_path.is_file() {
                keys.push(KeyPairEntry {
                    name,
                    private_path,
                    public_path,
                });
            }
        }
        keys.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(keys)
    }

    /// Add every `*.key` private key to the SSH agent.
    pub async fn load_keys(&self, runner: &dyn CommandRunner) -> Result<Vec<PathBuf>> {
        let mut loaded = Vec::new();
        for key in self.list_keys()? {
            if !key.name.ends_with(".key") {
                continue;
            }
            let spec = CommandSpec::new("ssh-add").path_arg(&key.private_path);
            let output = runner.run(&spec).await?;
            ensure_success(&spec, output)?;
            loaded.push(key.private_path);
        }
        Ok(loaded)
    }

    /// Delete line `line` (1-based) from `known_hosts`, returning it.
    ///
    /// The file is left untouched unless the whole operation succeeds.
    pub fn remove_known_host_line(&self, line: &str) -> Result<String> {
        let number = line
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| {
                PluginError::invalid(format!("line number must be a positive integer, got '{line}'"))
            })?;

        let path = self.known_hosts();
        if !path.is_file() {
            return Err(PluginError::FileNotFound(path));
        }

        let content = fs::read_to_string(&path)?;
        let mut lines: Vec<&str> = content.split_inclusive('\n').collect();
        if number > lines.len() {
            return Err(PluginError::invalid(format!(
                "{} has only {} line(s)",
                path.display(),
                lines.len()
            )));
        }
        let removed = lines.remove(number - 1).trim_end().to_string();

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, lines.concat())?;
        let permissions = fs::metadata(&path)?.permissions();
        fs::set_permissions(&temp_path, permissions)?;
        fs::rename(&temp_path, &path)?;

        info!("Removed line {} from {}", number, path.display());
        Ok(removed)
    }
}

/// Print the public key for a private key file.
pub async fn extract_public_key(
    session: &Session,
    runner: &dyn CommandRunner,
    private_key: &str,
) -> Result<String> {
    let path = session.resolve_path(private_key);
    if !path.is_file() {
        return Err(PluginError::FileNotFound(path));
    }

    let spec = CommandSpec::new("ssh-keygen")
        .arg("-y")
        .arg("-f")
        .path_arg(&path)
        .capture();
    let output = runner.run(&spec).await?;
    let output = ensure_success(&spec, output)?;
    Ok(output.stdout.trim().to_string())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chief_core::ScriptedPrompter;
    use chief_exec::{ExecutionOutput, RecordingRunner};
    use tempfile::TempDir;

    fn setup() -> (TempDir, Session, SshDir) {
        let home = TempDir::new().unwrap();
        let session = Session::new(home.path(), home.path()).with_var(vars::USER, "alice");
        let dir = SshDir::from_config(&session, &SshConfig::default());
        (home, session, dir)
    }

    /// Runner whose `ssh-keygen` writes both key files.
    fn keygen_runner() -> RecordingRunner {
        RecordingRunner::new().on("ssh-keygen", |spec| {
            let private = PathBuf::from(spec.args.last().unwrap());
            fs::write(&private, "PRIVATE").unwrap();
            fs::write(format!("{}.pub", private.display()), "PUBLIC").unwrap();
            Ok(ExecutionOutput::ok(""))
        })
    }

    #[test]
    fn test_spec_naming() {
        let dir = Path::new("/home/u/.ssh");
        let std_key = KeyPairSpec::new(dir, None, KeyType::Ed25519, "c").unwrap();
        assert_eq!(std_key.private_path, dir.join("id_ed25519"));
        assert_eq!(std_key.public_path, dir.join("id_ed25519.pub"));

        let custom = KeyPairSpec::new(dir, Some("github"), KeyType::Rsa, "c").unwrap();
        assert_eq!(custom.private_path, dir.join("github.key"));
        assert_eq!(custom.public_path, dir.join("github.key.pub"));

        assert!(matches!(
            KeyPairSpec::new(dir, Some("../evil"), KeyType::Rsa, "c"),
            Err(PluginError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_rsa_always_4096_and_ed25519_never_sized() {
        let dir = Path::new("/k");
        let rsa = KeyPairSpec::new(dir, Some("a"), KeyType::Rsa, "c").unwrap().command();
        let pos = rsa.args.iter().position(|a| a == "-b").unwrap();
        assert_eq!(rsa.args[pos + 1], "4096");

        let ed = KeyPairSpec::new(dir, Some("a"), KeyType::Ed25519, "c").unwrap().command();
        assert!(!ed.has_arg("-b"));
        assert!(ed.has_arg("ed25519"));
    }

    #[tokio::test]
    async fn test_create_key_pair_sets_permissions() {
        let (_home, session, dir) = setup();
        let runner = keygen_runner();

        let key = dir
            .create_key_pair(
                &session,
                &runner,
                &ScriptedPrompter::default(),
                Some("work"),
                KeyType::Ed25519,
                None,
            )
            .await
            .unwrap();

        assert_eq!(key.comment, "alice");
        assert!(key.private_path.is_file());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode(&key.private_path), 0o600);
            assert_eq!(mode(&key.public_path), 0o644);
            assert_eq!(mode(dir.path()), 0o700);
        }
    }

    #[tokio::test]
    async fn test_create_existing_requires_confirmation() {
        let (_home, session, dir) = setup();
        fs::create_dir_all(dir.path()).unwrap();
        fs::write(dir.path().join("id_rsa"), "OLD").unwrap();
        let runner = keygen_runner();

        let declined = dir
            .create_key_pair(
                &session,
                &runner,
                &ScriptedPrompter::new([false]),
                None,
                KeyType::Rsa,
                Some("me@example.com"),
            )
            .await;
        assert!(matches!(declined, Err(PluginError::AlreadyExists(_))));
        assert_eq!(fs::read_to_string(dir.path().join("id_rsa")).unwrap(), "OLD");
        assert!(runner.calls().is_empty());

        let key = dir
            .create_key_pair(
                &session,
                &runner,
                &ScriptedPrompter::new([true]),
                None,
                KeyType::Rsa,
                Some("me@example.com"),
            )
            .await
            .unwrap();
        assert_eq!(fs::read_to_string(&key.private_path).unwrap(), "PRIVATE");
        assert!(runner.calls()[0].has_arg("me@example.com"));
    }

    #[tokio::test]
    async fn test_create_failure_cleans_partial_output() {
        let (_home, session, dir) = setup();
        let runner = RecordingRunner::new().on("ssh-keygen", |spec| {
            fs::write(spec.args.last().unwrap(), "HALF").unwrap();
            Ok(ExecutionOutput::failed(1))
        });

        let result = dir
            .create_key_pair(
                &session,
                &runner,
                &ScriptedPrompter::default(),
                Some("broken"),
                KeyType::Ed25519,
                None,
            )
            .await;

        assert!(matches!(
            result,
            Err(PluginError::ExternalCommandFailed { .. })
        ));
        assert!(!dir.path().join("broken.key").exists());
        assert!(!dir.path().join("broken.key.pub").exists());
    }

    #[tokio::test]
    async fn test_extract_public_key() {
        let (home, session, _dir) = setup();
        let runner = RecordingRunner::new().stdout("ssh-keygen", "ssh-ed25519 AAAA me\n");

        let missing = extract_public_key(&session, &runner, "nope.key").await;
        assert!(matches!(missing, Err(PluginError::FileNotFound(_))));
        assert!(runner.calls().is_empty());

        fs::write(home.path().join("id"), "PRIVATE").unwrap();
        let key = extract_public_key(&session, &runner, "id").await.unwrap();
        assert_eq!(key, "ssh-ed25519 AAAA me");
        assert!(runner.calls()[0].has_arg("-y"));
    }

    #[test]
    fn test_remove_known_host_line() {
        let (_home, _session, dir) = setup();
        fs::create_dir_all(dir.path()).unwrap();
        fs::write(dir.known_hosts(), "one\ntwo\nthree\n").unwrap();

        let removed = dir.remove_known_host_line("2").unwrap();
        assert_eq!(removed, "two");
        assert_eq!(fs::read_to_string(dir.known_hosts()).unwrap(), "one\nthree\n");
    }

    #[test]
    fn test_remove_known_host_line_rejects_bad_input() {
        let (_home, _session, dir) = setup();
        fs::create_dir_all(dir.path()).unwrap();
        fs::write(dir.known_hosts(), "one\ntwo\n").unwrap();

        for bad in ["abc", "0", "-1", "1.5", "", "3"] {
            let result = dir.remove_known_host_line(bad);
            assert!(
                matches!(result, Err(PluginError::InvalidArgument(_))),
                "input {bad:?} should be rejected"
            );
        }
        assert_eq!(fs::read_to_string(dir.known_hosts()).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn test_remove_known_host_line_missing_file() {
        let (_home, _session, dir) = setup();
        assert!(matches!(
            dir.remove_known_host_line("1"),
            Err(PluginError::FileNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_and_load_keys() {
        let (_home, _session, dir) = setup();
        fs::create_dir_all(dir.path()).unwrap();
        for name in ["work.key", "id_ed25519"] {
            fs::write(dir.path().join(name), "PRIVATE").unwrap();
            fs::write(dir.path().join(format!("{name}.pub")), "PUBLIC").unwrap();
        }
        fs::write(dir.path().join("orphan.key"), "PRIVATE").unwrap();
        fs::write(dir.known_hosts(), "host\n").unwrap();

        let names: Vec<String> = dir.list_keys().unwrap().into_iter().map(|k| k.name).collect();
        assert_eq!(names, vec!["id_ed25519", "work.key"]);

        let runner = RecordingRunner::new();
        let loaded = dir.load_keys(&runner).await.unwrap();
        assert_eq!(loaded, vec![dir.path().join("work.key")]);
        assert_eq!(runner.calls_to("ssh-add").len(), 1);
    }
}
