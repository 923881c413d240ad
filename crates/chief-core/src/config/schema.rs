//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Main chief configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Python virtual environment settings.
    #[serde(default)]
    pub python: PythonConfig,

    /// SSH key settings.
    #[serde(default)]
    pub ssh: SshConfig,

    /// Secrets vault settings.
    #[serde(default)]
    pub vault: VaultConfig,

    /// AWS credentials settings.
    #[serde(default)]
    pub aws: AwsConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Python virtual environment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PythonConfig {
    /// Interpreter used to create environments.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Append local environments to `./.gitignore`.
    #[serde(default = "default_true")]
    pub gitignore: bool,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            gitignore: true,
        }
    }
}

/// SSH configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SshConfig {
    /// Key directory (defaults to `~/.ssh`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Key type used when none is given.
    #[serde(default)]
    pub default_type: KeyType,
}

/// SSH key algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    #[default]
    Ed25519,
    Rsa,
}

impl KeyType {
    /// Name passed to `ssh-keygen -t`.
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Ed25519 => "ed25519",
            KeyType::Rsa => "rsa",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ed25519" => Ok(KeyType::Ed25519),
            "rsa" => Ok(KeyType::Rsa),
            other => Err(format!("unsupported key type '{other}', expected ed25519 or rsa")),
        }
    }
}

/// Secrets vault configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Default vault file (defaults to `~/.chief_secrets.sh`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secrets_file: Option<PathBuf>,

    /// Editor for new vault files; falls back to `$EDITOR`, then `vi`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,

    /// ansible-vault executable.
    #[serde(default = "default_vault_program")]
    pub program: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            secrets_file: None,
            editor: None,
            program: default_vault_program(),
        }
    }
}

/// AWS credentials configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Credentials file (defaults to `~/.aws/credentials`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_file: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default)]
    pub level: LogLevel,
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

fn default_interpreter() -> String {
    "python3".to_string()
}

fn default_vault_program() -> String {
    "ansible-vault".to_string()
}

fn default_true() -> bool {
    true
}
