//! Configuration loading and persistence.

use super::Config;
use crate::error::ConfigError;
use crate::paths;
use std::fs;
use std::path::Path;
use tracing::debug;

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = paths::config_file()?;
        Self::load(&path)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load from `path` (or the default path), falling back to defaults when
    /// the file does not exist. Parse errors are still reported.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let result = match path {
            Some(p) => Self::load(p),
            None => Self::load_default(),
        };
        match result {
            Err(ConfigError::NotFound(p)) => {
                debug!("No config at {}, using defaults", p.display());
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Save configuration to a file path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_json5()?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Serialize to JSON5 string.
    pub fn to_json5(&self) -> Result<String, ConfigError> {
        // json5 doesn't have a serializer, so we use serde_json with pretty print
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.python.interpreter.trim().is_empty() {
            errors.push("python.interpreter must not be empty".to_string());
        }

        if self.vault.program.trim().is_empty() {
            errors.push("vault.program must not be empty".to_string());
        }

        if let Some(editor) = &self.vault.editor {
            if editor.trim().is_empty() {
                errors.push("vault.editor must not be empty when set".to_string());
            }
        }

        if let Some(file) = &self.vault.secrets_file {
            if file.is_dir() {
                errors.push(format!(
                    "vault.secrets_file {} is a directory",
                    file.display()
                ));
            }
        }

        if let Some(dir) = &self.ssh.dir {
            if dir.is_file() {
                errors.push(format!("ssh.dir {} is a file", dir.display()));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }
}
