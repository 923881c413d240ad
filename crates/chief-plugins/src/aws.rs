//! AWS shared credentials role switching.
//!
//! `set_role` copies a named profile into `[default]` together with a
//! region, so tools that only read the default profile pick it up. With
//! export, the default profile is printed as `export` lines and the
//! credentials file is moved aside so it cannot shadow them.

use crate::error::{PluginError, Result};
use chief_core::config::AwsConfig;
use chief_core::env::shell_quote;
use chief_core::{paths, Session};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Profile every AWS tool reads by default.
pub const DEFAULT_ROLE: &str = "default";

/// Suffix of the backup made by an export.
pub const BACKUP_SUFFIX: &str = ".aws_save";

type Section = (String, Vec<(String, String)>);

/// Credentials file location from config, defaulting to `~/.aws/credentials`.
pub fn credentials_path(session: &Session, config: &AwsConfig) -> PathBuf {
    match &config.credentials_file {
        Some(path) => session.resolve_path(&path.to_string_lossy()),
        None => paths::aws_credentials_file(session.home()),
    }
}

/// Backup location for a credentials file.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// An AWS shared credentials file.
#[derive(Debug, Clone)]
pub struct AwsCredentials {
    path: PathBuf,
    sections: Vec<Section>,
}

impl AwsCredentials {
    /// Open the credentials file, restoring it from its backup when only the
    /// backup exists.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            let backup = backup_path(path);
            if !backup.exists() {
                return Err(PluginError::FileNotFound(path.to_path_buf()));
            }
            info!("Restoring {} from {}", path.display(), backup.display());
            fs::rename(&backup, path)?;
        }
        let content = fs::read_to_string(path)?;
        Self::parse(path, &content)
    }

    /// Parse INI content. Keys are lower-cased; `#`/`;` lines are comments.
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let mut sections: Vec<Section> = Vec::new();

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                sections.push((name.trim().to_string(), Vec::new()));
                continue;
            }

            let Some((key, value)) = line.split_once('=').or_else(|| line.split_once(':')) else {
                return Err(PluginError::invalid(format!(
                    "{}:{}: expected 'key = value'",
                    path.display(),
                    index + 1
                )));
            };
            let Some((_, entries)) = sections.last_mut() else {
                return Err(PluginError::invalid(format!(
                    "{}:{}: entry outside of a [section]",
                    path.display(),
                    index + 1
                )));
            };
            set_entry(entries, key.trim(), value.trim());
        }

        Ok(Self {
            path: path.to_path_buf(),
            sections,
        })
    }

    /// File path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Profile names in file order.
    pub fn roles(&self) -> Vec<&str> {
        self.sections.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Entries of one profile.
    pub fn section(&self, name: &str) -> Option<&[(String, String)]> {
        self.sections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, entries)| entries.as_slice())
    }

    /// Copy `role` into `[default]` and set its region. Sections end up
    /// sorted by name.
    pub fn set_default_role(&mut self, role: &str, region: &str) -> Result<()> {
        let entries = self
            .section(role)
            .map(<[_]>::to_vec)
            .ok_or_else(|| PluginError::invalid(format!("unknown AWS role '{role}'")))?;

        if self.section(DEFAULT_ROLE).is_none() {
            self.sections.push((DEFAULT_ROLE.to_string(), Vec::new()));
        }
        let default = self
            .sections
            .iter_mut()
            .find(|(n, _)| n == DEFAULT_ROLE)
            .map(|(_, entries)| entries)
            .ok_or_else(|| PluginError::invalid("default role missing"))?;

        for (key, value) in &entries {
            set_entry(default, key, value);
        }
        set_entry(default, "aws_default_region", region);
        set_entry(default, "region", region);

        self.sections.sort_by(|a, b| a.0.cmp(&b.0));
        debug!("Default role set to {}", role);
        Ok(())
    }

    /// INI text for the current state.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, entries) in &self.sections {
            out.push_str(&format!("[{name}]\n"));
            for (key, value) in entries {
                out.push_str(&format!("{key} = {value}\n"));
            }
            out.push('\n');
        }
        out
    }

    /// Write the file back atomically, keeping the original permissions.
    pub fn save(&self) -> Result<()> {
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, self.render())?;
        if let Ok(metadata) = fs::metadata(&self.path) {
            fs::set_permissions(&temp_path, metadata.permissions())?;
        }
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    /// `export` lines for the default profile, then move the file to its
    /// backup.
    pub fn export_default(&self) -> Result<String> {
        let entries = self
            .section(DEFAULT_ROLE)
            .ok_or_else(|| PluginError::invalid("no [default] role to export"))?;

        let mut script = String::new();
        for (key, value) in entries {
            script.push_str(&format!(
                "export {}={}\n",
                key.to_uppercase(),
                shell_quote(value)
            ));
        }

        let backup = backup_path(&self.path);
        fs::rename(&self.path, &backup)?;
        script.push_str(&format!(
            "# {} was moved to {} as a backup.\n",
            self.path.display(),
            backup.display()
        ));
        Ok(script)
    }
}

fn set_entry(entries: &mut Vec<(String, String)>, key: &str, value: &str) {
    let key = key.to_lowercase();
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value.to_string(),
        None => entries.push((key, value.to_string())),
    }
}

/// Make `role` the default profile with `region`.
///
/// Returns the export script when `export` is set.
pub fn set_role(path: &Path, role: &str, region: &str, export: bool) -> Result<Option<String>> {
    if region.trim().is_empty() {
        return Err(PluginError::invalid("region must not be empty"));
    }

    let mut credentials = AwsCredentials::open(path)?;
    credentials.set_default_role(role, region)?;
    credentials.save()?;
    info!("Default AWS role set to '{}' in {}", role, path.display());

    if export {
        credentials.export_default().map(Some)
    } else {
        Ok(None)
    }
}
