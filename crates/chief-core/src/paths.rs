//! Path resolution utilities.

use crate::error::ConfigError;
use std::path::{Component, Path, PathBuf};

/// Get the user's home directory.
pub fn home_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::NoHomeDir)
}

/// Get the chief base directory (~/.chief).
pub fn base_dir() -> Result<PathBuf, ConfigError> {
    Ok(home_dir()?.join(".chief"))
}

/// Get the main config file path (~/.chief/chief.json5).
pub fn config_file() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("chief.json5"))
}

/// Default SSH directory under a home directory.
pub fn ssh_dir(home: &Path) -> PathBuf {
    home.join(".ssh")
}

/// Default secrets vault file under a home directory.
pub fn secrets_file(home: &Path) -> PathBuf {
    home.join(".chief_secrets.sh")
}

/// Default AWS credentials file under a home directory.
pub fn aws_credentials_file(home: &Path) -> PathBuf {
    home.join(".aws").join("credentials")
}

/// Expand a leading tilde (`~` or `~/...`) against `home`.
pub fn expand_tilde(path: &str, home: &Path) -> PathBuf {
    if path == "~" {
        return home.to_path_buf();
    }
    if let Some(rest) = path.strip_prefix("~/") {
        return home.join(rest);
    }
    PathBuf::from(path)
}

/// Make `path` absolute against `base` and fold `.`/`..` components.
///
/// Purely lexical: the path does not need to exist and symlinks are not
/// followed.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Check if `path` is lexically inside `dir`.
pub fn is_within(path: &Path, dir: &Path) -> bool {
    path.starts_with(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_dir() {
        let dir = base_dir().unwrap();
        assert!(dir.ends_with(".chief"));
    }

    #[test]
    fn test_expand_tilde() {
        let home = Path::new("/home/alice");
        assert_eq!(expand_tilde("~/envs/p", home), PathBuf::from("/home/alice/envs/p"));
        assert_eq!(expand_tilde("~", home), PathBuf::from("/home/alice"));
        assert_eq!(expand_tilde("rel/~x", home), PathBuf::from("rel/~x"));
    }

    #[test]
    fn test_absolutize_folds_dots() {
        let base = Path::new("/work/project");
        assert_eq!(
            absolutize(Path::new("./envs/../.venv"), base),
            PathBuf::from("/work/project/.venv")
        );
        assert_eq!(absolutize(Path::new("/opt/./ve"), base), PathBuf::from("/opt/ve"));
    }

    #[test]
    fn test_default_locations() {
        let home = Path::new("/home/bob");
        assert_eq!(ssh_dir(home), PathBuf::from("/home/bob/.ssh"));
        assert!(secrets_file(home).ends_with(".chief_secrets.sh"));
        assert!(aws_credentials_file(home).ends_with(".aws/credentials"));
    }
}
